//! Viewer selection.

use damage_numbers_types::Visibility;

use crate::host::{EntityId, HostBridge, Location, ViewerId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerPolicy {
    pub visibility: Visibility,
    pub view_range: f64,
}

impl ViewerPolicy {
    pub fn new(visibility: Visibility, view_range: f64) -> Self {
        Self {
            visibility,
            view_range,
        }
    }

    /// Players allowed to see an effect at `reference`.
    ///
    /// `Everyone` selects all players of the reference world whose distance
    /// is at most the view range (inclusive); otherwise only `actor`.
    pub fn select(&self, host: &dyn HostBridge, actor: EntityId, reference: &Location) -> Vec<ViewerId> {
        match self.visibility {
            Visibility::Actor => vec![actor],
            Visibility::Everyone => {
                let range_sq = self.view_range * self.view_range;
                host.players_in_world(reference.world)
                    .into_iter()
                    .filter(|player| {
                        player.location.position.distance_squared(reference.position) <= range_sq
                    })
                    .map(|player| player.id)
                    .collect()
            }
        }
    }
}
