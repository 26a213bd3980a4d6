//! Visual effects
//!
//! An [`EffectRequest`] is rendered into three kinds of client-side output:
//! - **Hologram**: a floating text display that rises for its lifetime and is
//!   then destroyed ([`EffectScheduler`])
//! - **Particles**: one burst per viewer ([`Feedback`])
//! - **Sound**: optional, per category ([`Feedback`])
//!
//! ```text
//!  EffectRequest ──► Formatter ──► EffectScheduler ──► SpawnText
//!                                        │
//!                                        ├─ tick 0, 2, 4, ... ─► Teleport
//!                                        └─ tick = lifetime ──► Destroy
//! ```

pub mod animation;
mod feedback;
mod presenter;


pub use animation::{AnimationParams, Frame, STEP_TICKS, build_frames};
pub use feedback::{DAMAGE_PARTICLE_HEIGHT, Feedback, HEALING_PARTICLE_HEIGHT};
pub use presenter::{EffectScheduler, MIN_HOLOGRAM_ID};

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;

use damage_numbers_types::{EffectCategory, Settings};

use crate::format::Formatter;
use crate::host::{DeliveryReport, HostBridge, Vec3, ViewerId};
use crate::scheduler::Scheduler;

/// Height of the hologram anchor above the target's feet. The configured
/// display offset is applied on top of it.
pub const ANCHOR_HEIGHT: f64 = 0.8;

/// One effect to render. Consumed once.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectRequest {
    /// Feet position of the damaged or healed entity.
    pub origin: Vec3,
    pub amount: f64,
    pub category: EffectCategory,
    pub viewers: Arc<[ViewerId]>,
}

/// Formatter, hologram presenter and feedback for one configuration snapshot.
pub struct EffectPipeline {
    formatter: Formatter,
    presenter: EffectScheduler,
    feedback: Feedback,
}

impl EffectPipeline {
    pub fn new(
        settings: &Settings,
        host: Arc<dyn HostBridge>,
        scheduler: Arc<dyn Scheduler>,
        rng: Arc<Mutex<StdRng>>,
    ) -> Self {
        Self {
            formatter: Formatter::new(settings),
            presenter: EffectScheduler::new(settings, Arc::clone(&host), scheduler, rng),
            feedback: Feedback::new(
                host,
                settings.particles.clone(),
                settings.advanced.sounds.clone(),
            ),
        }
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    /// Render `request` to its viewers. Returns the combined report of the
    /// immediate sends (spawn, particles, sound).
    pub fn emit(&self, request: EffectRequest) -> DeliveryReport {
        let text = self.formatter.render(request.amount, request.category);
        let anchor = request.origin.offset(0.0, ANCHOR_HEIGHT, 0.0);

        let mut report = self.presenter.present(
            Arc::clone(&request.viewers),
            anchor,
            text,
            request.category,
        );
        report.merge(self.feedback.play(&request.viewers, request.origin, request.category));

        if !report.is_clean() {
            tracing::debug!(
                failures = report.failures.len(),
                delivered = report.delivered,
                "Effect partially delivered"
            );
        }
        report
    }
}
