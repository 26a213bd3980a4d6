//! Particle bursts and sounds that accompany a hologram.

use std::sync::Arc;

use damage_numbers_types::{EffectCategory, ParticleSettings, SoundSettings};

use crate::host::{DeliveryReport, HostBridge, Instruction, SendError, Vec3, ViewerId, fan_out};

/// Burst height above the target's feet for damage.
pub const DAMAGE_PARTICLE_HEIGHT: f64 = 0.5;
/// Burst height above the healed player's feet.
pub const HEALING_PARTICLE_HEIGHT: f64 = 1.6;

pub struct Feedback {
    host: Arc<dyn HostBridge>,
    particles: ParticleSettings,
    sounds: SoundSettings,
}

impl Feedback {
    pub fn new(
        host: Arc<dyn HostBridge>,
        particles: ParticleSettings,
        sounds: SoundSettings,
    ) -> Self {
        Self {
            host,
            particles,
            sounds,
        }
    }

    /// Send the category's particles and sound to every viewer. Disabled
    /// (empty) names send nothing.
    pub fn play(&self, viewers: &[ViewerId], feet: Vec3, category: EffectCategory) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        let spec = self.particles.for_category(category);
        if !spec.kind.is_empty() {
            let height = match category {
                EffectCategory::Healing => HEALING_PARTICLE_HEIGHT,
                _ => DAMAGE_PARTICLE_HEIGHT,
            };
            let instruction = Instruction::Particles {
                location: feet.offset(0.0, height, 0.0),
                particle: spec.kind.clone(),
                count: spec.count,
                spread: spec.offset,
            };
            report.merge(fan_out(self.host.as_ref(), viewers, &instruction));
        }

        if let Some(sound) = self.sounds.name_for(category) {
            let instruction = Instruction::Sound {
                location: feet,
                sound: sound.to_string(),
                volume: self.sounds.volume,
                pitch: self.sounds.pitch,
            };
            report.merge(fan_out(self.host.as_ref(), viewers, &instruction));
        }

        for (viewer, error) in &report.failures {
            match error {
                SendError::UnknownKey { kind, key } => {
                    tracing::warn!(viewer = %viewer, kind, key = %key, "Host rejected effect name");
                }
                _ => tracing::debug!(viewer = %viewer, error = %error, "Feedback delivery failed"),
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;
    use damage_numbers_types::Settings;

    fn feedback(host: &Arc<MemoryHost>, settings: &Settings) -> Feedback {
        Feedback::new(
            Arc::clone(host) as Arc<dyn HostBridge>,
            settings.particles.clone(),
            settings.advanced.sounds.clone(),
        )
    }

    #[test]
    fn test_damage_particles_without_sound_by_default() {
        let host = Arc::new(MemoryHost::new());
        let viewer = host.spawn_player(host.default_world(), Vec3::default());
        let report = feedback(&host, &Settings::default()).play(
            &[viewer],
            Vec3::new(0.0, 64.0, 0.0),
            EffectCategory::Critical,
        );

        assert_eq!(report.delivered, 1);
        assert_eq!(
            host.sent_to(viewer),
            vec![Instruction::Particles {
                location: Vec3::new(0.0, 64.5, 0.0),
                particle: "CRIT".to_string(),
                count: 10,
                spread: 0.4,
            }]
        );
    }

    #[test]
    fn test_healing_burst_height_and_sound() {
        let host = Arc::new(MemoryHost::new());
        let viewer = host.spawn_player(host.default_world(), Vec3::default());
        let mut settings = Settings::default();
        settings.advanced.sounds.healing = "ENTITY_PLAYER_LEVELUP".to_string();

        feedback(&host, &settings).play(&[viewer], Vec3::new(0.0, 10.0, 0.0), EffectCategory::Healing);

        let sent = host.sent_to(viewer);
        assert_eq!(sent.len(), 2);
        match &sent[0] {
            Instruction::Particles { location, particle, .. } => {
                assert!((location.y - 11.6).abs() < 1e-9);
                assert_eq!(particle, "HEART");
            }
            other => panic!("expected particles, got {other:?}"),
        }
        assert_eq!(
            sent[1],
            Instruction::Sound {
                location: Vec3::new(0.0, 10.0, 0.0),
                sound: "ENTITY_PLAYER_LEVELUP".to_string(),
                volume: 0.5,
                pitch: 1.0,
            }
        );
    }

    #[test]
    fn test_disabled_particles_send_nothing() {
        let host = Arc::new(MemoryHost::new());
        let viewer = host.spawn_player(host.default_world(), Vec3::default());
        let mut settings = Settings::default();
        settings.particles.normal.kind.clear();

        let report = feedback(&host, &settings).play(&[viewer], Vec3::default(), EffectCategory::Normal);

        assert_eq!(report, DeliveryReport::default());
        assert!(host.sent().is_empty());
    }
}
