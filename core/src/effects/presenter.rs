//! Hologram spawn, animation and cleanup.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;
use rand::rngs::StdRng;

use damage_numbers_types::{EffectCategory, Offset, Settings};

use super::animation::{AnimationParams, Frame, build_frames};
use crate::format::StyledText;
use crate::host::{
    DeliveryReport, HostBridge, Instruction, TextDisplayFlags, Vec3, ViewerId, fan_out,
    fan_out_online,
};
use crate::scheduler::Scheduler;

/// Hologram ids are drawn above this value to stay clear of host entity ids.
pub const MIN_HOLOGRAM_ID: i32 = 100_000;

/// Spawns holograms and schedules their motion and removal.
///
/// Holds no per-hologram state: the id, frames and viewer list live only in
/// the scheduled tasks.
pub struct EffectScheduler {
    host: Arc<dyn HostBridge>,
    scheduler: Arc<dyn Scheduler>,
    rng: Arc<Mutex<StdRng>>,
    offset: Offset,
    random_offset: f64,
    normal: AnimationParams,
    critical: AnimationParams,
    healing: AnimationParams,
}

impl EffectScheduler {
    pub fn new(
        settings: &Settings,
        host: Arc<dyn HostBridge>,
        scheduler: Arc<dyn Scheduler>,
        rng: Arc<Mutex<StdRng>>,
    ) -> Self {
        Self {
            host,
            scheduler,
            rng,
            offset: settings.display.offset,
            random_offset: settings.display.random_offset,
            normal: AnimationParams::for_category(settings, EffectCategory::Normal),
            critical: AnimationParams::for_category(settings, EffectCategory::Critical),
            healing: AnimationParams::for_category(settings, EffectCategory::Healing),
        }
    }

    fn params(&self, category: EffectCategory) -> &AnimationParams {
        match category {
            EffectCategory::Normal => &self.normal,
            EffectCategory::Critical => &self.critical,
            EffectCategory::Healing => &self.healing,
        }
    }

    /// Spawn `text` near `base` for every viewer and schedule its animation.
    ///
    /// Returns the spawn delivery report. Later steps report their own
    /// failures to the log.
    pub fn present(
        &self,
        viewers: Arc<[ViewerId]>,
        base: Vec3,
        text: StyledText,
        category: EffectCategory,
    ) -> DeliveryReport {
        let params = *self.params(category);
        let (entity_id, spawn, frames) = {
            let mut rng = self.rng.lock();
            let spawn = self.spawn_position(base, &mut *rng);
            let entity_id = rng.gen_range(MIN_HOLOGRAM_ID..i32::MAX);
            let frames = build_frames(&params, spawn, &mut *rng);
            (entity_id, spawn, frames)
        };

        let spawn_instruction = Instruction::SpawnText {
            entity_id,
            position: spawn,
            text,
            flags: TextDisplayFlags::HOLOGRAM,
        };
        let report = fan_out(self.host.as_ref(), &viewers, &spawn_instruction);
        for (viewer, error) in &report.failures {
            tracing::debug!(viewer = %viewer, entity_id, error = %error, "Hologram spawn failed");
        }
        tracing::debug!(
            entity_id,
            category = category.label(),
            position = %spawn,
            viewers = report.delivered,
            "Spawned hologram"
        );

        for frame in frames {
            self.schedule_frame(entity_id, frame, Arc::clone(&viewers));
        }
        self.schedule_destroy(entity_id, u64::from(params.lifetime_ticks), viewers);

        report
    }

    fn spawn_position(&self, base: Vec3, rng: &mut StdRng) -> Vec3 {
        let jitter_x = (rng.r#gen::<f64>() - 0.5) * self.random_offset;
        let jitter_z = (rng.r#gen::<f64>() - 0.5) * self.random_offset;
        base.offset(
            self.offset.x + jitter_x,
            self.offset.y,
            self.offset.z + jitter_z,
        )
    }

    fn schedule_frame(&self, entity_id: i32, frame: Frame, viewers: Arc<[ViewerId]>) {
        let host = Arc::clone(&self.host);
        self.scheduler.schedule(
            frame.offset_ticks,
            Box::new(move || {
                let instruction = Instruction::Teleport {
                    entity_id,
                    position: frame.position,
                    yaw: frame.yaw,
                };
                let report = fan_out_online(host.as_ref(), &viewers, &instruction);
                for (viewer, error) in report.failures {
                    tracing::debug!(viewer = %viewer, entity_id, error = %error, "Teleport failed");
                }
            }),
        );
    }

    fn schedule_destroy(&self, entity_id: i32, lifetime_ticks: u64, viewers: Arc<[ViewerId]>) {
        let host = Arc::clone(&self.host);
        self.scheduler.schedule(
            lifetime_ticks,
            Box::new(move || {
                let report =
                    fan_out_online(host.as_ref(), &viewers, &Instruction::Destroy { entity_id });
                for (viewer, error) in &report.failures {
                    tracing::debug!(viewer = %viewer, entity_id, error = %error, "Destroy failed");
                }
                tracing::trace!(
                    entity_id,
                    delivered = report.delivered,
                    skipped = report.skipped,
                    "Destroyed hologram"
                );
            }),
        );
    }
}
