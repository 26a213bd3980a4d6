//! Hologram motion.
//!
//! Frames are computed up front, once per hologram, so every viewer sees the
//! same path and a seeded generator gives the same path in every run.

use rand::Rng;

use damage_numbers_types::{EffectCategory, Settings};

use crate::host::Vec3;

/// Ticks between two position updates.
pub const STEP_TICKS: u64 = 2;

const BOUNCE_UNTIL: f64 = 0.3;
const BOUNCE_AMPLITUDE: f64 = 0.1;
const SHAKE_UNTIL: f64 = 0.4;
const SHAKE_MAGNITUDE: f64 = 0.08;
const DEGREES_PER_SPIN_TICK: f64 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationParams {
    pub lifetime_ticks: u32,
    /// Blocks per step.
    pub rise_speed: f64,
    pub bounce: bool,
    pub shake: bool,
    pub spin_speed: f64,
}

impl AnimationParams {
    pub fn for_category(settings: &Settings, category: EffectCategory) -> Self {
        let animation = &settings.animation;
        Self {
            lifetime_ticks: settings.lifetime_for(category).max(1),
            rise_speed: animation.rise_speed,
            bounce: animation.bounce,
            shake: animation.shake_on_crit && category.is_critical(),
            spin_speed: animation.spin_speed,
        }
    }
}

/// One scheduled position update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Delay from spawn.
    pub offset_ticks: u64,
    pub position: Vec3,
    pub yaw: f32,
}

/// Position updates at steps `0, 2, 4, ...` below the lifetime, so
/// `ceil(lifetime / 2)` frames in total.
pub fn build_frames<R: Rng + ?Sized>(params: &AnimationParams, spawn: Vec3, rng: &mut R) -> Vec<Frame> {
    let lifetime = u64::from(params.lifetime_ticks);
    let mut frames = Vec::with_capacity(lifetime.div_ceil(STEP_TICKS) as usize);

    for step in (0..lifetime).step_by(STEP_TICKS as usize) {
        let progress = step as f64 / lifetime as f64;
        let mut y = spawn.y + params.rise_speed * (step as f64 / 2.0);
        if params.bounce && progress < BOUNCE_UNTIL {
            y += (progress * std::f64::consts::PI * 3.0).sin() * BOUNCE_AMPLITUDE;
        }

        let (dx, dz) = if params.shake && progress < SHAKE_UNTIL {
            (
                (rng.r#gen::<f64>() - 0.5) * SHAKE_MAGNITUDE,
                (rng.r#gen::<f64>() - 0.5) * SHAKE_MAGNITUDE,
            )
        } else {
            (0.0, 0.0)
        };

        let yaw = if params.spin_speed > 0.0 {
            (step as f64 * params.spin_speed * DEGREES_PER_SPIN_TICK) as f32
        } else {
            0.0
        };

        frames.push(Frame {
            offset_ticks: step,
            position: Vec3::new(spawn.x + dx, y, spawn.z + dz),
            yaw,
        });
    }

    frames
}
