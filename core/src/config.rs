//! Configuration loading and validation
//!
//! The file is TOML and every key is optional. [`validate`] normalizes a
//! parsed [`Settings`] and reports each value it had to change; nothing in a
//! config file can make loading fail except unreadable files and TOML syntax
//! or type errors.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use damage_numbers_types::config::{
    DEFAULT_CRITICAL_FORMAT, DEFAULT_HEALING_FORMAT, DEFAULT_NORMAL_FORMAT,
};
use damage_numbers_types::{MILLIS_PER_TICK, Settings};

use crate::format::AMOUNT_PLACEHOLDER;

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors that can occur during config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("serialize error for {path:?}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },
}

/// A value that was replaced during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    /// Dotted key, e.g. `particles.critical.type`.
    pub key: String,
    pub message: String,
}

impl ConfigWarning {
    fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

/// `dirs::config_dir()/damage-numbers/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("damage-numbers").join(CONFIG_FILE_NAME))
}

/// Read and parse a config file without validating it.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load, validate and log every warning.
pub fn load_validated(path: &Path) -> Result<(Settings, Vec<ConfigWarning>), ConfigError> {
    let (settings, warnings) = validate(load_settings(path)?);
    for warning in &warnings {
        tracing::warn!(path = %path.display(), key = %warning.key, "{}", warning.message);
    }
    Ok((settings, warnings))
}

/// Write the default configuration unless `path` already exists.
/// Returns whether a file was written.
pub fn write_default(path: &Path) -> Result<bool, ConfigError> {
    if path.exists() {
        return Ok(false);
    }

    let contents = toml::to_string_pretty(&Settings::default()).map_err(|e| ConfigError::Serialize {
        path: path.to_path_buf(),
        source: e,
    })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    fs::write(path, contents).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(path = %path.display(), "Wrote default configuration");
    Ok(true)
}

/// Normalize `settings`, returning the corrected copy and one warning per
/// corrected value.
pub fn validate(mut settings: Settings) -> (Settings, Vec<ConfigWarning>) {
    let mut warnings = Vec::new();

    check_template(&mut settings.formats.normal, "formats.normal", DEFAULT_NORMAL_FORMAT, &mut warnings);
    check_template(
        &mut settings.formats.critical,
        "formats.critical",
        DEFAULT_CRITICAL_FORMAT,
        &mut warnings,
    );
    check_template(&mut settings.formats.healing, "formats.healing", DEFAULT_HEALING_FORMAT, &mut warnings);

    let display = &mut settings.display;
    clamp_non_negative(&mut display.random_offset, "display.random-offset", &mut warnings);
    clamp_non_negative(&mut display.view_range, "display.view-range", &mut warnings);
    for (value, key) in [
        (&mut display.offset.x, "display.offset.x"),
        (&mut display.offset.y, "display.offset.y"),
        (&mut display.offset.z, "display.offset.z"),
    ] {
        finite_or_zero(value, key, &mut warnings);
    }
    clamp_non_negative(&mut settings.healing.view_range, "healing.view-range", &mut warnings);

    let animation = &mut settings.animation;
    finite_or_zero(&mut animation.rise_speed, "animation.rise-speed", &mut warnings);
    finite_or_zero(&mut animation.spin_speed, "animation.spin-speed", &mut warnings);

    let lifetime = &mut settings.advanced.lifetime;
    for (value, key) in [
        (&mut lifetime.normal, "advanced.lifetime.normal"),
        (&mut lifetime.critical, "advanced.lifetime.critical"),
        (&mut lifetime.healing, "advanced.lifetime.healing"),
    ] {
        if *value == 0 {
            warnings.push(ConfigWarning::new(key, "lifetime must be at least 1 tick, using 1"));
            *value = 1;
        }
    }

    let stacking = &mut settings.advanced.stacking;
    widen_window(
        &mut stacking.window_ms,
        stacking.delay_ticks,
        "advanced.stacking.window-ms",
        &mut warnings,
    );
    let healing = &mut settings.healing;
    widen_window(
        &mut healing.stack_window_ms,
        healing.stack_delay_ticks,
        "healing.stack-window-ms",
        &mut warnings,
    );

    let sounds = &mut settings.advanced.sounds;
    for (name, key) in [
        (&mut sounds.normal, "advanced.sounds.normal"),
        (&mut sounds.critical, "advanced.sounds.critical"),
        (&mut sounds.healing, "advanced.sounds.healing"),
    ] {
        normalize_name(name, key, &mut warnings);
    }
    if !sounds.volume.is_finite() || sounds.volume < 0.0 {
        warnings.push(ConfigWarning::new("advanced.sounds.volume", "must be a non-negative number, using 0"));
        sounds.volume = 0.0;
    }
    if !sounds.pitch.is_finite() || !(0.5..=2.0).contains(&sounds.pitch) {
        let clamped = if sounds.pitch.is_finite() {
            sounds.pitch.clamp(0.5, 2.0)
        } else {
            1.0
        };
        warnings.push(ConfigWarning::new(
            "advanced.sounds.pitch",
            format!("{} is outside 0.5..=2.0, using {clamped}", sounds.pitch),
        ));
        sounds.pitch = clamped;
    }

    let particles = &mut settings.particles;
    for (spec, key) in [
        (&mut particles.normal, "particles.normal"),
        (&mut particles.critical, "particles.critical"),
        (&mut particles.healing, "particles.healing"),
    ] {
        normalize_name(&mut spec.kind, &format!("{key}.type"), &mut warnings);
        clamp_non_negative(&mut spec.offset, &format!("{key}.offset"), &mut warnings);
    }

    let mut ignored = Vec::with_capacity(settings.triggers.ignored_entity_types.len());
    for name in &settings.triggers.ignored_entity_types {
        let normalized = name.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            warnings.push(ConfigWarning::new("triggers.ignored-entity-types", "empty entry removed"));
        } else if !ignored.contains(&normalized) {
            ignored.push(normalized);
        }
    }
    settings.triggers.ignored_entity_types = ignored;

    (settings, warnings)
}

fn check_template(template: &mut String, key: &str, default: &str, warnings: &mut Vec<ConfigWarning>) {
    if !template.contains(AMOUNT_PLACEHOLDER) {
        warnings.push(ConfigWarning::new(
            key,
            format!("template has no {AMOUNT_PLACEHOLDER} placeholder, using \"{default}\""),
        ));
        *template = default.to_string();
    }
}

fn clamp_non_negative(value: &mut f64, key: &str, warnings: &mut Vec<ConfigWarning>) {
    if !value.is_finite() || *value < 0.0 {
        warnings.push(ConfigWarning::new(key, format!("{value} is not a non-negative number, using 0")));
        *value = 0.0;
    }
}

fn finite_or_zero(value: &mut f64, key: &str, warnings: &mut Vec<ConfigWarning>) {
    if !value.is_finite() {
        warnings.push(ConfigWarning::new(key, format!("{value} is not a number, using 0")));
        *value = 0.0;
    }
}

/// A stack that fires after its window closed would restart mid-burst, so the
/// window is raised to cover the delay.
fn widen_window(window_ms: &mut u64, delay_ticks: u64, key: &str, warnings: &mut Vec<ConfigWarning>) {
    let delay_ms = delay_ticks.saturating_mul(MILLIS_PER_TICK);
    if delay_ms > *window_ms {
        warnings.push(ConfigWarning::new(
            key,
            format!("{window_ms}ms is shorter than the {delay_ticks} tick stack delay, using {delay_ms}ms"),
        ));
        *window_ms = delay_ms;
    }
}

/// Host registry names: upper case `A-Z`, digits, `_`, `.` and `:`.
/// Anything else disables the effect.
fn normalize_name(name: &mut String, key: &str, warnings: &mut Vec<ConfigWarning>) {
    let normalized = name.trim().to_ascii_uppercase();
    let valid = normalized
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | ':'));

    if valid {
        *name = normalized;
    } else {
        warnings.push(ConfigWarning::new(key, format!("invalid name \"{name}\", disabled")));
        name.clear();
    }
}
