//! Administrative commands
//!
//! - `dnreload`: reload the configuration (`damagenumbers.reload`)
//! - `damagenumbers test <hit|crit|heal>`: show a canned effect to the caller
//!
//! Failures never escape to the host: [`handle`] reports them to the sender
//! in red and logs them.

use crate::config::ConfigError;
use crate::format::{NamedColor, StyledText};
use crate::host::PlayerSnapshot;
use crate::plugin::{DamageNumbers, TestEffect};

pub const RELOAD_COMMAND: &str = "dnreload";
pub const MAIN_COMMAND: &str = "damagenumbers";
pub const RELOAD_PERMISSION: &str = "damagenumbers.reload";
pub const TEST_USAGE: &str = "/damagenumbers test <hit|crit|heal>";

/// Whoever typed the command: a player or the console.
pub trait CommandSender {
    fn name(&self) -> &str;

    fn has_permission(&self, permission: &str) -> bool;

    /// The sender as a player, `None` for the console.
    fn player(&self) -> Option<PlayerSnapshot>;

    fn send_message(&self, message: StyledText);
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("You don't have permission to use this command.")]
    PermissionDenied,
    #[error("This command can only be used by players.")]
    PlayersOnly,
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Invalid type '{0}'. Use: hit, crit, or heal.")]
    UnknownTestEffect(String),
    #[error("Unknown command '{0}'.")]
    UnknownCommand(String),
    #[error("Error reloading configuration: {0}")]
    Reload(#[from] ConfigError),
}

/// Run a command and return the success message.
pub fn execute(
    plugin: &DamageNumbers,
    sender: &dyn CommandSender,
    command: &str,
    args: &[&str],
) -> Result<String, CommandError> {
    match command.to_ascii_lowercase().as_str() {
        RELOAD_COMMAND => reload(plugin, sender),
        MAIN_COMMAND => match args {
            [sub, effect, ..] if sub.eq_ignore_ascii_case("test") => test(plugin, sender, effect),
            _ => Err(CommandError::Usage(TEST_USAGE)),
        },
        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

/// Run a command and report the outcome to the sender.
pub fn handle(plugin: &DamageNumbers, sender: &dyn CommandSender, command: &str, args: &[&str]) {
    match execute(plugin, sender, command, args) {
        Ok(message) => sender.send_message(StyledText::colored(message, NamedColor::Green)),
        Err(e) => {
            if let CommandError::Reload(source) = &e {
                tracing::error!(sender = sender.name(), error = %source, "Reload failed");
            } else {
                tracing::debug!(sender = sender.name(), command, error = %e, "Command rejected");
            }
            sender.send_message(StyledText::colored(e.to_string(), NamedColor::Red));
        }
    }
}

fn reload(plugin: &DamageNumbers, sender: &dyn CommandSender) -> Result<String, CommandError> {
    if !sender.has_permission(RELOAD_PERMISSION) {
        return Err(CommandError::PermissionDenied);
    }

    let warnings = plugin.reload()?;
    tracing::info!(sender = sender.name(), "Configuration reloaded by command");
    if warnings.is_empty() {
        Ok("DamageNumbers configuration reloaded successfully!".to_string())
    } else {
        Ok(format!(
            "DamageNumbers configuration reloaded with {} warning(s), see the server log.",
            warnings.len()
        ))
    }
}

fn test(plugin: &DamageNumbers, sender: &dyn CommandSender, effect: &str) -> Result<String, CommandError> {
    let player = sender.player().ok_or(CommandError::PlayersOnly)?;
    let effect =
        TestEffect::parse(effect).ok_or_else(|| CommandError::UnknownTestEffect(effect.to_string()))?;

    plugin.show_test(&player, effect);
    let message = match effect {
        TestEffect::Hit => "Displayed normal hit damage number.",
        TestEffect::Crit => "Displayed critical hit damage number.",
        TestEffect::Heal => "Displayed heal damage number.",
    };
    Ok(message.to_string())
}
