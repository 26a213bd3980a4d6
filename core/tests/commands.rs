mod common;

use common::{Server, TestSender, hit};

use damage_numbers_core::commands::{self, CommandError, RELOAD_PERMISSION, TEST_USAGE};
use damage_numbers_core::format::NamedColor;
use damage_numbers_core::host::{MotionState, Vec3};
use damage_numbers_core::{ConfigError, DispatchOutcome};

#[test]
fn reload_requires_permission() {
    let server = Server::start("");
    let player = server.player_at(Vec3::default());
    let sender = TestSender::player(server.snapshot(&player), &[]);

    let result = commands::execute(&server.plugin, &sender, "dnreload", &[]);
    assert!(matches!(result, Err(CommandError::PermissionDenied)));

    commands::handle(&server.plugin, &sender, "dnreload", &[]);
    let message = sender.last_message().unwrap();
    assert_eq!(message.plain(), "You don't have permission to use this command.");
    assert_eq!(message.runs[0].color, NamedColor::Red);
}

#[test]
fn reload_picks_up_the_new_file() {
    let server = Server::start("cooldown-ms = 50");
    assert_eq!(server.plugin.settings().cooldown_ms, 50);

    server.config.rewrite("cooldown-ms = 250");
    let sender = TestSender::console();
    commands::handle(&server.plugin, &sender, "dnreload", &[]);

    assert_eq!(server.plugin.settings().cooldown_ms, 250);
    let message = sender.last_message().unwrap();
    assert_eq!(message.plain(), "DamageNumbers configuration reloaded successfully!");
    assert_eq!(message.runs[0].color, NamedColor::Green);
}

#[test]
fn reload_reports_warnings_count() {
    let server = Server::start("");
    server.config.rewrite(
        r#"
[formats]
normal = "no placeholder"
"#,
    );

    let message = commands::execute(&server.plugin, &TestSender::console(), "dnreload", &[]).unwrap();
    assert!(message.contains("1 warning(s)"), "{message}");
}

#[test]
fn failed_reload_keeps_the_running_config() {
    let server = Server::start("cooldown-ms = 70");
    server.config.rewrite("cooldown-ms = [not toml");

    let result = commands::execute(&server.plugin, &TestSender::console(), "dnreload", &[]);
    assert!(matches!(result, Err(CommandError::Reload(ConfigError::Parse { .. }))));
    assert_eq!(server.plugin.settings().cooldown_ms, 70);
}

#[test]
fn reload_drops_pending_stacks() {
    let server = Server::start(
        r#"
cooldown-ms = 0

[advanced.stacking]
enabled = true
window-ms = 500
delay-ticks = 10
"#,
    );
    let player = server.player_at(Vec3::default());
    let zombie = server.mob_at("ZOMBIE", Vec3::default());

    let outcome = server.plugin.on_damage(&hit(&player, &zombie, 5.0, MotionState::default()));
    assert!(matches!(outcome, DispatchOutcome::Stacked { .. }));

    server.plugin.reload().unwrap();
    server.ticks.run_until_idle(100);
    assert!(server.holograms().is_empty());

    // the fresh runtime stacks again from zero
    let outcome = server.plugin.on_damage(&hit(&player, &zombie, 2.0, MotionState::default()));
    assert_eq!(
        outcome,
        DispatchOutcome::Stacked {
            accumulated: 2.0,
            started: true
        }
    );
}

#[test]
fn test_command_is_seen_only_by_the_sender() {
    let server = Server::start(
        r#"
[display]
visibility = "everyone"
"#,
    );
    let caller = server.player_at(Vec3::default());
    let bystander = server.player_at(Vec3::new(1.0, 0.0, 0.0));
    let sender = TestSender::player(server.snapshot(&caller), &[]);

    for (effect, expected) in [("hit", "5"), ("CRIT", "10 ✧"), ("heal", "+5 ❤")] {
        let message = commands::execute(&server.plugin, &sender, "damagenumbers", &["test", effect]).unwrap();
        assert!(message.starts_with("Displayed"));
        assert_eq!(server.holograms().last().unwrap(), &(caller.id, expected.to_string()));
    }
    assert!(server.host.sent_to(bystander.id).is_empty());
}

#[test]
fn test_command_needs_a_player() {
    let server = Server::start("");
    let result = commands::execute(&server.plugin, &TestSender::console(), "damagenumbers", &["test", "hit"]);
    assert!(matches!(result, Err(CommandError::PlayersOnly)));
}

#[test]
fn test_command_usage_errors() {
    let server = Server::start("");
    let player = server.player_at(Vec3::default());
    let sender = TestSender::player(server.snapshot(&player), &[RELOAD_PERMISSION]);

    let result = commands::execute(&server.plugin, &sender, "damagenumbers", &["test"]);
    assert!(matches!(result, Err(CommandError::Usage(TEST_USAGE))));

    let result = commands::execute(&server.plugin, &sender, "damagenumbers", &["test", "boom"]);
    match result {
        Err(e @ CommandError::UnknownTestEffect(_)) => {
            assert_eq!(e.to_string(), "Invalid type 'boom'. Use: hit, crit, or heal.");
        }
        other => panic!("expected unknown effect, got {other:?}"),
    }

    let result = commands::execute(&server.plugin, &sender, "frobnicate", &[]);
    assert!(matches!(result, Err(CommandError::UnknownCommand(_))));
    assert!(server.host.sent().is_empty());
}
