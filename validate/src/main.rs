use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use damage_numbers_core::config::{self, ConfigWarning};
use damage_numbers_core::host::memory::MemoryHost;
use damage_numbers_core::host::{
    Attacker, DamageEvent, EntityId, EntityKind, EntitySnapshot, HealEvent, Instruction, Location,
    MotionState, Vec3,
};
use damage_numbers_core::logging::init_logging;
use damage_numbers_core::{
    Clock, DamageNumbers, HostBridge, ManualClock, Scheduler, Services, Settings, TickScheduler,
};
use damage_numbers_types::MILLIS_PER_TICK;
use damage_numbers_types::formatting::{format_amount, format_ticks};

#[derive(Parser)]
#[command(version, about = "Check a damage-numbers config and preview its output")]
struct Cli {
    /// Config file; defaults to the per-user config directory.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the config and print every corrected value (default).
    Check,
    /// Write the default config if the file does not exist.
    WriteDefault,
    /// Replay a burst of hits against an in-memory server and print what
    /// each client would receive, tick by tick.
    Simulate {
        #[arg(short = 'n', long, default_value_t = 3)]
        hits: u32,
        /// Time between hits.
        #[arg(short, long, default_value_t = 200)]
        interval_ms: u64,
        #[arg(short, long, default_value_t = 4.0)]
        amount: f64,
        /// Make every hit a critical one.
        #[arg(long)]
        critical: bool,
        /// Replay heals instead of hits.
        #[arg(long)]
        heal: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Some(path) = cli.config.or_else(config::default_config_path) else {
        eprintln!("No config path given and no config directory available");
        return ExitCode::FAILURE;
    };

    let result = match cli.command.unwrap_or(Commands::Check) {
        Commands::Check => check(&path),
        Commands::WriteDefault => write_default(&path),
        Commands::Simulate {
            hits,
            interval_ms,
            amount,
            critical,
            heal,
        } => simulate(&path, hits, interval_ms, amount, critical, heal),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn load(path: &Path) -> Result<(Settings, Vec<ConfigWarning>), config::ConfigError> {
    if path.exists() {
        config::load_validated(path)
    } else {
        println!("{} does not exist, using defaults", path.display());
        Ok(config::validate(Settings::default()))
    }
}

fn check(path: &Path) -> Result<(), config::ConfigError> {
    let (settings, warnings) = load(path)?;

    if warnings.is_empty() {
        println!("{}: OK", path.display());
    } else {
        println!("{}: {} value(s) corrected", path.display(), warnings.len());
        for warning in &warnings {
            println!("  {warning}");
        }
    }

    let stacking = &settings.advanced.stacking;
    println!(
        "  cooldown {}ms, lifetime {}",
        settings.cooldown_ms,
        format_ticks(u64::from(settings.advanced.lifetime.normal))
    );
    if stacking.enabled {
        println!(
            "  stacking: window {}ms, delay {}",
            stacking.window_ms,
            format_ticks(stacking.delay_ticks)
        );
    } else {
        println!("  stacking: off");
    }
    Ok(())
}

fn write_default(path: &Path) -> Result<(), config::ConfigError> {
    if config::write_default(path)? {
        println!("Wrote {}", path.display());
    } else {
        println!("{} already exists, left untouched", path.display());
    }
    Ok(())
}

fn simulate(
    path: &Path,
    hits: u32,
    interval_ms: u64,
    amount: f64,
    critical: bool,
    heal: bool,
) -> Result<(), config::ConfigError> {
    let (settings, _) = load(path)?;

    let host = Arc::new(MemoryHost::new());
    let ticks = Arc::new(TickScheduler::new());
    let clock = Arc::new(ManualClock::new(0));
    let services = Services::new(
        Arc::clone(&host) as Arc<dyn HostBridge>,
        Arc::clone(&ticks) as Arc<dyn Scheduler>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    )
    .with_seed(0);
    let plugin = DamageNumbers::with_settings(path, settings, services);

    let world = host.default_world();
    let position = Vec3::new(0.0, 64.0, 0.0);
    let player = EntitySnapshot {
        id: host.spawn_player(world, position),
        kind: EntityKind::Player,
        location: Location { world, position },
        invisible: false,
    };
    let zombie = EntitySnapshot {
        id: EntityId::random(),
        kind: EntityKind::Other("ZOMBIE".to_string()),
        location: Location {
            world,
            position: position.offset(2.0, 0.0, 0.0),
        },
        invisible: false,
    };
    let motion = if critical {
        MotionState {
            fall_distance: 1.0,
            vertical_velocity: -0.3,
            on_ground: false,
        }
    } else {
        MotionState::default()
    };

    let ticks_between = (interval_ms / MILLIS_PER_TICK).max(1);
    tracing::debug!(hits, interval_ms, ticks_between, heal, "Starting simulation");
    for i in 0..hits {
        if i > 0 {
            for _ in 0..ticks_between {
                step(&ticks, &host);
            }
            clock.advance(interval_ms);
        }

        let outcome = if heal {
            plugin.on_heal(&HealEvent {
                target: player.clone(),
                amount,
            })
        } else {
            plugin.on_damage(&DamageEvent {
                attacker: Some(Attacker {
                    entity: player.clone(),
                    motion,
                }),
                target: zombie.clone(),
                final_damage: amount,
            })
        };
        println!(
            "t={:>5}ms  event {} ({}): {:?}",
            clock.now_ms(),
            i + 1,
            format_amount(amount),
            outcome
        );
        print_sent(&host, ticks.current_tick());
    }

    while ticks.pending_count() > 0 {
        step(&ticks, &host);
    }
    println!("done after {}", format_ticks(ticks.current_tick()));
    Ok(())
}

/// Run one tick and print what it sent.
fn step(ticks: &TickScheduler, host: &MemoryHost) {
    let tick = ticks.current_tick();
    ticks.advance();
    print_sent(host, tick);
}

fn print_sent(host: &MemoryHost, tick: u64) {
    for (_, instruction) in host.take_sent() {
        let detail = match &instruction {
            Instruction::SpawnText {
                entity_id,
                position,
                text,
                ..
            } => format!("#{entity_id} '{}' at {position}", text.plain()),
            Instruction::Teleport {
                entity_id,
                position,
                yaw,
            } => format!("#{entity_id} -> {position} yaw {yaw:.0}"),
            Instruction::Destroy { entity_id } => format!("#{entity_id}"),
            Instruction::Particles {
                particle, count, ..
            } => format!("{particle} x{count}"),
            Instruction::Sound { sound, .. } => sound.clone(),
        };
        println!("  tick {tick:>3}  {:<10} {detail}", instruction.kind());
    }
}
