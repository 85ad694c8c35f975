//! Arena Sim entry point
//!
//! Natively this runs a headless autopilot session, handy for balance checks
//! and for reproducing a seed. The browser build is driven through
//! `platform::web::WebSession` instead.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use anyhow::{Context, Result, bail};
    use clap::{Parser, ValueEnum};

    use arena_sim::platform::init_logging;
    use arena_sim::sim::{GameEvent, GameSession, InputState, KindTag, tick};
    use arena_sim::tuning::WaveMode;
    use arena_sim::{DifficultyPreset, Tuning};

    #[derive(Debug, Clone, Copy, ValueEnum)]
    enum Mode {
        /// Defend the obelisk against a stream of enemies
        Obelisk,
        /// Clear dungeon floors
        Dungeon,
    }

    #[derive(Debug, Parser)]
    #[command(name = "arena-sim", about = "Headless wave-survival simulation")]
    struct Args {
        /// RNG seed
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Difficulty: easy, normal or hard
        #[arg(long, default_value = "normal")]
        preset: String,
        #[arg(long, value_enum, default_value_t = Mode::Obelisk)]
        mode: Mode,
        /// JSON balance sheet; overrides --mode
        #[arg(long)]
        tuning: Option<PathBuf>,
        /// Simulated seconds before giving up
        #[arg(long, default_value_t = 300.0)]
        seconds: f32,
        /// Host frame duration fed to each tick
        #[arg(long, default_value_t = 16.0)]
        frame_ms: f32,
        /// Log level when RUST_LOG is unset
        #[arg(long, default_value_t = log::Level::Info)]
        log_level: log::Level,
    }

    fn load_tuning(args: &Args) -> Result<Tuning> {
        let Some(preset) = DifficultyPreset::parse(&args.preset) else {
            bail!("unknown difficulty preset '{}'", args.preset);
        };
        let base = match &args.tuning {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                Tuning::from_json(&json).with_context(|| format!("parsing {}", path.display()))?
            }
            None => match args.mode {
                Mode::Obelisk => Tuning::obelisk(),
                Mode::Dungeon => Tuning::dungeon(),
            },
        };
        Ok(base.with_preset(preset))
    }

    pub fn run() -> Result<()> {
        let args = Args::parse();
        init_logging(args.log_level);

        if args.frame_ms.is_nan() || args.frame_ms <= 0.0 {
            bail!("--frame-ms must be positive");
        }
        let tuning = load_tuning(&args)?;
        let mut session = GameSession::new(args.seed, tuning).context("building session")?;
        let floors = session.tuning().mode == WaveMode::Floors;
        if floors {
            // Autopilot takes the first offer
            if let Some(&pick) = session.offer_weapons(false, 3).first() {
                session.select_weapon(pick, false)?;
            }
        }
        session.start();

        let input = InputState {
            autopilot: true,
            ..Default::default()
        };
        let frames = (args.seconds * 1000.0 / args.frame_ms).ceil() as u64;
        let mut kills = 0u32;
        let mut bosses = 0u32;

        'frames: for _ in 0..frames {
            for event in tick(&mut session, &input, args.frame_ms) {
                match event {
                    GameEvent::Died {
                        kind: KindTag::Enemy,
                        ..
                    } => kills += 1,
                    GameEvent::BossDefeated { .. } if floors => {
                        bosses += 1;
                        if let Some(&pick) = session.offer_weapons(true, 3).first() {
                            log::info!("Boss reward: {}", pick.name());
                            session.select_weapon(pick, true)?;
                        }
                    }
                    GameEvent::BossDefeated { .. } | GameEvent::LeveledUp { .. } => {
                        let legendary = matches!(event, GameEvent::BossDefeated { .. });
                        if legendary {
                            bosses += 1;
                        }
                        if let Some(&upgrade) = session.offer_upgrades(legendary, 3).first() {
                            log::info!("{}: {}", upgrade.name(), upgrade.description());
                            session.apply_upgrade(upgrade)?;
                        }
                    }
                    _ if event.is_game_over() => break 'frames,
                    _ => {}
                }
            }
        }

        let progression = session.progression();
        match session.outcome() {
            Some(outcome) => log::info!(
                "{} after {} ticks: level {}, floor {}",
                if outcome.win { "Won" } else { "Lost" },
                session.tick_count(),
                outcome.final_level,
                outcome.floor
            ),
            None => log::info!(
                "Still alive after {}s: level {}, floor {}",
                args.seconds,
                progression.level,
                progression.floor
            ),
        }
        log::info!("{} enemies killed, {} bosses defeated", kills, bosses);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is WebSession, this is just to satisfy the compiler
}
