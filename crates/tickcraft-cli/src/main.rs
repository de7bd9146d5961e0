//! Tickcraft headless driver.
//!
//! Creates, inspects, edits and advances a JSON save file.

mod report;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tickcraft_core::action::Action;
use tickcraft_core::robot::{Robot, RobotId, Rule};
use tickcraft_core::serialize;
use tickcraft_core::state::State;
use tickcraft_data::GameConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tickcraft")]
#[command(about = "Tick-driven production simulation")]
struct Cli {
    /// Path to the save file
    #[arg(short, long, default_value = "tickcraft.json")]
    save: PathBuf,

    /// Game config (.ron, .toml or .json); the stock game if omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace). RUST_LOG overrides this.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new game at tick zero
    New {
        /// Overwrite an existing save
        #[arg(long)]
        force: bool,
    },

    /// Print the inventory, queue and robots
    Show,

    /// Advance a fixed number of ticks
    Run {
        #[arg(short, long)]
        ticks: u64,

        /// Start over if the save cannot be loaded
        #[arg(long)]
        reset_on_invalid: bool,

        /// Print every completed action
        #[arg(long)]
        events: bool,
    },

    /// Advance in real time for a while
    Play {
        #[arg(long, default_value = "1.0")]
        seconds: f64,

        /// Use the fast tick interval
        #[arg(long)]
        fast: bool,
    },

    /// Append an action to the queue
    Enqueue {
        kind: ActionKindArg,

        /// Item name, e.g. Coal or IronPlate
        item: String,

        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },

    /// Remove the queue entry at INDEX (0 is the head)
    Dequeue { index: usize },

    /// Manage robots
    Robot {
        #[command(subcommand)]
        command: RobotCommands,
    },
}

#[derive(Subcommand)]
enum RobotCommands {
    /// Build a robot from a Robot item in the inventory
    Add {
        name: String,

        /// A rule such as "Coal < 10 => Mine Coal (5)"; checked in order
        #[arg(short, long = "rule")]
        rules: Vec<String>,
    },

    /// Rename a robot or replace its rules; its running action is kept
    Edit {
        id: u32,

        #[arg(long)]
        name: Option<String>,

        /// Replaces the whole rule list when given
        #[arg(short, long = "rule")]
        rules: Vec<String>,
    },

    /// Scrap a robot, returning its Robot item to the inventory
    Remove { id: u32 },
}

#[derive(Clone, Copy, ValueEnum)]
enum ActionKindArg {
    Mine,
    Craft,
    Smelt,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => tickcraft_data::load_config(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GameConfig::default(),
    };

    match cli.command {
        Commands::New { force } => {
            if cli.save.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    cli.save.display()
                );
            }
            let state = config.initial_state();
            save(&cli.save, &state)?;
            println!("New game written to {}", cli.save.display());
        }

        Commands::Show => {
            let state = load(&cli.save)?;
            print!("{}", report::describe(&state));
        }

        Commands::Run {
            ticks,
            reset_on_invalid,
            events,
        } => {
            let state = match load(&cli.save) {
                Ok(state) => state,
                Err(e) if reset_on_invalid => {
                    warn!(error = %e, "Save unreadable, starting over");
                    config.initial_state()
                }
                Err(e) => return Err(e.context("use --reset-on-invalid to start over")),
            };
            let mut engine = config.engine(state)?;
            let result = engine.run(ticks);
            // Ticks before a failure are committed, so keep them.
            save(&cli.save, engine.state())?;
            let result = result?;
            if events {
                for line in result.reports.iter().flat_map(report::completions) {
                    println!("{line}");
                }
            }
            println!(
                "Ran {} ticks, now at tick {}",
                result.steps_run,
                engine.state().tick()
            );
        }

        Commands::Play { seconds, fast } => {
            let mut engine = config.engine(load(&cli.save)?)?;
            engine.set_fast(fast);
            let deadline = Instant::now() + Duration::from_secs_f64(seconds.max(0.0));
            let mut last = Instant::now();
            let mut steps = 0;
            while Instant::now() < deadline {
                std::thread::sleep(engine.interval());
                let now = Instant::now();
                let result = engine.advance(now - last);
                last = now;
                match result {
                    Ok(r) => steps += r.steps_run,
                    Err(e) => {
                        save(&cli.save, engine.state())?;
                        return Err(e.into());
                    }
                }
            }
            save(&cli.save, engine.state())?;
            println!("Played {steps} ticks, now at tick {}", engine.state().tick());
        }

        Commands::Enqueue { kind, item, count } => {
            let mut state = load(&cli.save)?;
            let action = build_action(kind, &item, count)?;
            state.enqueue(action)?;
            save(&cli.save, &state)?;
            print!("{}", report::describe_queue(&state));
        }

        Commands::Dequeue { index } => {
            let mut state = load(&cli.save)?;
            let removed = state.dequeue_at(index)?;
            save(&cli.save, &state)?;
            println!("Removed {removed}");
        }

        Commands::Robot { command } => {
            let mut state = load(&cli.save)?;
            match command {
                RobotCommands::Add { name, rules } => {
                    let id = state.add_robot(name, parse_rules(&rules)?)?;
                    println!("Added robot {id}");
                }
                RobotCommands::Edit { id, name, rules } => {
                    let id = RobotId(id);
                    let current = state
                        .robot(id)
                        .with_context(|| format!("no robot {id}"))?;
                    let mut edited = Robot::new(
                        id,
                        name.unwrap_or_else(|| current.name.clone()),
                        current.algorithm.clone(),
                    );
                    if !rules.is_empty() {
                        edited.algorithm = parse_rules(&rules)?;
                    }
                    state.add_or_update_robot(edited)?;
                    println!("Updated robot {id}");
                }
                RobotCommands::Remove { id } => {
                    let robot = state.remove_robot(RobotId(id))?;
                    println!("Removed robot {} ({})", robot.id, robot.name);
                }
            }
            save(&cli.save, &state)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: &Path) -> Result<State> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading {} (run `tickcraft new` first?)", path.display()))?;
    serialize::from_json(&json).with_context(|| format!("loading {}", path.display()))
}

fn save(path: &Path, state: &State) -> Result<()> {
    let json = serialize::to_json(state)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(file = %path.display(), tick = state.tick(), "Saved");
    Ok(())
}

fn build_action(kind: ActionKindArg, item: &str, count: u32) -> Result<Action> {
    Ok(match kind {
        ActionKindArg::Mine => Action::mine(item.parse()?, count),
        ActionKindArg::Craft => {
            if count != 1 {
                bail!("crafts make one item at a time; enqueue {count} crafts instead");
            }
            Action::craft(item.parse()?)
        }
        ActionKindArg::Smelt => Action::smelt(item.parse()?, count),
    })
}

fn parse_rules(rules: &[String]) -> Result<Vec<Rule>> {
    rules
        .iter()
        .map(|text| {
            text.parse::<Rule>()
                .with_context(|| format!("bad rule '{text}'"))
        })
        .collect()
}
