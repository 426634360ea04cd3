//! Headless arena runner.
//!
//! Runs the simulation without graphics, driven by a built-in input script.
//!
//! # Usage
//!
//! ```bash
//! # Run 300 idle ticks and print a summary
//! cargo run -p retro_headless -- run --ticks 300
//!
//! # Strafe and fire with a custom tuning file, then draw the arena
//! cargo run -p retro_headless -- run --ticks 900 --config tuning.ron --script strafe --fire-every 15 --ascii
//!
//! # Print the default tuning as RON
//! cargo run -p retro_headless -- config --dump
//! ```
//!
//! Summaries and snapshots go to stdout; logs go to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use retro_core::config::SimConfig;
use retro_headless::{
    ascii_visualizer::{render_ascii, AsciiConfig},
    runner::{verify_determinism, HeadlessRunner, RunConfig},
    script::{Script, ScriptedInput},
};

#[derive(Parser)]
#[command(name = "retro_headless")]
#[command(about = "Headless arena runner for scripted sessions and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single scripted session
    Run {
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "600")]
        ticks: u64,

        /// RON tuning file (defaults apply to omitted fields)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the RNG seed
        #[arg(long)]
        seed: Option<u32>,

        /// Movement script for the player
        #[arg(long, value_enum, default_value_t = Script::Idle)]
        script: Script,

        /// Fire every K ticks
        #[arg(long)]
        fire_every: Option<u64>,

        /// Draw the final arena as ASCII
        #[arg(long)]
        ascii: bool,

        /// Disable colored ASCII output
        #[arg(long)]
        no_color: bool,

        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify determinism by running the same session several times
    Verify {
        /// Number of ticks per run
        #[arg(short, long, default_value = "1000")]
        ticks: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "3")]
        runs: u32,

        /// Movement script for the player
        #[arg(long, value_enum, default_value_t = Script::Circle)]
        script: Script,

        /// Fire every K ticks
        #[arg(long, default_value = "20")]
        fire_every: u64,
    },

    /// Inspect tuning configuration
    Config {
        /// Print the default configuration as RON
        #[arg(long)]
        dump: bool,

        /// Validate a RON tuning file
        #[arg(long)]
        check: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries summaries and snapshots.
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            ticks,
            config,
            seed,
            script,
            fire_every,
            ascii,
            no_color,
            json,
        } => {
            let sim = load_config(config, seed);
            let run = RunConfig {
                sim,
                ticks,
                input: ScriptedInput { script, fire_every },
            };
            cmd_run(run, ascii, !no_color, json);
        }
        Commands::Verify {
            ticks,
            runs,
            script,
            fire_every,
        } => {
            let run = RunConfig {
                sim: SimConfig::default(),
                ticks,
                input: ScriptedInput {
                    script,
                    fire_every: Some(fire_every),
                },
            };
            cmd_verify(&run, runs);
        }
        Commands::Config { dump, check } => {
            cmd_config(dump, check);
        }
    }
}

/// Load tuning from a file or defaults, exiting on failure.
fn load_config(path: Option<PathBuf>, seed: Option<u32>) -> SimConfig {
    let mut config = match path {
        Some(path) => match SimConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {e}");
                std::process::exit(1);
            }
        },
        None => SimConfig::default(),
    };
    if let Some(seed) = seed {
        config.seed = seed;
    }
    config
}

/// Run one session and print the results.
fn cmd_run(run: RunConfig, ascii: bool, color: bool, json: bool) {
    let mut runner = match HeadlessRunner::new(run) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Failed to start session: {e}");
            std::process::exit(1);
        }
    };

    let summary = runner.run();

    if ascii {
        let config = AsciiConfig {
            use_color: color,
            ..AsciiConfig::default()
        };
        print!("{}", render_ascii(&runner.snapshot(), &config));
    }

    if json {
        match runner.snapshot_json() {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
    }

    println!("=== Run Summary ===");
    println!("Tick:            {}", summary.tick);
    match summary.player_health {
        Some(health) => println!("Player health:   {health}"),
        None => println!("Player health:   destroyed"),
    }
    println!("Enemies alive:   {}", summary.enemies_alive);
    println!("Shots fired:     {}", summary.shots_fired);
    println!("Hits:            {}", summary.hits);
    println!("Units destroyed: {}", summary.units_destroyed);
    println!("Fireballs:       {}", summary.projectiles);
    println!("Particles:       {}", summary.particles);
    println!(
        "Motion events:   {} moves, {} stops",
        summary.motion.moves, summary.motion.stops
    );
    println!("State hash:      {:016x}", summary.state_hash);
}

/// Verify determinism across repeated runs.
fn cmd_verify(run: &RunConfig, runs: u32) {
    tracing::info!(
        "Verifying determinism: {} ticks, {} runs",
        run.ticks,
        runs
    );

    match verify_determinism(run, runs) {
        Ok(true) => eprintln!("PASS: All {runs} runs produced identical results"),
        Ok(false) => {
            eprintln!("FAIL: Non-determinism detected!");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to start session: {e}");
            std::process::exit(1);
        }
    }
}

/// Print or validate tuning configuration.
fn cmd_config(dump: bool, check: Option<PathBuf>) {
    if let Some(path) = check {
        match SimConfig::load(&path) {
            Ok(_) => eprintln!("OK: {} is a valid configuration", path.display()),
            Err(e) => {
                eprintln!("Invalid configuration: {e}");
                std::process::exit(1);
            }
        }
    }

    if dump {
        match SimConfig::default().to_ron_string() {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
    }
}
