use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use message_key_sender::config::parse_duration;
use message_key_sender::{
    menu, platform_backend, Config, SharedBackend, SharedConfig, SimulatedBackend, Supervisor,
};

/// Repeatedly types a message into the focused window.
///
/// Activate from the menu, then press F2 in the target window to start typing
/// and F4 to cut the current burst short.
#[derive(Parser, Debug)]
#[command(name = "mks", version, about)]
struct Args {
    /// Message to type
    #[arg(short, long)]
    message: Option<String>,

    /// Type random printable characters instead of the message
    #[arg(short, long)]
    randomize: bool,

    /// Wait after each message (e.g. 100ms, 1s)
    #[arg(long, value_parser = parse_duration)]
    message_delay: Option<std::time::Duration>,

    /// Wait after each key (e.g. 20ms)
    #[arg(long, value_parser = parse_duration)]
    key_delay: Option<std::time::Duration>,

    /// Messages typed per press of F2
    #[arg(short = 'n', long)]
    repetitions: Option<u32>,

    /// Activate immediately instead of waiting for the menu
    #[arg(short, long)]
    activate: bool,

    /// Log keystrokes instead of sending them; F2 is treated as held down
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> Config {
        let defaults = Config::default();
        Config {
            message: self.message.clone().unwrap_or(defaults.message),
            randomize: self.randomize,
            message_delay: self.message_delay.unwrap_or(defaults.message_delay),
            key_delay: self.key_delay.unwrap_or(defaults.key_delay),
            repetitions: self.repetitions.unwrap_or(defaults.repetitions),
        }
    }
}

fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let backend: SharedBackend = if args.dry_run {
        Arc::new(SimulatedBackend::dry_run())
    } else {
        platform_backend().context("failed to initialize keyboard backend")?
    };

    let mut supervisor = Supervisor::new(backend, SharedConfig::new(args.config()));
    println!("{}\n", "A keystroke simulator.".bold());

    if args.activate {
        supervisor.activate().await;
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    menu::run(&mut supervisor, stdin, &mut stdout)
        .await
        .context("menu loop failed")?;

    Ok(())
}
