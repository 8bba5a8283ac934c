use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod app;
mod config;
mod session;
mod world;
mod zone_feed;

use app::App;
use config::{load_config, Overrides};

#[derive(Parser, Debug)]
#[command(name = "mousevr", about = "Closed-loop VR trial controller")]
struct Args {
    /// Session config file (TOML)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Subject identifier
    #[arg(long)]
    subject: Option<String>,

    /// Task variant: alternation or avoidance
    #[arg(long)]
    task: Option<String>,

    /// Total trial budget
    #[arg(long)]
    trials: Option<u32>,

    /// Reward per trial in µL
    #[arg(long)]
    reward_ul: Option<u32>,

    /// Serial device of the reward controller
    #[arg(long, value_name = "PATH")]
    device: Option<String>,

    /// UDP port of the command channel
    #[arg(long)]
    port: Option<u16>,

    /// Log every received command
    #[arg(long)]
    debug: bool,

    /// Don't read zone crossings from stdin
    #[arg(long)]
    no_zone_feed: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let overrides = Overrides {
        subject: args.subject,
        task: args.task,
        trials: args.trials,
        reward_ul: args.reward_ul,
        device: args.device,
        port: args.port,
        debug: args.debug,
    };
    let config = load_config(args.config.as_deref(), &overrides)?;

    let app = App::new(&config, !args.no_zone_feed)?;
    app.run()?;

    Ok(())
}
