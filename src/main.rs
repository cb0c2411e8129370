use std::{path::PathBuf, time::Instant};

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sol_colony::{
    config::ConfigLoader,
    session::Session,
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Sol colony simulation runner")]
struct Cli {
    /// Path to the colony YAML file
    #[arg(long, default_value = "scenarios/red_plains.yaml")]
    config: PathBuf,

    /// Override tick count for a headless run
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the master seed
    #[arg(long)]
    seed: Option<u64>,

    /// Serve the colony over HTTP instead of running headless
    #[arg(long)]
    serve: bool,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Never contact the narrative service
    #[arg(long)]
    offline: bool,

    /// Disable the auto-builder and the narrative service
    #[arg(long)]
    no_ai: bool,

    /// Turn the auto-builder on from the first tick
    #[arg(long)]
    auto_build: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ConfigLoader::new(".");
    let mut config = loader.load(&cli.config)?;
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if cli.no_ai {
        config.ai_enabled = false;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if cli.serve {
        return web::run(WebServerConfig {
            config,
            offline: cli.offline,
            host: cli.host,
            port: cli.port,
        })
        .await;
    }

    let ticks = config.ticks(cli.ticks);
    let mut session = Session::from_config(config, cli.offline)?;
    session.set_auto_build(cli.auto_build);
    for _ in 0..ticks {
        let summary = session.tick(Instant::now())?;
        if summary.death_toll > 0 || summary.goal_completed {
            info!(
                day = summary.day,
                deaths = summary.death_toll,
                goal_completed = summary.goal_completed,
                "notable sol"
            );
        }
        // let spawned narrative requests make progress between ticks
        tokio::task::yield_now().await;
    }
    session.stop();

    let stats = session.world().stats();
    println!(
        "Colony '{}' ran for {} sols. Population {}, treasury {}, science {}, buildings {}.",
        session.config().name,
        stats.day,
        stats.population,
        stats.money,
        stats.science,
        session.world().ledger().buildings
    );
    Ok(())
}
