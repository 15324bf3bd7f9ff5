use std::{env, process};

use anyhow::Result;
use bfx_funding_maker::{config::BotConfig, feed};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut args = env::args().skip(1);
    let (Some(config_path), None) = (args.next(), args.next()) else {
        eprintln!("Usage: bfx-funding-maker <configuration file>");
        process::exit(2);
    };

    let config = BotConfig::from_path(&config_path)?;
    tracing::info!(?config, "starting");
    feed::run(config).await
}
