use std::env;

use anyhow::{Context, bail};
use log::info;
use server::ServerConfig;
use tokio::task;
use trainer::{Pipeline, TrainingConfig};

const USAGE: &str = "usage: ev-energy <train|serve>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mode = env::args().nth(1);
    match mode.as_deref() {
        Some("train") => train().await,
        Some("serve") => serve().await,
        Some(other) => bail!("unknown mode {other:?}, {USAGE}"),
        None => bail!(USAGE),
    }
}

async fn train() -> anyhow::Result<()> {
    let config = TrainingConfig::from_env().context("invalid training configuration")?;
    let pipeline = Pipeline::new(config);

    let report = task::spawn_blocking(move || pipeline.run())
        .await?
        .context("training failed")?;

    info!("training finished, selected {}", report.selected);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn serve() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("invalid server configuration")?;
    server::run(config).await.context("server stopped unexpectedly")
}
