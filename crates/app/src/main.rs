use clap::Parser;
use engine::Engine;

use crate::{cli::Cli, file_store::FileStore, settings::Settings};

mod cli;
mod commands;
mod error;
mod file_store;
mod settings;
mod views;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli.overrides)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tripsplit={level},engine={level}",
            level = settings.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let store = FileStore::new(&settings.data_dir);
    tracing::debug!(data_dir = %store.dir().display(), "using trip store");
    let mut engine = Engine::builder()
        .store(store)
        .options(settings.engine_options())
        .build()?;

    if let Err(err) = commands::run(&mut engine, cli.command).await {
        tracing::error!("{err}");
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    Ok(())
}
