//! RuX command line client

use std::io::read_to_string;
use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use rux_session::SessionCache;
use tracing::{info, warn};

use crate::api::Client;
use crate::config::{Config, LogFormat};
use crate::opt::Opt;

mod api;
mod command;
mod config;
mod feed;
mod model;
mod opt;

/// Initializes tracing collection
fn setup_tracing(config: config::Logging) -> Result<()> {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let fmt_layer = match config.format {
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
    };

    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    let filter_layer = config
        .filters
        .into_iter()
        .fold(filter_layer, |layer, filter| layer.add_directive(filter));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let Opt { config, command } = Opt::parse();

    let (config, config_path) = match config {
        Some(mut config_file) => {
            let content = read_to_string(&mut config_file)?;
            let config: Config = toml::from_str(&content)?;
            (config, Some(config_file.path().path().to_path_buf()))
        }
        None => (Config::default(), None),
    };

    setup_tracing(config.logging)?;
    color_eyre::install()?;

    info!(config = ?config_path, api = %config.api.base_url, "Tracing initialized");

    let store = config.session.store.open();
    let session = SessionCache::new(store).with_window(config.session.cache_window);
    let client = Client::new(config.api.base_url, Arc::new(session));
    client.on_session_lost(|event| {
        warn!(path = %event.path, "Session rejected by the server, log in again");
    });

    command::execute(&client, command).await
}
