//! wbclient - query the Wildberries API and maintain the response cache
//!
//! Each API subcommand prints the resulting envelope as JSON and exits
//! non-zero when the call failed. `cache clear` and `cache sweep` are the
//! administrative entry points for purging stored responses.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wb_client::cache::{CacheStore, FileCacheStore};
use wb_client::cli::{fields_to_map, ApiCommand, CacheCommand, Cli, CliError, Command};
use wb_client::client::{Filter, WbClient};
use wb_client::envelope::Envelope;
use wb_client::sweep::{sweep_once, SweepConfig, SweepHandle, SweepMessage};

/// Installs a stderr subscriber honouring `RUST_LOG` (default `info`)
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(cli: &Cli) -> Result<FileCacheStore, CliError> {
    match &cli.cache_dir {
        Some(dir) => Ok(FileCacheStore::with_dir(dir.clone())),
        None => FileCacheStore::new().ok_or(CliError::NoCacheDir),
    }
}

async fn run_cache(action: &CacheCommand, store: Arc<dyn CacheStore>) -> anyhow::Result<ExitCode> {
    match action {
        CacheCommand::Clear { all: true } => {
            let count = store.clear_all().context("clearing cache")?;
            println!("Cleared entire cache. Entries removed: {}", count);
        }
        CacheCommand::Clear { all: false } => match sweep_once(store.as_ref()) {
            SweepMessage::Swept(count) => {
                println!("Cleared expired cache. Entries removed: {}", count)
            }
            SweepMessage::Failed(e) => anyhow::bail!("clearing expired cache: {}", e),
        },
        CacheCommand::Sweep { every } => {
            let mut handle = SweepHandle::spawn(
                store,
                SweepConfig {
                    interval: *every,
                    sweep_on_start: true,
                },
            );
            loop {
                tokio::select! {
                    message = handle.receiver.recv() => match message {
                        Some(SweepMessage::Swept(count)) => println!("Entries removed: {}", count),
                        Some(SweepMessage::Failed(e)) => eprintln!("Sweep failed: {}", e),
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            handle.shutdown().await;
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_api(client: &WbClient, command: &ApiCommand) -> Envelope {
    match command {
        ApiCommand::Auth { force_refresh } => client.check_auth(*force_refresh).await,
        ApiCommand::Products { listing, force_refresh } => {
            client.get_products(Some(&listing.to_filter()), *force_refresh).await
        }
        ApiCommand::Product { id, force_refresh } => client.get_product(id, *force_refresh).await,
        ApiCommand::Commission { id, force_refresh } => {
            client.get_commission(id, *force_refresh).await
        }
        ApiCommand::UpdateProduct { id, fields } => {
            client.update_product(id, &fields_to_map(fields)).await
        }
        ApiCommand::Orders { listing, force_refresh } => {
            client.get_orders(Some(&listing.to_filter()), *force_refresh).await
        }
        ApiCommand::Categories {
            parent_id,
            depth,
            force_refresh,
        } => {
            let mut filter = Filter::new();
            if let Some(parent_id) = parent_id {
                filter.insert("parent_id", *parent_id);
            }
            if let Some(depth) = depth {
                filter.insert("depth", *depth);
            }
            client.get_categories(Some(&filter), *force_refresh).await
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let store: Arc<dyn CacheStore> = Arc::new(open_store(&cli)?);

    let command = match &cli.command {
        Command::Cache { action } => return run_cache(action, store).await,
        Command::Api(command) => command,
    };

    let config = cli.client_config()?;
    let client = WbClient::new(config, store)?;
    let envelope = run_api(&client, command).await;

    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(if envelope.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
