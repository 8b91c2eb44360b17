//! Command-line interface parsing for the admin binary
//!
//! This module handles parsing of CLI arguments using clap: global connection
//! flags, one subcommand per client operation, and the cache maintenance
//! commands (`cache clear`, `cache sweep`).

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::client::Filter;
use crate::config::{ClientConfig, ConfigError};

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// A `--set` argument was not of the form `name=value`
    #[error("Invalid field assignment: '{0}'. Expected name=value")]
    InvalidField(String),

    /// No cache directory was given and none could be derived
    #[error("Could not determine a cache directory; pass --cache-dir")]
    NoCacheDir,
}

/// Wildberries API client with a persistent response cache
#[derive(Parser, Debug)]
#[command(name = "wbclient")]
#[command(about = "Query the Wildberries API and manage the response cache")]
#[command(version)]
pub struct Cli {
    /// TOML config file with base_url, token, timeout, max_retries, retry_delay
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// API base URL
    #[arg(long, global = true, env = "WB_API_URL")]
    pub base_url: Option<String>,

    /// API token
    #[arg(long, global = true, env = "WB_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Directory for cached responses (defaults to the XDG cache directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(flatten)]
    Api(ApiCommand),
    /// Cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

/// Subcommands that call the API
#[derive(Subcommand, Debug)]
pub enum ApiCommand {
    /// Check that the token is accepted
    Auth {
        #[arg(long)]
        force_refresh: bool,
    },
    /// List products
    Products {
        #[command(flatten)]
        listing: ListingArgs,
        #[arg(long)]
        force_refresh: bool,
    },
    /// Show one product
    Product {
        id: String,
        #[arg(long)]
        force_refresh: bool,
    },
    /// Show the commission for a product
    Commission {
        id: String,
        #[arg(long)]
        force_refresh: bool,
    },
    /// Partially update a product
    ///
    /// Example: wbclient update-product 12345 --set price=1099 --set name='"New name"'
    UpdateProduct {
        id: String,
        /// Field assignment; values are parsed as JSON, falling back to a string
        #[arg(long = "set", value_name = "NAME=VALUE", required = true, value_parser = parse_field)]
        fields: Vec<(String, Value)>,
    },
    /// List orders
    Orders {
        #[command(flatten)]
        listing: ListingArgs,
        #[arg(long)]
        force_refresh: bool,
    },
    /// Show the category tree
    Categories {
        #[arg(long)]
        parent_id: Option<i64>,
        #[arg(long)]
        depth: Option<u32>,
        #[arg(long)]
        force_refresh: bool,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum CacheCommand {
    /// Delete expired entries, or everything with --all
    Clear {
        #[arg(long)]
        all: bool,
    },
    /// Keep deleting expired entries on an interval until interrupted
    Sweep {
        /// Interval between sweeps, e.g. 30m, 24h
        #[arg(long, default_value = "24h", value_parser = humantime::parse_duration)]
        every: Duration,
    },
}

/// Filters shared by the product and order listings
#[derive(Args, Debug, Default)]
pub struct ListingArgs {
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub limit: Option<u32>,
    #[arg(long)]
    pub date_from: Option<String>,
    #[arg(long)]
    pub date_to: Option<String>,
}

impl ListingArgs {
    pub fn to_filter(&self) -> Filter {
        let mut filter = Filter::new();
        if let Some(status) = &self.status {
            filter.insert("status", status.clone());
        }
        if let Some(limit) = self.limit {
            filter.insert("limit", limit);
        }
        if let Some(date_from) = &self.date_from {
            filter.insert("date_from", date_from.clone());
        }
        if let Some(date_to) = &self.date_to {
            filter.insert("date_to", date_to.clone());
        }
        filter
    }
}

/// Parses `name=value`, reading the value as JSON when possible
pub fn parse_field(s: &str) -> Result<(String, Value), CliError> {
    let (name, raw) = s
        .split_once('=')
        .filter(|(name, _)| !name.trim().is_empty())
        .ok_or_else(|| CliError::InvalidField(s.to_string()))?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.trim().to_string(), value))
}

/// Collects `--set` pairs into an update body
pub fn fields_to_map(fields: &[(String, Value)]) -> Map<String, Value> {
    fields.iter().cloned().collect()
}

impl Cli {
    /// Resolves the client configuration: file, then environment, then flags
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)?,
            None => ClientConfig::default(),
        }
        .apply_env();
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(token) = &self.token {
            config.token = token.clone();
        }
        Ok(config)
    }
}
