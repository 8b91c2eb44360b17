//! Integration tests for the wbclient binary
//!
//! Exercises argument handling and the cache commands, which need no network.

use std::process::Command;

use serde_json::json;
use tempfile::TempDir;

use wb_client::cache::{CacheKey, CacheStore, FileCacheStore};

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_wbclient"))
        .args(args)
        .env_remove("WB_API_TOKEN")
        .env_remove("WB_API_URL")
        .output()
        .expect("Failed to execute wbclient")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("wbclient"), "Help should mention wbclient");
    assert!(stdout.contains("products"), "Help should list the products command");
    assert!(stdout.contains("cache"), "Help should list the cache command");
}

#[test]
fn test_invalid_field_assignment_is_rejected() {
    let output = run_cli(&["update-product", "12345", "--set", "novalue"]);
    assert!(!output.status.success(), "Expected invalid --set to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid field assignment"),
        "Should explain the expected form: {}",
        stderr
    );
}

#[test]
fn test_missing_token_fails_before_any_request() {
    let dir = TempDir::new().unwrap();
    let output = run_cli(&[
        "--cache-dir",
        dir.path().to_str().unwrap(),
        "--base-url",
        "http://127.0.0.1:9",
        "auth",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("API token is not configured"), "stderr: {}", stderr);
}

#[test]
fn test_cache_clear_removes_only_expired_entries() {
    let dir = TempDir::new().unwrap();
    let store = FileCacheStore::with_dir(dir.path().to_path_buf());
    let past = chrono::Utc::now() - chrono::Duration::seconds(120);
    store
        .set_at(&CacheKey::new("get_orders", None), &json!({"success": true}), 60, past)
        .unwrap();
    store
        .set(&CacheKey::new("get_categories", None), &json!({"success": true}), 3600)
        .unwrap();

    let output = run_cli(&["cache", "clear", "--cache-dir", dir.path().to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Entries removed: 1"), "stdout: {}", stdout);
    assert_eq!(store.len().unwrap(), 1);

    let output = run_cli(&["cache", "clear", "--all", "--cache-dir", dir.path().to_str().unwrap()]);
    assert!(output.status.success());
    assert!(store.is_empty().unwrap());
}

#[cfg(test)]
mod unit_tests {
    //! Parsing checks that don't require running the binary

    use clap::Parser;
    use wb_client::cli::{ApiCommand, Cli, Command};

    #[test]
    fn test_categories_filters() {
        let cli = Cli::parse_from(["wbclient", "categories", "--parent-id", "5", "--depth", "2"]);
        match cli.command {
            Command::Api(ApiCommand::Categories { parent_id, depth, force_refresh }) => {
                assert_eq!(parent_id, Some(5));
                assert_eq!(depth, Some(2));
                assert!(!force_refresh);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["wbclient", "orders", "--cache-dir", "/tmp/wb", "--limit", "5"]);
        assert_eq!(cli.cache_dir.as_deref(), Some(std::path::Path::new("/tmp/wb")));
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["wbclient", "refunds"]).is_err());
    }
}
