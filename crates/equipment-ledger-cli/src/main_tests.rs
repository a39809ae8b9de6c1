// equipment-ledger-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Tests
// Description: Argument parsing, bounded reads, and offline command execution.
// Purpose: Ensure offline commands share the API handler's behavior.
// Dependencies: equipment-ledger-cli main helpers, tempfile
// ============================================================================

//! ## Overview
//! Parses representative command lines and drives offline commands against a
//! temporary `SQLite` store.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use equipment_ledger_config::EquipmentLedgerConfig;
use equipment_ledger_config::StoreType;
use equipment_ledger_server::ApiResponse;
use tempfile::TempDir;

use super::Cli;
use super::Commands;
use super::ConfigCommand;
use super::IngestCommand;
use super::OfflineCommand;
use super::ReadLimitError;
use super::execute_offline;
use super::read_bytes_with_limit;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn sqlite_config(temp: &TempDir) -> EquipmentLedgerConfig {
    let mut config = EquipmentLedgerConfig::default();
    config.store.store_type = StoreType::Sqlite;
    config.store.path = Some(temp.path().join("ledger.db"));
    config.audit.enabled = false;
    config
}

fn write_csv(temp: &TempDir, name: &str, rows: &[&str]) -> PathBuf {
    let mut body = String::from("Equipment Name,Type,Flowrate,Pressure,Temperature\n");
    for row in rows {
        body.push_str(row);
        body.push('\n');
    }
    let path = temp.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

fn ingest(file: PathBuf, confirm: bool, owner: Option<&str>) -> OfflineCommand {
    OfflineCommand::Ingest(IngestCommand {
        file,
        confirm,
        owner: owner.map(str::to_string),
    })
}

fn json_of(response: &ApiResponse) -> &serde_json::Value {
    response.json().expect("json response")
}

// ============================================================================
// SECTION: Parsing Tests
// ============================================================================

#[test]
fn ingest_arguments_parse() {
    let cli = Cli::try_parse_from([
        "equipment-ledger",
        "--config",
        "ledger.toml",
        "ingest",
        "plant.csv",
        "--confirm",
        "--owner",
        "operator-4",
    ])
    .unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("ledger.toml")));
    let Commands::Ingest(command) = cli.command else {
        panic!("expected ingest command");
    };
    assert_eq!(command.file, PathBuf::from("plant.csv"));
    assert!(command.confirm);
    assert_eq!(command.owner.as_deref(), Some("operator-4"));
}

#[test]
fn global_config_flag_is_accepted_after_subcommand() {
    let cli = Cli::try_parse_from(["equipment-ledger", "history", "--config", "x.toml"]).unwrap();
    assert!(matches!(cli.command, Commands::History));
    assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
}

#[test]
fn config_check_parses() {
    let cli = Cli::try_parse_from(["equipment-ledger", "config", "check"]).unwrap();
    assert!(matches!(cli.command, Commands::Config {
        command: ConfigCommand::Check
    }));
}

#[test]
fn missing_subcommand_is_an_error() {
    assert!(Cli::try_parse_from(["equipment-ledger"]).is_err());
    assert!(Cli::try_parse_from(["equipment-ledger", "show"]).is_err());
}

// ============================================================================
// SECTION: Read Limit Tests
// ============================================================================

#[test]
fn read_bytes_with_limit_allows_small_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("small.bin");
    fs::write(&path, b"ok").unwrap();
    assert_eq!(read_bytes_with_limit(&path, 2).unwrap(), b"ok");
}

#[test]
fn read_bytes_with_limit_rejects_large_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("large.bin");
    fs::write(&path, b"toolarge").unwrap();
    match read_bytes_with_limit(&path, 4) {
        Err(ReadLimitError::TooLarge {
            size,
            limit,
        }) => {
            assert_eq!(size, 8);
            assert_eq!(limit, 4);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

// ============================================================================
// SECTION: Offline Command Tests
// ============================================================================

#[test]
fn offline_commands_require_a_durable_store() {
    let temp = TempDir::new().unwrap();
    let path = write_csv(&temp, "plant.csv", &["P,Pump,1,1,1"]);
    let err = execute_offline(&EquipmentLedgerConfig::default(), ingest(path, false, None))
        .unwrap_err();
    assert!(err.to_string().contains("durable store"));
}

#[test]
fn offline_ingest_show_and_delete_share_one_store() {
    let temp = TempDir::new().unwrap();
    let config = sqlite_config(&temp);
    let gap = write_csv(&temp, "plant.csv", &["Pump-1,Pump,10,2.5,80", "Pump-2,Pump,,2.0,75"]);

    let pending = execute_offline(&config, ingest(gap.clone(), false, None)).unwrap();
    assert!(pending.status().is_client_error());
    assert_eq!(json_of(&pending)["requires_confirmation"], true);

    let stored = execute_offline(&config, ingest(gap, true, Some("operator-4"))).unwrap();
    assert!(stored.status().is_success());
    let id = json_of(&stored)["batch_id"].as_i64().unwrap().to_string();
    assert_eq!(json_of(&stored)["batch"]["owner"], "operator-4");

    let history = execute_offline(&config, OfflineCommand::History).unwrap();
    assert_eq!(json_of(&history).as_array().unwrap().len(), 1);

    let shown = execute_offline(&config, OfflineCommand::Show(id.clone())).unwrap();
    assert_eq!(json_of(&shown)["summary"]["valid_count"], 1);

    let report = execute_offline(&config, OfflineCommand::Report(id.clone())).unwrap();
    assert!(matches!(report, ApiResponse::Document { .. }));

    let deleted = execute_offline(&config, OfflineCommand::Delete(id.clone())).unwrap();
    assert_eq!(deleted.status().as_u16(), 204);
    let missing = execute_offline(&config, OfflineCommand::Show(id)).unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[test]
fn offline_ingest_reports_unreadable_files() {
    let temp = TempDir::new().unwrap();
    let config = sqlite_config(&temp);
    let err = execute_offline(&config, ingest(temp.path().join("absent.csv"), false, None))
        .unwrap_err();
    assert!(err.to_string().contains("failed to read"));
}
