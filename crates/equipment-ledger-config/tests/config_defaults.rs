//! Default and loading tests for equipment-ledger-config.
// equipment-ledger-config/tests/config_defaults.rs
// =============================================================================
// Module: Config Default Tests
// Description: Validate defaults, file loading, and pipeline mapping.
// Purpose: Ensure an empty config yields a usable local deployment.
// =============================================================================

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
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;

use equipment_ledger_config::ConfigError;
use equipment_ledger_config::EquipmentLedgerConfig;
use equipment_ledger_config::StoreType;
use tempfile::TempDir;

mod common;
use common::TestResult;

#[test]
fn empty_config_uses_local_defaults() -> TestResult {
    let config = common::minimal_config()?;
    config.validate().map_err(|err| err.to_string())?;
    if config.server.bind != "127.0.0.1:8000" {
        return Err(format!("unexpected bind {}", config.server.bind));
    }
    if config.store.store_type != StoreType::Memory {
        return Err("default store must be memory".to_string());
    }
    let pipeline = config.pipeline_config();
    if pipeline.retention.max_batches() != 5 {
        return Err("default retention must be 5 batches".to_string());
    }
    if pipeline.report_format.decimal_places != 2 || pipeline.report_format.missing_placeholder != "N/A" {
        return Err("unexpected default report format".to_string());
    }
    if !config.audit.enabled {
        return Err("audit must default to enabled".to_string());
    }
    Ok(())
}

#[test]
fn load_reads_and_validates_file() -> TestResult {
    let temp = TempDir::new().map_err(|err| err.to_string())?;
    let path = temp.path().join("equipment-ledger.toml");
    let db_path = temp.path().join("ledger.db");
    let body = format!(
        "[server]\nbind = \"127.0.0.1:9100\"\n\n[store]\ntype = \"sqlite\"\npath = \"{db}\"\nsync_mode = \
         \"normal\"\n\n[retention]\nmax_batches = 3\n\n[report]\ndecimal_places = 1\n",
        db = db_path.display()
    );
    fs::write(&path, body).map_err(|err| err.to_string())?;

    let config = EquipmentLedgerConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if config.source_path.as_deref() != Some(path.as_path()) {
        return Err("source path not recorded".to_string());
    }
    let sqlite = config.store.sqlite_config().ok_or("sqlite config missing")?;
    if sqlite.path != db_path {
        return Err("sqlite path mismatch".to_string());
    }
    if config.pipeline_config().retention.max_batches() != 3 {
        return Err("retention override ignored".to_string());
    }
    Ok(())
}

#[test]
fn load_reports_missing_file_as_io_error() -> TestResult {
    let temp = TempDir::new().map_err(|err| err.to_string())?;
    match EquipmentLedgerConfig::load(Some(&temp.path().join("absent.toml"))) {
        Err(ConfigError::Io(_)) => Ok(()),
        other => Err(format!("expected io error, got ok={}", other.is_ok())),
    }
}

#[test]
fn malformed_toml_is_a_parse_error() -> TestResult {
    match EquipmentLedgerConfig::from_toml_bytes(b"[server\nbind = 1") {
        Err(ConfigError::Parse(_)) => Ok(()),
        other => Err(format!("expected parse error, got ok={}", other.is_ok())),
    }
}

#[test]
fn oversized_config_is_rejected() -> TestResult {
    let bytes = vec![b'#'; 1024 * 1024 + 1];
    common::assert_invalid(
        EquipmentLedgerConfig::from_toml_bytes(&bytes).map(|_| ()),
        "config file exceeds size limit",
    )
}

#[test]
fn non_utf8_config_is_rejected() -> TestResult {
    common::assert_invalid(
        EquipmentLedgerConfig::from_toml_bytes(b"\xFF\xFE").map(|_| ()),
        "config file must be utf-8",
    )
}
