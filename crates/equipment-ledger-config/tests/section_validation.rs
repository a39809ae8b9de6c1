//! Section validation tests for equipment-ledger-config.
// equipment-ledger-config/tests/section_validation.rs
// =============================================================================
// Module: Config Section Validation Tests
// Description: Validate server, store, retention, report, and audit limits.
// Purpose: Ensure out-of-range values fail closed.
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

use std::path::PathBuf;

use equipment_ledger_config::StoreType;

mod common;
use common::TestResult;
use common::assert_invalid;

#[test]
fn server_rejects_malformed_bind() -> TestResult {
    let mut config = common::minimal_config()?;
    config.server.bind = "localhost".to_string();
    assert_invalid(config.validate(), "invalid bind address")
}

#[test]
fn server_rejects_zero_body_limit() -> TestResult {
    let mut config = common::minimal_config()?;
    config.server.max_body_bytes = 0;
    assert_invalid(config.validate(), "max_body_bytes must be greater than zero")
}

#[test]
fn server_rejects_huge_body_limit() -> TestResult {
    let mut config = common::minimal_config()?;
    config.server.max_body_bytes = 512 * 1024 * 1024;
    assert_invalid(config.validate(), "max_body_bytes must not exceed")
}

#[test]
fn memory_store_rejects_path() -> TestResult {
    let mut config = common::minimal_config()?;
    config.store.store_type = StoreType::Memory;
    config.store.path = Some(PathBuf::from("ledger.db"));
    assert_invalid(config.validate(), "memory store must not set path")
}

#[test]
fn sqlite_store_requires_path() -> TestResult {
    let mut config = common::minimal_config()?;
    config.store.store_type = StoreType::Sqlite;
    config.store.path = None;
    assert_invalid(config.validate(), "sqlite store requires path")
}

#[test]
fn sqlite_store_rejects_overlong_component() -> TestResult {
    let mut config = common::minimal_config()?;
    config.store.store_type = StoreType::Sqlite;
    config.store.path = Some(PathBuf::from("a".repeat(300)));
    assert_invalid(config.validate(), "store.path path component too long")
}

#[test]
fn retention_bounds_are_enforced() -> TestResult {
    let mut config = common::minimal_config()?;
    config.retention.max_batches = 0;
    assert_invalid(config.validate(), "retention.max_batches must be between 1 and 1000")?;
    config.retention.max_batches = 1_001;
    assert_invalid(config.validate(), "retention.max_batches must be between 1 and 1000")?;
    config.retention.max_batches = 1;
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn report_precision_is_bounded() -> TestResult {
    let mut config = common::minimal_config()?;
    config.report.decimal_places = 11;
    assert_invalid(config.validate(), "report.decimal_places must not exceed 10")
}

#[test]
fn report_placeholder_must_be_short_and_non_empty() -> TestResult {
    let mut config = common::minimal_config()?;
    config.report.missing_placeholder = "   ".to_string();
    assert_invalid(config.validate(), "report.missing_placeholder must be non-empty")?;
    config.report.missing_placeholder = "x".repeat(33);
    assert_invalid(config.validate(), "report.missing_placeholder exceeds 32 characters")
}

#[test]
fn audit_path_must_be_non_empty() -> TestResult {
    let mut config = common::minimal_config()?;
    config.audit.path = Some("  ".to_string());
    assert_invalid(config.validate(), "audit.path must be non-empty")
}

#[test]
fn unknown_store_type_fails_to_parse() -> TestResult {
    match common::config_from_toml("[store]\ntype = \"postgres\"\n") {
        Err(_) => Ok(()),
        Ok(_) => Err("unknown store type must not parse".to_string()),
    }
}
