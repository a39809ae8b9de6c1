// equipment-ledger-cli/src/main.rs
// ============================================================================
// Module: Equipment Ledger CLI Entry Point
// Description: Command dispatcher for serving and offline batch operations.
// Purpose: Run the HTTP server or operate on a durable store from the shell.
// Dependencies: clap, equipment-ledger-config, equipment-ledger-server, tokio
// ============================================================================

//! ## Overview
//! `equipment-ledger serve` starts the HTTP server. The offline commands
//! (`ingest`, `history`, `show`, `report`, `delete`) open the configured
//! durable store directly and reuse the server's API handler, so statuses,
//! JSON bodies, and audit events match the HTTP surface. Successful output
//! goes to stdout as JSON; failures go to stderr with a non-zero exit code.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use equipment_ledger_config::EquipmentLedgerConfig;
use equipment_ledger_config::StoreType;
use equipment_ledger_core::OwnerRef;
use equipment_ledger_core::RequestContext;
use equipment_ledger_server::ApiHandler;
use equipment_ledger_server::ApiResponse;
use equipment_ledger_server::LedgerServer;
use equipment_ledger_server::UploadFile;
use equipment_ledger_server::build_handler;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Request id attached to offline commands.
const CLI_REQUEST_ID: &str = "cli";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "equipment-ledger", version, disable_help_subcommand = true)]
struct Cli {
    /// Optional config file path (defaults to equipment-ledger.toml or env override).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server.
    Serve,
    /// Ingest a CSV file into the store.
    Ingest(IngestCommand),
    /// List stored batches, newest first.
    History,
    /// Show a batch's rows and summary.
    Show(BatchCommand),
    /// Render a batch's printable report.
    Report(ReportCommand),
    /// Delete a batch and its records.
    Delete(BatchCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for the `ingest` command.
#[derive(Args, Debug)]
struct IngestCommand {
    /// CSV file to ingest.
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// Store the upload even when required cells are missing.
    #[arg(long, action = ArgAction::SetTrue)]
    confirm: bool,
    /// Owner reference recorded on the batch.
    #[arg(long, value_name = "OWNER")]
    owner: Option<String>,
}

/// Arguments for commands addressing one batch.
#[derive(Args, Debug)]
struct BatchCommand {
    /// Batch identifier.
    #[arg(value_name = "ID")]
    id: String,
}

/// Arguments for the `report` command.
#[derive(Args, Debug)]
struct ReportCommand {
    /// Batch identifier.
    #[arg(value_name = "ID")]
    id: String,
    /// Write the report to a file instead of stdout.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the configuration file.
    Check,
}

/// Commands that operate on the store without a server.
#[derive(Debug)]
enum OfflineCommand {
    /// Ingest a file.
    Ingest(IngestCommand),
    /// List batches.
    History,
    /// Show a batch.
    Show(String),
    /// Render a report.
    Report(String),
    /// Delete a batch.
    Delete(String),
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Bounded file read failures.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve => command_serve(config_path).await,
        Commands::Ingest(command) => run_offline(config_path, OfflineCommand::Ingest(command), None),
        Commands::History => run_offline(config_path, OfflineCommand::History, None),
        Commands::Show(command) => run_offline(config_path, OfflineCommand::Show(command.id), None),
        Commands::Report(command) => run_offline(
            config_path,
            OfflineCommand::Report(command.id),
            command.output.as_deref(),
        ),
        Commands::Delete(command) => {
            run_offline(config_path, OfflineCommand::Delete(command.id), None)
        }
        Commands::Config {
            command: ConfigCommand::Check,
        } => command_config_check(config_path),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let bind = config.server.bind.clone();
    let server = tokio::task::spawn_blocking(move || LedgerServer::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("server init failed: init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    write_stderr_line(&format!("equipment-ledger: listening on {bind}"))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

/// Executes `config check`.
fn command_config_check(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let store = match config.store.store_type {
        StoreType::Memory => "memory",
        StoreType::Sqlite => "sqlite",
    };
    let summary = serde_json::json!({
        "status": "ok",
        "path": config.source_path.as_ref().map(|path| path.display().to_string()),
        "bind": config.server.bind,
        "store": store,
        "max_batches": config.retention.max_batches,
    });
    write_json(&summary)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Offline Commands
// ============================================================================

/// Loads config, executes an offline command, and emits the response.
fn run_offline(
    config_path: Option<&Path>,
    command: OfflineCommand,
    output: Option<&Path>,
) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let response = execute_offline(&config, command)?;
    emit_response(response, output)
}

/// Executes an offline command against the configured durable store.
fn execute_offline(
    config: &EquipmentLedgerConfig,
    command: OfflineCommand,
) -> CliResult<ApiResponse> {
    if config.store.store_type == StoreType::Memory {
        return Err(CliError::new(
            "offline commands require a durable store; set [store] type = \"sqlite\"".to_string(),
        ));
    }
    let handler = build_handler(config).map_err(|err| CliError::new(err.to_string()))?;
    let ctx = RequestContext::anonymous().with_request_id(CLI_REQUEST_ID);
    let response = match command {
        OfflineCommand::Ingest(command) => {
            command_ingest(&handler, ctx, &command, config.server.max_body_bytes)?
        }
        OfflineCommand::History => handler.history(&ctx),
        OfflineCommand::Show(id) => handler.data(&ctx, &id),
        OfflineCommand::Report(id) => handler.report(&ctx, &id),
        OfflineCommand::Delete(id) => handler.delete(&ctx, &id),
    };
    Ok(response)
}

/// Reads the upload file and runs it through the handler.
fn command_ingest(
    handler: &ApiHandler,
    ctx: RequestContext,
    command: &IngestCommand,
    max_bytes: usize,
) -> CliResult<ApiResponse> {
    let bytes = read_bytes_with_limit(&command.file, max_bytes).map_err(|err| {
        let message = match err {
            ReadLimitError::Io(error) => {
                format!("failed to read {}: {error}", command.file.display())
            }
            ReadLimitError::TooLarge {
                size,
                limit,
            } => format!("{} is {size} bytes; limit is {limit}", command.file.display()),
        };
        CliError::new(message)
    })?;
    let filename = command
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ctx = match command.owner.as_deref().map(str::trim) {
        Some(owner) if !owner.is_empty() => ctx.with_owner(OwnerRef::new(owner)),
        _ => ctx,
    };
    let file = UploadFile {
        filename,
        bytes,
    };
    Ok(handler.upload(&ctx, Some(file), command.confirm))
}

/// Writes a handler response and maps its status to an exit code.
fn emit_response(response: ApiResponse, output: Option<&Path>) -> CliResult<ExitCode> {
    let status = response.status();
    match response {
        ApiResponse::Json {
            body, ..
        } => {
            let text = serde_json::to_string_pretty(&body)
                .map_err(|err| CliError::new(format!("json serialization failed: {err}")))?;
            if status.is_success() {
                write_stdout_line(&text).map_err(|err| CliError::new(output_error("stdout", &err)))?;
            } else {
                write_stderr_line(&text).map_err(|err| CliError::new(output_error("stderr", &err)))?;
            }
        }
        ApiResponse::Document {
            report,
        } => match output {
            Some(path) => {
                fs::write(path, &report.bytes).map_err(|err| {
                    CliError::new(format!("failed to write {}: {err}", path.display()))
                })?;
                write_json(&serde_json::json!({
                    "status": "ok",
                    "output": path.display().to_string(),
                    "content_type": report.content_type,
                }))?;
            }
            None => write_stdout_bytes(&report.bytes)
                .map_err(|err| CliError::new(output_error("stdout", &err)))?,
        },
        ApiResponse::Empty {
            ..
        } => {
            write_json(&serde_json::json!({ "status": status.as_u16() }))?;
        }
    }
    Ok(if status.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads configuration with the standard resolution rules.
fn load_config(path: Option<&Path>) -> CliResult<EquipmentLedgerConfig> {
    EquipmentLedgerConfig::load(path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let metadata = file.metadata().map_err(ReadLimitError::Io)?;
    let size = metadata.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes a JSON value to stdout.
fn write_json(value: &serde_json::Value) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("json serialization failed: {err}")))?;
    write_stdout_line(&text).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
