//! Binary entry point for the tugast CLI.
//!
//! Runs path visitors over ESTree JSON documents. All output is JSON on
//! stdout; logs go to stderr.
//!
//! ## Usage
//!
//! ```bash
//! # Count nodes by type
//! tugast stats program.json
//!
//! # List expressions that need parentheses
//! tugast parens program.json
//!
//! # Remove every empty statement, cleaning up what they leave behind
//! tugast prune program.json --type EmptyStatement
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use tugast::commands::{parse_node_type, run_parens, run_prune, run_stats};
use tugast::error::{OutputErrorCode, TugastError};
use tugast::output::{emit_response, emit_response_compact, ErrorResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Path-based traversal and rewriting of ESTree syntax trees.
#[derive(Parser, Debug)]
#[command(name = "tugast", version, about = "Traverse and rewrite ESTree syntax trees")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Write logs to stderr as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Emit single-line JSON instead of pretty-printed JSON.
    #[arg(long, global = true)]
    compact: bool,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count nodes and comments by type.
    Stats {
        /// ESTree JSON file.
        file: PathBuf,
    },
    /// List expressions that must be parenthesized where they stand.
    Parens {
        /// ESTree JSON file.
        file: PathBuf,
        /// Treat every expression as standing outside statement-start
        /// position.
        #[arg(long)]
        assume_expression_context: bool,
    },
    /// Prune every node of a type and print the resulting tree.
    Prune {
        /// ESTree JSON file.
        file: PathBuf,
        /// Node type name, e.g. `EmptyStatement`.
        #[arg(long = "type", value_name = "TYPE")]
        node_type: String,
    },
}

// ============================================================================
// Main
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level, cli.global.log_json);

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON, same as successful responses.
            let _ = emit(&cli.global, &response);

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel, json: bool) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Execute the CLI command.
fn execute(cli: &Cli) -> Result<(), TugastError> {
    match &cli.command {
        Command::Stats { file } => {
            let response = run_stats(file)?;
            emit(&cli.global, &response)
        }
        Command::Parens {
            file,
            assume_expression_context,
        } => {
            let response = run_parens(file, *assume_expression_context)?;
            emit(&cli.global, &response)
        }
        Command::Prune { file, node_type } => {
            let node_type = parse_node_type(node_type)?;
            let response = run_prune(file, node_type)?;
            emit(&cli.global, &response)
        }
    }
}

fn emit<T: Serialize>(global: &GlobalArgs, response: &T) -> Result<(), TugastError> {
    let mut stdout = io::stdout();
    let result = if global.compact {
        emit_response_compact(response, &mut stdout)
    } else {
        emit_response(response, &mut stdout)
    };
    result.map_err(|e| TugastError::internal(e.to_string()))?;
    let _ = stdout.flush();
    Ok(())
}
