//! Command-line interface and orchestration for contrib-report
//!
//! This module implements the CLI commands and coordinates fact collection, rollup,
//! and report generation. It handles argument parsing, configuration management, and
//! the high-level workflow.
//!
//! # Implementation Model
//!
//! ## Commands
//!
//! - **report**: Parse the repository list, fetch commits and closed pull requests for
//!   the trailing window, fold them into per-author rollups, write the xlsx workbook,
//!   and print a short summary
//! - **init**: Generate a default configuration file
//!
//! ## Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes
//! to the appropriate command handler. The report command validates everything it can
//! before touching the network: the repository list, the configuration, the token, and
//! the output directory.
//!
//! The `common` module provides the arguments shared with anything that talks to
//! GitHub, as well as logging setup and color mode handling.

mod common;
mod config;
mod host;
mod init;
mod progress_reporter;
mod report;
mod run;

#[cfg(debug_assertions)]
pub use config::Config;

pub use host::Host;
pub use init::{InitArgs, init_config};
pub use progress_reporter::ProgressReporter;
pub use report::{ReportArgs, process_report};
pub use run::run;
