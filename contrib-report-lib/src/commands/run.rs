//! Command dispatch logic for contrib-report

use super::{InitArgs, ReportArgs, init_config, process_report};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "contrib-report", author, version, long_about = None)]
#[command(about = "Summarize who contributed what to GitHub repositories")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: ContribSubcommand,
}

#[derive(Subcommand, Debug)]
enum ContribSubcommand {
    /// Collect commits and pull requests and write a contributions workbook
    Report(Box<ReportArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        ContribSubcommand::Report(report_args) => process_report(host, report_args).await,
        ContribSubcommand::Init(init_args) => init_config(host, init_args),
    }
}
