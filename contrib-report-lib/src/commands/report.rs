use super::Host;
use super::ProgressReporter;
use super::common::{CommonArgs, init_logging};
use super::config::Config;
use crate::Result;
use crate::facts::{ActivityReport, ActivityWindow, Collector, RepoSpec};
use crate::reports::{generate_console, generate_console_skipped, generate_xlsx};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use clap::Parser;
use ohno::{IntoAppError, app_err, bail};
use std::io::Write;
use tempfile::NamedTempFile;

const LOG_TARGET: &str = "    report";

/// Longest window accepted on the command line, 100 years.
const MAX_WEEKS: i64 = 5200;

/// Default workbook file name.
pub const DEFAULT_OUTPUT: &str = "contributions_report.xlsx";

#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Comma-separated repositories (`owner/name` or a GitHub URL)
    #[arg(long, value_name = "REPOS")]
    pub repos: String,

    /// Number of weeks to look back from now (at most 5200)
    #[arg(long, value_name = "N", default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..=MAX_WEEKS))]
    pub weeks: u32,

    /// Where to write the xlsx workbook
    #[arg(long, short = 'o', value_name = "PATH", default_value = DEFAULT_OUTPUT)]
    pub output: Utf8PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Collect activity for the requested repositories and write the workbook.
///
/// Repositories that cannot be read are reported on the error stream but do not fail the
/// command. Bad arguments, an invalid configuration, a missing token, or a failed write do.
pub async fn process_report<H: Host>(host: &mut H, args: &ReportArgs) -> Result<()> {
    init_logging(args.common.log_level);

    let repos = RepoSpec::parse_list(&args.repos)?;
    let config = Config::load(Utf8Path::new("."), args.common.config.as_ref())?;

    let Some(token) = args.common.github_token.as_deref().filter(|t| !t.trim().is_empty()) else {
        bail!("a GitHub token is required: pass --github-token or set the GITHUB_TOKEN environment variable");
    };

    let output_dir = output_dir(&args.output);
    if !output_dir.is_dir() {
        bail!("cannot write report '{}': directory '{output_dir}' does not exist", args.output);
    }

    let window = ActivityWindow::new(Utc::now(), args.weeks);
    log::info!(target: LOG_TARGET, "Reporting on {} repository(ies) over {window}", repos.len());

    let progress = ProgressReporter::new(args.common.progress_delay(), args.common.color.use_colors(&std::io::stderr()));
    let collector = Collector::new(token, config.collector_options(), progress)?;
    let report = collector.collect(repos, &window).await;

    write_workbook(&report, &args.output)?;
    log::info!(target: LOG_TARGET, "Wrote '{}'", args.output);

    let mut console = String::new();
    generate_console(&report, args.common.color.use_colors(&std::io::stdout()), &mut console)?;
    let _ = write!(host.output(), "{console}");

    let mut skipped = String::new();
    generate_console_skipped(&report, args.common.color.use_colors(&std::io::stderr()), &mut skipped)?;
    let _ = write!(host.error(), "{skipped}");

    let _ = writeln!(host.output(), "Contributions report generated successfully!");
    Ok(())
}

fn output_dir(output: &Utf8Path) -> &Utf8Path {
    output
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."))
}

/// Write the workbook next to its destination, then move it into place.
///
/// A failed run never leaves a truncated workbook behind.
fn write_workbook(report: &ActivityReport, output: &Utf8Path) -> Result<()> {
    let dir = output_dir(output);
    let mut file = NamedTempFile::new_in(dir).into_app_err_with(|| format!("creating a temporary file in '{dir}'"))?;

    generate_xlsx(report, &mut file)?;
    file.as_file()
        .sync_all()
        .into_app_err_with(|| format!("flushing report '{output}'"))?;

    let _ = file
        .persist(output)
        .map_err(|e| app_err!("writing report '{output}': {}", e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_dir() {
        assert_eq!(output_dir(Utf8Path::new("report.xlsx")), Utf8Path::new("."));
        assert_eq!(output_dir(Utf8Path::new("out/report.xlsx")), Utf8Path::new("out"));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_write_workbook_replaces_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let output = Utf8PathBuf::try_from(tmp.path().join("report.xlsx")).unwrap();
        std::fs::write(&output, "stale").unwrap();

        write_workbook(&ActivityReport::default(), &output).unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(&bytes[0..2], b"PK");
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_workbook_missing_directory_fails() {
        let output = Utf8PathBuf::from("/definitely/not/here/report.xlsx");
        assert!(write_workbook(&ActivityReport::default(), &output).is_err());
    }
}
