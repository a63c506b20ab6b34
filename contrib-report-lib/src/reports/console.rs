use crate::Result;
use crate::facts::{ActivityReport, RepoOutcome};
use core::fmt::Write;
use owo_colors::OwoColorize;

/// Write one line per collected repository, followed by run totals.
pub fn generate<W: Write>(report: &ActivityReport, use_colors: bool, writer: &mut W) -> Result<()> {
    for (repo, outcome) in &report.outcomes {
        if let RepoOutcome::Collected {
            commits,
            pull_requests,
            authors,
        } = outcome
        {
            let name = if use_colors { repo.bold().to_string() } else { repo.to_string() };
            writeln!(
                writer,
                "{name}: {commits} commit(s), {pull_requests} pull request(s), {authors} author(s)"
            )?;
        }
    }

    let skipped = report.skipped().count();
    if !report.outcomes.is_empty() {
        let total = report.outcomes.len();
        let collected = total - skipped;
        writeln!(
            writer,
            "Totals: {} commit(s), {} pull request(s) from {collected} of {total} repositories",
            report.commits.len(),
            report.pull_requests.len()
        )?;
    }

    Ok(())
}

/// Write one line per skipped repository with the reason.
pub fn generate_skipped<W: Write>(report: &ActivityReport, use_colors: bool, writer: &mut W) -> Result<()> {
    for (repo, reason) in report.skipped() {
        let label = if use_colors {
            "Skipped".yellow().bold().to_string()
        } else {
            "Skipped".to_string()
        };
        writeln!(writer, "{label} {repo}: {reason}")?;
    }

    Ok(())
}
