use crate::Result;
use crate::facts::{ActivityReport, format_timestamp};
use rust_xlsxwriter::{DocProperties, Format, Note, Workbook, Worksheet};
use std::io::Write;

/// Longest text a single Excel cell accepts.
const MAX_CELL_CHARS: usize = 32_767;

const COMMIT_HEADERS: [&str; 11] = [
    "sha",
    "author",
    "message",
    "additions",
    "deletions",
    "files_touched",
    "date",
    "branch",
    "repository",
    "url",
    "URL",
];

const PULL_REQUEST_HEADERS: [&str; 10] = [
    "number",
    "title",
    "author",
    "from_branch",
    "to_branch",
    "additions",
    "deletions",
    "created_at",
    "closed_at",
    "wait_time",
];

/// Pull request columns the listing endpoint never fills in.
const PULL_REQUEST_UNREPORTED_COLUMNS: [u16; 2] = [5, 6];

const UNREPORTED_LINE_COUNT_NOTE: &str =
    "GitHub's pull request listing does not include line counts, so this column is 0 unless the API supplied a value.";

const SUMMARY_HEADERS: [&str; 7] = ["author", "commits", "additions", "deletions", "files_touched", "prs", "working_days"];

/// Write the report as an xlsx workbook with the `Commits`, `Pull Requests`, and `Summary` sheets.
///
/// Sheets carry a header row even when they have no data rows. Which repositories were
/// collected and which were skipped is recorded in the document comment.
#[expect(unused_results, reason = "rust_xlsxwriter methods return &mut Worksheet for chaining")]
pub fn generate<W: Write>(report: &ActivityReport, writer: &mut W) -> Result<()> {
    let mut workbook = Workbook::new();

    let properties = DocProperties::new()
        .set_author("contrib-report")
        .set_title("Contributions report")
        .set_comment(repository_comment(report));
    workbook.set_properties(&properties);

    let bold_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet().set_name("Commits")?;
    write_header(worksheet, &COMMIT_HEADERS, &bold_format)?;
    for (row, commit) in (1u32..).zip(&report.commits) {
        worksheet.write_string(row, 0, &commit.sha)?;
        worksheet.write_string(row, 1, &commit.author)?;
        worksheet.write_string(row, 2, cell_text(&commit.message))?;
        write_count(worksheet, row, 3, commit.additions)?;
        write_count(worksheet, row, 4, commit.deletions)?;
        write_count(worksheet, row, 5, commit.files_touched)?;
        worksheet.write_string(row, 6, format_timestamp(commit.date))?;
        worksheet.write_string(row, 7, &commit.branch)?;
        worksheet.write_string(row, 8, commit.repository.as_ref())?;
        worksheet.write_string(row, 9, &commit.url)?;
        if worksheet.write_url_with_text(row, 10, commit.url.as_str(), "View Commit").is_err() {
            worksheet.write_string(row, 10, "View Commit")?;
        }
    }
    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofit();

    let worksheet = workbook.add_worksheet().set_name("Pull Requests")?;
    write_header(worksheet, &PULL_REQUEST_HEADERS, &bold_format)?;
    let note = Note::new(UNREPORTED_LINE_COUNT_NOTE).set_author("contrib-report");
    for col in PULL_REQUEST_UNREPORTED_COLUMNS {
        worksheet.insert_note(0, col, &note)?;
    }
    for (row, pull) in (1u32..).zip(&report.pull_requests) {
        write_count(worksheet, row, 0, pull.number)?;
        worksheet.write_string(row, 1, cell_text(&pull.title))?;
        worksheet.write_string(row, 2, &pull.author)?;
        worksheet.write_string(row, 3, &pull.from_branch)?;
        worksheet.write_string(row, 4, &pull.to_branch)?;
        write_count(worksheet, row, 5, pull.additions)?;
        write_count(worksheet, row, 6, pull.deletions)?;
        worksheet.write_string(row, 7, format_timestamp(pull.created_at))?;
        worksheet.write_string(row, 8, format_timestamp(pull.closed_at))?;
        #[expect(clippy::cast_precision_loss, reason = "Intentional conversion to f64 for Excel output")]
        worksheet.write_number(row, 9, pull.wait_time as f64)?;
    }
    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofit();

    let worksheet = workbook.add_worksheet().set_name("Summary")?;
    write_header(worksheet, &SUMMARY_HEADERS, &bold_format)?;
    for (row, rollup) in (1u32..).zip(&report.summary) {
        worksheet.write_string(row, 0, &rollup.author)?;
        write_count(worksheet, row, 1, rollup.commits)?;
        write_count(worksheet, row, 2, rollup.additions)?;
        write_count(worksheet, row, 3, rollup.deletions)?;
        write_count(worksheet, row, 4, rollup.files_touched)?;
        write_count(worksheet, row, 5, rollup.prs)?;
        write_count(worksheet, row, 6, rollup.working_days)?;
    }
    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofit();

    let data = workbook.save_to_buffer()?;
    writer.write_all(&data)?;

    Ok(())
}

#[expect(unused_results, reason = "rust_xlsxwriter methods return &mut Worksheet for chaining")]
fn write_header(worksheet: &mut Worksheet, headers: &[&str], format: &Format) -> Result<()> {
    for (col, header) in (0u16..).zip(headers) {
        worksheet.write_string_with_format(0, col, *header, format)?;
    }
    Ok(())
}

#[expect(unused_results, reason = "rust_xlsxwriter methods return &mut Worksheet for chaining")]
#[expect(clippy::cast_precision_loss, reason = "Intentional conversion to f64 for Excel output")]
fn write_count(worksheet: &mut Worksheet, row: u32, col: u16, value: u64) -> Result<()> {
    worksheet.write_number(row, col, value as f64)?;
    Ok(())
}

/// Clip text to what a cell can hold.
fn cell_text(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => text.split_at(end).0,
        None => text,
    }
}

fn repository_comment(report: &ActivityReport) -> String {
    let collected: Vec<String> = report.collected().map(ToString::to_string).collect();
    let skipped: Vec<String> = report
        .skipped()
        .map(|(repo, reason)| format!("{repo} ({reason})"))
        .collect();

    let mut comment = format!("Collected: {}", if collected.is_empty() { "none".to_string() } else { collected.join(", ") });
    if !skipped.is_empty() {
        comment.push_str("; Skipped: ");
        comment.push_str(&skipped.join(", "));
    }
    comment
}
