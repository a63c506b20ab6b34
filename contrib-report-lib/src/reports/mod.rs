//! Report generation for collected contribution activity
//!
//! # Implementation Model
//!
//! Two generators are provided, each accessed through a `generate` function:
//! - **Excel**: Native .xlsx workbook with `Commits`, `Pull Requests`, and `Summary` sheets
//! - **Console**: Short per-repository summary lines for the terminal
//!
//! Both operate on the same [`ActivityReport`](crate::facts::ActivityReport), so the rows in
//! the workbook and the counts on the console always agree.

mod console;
mod excel;

pub use console::{generate as generate_console, generate_skipped as generate_console_skipped};
pub use excel::generate as generate_xlsx;
