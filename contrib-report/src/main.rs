//! Summarize who contributed what to a set of GitHub repositories.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use contrib_report_lib::{Host, run};
use std::io::{Write, stderr, stdout};

/// Exit code for configuration errors and failed report writes.
const FAILURE_EXIT_CODE: i32 = 1;

/// Host backed by the process's standard streams.
#[derive(Debug, Clone, Default)]
pub struct ProcessHost;

#[cfg_attr(coverage_nightly, coverage(off))]
impl Host for ProcessHost {
    fn output(&mut self) -> impl Write {
        stdout()
    }

    fn error(&mut self) -> impl Write {
        stderr()
    }

    fn exit(&mut self, code: i32) {
        std::process::exit(code);
    }
}

#[tokio::main]
#[cfg_attr(coverage_nightly, coverage(off))]
async fn main() {
    let mut host = ProcessHost;
    if let Err(e) = run(&mut host, std::env::args()).await {
        let _ = writeln!(host.error(), "error: {e}");
        host.exit(FAILURE_EXIT_CODE);
    }
}
