//! `bdaysync sync`.

use std::io::{self, Write};

use bdaysync_core::SyncReport;

use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Runs a sync, printing one line per birthday as it is processed.
///
/// Per-entry failures are part of the report, not an error.
pub async fn run(config: &ClientConfig) -> ClientResult<SyncReport> {
    let engine = super::build_engine(config)?;

    let report = engine
        .sync_with_progress(|entry| println!("{}", entry))
        .await?;

    write_footer(&mut io::stdout().lock(), &report, engine.options().page_size)?;
    Ok(report)
}

/// Writes the truncation notice (if any) and the summary line.
pub fn write_footer(out: &mut impl Write, report: &SyncReport, page_size: usize) -> io::Result<()> {
    if report.truncated {
        writeln!(
            out,
            "Only the first {} contacts were synced; set `follow_pages = true` in [sync] to fetch all.",
            page_size
        )?;
    }
    writeln!(out, "{}", report.summary())
}
