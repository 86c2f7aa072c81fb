//! Prediction report
//!
//! One tab-separated row per evaluated site: chromosome, window start, window
//! end, numeric label, raw probability, thresholded call.

use crate::data::CONTEXT_LEN;
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Report column header
pub const REPORT_HEADER: &str = "chr\tp1\tp2\tlabel\toutput\tpredict";

/// One report row
#[derive(Debug, Clone)]
pub struct ReportRow {
    /// Site identifier, `"chrom:start"`
    pub id: String,
    /// Numeric label (M → 1, U → 0)
    pub label: f32,
    /// Raw model probability
    pub output: f32,
}

impl ReportRow {
    /// Thresholded call: output ≥ 0.5
    pub fn predicted(&self) -> bool {
        self.output >= 0.5
    }
}

/// Write the report; overwrites any existing file at `path`
pub fn write_report<P: AsRef<Path>>(path: P, rows: &[ReportRow]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file {:?}", path))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", REPORT_HEADER)?;
    for row in rows {
        let (chrom, start) = split_id(&row.id)?;
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}",
            chrom,
            start,
            start + CONTEXT_LEN as u64,
            row.label as u8,
            row.output,
            row.predicted(),
        )?;
    }
    writer.flush().context("Failed to flush report file")?;

    info!("Wrote {} report rows to {:?}", rows.len(), path);
    Ok(())
}

fn split_id(id: &str) -> Result<(&str, u64)> {
    let Some((chrom, start)) = id.rsplit_once(':') else {
        bail!("malformed site identifier: {}", id);
    };
    let start: u64 = start
        .parse()
        .with_context(|| format!("non-numeric position in identifier {}", id))?;
    Ok((chrom, start))
}
