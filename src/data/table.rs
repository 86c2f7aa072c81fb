//! Input-table parsing
//!
//! Streams the tab-separated site table into a [`RecordIndex`]. Columns are at
//! fixed offsets: `chr p1 p2 context metDens label W_1..W_11 C_1..C_11`.
//! Plain and gzip-compressed tables are supported.

use crate::data::encoder::{base_row, reverse_complement};
use crate::data::{CpgRecord, Label, RecordIndex, CONTEXT_LEN, WINDOW_LEN};
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// Number of whitespace-separated columns a data line must carry
const NUM_COLUMNS: usize = 6 + 2 * WINDOW_LEN;

/// Column offset of the forward-strand ratio block
const WATSON_RATIO_OFFSET: usize = 6;

/// Column offset of the reverse-strand ratio block
const CRICK_RATIO_OFFSET: usize = WATSON_RATIO_OFFSET + WINDOW_LEN;

/// Build a record index from a site table on disk
///
/// `.gz` paths are decompressed on the fly.
pub fn build_index<P: AsRef<Path>>(path: P) -> Result<RecordIndex> {
    let path = path.as_ref();
    info!("Loading site table from {:?}", path);

    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;

    let index = if path.extension().map(|e| e == "gz").unwrap_or(false) {
        parse_table(BufReader::new(GzDecoder::new(file)))?
    } else {
        parse_table(BufReader::new(file))?
    };

    info!(
        "Indexed {} sites (M: {}, U: {}); skipped {} malformed, {} ambiguous",
        index.len(),
        index.methylated_count(),
        index.unmethylated_count(),
        index.skipped_malformed,
        index.skipped_ambiguous,
    );
    Ok(index)
}

/// Parse a site table from any reader; the first line is a discarded header
pub fn parse_table<R: Read>(reader: R) -> Result<RecordIndex> {
    let mut lines = BufReader::new(reader).lines();
    let mut index = RecordIndex::new();

    // header line
    match lines.next() {
        Some(header) => {
            let header = header.context("Failed to read header line")?;
            debug!("Header: {}", header.trim());
        }
        None => return Ok(index),
    }

    for (line_no, line) in lines.enumerate() {
        let line = line.with_context(|| format!("Failed to read data line {}", line_no + 2))?;
        let fields: Vec<&str> = line.split_whitespace().collect();

        // A blank or single-field line marks end of data.
        if fields.len() <= 1 {
            debug!("End-of-data sentinel at line {}", line_no + 2);
            break;
        }

        match parse_record(&fields) {
            Some(record) => index.insert(record),
            None => {
                if window_is_ambiguous(&fields) {
                    index.skipped_ambiguous += 1;
                } else {
                    warn!("Skipping malformed line {}", line_no + 2);
                    index.skipped_malformed += 1;
                }
            }
        }
    }

    Ok(index)
}

/// Parse one data line; `None` when the line is malformed or its window holds
/// an ambiguous base
fn parse_record(fields: &[&str]) -> Option<CpgRecord> {
    if fields.len() < NUM_COLUMNS {
        return None;
    }

    let chrom = fields[0].to_string();
    let start: u64 = fields[1].parse().ok()?;
    let context = fields[3];
    // byte length check only holds up slicing for ASCII contexts
    if context.len() != CONTEXT_LEN || !context.is_ascii() {
        return None;
    }
    let label = Label::parse(fields[5])?;

    let watson_seq = context[..WINDOW_LEN].to_string();
    let crick_seq = reverse_complement(context)[..WINDOW_LEN].to_string();
    if !is_unambiguous(&watson_seq) || !is_unambiguous(&crick_seq) {
        return None;
    }

    let watson_ratios = parse_ratios(&fields[WATSON_RATIO_OFFSET..CRICK_RATIO_OFFSET])?;
    let crick_ratios = parse_ratios(&fields[CRICK_RATIO_OFFSET..CRICK_RATIO_OFFSET + WINDOW_LEN])?;

    Some(CpgRecord {
        chrom,
        start,
        watson_seq,
        crick_seq,
        watson_ratios,
        crick_ratios,
        label,
    })
}

fn parse_ratios(fields: &[&str]) -> Option<Vec<f32>> {
    fields.iter().map(|f| f.parse::<f32>().ok()).collect()
}

fn is_unambiguous(seq: &str) -> bool {
    seq.bytes().all(|b| base_row(b).is_some())
}

/// Whether a structurally complete line was rejected for its window content
fn window_is_ambiguous(fields: &[&str]) -> bool {
    if fields.len() < NUM_COLUMNS || fields[3].len() != CONTEXT_LEN || !fields[3].is_ascii() {
        return false;
    }
    let context = fields[3];
    !is_unambiguous(&context[..WINDOW_LEN])
        || !is_unambiguous(&reverse_complement(context)[..WINDOW_LEN])
}
