pub mod batch;
pub mod encoder;
pub mod split;
pub mod table;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Length of the per-strand sequence window fed to the model
pub const WINDOW_LEN: usize = 11;

/// Length of the raw CpG context column in the input table (window + 1)
pub const CONTEXT_LEN: usize = 12;

/// Number of tracked nucleotides (A, C, G, T)
pub const NUM_BASES: usize = 4;

/// Rows of the encoded sample matrix: 4 nucleotides × 2 strands
pub const MATRIX_ROWS: usize = 2 * NUM_BASES;

/// Methylation call for a CpG site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    /// Methylated (table label `M`)
    Methylated,
    /// Unmethylated (table label `U`)
    Unmethylated,
}

impl Label {
    /// Parse from the table's label column
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "M" => Some(Label::Methylated),
            "U" => Some(Label::Unmethylated),
            _ => None,
        }
    }

    /// Numeric training target: M → 1, U → 0
    pub fn target(&self) -> f32 {
        match self {
            Label::Methylated => 1.0,
            Label::Unmethylated => 0.0,
        }
    }
}

/// One CpG site with its strand windows and conversion ratios
///
/// Built once from the input table and held immutable for the run. Both
/// sequence windows are exactly [`WINDOW_LEN`] characters over {A,C,G,T};
/// sites with ambiguous bases never make it into the index.
#[derive(Debug, Clone)]
pub struct CpgRecord {
    /// Chromosome name
    pub chrom: String,
    /// 0-based start position of the context window
    pub start: u64,
    /// Forward-strand window (Watson)
    pub watson_seq: String,
    /// Reverse-complement window (Crick)
    pub crick_seq: String,
    /// Per-position conversion ratios, forward strand
    pub watson_ratios: Vec<f32>,
    /// Per-position conversion ratios, reverse strand
    pub crick_ratios: Vec<f32>,
    /// Methylation call
    pub label: Label,
}

impl CpgRecord {
    /// Record identifier, `"chrom:start"`
    pub fn id(&self) -> String {
        format!("{}:{}", self.chrom, self.start)
    }
}

/// Keyed store of CpG records plus per-class identifier lists
///
/// Identifier lists preserve table order. The skip counters surface lines the
/// parser dropped instead of swallowing them silently.
#[derive(Debug, Default)]
pub struct RecordIndex {
    records: HashMap<String, CpgRecord>,
    /// All identifiers in file order
    pub ids: Vec<String>,
    /// Identifiers labeled M, in file order
    pub methylated_ids: Vec<String>,
    /// Identifiers labeled U, in file order
    pub unmethylated_ids: Vec<String>,
    /// Data lines dropped for having too few or unparseable columns
    pub skipped_malformed: usize,
    /// Data lines dropped because a strand window contained an ambiguous base
    pub skipped_ambiguous: usize,
}

impl RecordIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, registering its id in the class lists
    pub fn insert(&mut self, record: CpgRecord) {
        let id = record.id();
        match record.label {
            Label::Methylated => self.methylated_ids.push(id.clone()),
            Label::Unmethylated => self.unmethylated_ids.push(id.clone()),
        }
        self.ids.push(id.clone());
        self.records.insert(id, record);
    }

    /// Look up a record by identifier
    pub fn get(&self, id: &str) -> Option<&CpgRecord> {
        self.records.get(id)
    }

    /// Total number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of methylated records
    pub fn methylated_count(&self) -> usize {
        self.methylated_ids.len()
    }

    /// Number of unmethylated records
    pub fn unmethylated_count(&self) -> usize {
        self.unmethylated_ids.len()
    }
}
