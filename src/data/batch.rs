//! Batched sample provider
//!
//! Wraps the record index and one identifier set, yielding fixed-size batches
//! of encoded samples. The train split is re-shuffled before every epoch;
//! validation and test are always walked in table identifier order. No I/O
//! happens here, only indexing and encoding.

use crate::data::encoder::encode_site;
use crate::data::{RecordIndex, MATRIX_ROWS, WINDOW_LEN};
use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;

/// Default batch size
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// One batch of encoded samples
///
/// `matrices` is row-major `[len, 8, 11]`; `labels` holds one 0/1 target per
/// sample.
#[derive(Debug, Clone)]
pub struct SampleBatch {
    /// Flattened sample matrices
    pub matrices: Vec<f32>,
    /// Numeric targets (M → 1, U → 0)
    pub labels: Vec<f32>,
    /// Originating identifiers
    pub ids: Vec<String>,
}

impl SampleBatch {
    /// Number of samples in the batch
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Random-access view over one split's identifiers
pub struct SampleProvider<'a> {
    index: &'a RecordIndex,
    ids: &'a [String],
    batch_size: usize,
}

impl<'a> SampleProvider<'a> {
    /// Create a provider over `ids` with the default batch size
    pub fn new(index: &'a RecordIndex, ids: &'a [String]) -> Self {
        Self {
            index,
            ids,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Override the batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Number of samples in the split
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the split is empty
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Retrieve one sample by position: (encoded 8×11 matrix, target, id)
    pub fn get(&self, pos: usize) -> Result<(Vec<f32>, f32, &'a str)> {
        let id = self.ids.get(pos).context("sample position out of range")?;
        let record = self
            .index
            .get(id)
            .with_context(|| format!("identifier {} missing from record index", id))?;
        Ok((encode_site(record), record.label.target(), id.as_str()))
    }

    /// Batches in table identifier order (validation and test)
    pub fn batches_ordered(&self) -> Result<Vec<SampleBatch>> {
        let order: Vec<usize> = (0..self.len()).collect();
        self.batches_in(&order)
    }

    /// Batches in a freshly shuffled order (training); call once per epoch
    pub fn batches_shuffled<R: Rng>(&self, rng: &mut R) -> Result<Vec<SampleBatch>> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(rng);
        self.batches_in(&order)
    }

    fn batches_in(&self, order: &[usize]) -> Result<Vec<SampleBatch>> {
        let sample_len = MATRIX_ROWS * WINDOW_LEN;
        order
            .chunks(self.batch_size)
            .map(|chunk| {
                let mut batch = SampleBatch {
                    matrices: Vec::with_capacity(chunk.len() * sample_len),
                    labels: Vec::with_capacity(chunk.len()),
                    ids: Vec::with_capacity(chunk.len()),
                };
                for &pos in chunk {
                    let (matrix, label, id) = self.get(pos)?;
                    batch.matrices.extend(matrix);
                    batch.labels.push(label);
                    batch.ids.push(id.to_string());
                }
                Ok(batch)
            })
            .collect()
    }
}
