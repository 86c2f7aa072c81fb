//! Balanced splitting
//!
//! Equalizes the two class counts by down-sampling the majority class, then
//! partitions each class independently into train/validation/test with a
//! two-stage stratified split. All sampling draws from a single RNG seeded
//! with the split seed, so the partition is reproducible run-to-run.

use crate::data::RecordIndex;
use crate::utils::validation;
use anyhow::{bail, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Split fractions and seed
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Training fraction
    pub train_fraction: f64,
    /// Validation fraction
    pub valid_fraction: f64,
    /// Test fraction
    pub test_fraction: f64,
    /// Seed for down-sampling and partitioning; distinct from the per-epoch
    /// shuffle seed
    pub split_seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.70,
            valid_fraction: 0.15,
            test_fraction: 0.15,
            split_seed: 10,
        }
    }
}

impl SplitConfig {
    /// Validate fractions: each in (0,1), summing to 1
    pub fn validate(&self) -> Result<()> {
        for (value, name) in [
            (self.train_fraction, "train fraction"),
            (self.valid_fraction, "validation fraction"),
            (self.test_fraction, "test fraction"),
        ] {
            validation::positive(value, name)?;
            validation::in_range(value, 0.0, 1.0, name)?;
        }
        let sum = self.train_fraction + self.valid_fraction + self.test_fraction;
        if (sum - 1.0).abs() > 1e-6 {
            bail!("split fractions must sum to 1, got {}", sum);
        }
        Ok(())
    }

    /// Fraction held out of training (validation + test)
    pub fn holdout_fraction(&self) -> f64 {
        self.valid_fraction + self.test_fraction
    }

    /// Share of the holdout that goes to the test set
    pub fn test_share(&self) -> f64 {
        self.test_fraction / self.holdout_fraction()
    }
}

/// Identifier sets for the three splits
#[derive(Debug, Clone)]
pub struct SplitIds {
    /// Training identifiers (both classes concatenated)
    pub train: Vec<String>,
    /// Validation identifiers
    pub valid: Vec<String>,
    /// Test identifiers
    pub test: Vec<String>,
}

impl SplitIds {
    /// Total identifiers across the three sets
    pub fn total(&self) -> usize {
        self.train.len() + self.valid.len() + self.test.len()
    }
}

/// Down-sample the majority class and partition both classes
///
/// The three output sets are pairwise disjoint and their union is exactly the
/// equalized identifiers: `total() == 2 * min(|M|, |U|)`.
pub fn balanced_split(index: &RecordIndex, config: &SplitConfig) -> Result<SplitIds> {
    config.validate()?;

    let m_count = index.methylated_count();
    let u_count = index.unmethylated_count();
    if m_count == 0 || u_count == 0 {
        bail!(
            "cannot split with an empty class (M: {}, U: {})",
            m_count,
            u_count
        );
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.split_seed);
    let per_class = m_count.min(u_count);

    let m_ids = equalize(&index.methylated_ids, per_class, &mut rng);
    let u_ids = equalize(&index.unmethylated_ids, per_class, &mut rng);
    info!(
        "Equalized classes to {} sites each (from M: {}, U: {})",
        per_class, m_count, u_count
    );

    let (m_train, m_valid, m_test) = split_class(m_ids, config, &mut rng);
    let (u_train, u_valid, u_test) = split_class(u_ids, config, &mut rng);

    let splits = SplitIds {
        train: concat(m_train, u_train),
        valid: concat(m_valid, u_valid),
        test: concat(m_test, u_test),
    };
    info!(
        "Split sizes: train={}, valid={}, test={}",
        splits.train.len(),
        splits.valid.len(),
        splits.test.len()
    );
    Ok(splits)
}

/// Draw `count` ids without replacement; the minority class passes through
fn equalize(ids: &[String], count: usize, rng: &mut ChaCha8Rng) -> Vec<String> {
    if ids.len() == count {
        ids.to_vec()
    } else {
        ids.choose_multiple(rng, count).cloned().collect()
    }
}

/// Two-stage split of one class: shuffle, peel off the holdout, then divide
/// the holdout into test and validation
fn split_class(
    mut ids: Vec<String>,
    config: &SplitConfig,
    rng: &mut ChaCha8Rng,
) -> (Vec<String>, Vec<String>, Vec<String>) {
    ids.shuffle(rng);

    let n = ids.len();
    let n_holdout = ((n as f64) * config.holdout_fraction()).ceil() as usize;
    let holdout = ids.split_off(n - n_holdout.min(n));

    let n_test = ((holdout.len() as f64) * config.test_share()).ceil() as usize;
    let test = holdout[..n_test].to_vec();
    let valid = holdout[n_test..].to_vec();

    (ids, valid, test)
}

fn concat(mut a: Vec<String>, b: Vec<String>) -> Vec<String> {
    a.extend(b);
    a
}
