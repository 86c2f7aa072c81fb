pub mod report;
pub mod trainer;

use serde::{Deserialize, Serialize};

/// Training hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of epochs
    pub epochs: usize,
    /// Batch size
    pub batch_size: usize,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Seed for per-epoch shuffling; entropy-seeded when absent, so epoch
    /// order is irreproducible unless a seed is given explicitly
    pub shuffle_seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            batch_size: 64,
            learning_rate: 0.001,
            shuffle_seed: None,
        }
    }
}

/// Mutable loop state, reset at run start and discarded at run end
#[derive(Debug, Clone, Default)]
pub struct TrainingState {
    /// Last completed epoch (1-based)
    pub epoch: usize,
    /// Lowest mean validation loss seen so far
    pub best_valid_loss: Option<f64>,
    /// Validation accuracy at the best epoch
    pub best_valid_accuracy: Option<f64>,
    /// Validation AUC at the best epoch
    pub best_valid_auc: Option<f64>,
    /// Training AUC at the best epoch
    pub best_train_auc: Option<f64>,
    /// Per-epoch mean training loss
    pub train_loss_history: Vec<f64>,
    /// Per-epoch mean validation loss
    pub valid_loss_history: Vec<f64>,
    /// Per-epoch training accuracy (percent)
    pub train_acc_history: Vec<f64>,
    /// Per-epoch validation accuracy (percent)
    pub valid_acc_history: Vec<f64>,
}

impl TrainingState {
    /// Fresh state
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict-improvement rule: ties do not count, and NaN never improves
    pub fn improved(&self, valid_loss: f64) -> bool {
        if valid_loss.is_nan() {
            return false;
        }
        match self.best_valid_loss {
            None => true,
            Some(best) => valid_loss < best,
        }
    }

    /// Record one completed epoch's curves
    pub fn push_epoch(
        &mut self,
        epoch: usize,
        train_loss: f64,
        train_acc: f64,
        valid_loss: f64,
        valid_acc: f64,
    ) {
        self.epoch = epoch;
        self.train_loss_history.push(train_loss);
        self.train_acc_history.push(train_acc);
        self.valid_loss_history.push(valid_loss);
        self.valid_acc_history.push(valid_acc);
    }
}

/// Metrics of one evaluation pass
#[derive(Debug, Clone, Default)]
pub struct EvalMetrics {
    /// Mean loss over the split
    pub loss: f64,
    /// Accuracy in percent
    pub accuracy: f64,
    /// Area under the ROC curve
    pub auc: f64,
}

/// Outcome of a full train/validate/test run
#[derive(Debug, Clone)]
pub struct TrainingResult {
    /// Final loop state (histories and best-epoch records)
    pub state: TrainingState,
    /// Path of the best-validation checkpoint
    pub checkpoint_path: Option<std::path::PathBuf>,
    /// Test-split metrics under the final parameters
    pub test_metrics: EvalMetrics,
    /// Wall-clock duration in seconds
    pub duration_secs: f64,
}
