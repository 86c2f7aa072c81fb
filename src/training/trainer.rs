use crate::data::batch::{SampleBatch, SampleProvider};
use crate::data::split::SplitIds;
use crate::data::{RecordIndex, MATRIX_ROWS, WINDOW_LEN};
use crate::logging::ProgressSink;
use crate::model::architecture::{init_model, CpgCnn};
use crate::model::checkpoint::{CheckpointManager, CheckpointMetadata};
use crate::model::loss::{binary_cross_entropy, metrics};
use crate::model::ModelConfig;
use crate::training::report::{write_report, ReportRow};
use crate::training::{EvalMetrics, TrainingConfig, TrainingResult, TrainingState};
use anyhow::{anyhow, bail, Context, Result};
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Tensor, TensorData};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Orchestrates the train/validate/test loop
///
/// One logical thread drives the loop; an epoch runs to completion
/// synchronously once started. The only state mutated across epochs is the
/// [`TrainingState`] owned here and the checkpoint file, overwritten wholesale
/// on each strict validation-loss improvement.
pub struct Trainer<B: AutodiffBackend> {
    config: TrainingConfig,
    model_config: ModelConfig,
    device: B::Device,
    checkpoint_manager: Option<CheckpointManager>,
}

impl<B: AutodiffBackend> Trainer<B> {
    /// Create a trainer without checkpointing
    pub fn new(config: TrainingConfig, model_config: ModelConfig, device: B::Device) -> Self {
        Self {
            config,
            model_config,
            device,
            checkpoint_manager: None,
        }
    }

    /// Enable checkpointing into `checkpoint_dir`
    pub fn with_checkpoint_dir<P: AsRef<Path>>(mut self, checkpoint_dir: P) -> Result<Self> {
        self.checkpoint_manager = Some(CheckpointManager::new(checkpoint_dir)?);
        Ok(self)
    }

    /// Run the full loop and write the test report to `report_path`
    pub fn train<P: AsRef<Path>>(
        &self,
        index: &RecordIndex,
        splits: &SplitIds,
        sink: &mut dyn ProgressSink,
        report_path: P,
    ) -> Result<TrainingResult> {
        if splits.train.is_empty() || splits.valid.is_empty() || splits.test.is_empty() {
            bail!(
                "all three splits must be non-empty (train: {}, valid: {}, test: {})",
                splits.train.len(),
                splits.valid.len(),
                splits.test.len()
            );
        }

        let start = Instant::now();
        info!("Training configuration: {:?}", self.config);

        // Distinct random streams: the split was seeded upstream; shuffling
        // and dropout get their own, entropy-seeded unless pinned.
        let mut shuffle_rng = match self.config.shuffle_seed {
            Some(seed) => {
                B::seed(seed);
                ChaCha8Rng::seed_from_u64(seed)
            }
            None => ChaCha8Rng::from_entropy(),
        };

        let train_provider =
            SampleProvider::new(index, &splits.train).with_batch_size(self.config.batch_size);
        let valid_provider =
            SampleProvider::new(index, &splits.valid).with_batch_size(self.config.batch_size);
        let test_provider =
            SampleProvider::new(index, &splits.test).with_batch_size(self.config.batch_size);

        let mut model = init_model::<B>(&self.model_config, &self.device)?;
        let mut optim = AdamConfig::new().init();
        let mut state = TrainingState::new();
        let mut checkpoint_path = None;

        for epoch in 1..=self.config.epochs {
            // TRAIN_EPOCH
            let mut pass = EvalPass::default();
            for batch in train_provider.batches_shuffled(&mut shuffle_rng)? {
                let (input, targets) = to_tensors::<B>(&batch, &self.device);
                let probs = model.forward(input);
                let loss = binary_cross_entropy(probs.clone(), targets);

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optim.step(self.config.learning_rate, model, grads);

                pass.absorb(&batch, probs, loss)?;
            }
            let train_loss = pass.mean_loss(train_provider.len());
            let train_acc = pass.accuracy_percent();
            let train_auc = pass.auc()?;
            debug!("Epoch {} train AUC: {:.4}", epoch, train_auc);

            // VALIDATE_EPOCH: no updates, no dropout
            let valid_pass = evaluate(&model.valid(), &valid_provider, &self.device)?;
            let valid_loss = valid_pass.mean_loss(valid_provider.len());
            let valid_acc = valid_pass.accuracy_percent();

            sink.append_line(&format!(
                "Epoch: {} | training_loss: {:.6} | training_acc: {:.2}% | validation_loss: {:.6} | validation_acc: {:.2}%",
                epoch, train_loss, train_acc, valid_loss, valid_acc
            ))?;

            if state.improved(valid_loss) {
                let valid_auc = valid_pass.auc()?;
                state.best_valid_loss = Some(valid_loss);
                state.best_valid_accuracy = Some(valid_acc);
                state.best_valid_auc = Some(valid_auc);
                state.best_train_auc = Some(train_auc);

                if let Some(manager) = &self.checkpoint_manager {
                    let metadata = CheckpointMetadata {
                        epoch,
                        valid_loss,
                        valid_accuracy: valid_acc,
                        valid_auc,
                        model_config: self.model_config.clone(),
                    };
                    checkpoint_path = Some(manager.save(&model, &metadata)?);
                }
            }

            state.push_epoch(epoch, train_loss, train_acc, valid_loss, valid_acc);
        }

        sink.append_line("training finish =====================")?;
        // Validation loss never improving (e.g. all-NaN losses) leaves the
        // best-epoch records unset; that is an error, not a silent fallback.
        let best_train_auc = state
            .best_train_auc
            .context("validation loss never improved; no best epoch was recorded")?;
        let best_valid_auc = state
            .best_valid_auc
            .context("validation loss never improved; no best epoch was recorded")?;
        sink.append_line(&format!("training_auc: {}", best_train_auc))?;
        sink.append_line(&format!("validation_auc: {}", best_valid_auc))?;

        // TESTING: once, with the final (not best-checkpoint) parameters
        sink.append_line("testing...")?;
        let test_pass = evaluate(&model.valid(), &test_provider, &self.device)?;
        let test_metrics = EvalMetrics {
            loss: test_pass.mean_loss(test_provider.len()),
            accuracy: test_pass.accuracy_percent(),
            auc: test_pass.auc()?,
        };

        write_report(report_path.as_ref(), &test_pass.report_rows())?;

        sink.append_line("testing finish =====================")?;
        sink.append_line(&format!("testing_auc: {}", test_metrics.auc))?;

        Ok(TrainingResult {
            state,
            checkpoint_path,
            test_metrics,
            duration_secs: start.elapsed().as_secs_f64(),
        })
    }
}

/// Accumulated outputs of one pass over a split
#[derive(Debug, Default)]
pub struct EvalPass {
    loss_sum: f64,
    outputs: Vec<f32>,
    labels: Vec<f32>,
    ids: Vec<String>,
}

impl EvalPass {
    fn absorb<B: Backend>(
        &mut self,
        batch: &SampleBatch,
        probs: Tensor<B, 2>,
        loss: Tensor<B, 1>,
    ) -> Result<()> {
        self.loss_sum += loss.into_scalar().elem::<f64>();
        let outputs = probs
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("failed to read model outputs: {:?}", e))?;
        self.outputs.extend(outputs);
        self.labels.extend_from_slice(&batch.labels);
        self.ids.extend_from_slice(&batch.ids);
        Ok(())
    }

    /// Summed batch losses divided by the split size
    fn mean_loss(&self, split_len: usize) -> f64 {
        self.loss_sum / split_len as f64
    }

    fn accuracy_percent(&self) -> f64 {
        metrics::correct_count(&self.outputs, &self.labels) as f64 / self.labels.len() as f64
            * 100.0
    }

    fn auc(&self) -> Result<f64> {
        metrics::roc_auc(&self.labels, &self.outputs)
    }

    /// Per-sample rows for the prediction report, in pass order
    pub fn report_rows(&self) -> Vec<ReportRow> {
        self.ids
            .iter()
            .zip(self.labels.iter().zip(&self.outputs))
            .map(|(id, (&label, &output))| ReportRow {
                id: id.clone(),
                label,
                output,
            })
            .collect()
    }
}

/// Forward a whole split in order, accumulating losses, outputs and ids
///
/// Works on any backend; pass an autodiff-free model to keep dropout and
/// parameter updates disabled.
pub fn evaluate<B: Backend>(
    model: &CpgCnn<B>,
    provider: &SampleProvider<'_>,
    device: &B::Device,
) -> Result<EvalPass> {
    let mut pass = EvalPass::default();
    for batch in provider.batches_ordered()? {
        let (input, targets) = to_tensors::<B>(&batch, device);
        let probs = model.forward(input);
        let loss = binary_cross_entropy(probs.clone(), targets);
        pass.absorb(&batch, probs, loss)?;
    }
    Ok(pass)
}

fn to_tensors<B: Backend>(
    batch: &SampleBatch,
    device: &B::Device,
) -> (Tensor<B, 3>, Tensor<B, 2>) {
    let n = batch.len();
    let input = Tensor::from_data(
        TensorData::new(batch.matrices.clone(), [n, MATRIX_ROWS, WINDOW_LEN]),
        device,
    );
    let targets = Tensor::from_data(TensorData::new(batch.labels.clone(), [n, 1]), device);
    (input, targets)
}
