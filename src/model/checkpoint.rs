use crate::model::architecture::{init_model, CpgCnn};
use crate::model::ModelConfig;
use anyhow::{Context, Result};
use burn::module::Module;
use burn::record::{CompactRecorder, Recorder};
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Weights file name inside the output directory
pub const CHECKPOINT_FILE: &str = "best_model.mpk";

/// Metadata stored next to the weights
///
/// Carries enough to rebuild an identically-configured model on load, plus
/// the validation metrics at the epoch the snapshot was taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// 1-based epoch the snapshot was taken at
    pub epoch: usize,
    /// Mean validation loss at that epoch
    pub valid_loss: f64,
    /// Validation accuracy (percent) at that epoch
    pub valid_accuracy: f64,
    /// Validation AUC at that epoch
    pub valid_auc: f64,
    /// Hyperparameters the weights were trained with
    pub model_config: ModelConfig,
}

/// Writes and reads the single best-model snapshot
///
/// The snapshot is overwritten wholesale on every save; there is exactly one
/// checkpoint per run.
pub struct CheckpointManager {
    checkpoint_dir: PathBuf,
}

impl CheckpointManager {
    /// Create a manager, creating the directory if needed
    pub fn new<P: AsRef<Path>>(checkpoint_dir: P) -> Result<Self> {
        let checkpoint_dir = checkpoint_dir.as_ref().to_path_buf();
        fs::create_dir_all(&checkpoint_dir).context("Failed to create checkpoint directory")?;
        Ok(Self { checkpoint_dir })
    }

    /// Path of the weights file
    pub fn checkpoint_path(&self) -> PathBuf {
        self.checkpoint_dir.join(CHECKPOINT_FILE)
    }

    /// Persist the current parameters and metadata
    pub fn save<B: Backend>(
        &self,
        model: &CpgCnn<B>,
        metadata: &CheckpointMetadata,
    ) -> Result<PathBuf> {
        let path = self.checkpoint_path();

        let record = model.clone().into_record();
        CompactRecorder::new()
            .record(record, path.clone())
            .context("Failed to save model checkpoint")?;

        let metadata_json =
            serde_json::to_string_pretty(metadata).context("Failed to serialize metadata")?;
        fs::write(path.with_extension("json"), metadata_json)
            .context("Failed to write checkpoint metadata")?;

        info!("Saved checkpoint at epoch {}: {:?}", metadata.epoch, path);
        Ok(path)
    }

    /// Load the snapshot back into a model configured from its metadata
    pub fn load<B: Backend>(&self, device: &B::Device) -> Result<(CpgCnn<B>, CheckpointMetadata)> {
        load_checkpoint(&self.checkpoint_path(), device)
    }
}

/// Load a checkpoint from an explicit weights path (metadata JSON alongside)
pub fn load_checkpoint<B: Backend>(
    path: &Path,
    device: &B::Device,
) -> Result<(CpgCnn<B>, CheckpointMetadata)> {
    info!("Loading checkpoint from {:?}", path);

    let metadata_path = path.with_extension("json");
    let metadata_json = fs::read_to_string(&metadata_path)
        .with_context(|| format!("Failed to read checkpoint metadata {:?}", metadata_path))?;
    let metadata: CheckpointMetadata =
        serde_json::from_str(&metadata_json).context("Failed to parse checkpoint metadata")?;

    let record = CompactRecorder::new()
        .load(path.to_path_buf(), device)
        .context("Failed to load model checkpoint")?;
    let model = init_model::<B>(&metadata.model_config, device)?.load_record(record);

    info!("Loaded checkpoint from epoch {}", metadata.epoch);
    Ok((model, metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MATRIX_ROWS, WINDOW_LEN};
    use burn::backend::NdArray;
    use burn::tensor::{Tensor, TensorData};
    use tempfile::TempDir;

    type TestBackend = NdArray<f32>;

    fn metadata() -> CheckpointMetadata {
        CheckpointMetadata {
            epoch: 7,
            valid_loss: 0.31,
            valid_accuracy: 84.2,
            valid_auc: 0.91,
            model_config: ModelConfig::default(),
        }
    }

    #[test]
    fn test_save_load_roundtrip_preserves_outputs() {
        let temp = TempDir::new().unwrap();
        let manager = CheckpointManager::new(temp.path()).unwrap();
        let device = Default::default();

        let model = init_model::<TestBackend>(&ModelConfig::default(), &device).unwrap();
        let path = manager.save(&model, &metadata()).unwrap();
        assert!(path.exists());
        assert!(path.with_extension("json").exists());

        let (loaded, meta) = manager.load::<TestBackend>(&device).unwrap();
        assert_eq!(meta.epoch, 7);

        let data: Vec<f32> = (0..MATRIX_ROWS * WINDOW_LEN).map(|i| i as f32 / 88.0).collect();
        let input = Tensor::<TestBackend, 3>::from_data(
            TensorData::new(data, [1, MATRIX_ROWS, WINDOW_LEN]),
            &device,
        );
        let before = model.forward(input.clone()).into_data().to_vec::<f32>().unwrap();
        let after = loaded.forward(input).into_data().to_vec::<f32>().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let temp = TempDir::new().unwrap();
        let manager = CheckpointManager::new(temp.path()).unwrap();
        let device = Default::default();

        let first = init_model::<TestBackend>(&ModelConfig::default(), &device).unwrap();
        manager.save(&first, &metadata()).unwrap();

        let second = init_model::<TestBackend>(&ModelConfig::default(), &device).unwrap();
        let mut meta = metadata();
        meta.epoch = 9;
        manager.save(&second, &meta).unwrap();

        let (loaded, loaded_meta) = manager.load::<TestBackend>(&device).unwrap();
        assert_eq!(loaded_meta.epoch, 9);

        let data: Vec<f32> = vec![0.5; MATRIX_ROWS * WINDOW_LEN];
        let input = Tensor::<TestBackend, 3>::from_data(
            TensorData::new(data, [1, MATRIX_ROWS, WINDOW_LEN]),
            &device,
        );
        let want = second.forward(input.clone()).into_data().to_vec::<f32>().unwrap();
        let got = loaded.forward(input).into_data().to_vec::<f32>().unwrap();
        assert_eq!(want, got);
    }

    #[test]
    fn test_load_missing_checkpoint_fails() {
        let temp = TempDir::new().unwrap();
        let manager = CheckpointManager::new(temp.path()).unwrap();
        let device = Default::default();
        assert!(manager.load::<TestBackend>(&device).is_err());
    }
}
