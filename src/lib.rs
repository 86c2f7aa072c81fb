//! # cpgnet: CpG methylation state classifier
//!
//! cpgnet classifies genomic CpG sites as methylated (M) or unmethylated (U)
//! from an 11-base sequence context plus per-base strand conversion ratios,
//! using a small 1-D convolutional network.
//!
//! ## Pipeline
//!
//! 1. Parse the tab-separated site table into a keyed record index
//! 2. Equalize class counts by down-sampling and split into train/validation/test
//! 3. Encode each site into an 8×11 matrix (4 nucleotide rows × 2 strands)
//! 4. Train the CNN, checkpointing whenever validation loss improves
//! 5. Evaluate on the test split and write a per-site prediction report
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cpgnet::data::split::{balanced_split, SplitConfig};
//! use cpgnet::data::table::build_index;
//! use cpgnet::logging::RunLog;
//! use cpgnet::model::ModelConfig;
//! use cpgnet::training::{trainer::Trainer, TrainingConfig};
//! use cpgnet::TrainingBackend;
//!
//! let index = build_index("sites.txt").unwrap();
//! let splits = balanced_split(&index, &SplitConfig::default()).unwrap();
//!
//! let device = Default::default();
//! let trainer = Trainer::<TrainingBackend>::new(
//!     TrainingConfig::default(),
//!     ModelConfig::default(),
//!     device,
//! )
//! .with_checkpoint_dir("out")
//! .unwrap();
//!
//! let mut sink = RunLog::open("out/log.txt").unwrap();
//! let result = trainer
//!     .train(&index, &splits, &mut sink, "out/testResult.txt")
//!     .unwrap();
//! println!("test AUC: {}", result.test_metrics.auc);
//! ```

pub mod cli;
pub mod data;
pub mod logging;
pub mod model;
pub mod training;
pub mod utils;

use burn::backend::Autodiff;
use burn_ndarray::NdArray;

/// Default inference backend
pub type DefaultBackend = NdArray<f32>;

/// Backend used for training (gradient-enabled)
pub type TrainingBackend = Autodiff<NdArray<f32>>;

/// Re-export commonly used types
pub use data::{CpgRecord, Label, RecordIndex};
pub use model::{architecture::CpgCnn, ModelConfig};
pub use training::{TrainingConfig, TrainingResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
