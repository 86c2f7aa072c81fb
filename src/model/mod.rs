pub mod architecture;
pub mod checkpoint;
pub mod loss;

use crate::data::{MATRIX_ROWS, WINDOW_LEN};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Classifier hyperparameters
///
/// The width of the first fully-connected layer is not a free parameter: it is
/// derived from the convolution hyperparameters and the fixed input length at
/// construction time, so a kernel/channel override can never silently mismatch
/// the flatten step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Output channels of the first convolution
    pub conv1_channels: usize,
    /// Kernel size of the first convolution
    pub conv1_kernel: usize,
    /// Output channels of the second convolution
    pub conv2_channels: usize,
    /// Kernel size of the second convolution
    pub conv2_kernel: usize,
    /// Width of the hidden fully-connected layer
    pub hidden_size: usize,
    /// Dropout rate applied after the hidden layer at training time
    pub dropout: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            conv1_channels: 64,
            conv1_kernel: 4,
            conv2_channels: 64,
            conv2_kernel: 4,
            hidden_size: 10,
            dropout: 0.5,
        }
    }
}

impl ModelConfig {
    /// Sequence length remaining after both stride-1 valid convolutions
    pub fn conv_output_len(&self) -> Result<usize> {
        if self.conv1_kernel == 0 || self.conv2_kernel == 0 {
            bail!("kernel sizes must be non-zero");
        }
        let shrink = (self.conv1_kernel - 1) + (self.conv2_kernel - 1);
        if shrink >= WINDOW_LEN {
            bail!(
                "kernel sizes {}/{} leave no output for input length {}",
                self.conv1_kernel,
                self.conv2_kernel,
                WINDOW_LEN
            );
        }
        Ok(WINDOW_LEN - shrink)
    }

    /// Input width of the first fully-connected layer (320 for the defaults)
    pub fn flattened_size(&self) -> Result<usize> {
        Ok(self.conv2_channels * self.conv_output_len()?)
    }

    /// Check the configuration is constructible
    pub fn validate(&self) -> Result<()> {
        if self.conv1_channels == 0 || self.conv2_channels == 0 || self.hidden_size == 0 {
            bail!("channel counts and hidden size must be non-zero");
        }
        if !(0.0..1.0).contains(&self.dropout) {
            bail!("dropout must be in [0, 1), got {}", self.dropout);
        }
        self.conv_output_len()?;
        Ok(())
    }

    /// Number of input channels (4 nucleotides × 2 strands)
    pub const fn input_channels() -> usize {
        MATRIX_ROWS
    }

    /// Builder-style dropout override
    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }
}
