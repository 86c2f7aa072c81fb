use crate::model::ModelConfig;
use anyhow::Result;
use burn::module::Module;
use burn::nn::conv::{Conv1d, Conv1dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig};
use burn::tensor::activation::{relu, sigmoid};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// CpG methylation classifier
///
/// Two 1-D convolution stages over the 8×11 sample matrix, flattened into two
/// fully-connected stages ending in a sigmoid. The output is one probability
/// per sample, interpreted as P(methylated).
#[derive(Module, Debug)]
pub struct CpgCnn<B: Backend> {
    conv1: Conv1d<B>,
    norm1: BatchNorm<B, 1>,
    conv2: Conv1d<B>,
    norm2: BatchNorm<B, 1>,
    fc1: Linear<B>,
    dropout: Dropout,
    fc2: Linear<B>,
}

impl<B: Backend> CpgCnn<B> {
    /// Forward pass: `[batch, 8, 11]` → `[batch, 1]` probabilities in (0, 1)
    ///
    /// Dropout and batch statistics follow the backend's autodiff mode, so the
    /// same method serves training and evaluation.
    pub fn forward(&self, input: Tensor<B, 3>) -> Tensor<B, 2> {
        let x = relu(self.norm1.forward(self.conv1.forward(input)));
        let x = relu(self.norm2.forward(self.conv2.forward(x)));

        let [batch, channels, len] = x.dims();
        let x = x.reshape([batch, channels * len]);

        let x = relu(self.dropout.forward(self.fc1.forward(x)));
        sigmoid(self.fc2.forward(x))
    }
}

/// Build the model, deriving the flatten width from the configuration
///
/// Fails fast on a configuration whose convolutions consume the whole window,
/// instead of panicking inside a forward pass.
pub fn init_model<B: Backend>(config: &ModelConfig, device: &B::Device) -> Result<CpgCnn<B>> {
    config.validate()?;
    let flattened = config.flattened_size()?;

    let conv1 = Conv1dConfig::new(
        ModelConfig::input_channels(),
        config.conv1_channels,
        config.conv1_kernel,
    )
    .init(device);
    let norm1 = BatchNormConfig::new(config.conv1_channels).init(device);

    let conv2 = Conv1dConfig::new(config.conv1_channels, config.conv2_channels, config.conv2_kernel)
        .init(device);
    let norm2 = BatchNormConfig::new(config.conv2_channels).init(device);

    let fc1 = LinearConfig::new(flattened, config.hidden_size).init(device);
    let dropout = DropoutConfig::new(config.dropout).init();
    let fc2 = LinearConfig::new(config.hidden_size, 1).init(device);

    Ok(CpgCnn {
        conv1,
        norm1,
        conv2,
        norm2,
        fc1,
        dropout,
        fc2,
    })
}
