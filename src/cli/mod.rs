use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cpgnet: CpG methylation state classifier
#[derive(Parser, Debug)]
#[command(name = "cpgnet")]
#[command(about = "CpG methylation state classifier using a 1-D CNN")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a model from a site table and evaluate it on the held-out split
    Train(TrainArgs),

    /// Score a site table with a trained checkpoint
    Predict(PredictArgs),
}

/// Training arguments
#[derive(Parser, Debug)]
pub struct TrainArgs {
    /// Input site table (tab-separated, optionally gzipped)
    #[arg(short, long, required = true)]
    pub input: PathBuf,

    /// Output directory for checkpoint, log and test report
    #[arg(short, long, default_value = "./output")]
    pub output: PathBuf,

    /// Number of training epochs
    #[arg(short, long, default_value = "100")]
    pub epochs: usize,

    /// Batch size
    #[arg(short, long, default_value = "64")]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value = "0.001")]
    pub learning_rate: f64,

    /// Training fraction
    #[arg(long, default_value = "0.70")]
    pub train_fraction: f64,

    /// Validation fraction
    #[arg(long, default_value = "0.15")]
    pub valid_fraction: f64,

    /// Test fraction
    #[arg(long, default_value = "0.15")]
    pub test_fraction: f64,

    /// Seed for class down-sampling and the train/validation/test partition
    #[arg(long, default_value = "10")]
    pub split_seed: u64,

    /// Seed for per-epoch shuffling and dropout; entropy-seeded when omitted
    #[arg(long)]
    pub shuffle_seed: Option<u64>,

    /// Output channels of the first convolution
    #[arg(long, default_value = "64")]
    pub conv1_channels: usize,

    /// Kernel size of the first convolution
    #[arg(long, default_value = "4")]
    pub conv1_kernel: usize,

    /// Output channels of the second convolution
    #[arg(long, default_value = "64")]
    pub conv2_channels: usize,

    /// Kernel size of the second convolution
    #[arg(long, default_value = "4")]
    pub conv2_kernel: usize,

    /// Width of the hidden fully-connected layer
    #[arg(long, default_value = "10")]
    pub hidden_size: usize,

    /// Dropout rate after the hidden layer
    #[arg(long, default_value = "0.5")]
    pub dropout: f64,
}

/// Prediction arguments
#[derive(Parser, Debug)]
pub struct PredictArgs {
    /// Input site table (tab-separated, optionally gzipped)
    #[arg(short, long, required = true)]
    pub input: PathBuf,

    /// Model checkpoint file (metadata JSON expected alongside)
    #[arg(short, long, required = true)]
    pub model: PathBuf,

    /// Output report file
    #[arg(short, long, default_value = "predictions.txt")]
    pub output: PathBuf,

    /// Batch size for scoring
    #[arg(short, long, default_value = "64")]
    pub batch_size: usize,
}

/// Parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Setup logging based on verbosity
pub fn setup_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
