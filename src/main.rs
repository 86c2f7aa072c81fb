use anyhow::{Context, Result};
use cpgnet::cli::{parse_args, setup_logging, Commands, PredictArgs, TrainArgs};
use cpgnet::data::batch::SampleProvider;
use cpgnet::data::split::{balanced_split, SplitConfig};
use cpgnet::data::table::build_index;
use cpgnet::logging::{ProgressSink, RunLog};
use cpgnet::model::checkpoint::load_checkpoint;
use cpgnet::model::ModelConfig;
use cpgnet::training::trainer::{evaluate, Trainer};
use cpgnet::training::{report::write_report, TrainingConfig};
use cpgnet::{DefaultBackend, TrainingBackend};
use tracing::{error, info};

fn main() {
    let cli = parse_args();

    setup_logging(cli.verbose);

    let result = match cli.command {
        Commands::Train(args) => run_train(args),
        Commands::Predict(args) => run_predict(args),
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    info!("Input file: {:?}", args.input);
    info!("Output directory: {:?}", args.output);

    cpgnet::utils::ensure_dir(&args.output)?;
    let mut sink = RunLog::open(args.output.join("log.txt"))?;

    sink.append_line("data processing ...")?;
    let index = build_index(&args.input)
        .with_context(|| format!("Failed to load site table {:?}", args.input))?;
    sink.append_line(&format!(
        "loaded {} sites (M: {}, U: {}); skipped {} malformed, {} ambiguous",
        index.len(),
        index.methylated_count(),
        index.unmethylated_count(),
        index.skipped_malformed,
        index.skipped_ambiguous,
    ))?;

    let split_config = SplitConfig {
        train_fraction: args.train_fraction,
        valid_fraction: args.valid_fraction,
        test_fraction: args.test_fraction,
        split_seed: args.split_seed,
    };
    sink.append_line(&format!(
        "training: validation: testing is {}:{}:{}",
        split_config.train_fraction, split_config.valid_fraction, split_config.test_fraction
    ))?;
    let splits = balanced_split(&index, &split_config)?;

    let model_config = ModelConfig {
        conv1_channels: args.conv1_channels,
        conv1_kernel: args.conv1_kernel,
        conv2_channels: args.conv2_channels,
        conv2_kernel: args.conv2_kernel,
        hidden_size: args.hidden_size,
        dropout: args.dropout,
    };
    let training_config = TrainingConfig {
        epochs: args.epochs,
        batch_size: args.batch_size,
        learning_rate: args.learning_rate,
        shuffle_seed: args.shuffle_seed,
    };

    let device = Default::default();
    let trainer = Trainer::<TrainingBackend>::new(training_config, model_config, device)
        .with_checkpoint_dir(&args.output)?;

    sink.append_line("training...")?;
    let report_path = args.output.join("testResult.txt");
    let result = trainer
        .train(&index, &splits, &mut sink, &report_path)
        .context("Training failed")?;

    info!(
        "Run finished in {}; test loss {:.6}, test accuracy {:.2}%, test AUC {:.4}",
        cpgnet::utils::format_duration(result.duration_secs),
        result.test_metrics.loss,
        result.test_metrics.accuracy,
        result.test_metrics.auc,
    );
    if let Some(checkpoint) = &result.checkpoint_path {
        info!("Best model saved to {:?}", checkpoint);
    }
    info!("Test report written to {:?}", report_path);

    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    info!("Input file: {:?}", args.input);
    info!("Model: {:?}", args.model);

    let device = Default::default();
    let (model, metadata) = load_checkpoint::<DefaultBackend>(&args.model, &device)
        .with_context(|| format!("Failed to load model from {:?}", args.model))?;
    info!(
        "Scoring with checkpoint from epoch {} (validation AUC {:.4})",
        metadata.epoch, metadata.valid_auc
    );

    let index = build_index(&args.input)
        .with_context(|| format!("Failed to load site table {:?}", args.input))?;

    let provider = SampleProvider::new(&index, &index.ids).with_batch_size(args.batch_size);
    let pass = evaluate(&model, &provider, &device).context("Scoring failed")?;

    write_report(&args.output, &pass.report_rows())?;
    info!("Predictions written to {:?}", args.output);

    Ok(())
}
