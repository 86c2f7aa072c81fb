//! End-to-end training run on a small synthetic site table.

use cpgnet::data::split::{balanced_split, SplitConfig};
use cpgnet::data::table::build_index;
use cpgnet::logging::ProgressSink;
use cpgnet::model::checkpoint::load_checkpoint;
use cpgnet::model::ModelConfig;
use cpgnet::training::report::REPORT_HEADER;
use cpgnet::training::trainer::Trainer;
use cpgnet::training::TrainingConfig;
use cpgnet::{DefaultBackend, TrainingBackend};
use std::collections::HashSet;
use std::fmt::Write as _;
use tempfile::TempDir;

const CONTEXTS: [&str; 4] = ["ACGTACGTACGT", "TTGCATGCATGC", "GGCCAATTGGCC", "CAGTCAGTCAGT"];

/// Tab-separated table with `per_class` M and U rows each; ratios track the
/// label so the classes are separable.
fn synthetic_table(per_class: usize) -> String {
    let mut table = String::from("chr\tp1\tp2\tcontext\tmetDens\tlabel");
    for i in 1..=11 {
        write!(table, "\tW_{}", i).unwrap();
    }
    for i in 1..=11 {
        write!(table, "\tC_{}", i).unwrap();
    }
    table.push('\n');

    for i in 0..2 * per_class {
        let methylated = i % 2 == 0;
        let label = if methylated { "M" } else { "U" };
        let base = if methylated { 0.8 } else { 0.2 };
        let start = 1000 + i as u64 * 100;
        write!(
            table,
            "chr{}\t{}\t{}\t{}\t0.5\t{}",
            (i % 3) + 1,
            start,
            start + 12,
            CONTEXTS[i % CONTEXTS.len()],
            label
        )
        .unwrap();
        for pos in 0..22 {
            write!(table, "\t{:.3}", base + (pos as f32) * 0.005).unwrap();
        }
        table.push('\n');
    }
    table
}

#[test]
fn full_run_produces_checkpoint_and_report() {
    let temp = TempDir::new().unwrap();
    let table_path = temp.path().join("sites.txt");
    std::fs::write(&table_path, synthetic_table(20)).unwrap();

    let index = build_index(&table_path).unwrap();
    assert_eq!(index.len(), 40);
    assert_eq!(index.methylated_count(), 20);
    assert_eq!(index.skipped_malformed, 0);

    let splits = balanced_split(&index, &SplitConfig::default()).unwrap();
    assert_eq!(splits.total(), 40);

    // all three splits carry both classes in equal shares
    let m_ids: HashSet<_> = index.methylated_ids.iter().cloned().collect();
    for ids in [&splits.train, &splits.valid, &splits.test] {
        let m = ids.iter().filter(|id| m_ids.contains(*id)).count();
        assert_eq!(m * 2, ids.len());
    }

    let model_config = ModelConfig {
        conv1_channels: 8,
        conv2_channels: 8,
        conv1_kernel: 3,
        conv2_kernel: 3,
        hidden_size: 4,
        dropout: 0.5,
    };
    let training_config = TrainingConfig {
        epochs: 3,
        batch_size: 8,
        learning_rate: 0.01,
        shuffle_seed: Some(11),
    };
    let trainer = Trainer::<TrainingBackend>::new(training_config, model_config, Default::default())
        .with_checkpoint_dir(temp.path())
        .unwrap();

    let report_path = temp.path().join("testResult.txt");
    let mut sink: Vec<String> = Vec::new();
    let result = trainer.train(&index, &splits, &mut sink, &report_path).unwrap();

    // progress lines: one per epoch plus the summary block
    assert_eq!(sink.iter().filter(|l| l.starts_with("Epoch:")).count(), 3);
    assert!(sink.iter().any(|l| l.starts_with("validation_auc:")));

    // checkpoint loads back into a usable model
    let checkpoint = result.checkpoint_path.expect("checkpoint saved");
    let (_model, metadata) = load_checkpoint::<DefaultBackend>(&checkpoint, &Default::default()).unwrap();
    assert!(metadata.epoch >= 1 && metadata.epoch <= 3);
    assert_eq!(metadata.model_config.conv1_channels, 8);

    // report: header plus one row per test site, probabilities in (0, 1)
    let contents = std::fs::read_to_string(&report_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines[0], REPORT_HEADER);
    assert_eq!(lines.len(), splits.test.len() + 1);
    for line in &lines[1..] {
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(fields.len(), 6);
        let p1: u64 = fields[1].parse().unwrap();
        let p2: u64 = fields[2].parse().unwrap();
        assert_eq!(p2, p1 + 12);
        let output: f32 = fields[4].parse().unwrap();
        assert!(output > 0.0 && output < 1.0);
        assert!(fields[5] == "true" || fields[5] == "false");
    }

    assert!(result.test_metrics.auc >= 0.0 && result.test_metrics.auc <= 1.0);
    assert!(result.state.best_valid_loss.is_some());
}

#[test]
fn checkpoint_tracks_the_lowest_validation_loss_epoch() {
    let temp = TempDir::new().unwrap();
    let table_path = temp.path().join("sites.txt");
    std::fs::write(&table_path, synthetic_table(20)).unwrap();

    let index = build_index(&table_path).unwrap();
    let splits = balanced_split(&index, &SplitConfig::default()).unwrap();

    let model_config = ModelConfig {
        conv1_channels: 8,
        conv2_channels: 8,
        conv1_kernel: 3,
        conv2_kernel: 3,
        hidden_size: 4,
        dropout: 0.5,
    };
    let training_config = TrainingConfig {
        epochs: 6,
        batch_size: 8,
        learning_rate: 0.05, // large steps so the loss curve is not monotone
        shuffle_seed: Some(5),
    };
    let trainer = Trainer::<TrainingBackend>::new(training_config, model_config, Default::default())
        .with_checkpoint_dir(temp.path())
        .unwrap();

    let mut sink: Vec<String> = Vec::new();
    let report_path = temp.path().join("testResult.txt");
    let result = trainer.train(&index, &splits, &mut sink, &report_path).unwrap();

    // the snapshot belongs to the first epoch attaining the minimum
    // validation loss, not to the final epoch
    let history = &result.state.valid_loss_history;
    assert_eq!(history.len(), 6);
    let (best_idx, &best_loss) = history
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
        .unwrap();

    let checkpoint = result.checkpoint_path.expect("checkpoint saved");
    let (_model, metadata) = load_checkpoint::<DefaultBackend>(&checkpoint, &Default::default()).unwrap();
    assert_eq!(metadata.epoch, best_idx + 1);
    assert!((metadata.valid_loss - best_loss).abs() < 1e-12);
    assert_eq!(result.state.best_valid_loss, Some(best_loss));
}

#[test]
fn ambiguous_sites_never_reach_the_splits() {
    let temp = TempDir::new().unwrap();
    let mut table = synthetic_table(3);
    // center-window N: excluded from the index and both class lists
    table.push_str("chrX\t9000\t9012\tACGTANGTACGT\t0.5\tM");
    for _ in 0..22 {
        table.push_str("\t0.4");
    }
    table.push('\n');

    let table_path = temp.path().join("sites.txt");
    std::fs::write(&table_path, table).unwrap();

    let index = build_index(&table_path).unwrap();
    assert_eq!(index.len(), 6);
    assert_eq!(index.skipped_ambiguous, 1);
    assert!(index.get("chrX:9000").is_none());
    assert!(!index.methylated_ids.iter().any(|id| id == "chrX:9000"));
}

#[test]
fn six_site_table_splits_without_downsampling() {
    let temp = TempDir::new().unwrap();
    let table_path = temp.path().join("sites.txt");
    std::fs::write(&table_path, synthetic_table(3)).unwrap();

    let index = build_index(&table_path).unwrap();
    assert_eq!(index.methylated_count(), 3);
    assert_eq!(index.unmethylated_count(), 3);

    let config = SplitConfig {
        train_fraction: 0.5,
        valid_fraction: 0.25,
        test_fraction: 0.25,
        split_seed: 10,
    };
    let splits = balanced_split(&index, &config).unwrap();

    // |M| == |U| == 3: nothing down-sampled, all six sites assigned
    assert_eq!(splits.total(), 6);
    assert!(!splits.valid.is_empty() && splits.valid.len() <= 2);
    assert!(!splits.test.is_empty() && splits.test.len() <= 2);
    assert_eq!(splits.valid.len() + splits.test.len(), 4);

    let all: HashSet<_> = splits
        .train
        .iter()
        .chain(&splits.valid)
        .chain(&splits.test)
        .collect();
    assert_eq!(all.len(), 6);
}
