use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Binary cross-entropy over probabilities
///
/// `probs` and `targets` are both `[batch, 1]`; probabilities are clamped away
/// from 0 and 1 before the log for numeric stability. Returns the batch mean.
pub fn binary_cross_entropy<B: Backend>(
    probs: Tensor<B, 2>,
    targets: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let eps = 1e-7;
    let probs = probs.clamp(eps, 1.0 - eps);
    let pos = targets.clone() * probs.clone().log();
    let neg = (targets.neg().add_scalar(1.0)) * (probs.neg().add_scalar(1.0)).log();
    (pos + neg).mean().neg()
}

/// Host-side ranking and threshold metrics
pub mod metrics {
    use anyhow::{bail, Result};

    /// Count outputs whose thresholded call (≥ 0.5) matches the label
    pub fn correct_count(outputs: &[f32], labels: &[f32]) -> usize {
        outputs
            .iter()
            .zip(labels)
            .filter(|(&out, &label)| (out >= 0.5) == (label >= 0.5))
            .count()
    }

    /// Area under the ROC curve via the rank-sum statistic, ties averaged
    ///
    /// Undefined when either class is absent; that is a hard error so a
    /// degenerate split stops the run instead of reporting garbage.
    pub fn roc_auc(labels: &[f32], scores: &[f32]) -> Result<f64> {
        if labels.len() != scores.len() {
            bail!(
                "label/score length mismatch: {} vs {}",
                labels.len(),
                scores.len()
            );
        }
        let n_pos = labels.iter().filter(|&&l| l >= 0.5).count();
        let n_neg = labels.len() - n_pos;
        if n_pos == 0 || n_neg == 0 {
            bail!(
                "AUC undefined: split contains {} positive and {} negative samples",
                n_pos,
                n_neg
            );
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| {
            scores[a]
                .partial_cmp(&scores[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // average ranks across tied scores
        let mut rank_sum_pos = 0.0f64;
        let mut i = 0;
        while i < order.len() {
            let mut j = i;
            while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
                j += 1;
            }
            let mean_rank = ((i + 1 + j + 1) as f64) / 2.0;
            for &idx in &order[i..=j] {
                if labels[idx] >= 0.5 {
                    rank_sum_pos += mean_rank;
                }
            }
            i = j + 1;
        }

        let n_pos = n_pos as f64;
        let n_neg = n_neg as f64;
        Ok((rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
    }
}
