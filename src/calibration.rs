use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Win,
    Loss,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub samples: usize,
    pub brier: f64,
    pub log_loss: f64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CalibrationBin {
    pub bucket_start: f64,
    pub bucket_end: f64,
    pub count: usize,
    pub avg_pred: f64,
    pub actual_rate: f64,
}

impl Metrics {
    pub fn empty() -> Self {
        Self {
            samples: 0,
            brier: 0.0,
            log_loss: 0.0,
            accuracy: 0.0,
        }
    }
}

impl Outcome {
    pub fn from_result(raw: &str) -> Option<Self> {
        // Feeds report walk-off wins as "W-wo".
        match raw.trim().chars().next()? {
            'W' | 'w' => Some(Outcome::Win),
            'L' | 'l' => Some(Outcome::Loss),
            _ => None,
        }
    }

    fn actual(self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Loss => 0.0,
        }
    }
}

/// Scores win probabilities against realised outcomes.
pub fn evaluate_probs(predictions: &[f64], outcomes: &[Outcome]) -> Metrics {
    if predictions.is_empty() || outcomes.is_empty() || predictions.len() != outcomes.len() {
        return Metrics::empty();
    }

    let mut brier_sum = 0.0_f64;
    let mut log_loss_sum = 0.0_f64;
    let mut correct = 0usize;

    for (p, outcome) in predictions.iter().zip(outcomes) {
        let p = p.clamp(0.0, 1.0);
        let y = outcome.actual();
        brier_sum += (p - y).powi(2);

        let actual_prob = match outcome {
            Outcome::Win => p,
            Outcome::Loss => 1.0 - p,
        }
        .clamp(1e-12, 1.0);
        log_loss_sum += -actual_prob.ln();

        let predicted = if p >= 0.5 { Outcome::Win } else { Outcome::Loss };
        if predicted == *outcome {
            correct += 1;
        }
    }

    let n = predictions.len() as f64;
    Metrics {
        samples: predictions.len(),
        brier: brier_sum / n,
        log_loss: log_loss_sum / n,
        accuracy: correct as f64 / n,
    }
}

pub fn calibration_bins(
    predictions: &[f64],
    outcomes: &[Outcome],
    bins: usize,
) -> Vec<CalibrationBin> {
    let bins = bins.max(2);
    let mut counts = vec![0usize; bins];
    let mut pred_sum = vec![0.0_f64; bins];
    let mut actual_sum = vec![0.0_f64; bins];

    for (p, outcome) in predictions.iter().zip(outcomes) {
        let p = p.clamp(0.0, 1.0);
        let idx = ((p * bins as f64).floor() as usize).min(bins - 1);
        counts[idx] += 1;
        pred_sum[idx] += p;
        actual_sum[idx] += outcome.actual();
    }

    let mut out = Vec::with_capacity(bins);
    for i in 0..bins {
        let start = i as f64 / bins as f64;
        let end = (i + 1) as f64 / bins as f64;
        let count = counts[i];
        let (avg_pred, actual_rate) = if count > 0 {
            (pred_sum[i] / count as f64, actual_sum[i] / count as f64)
        } else {
            (0.0, 0.0)
        };
        out.push(CalibrationBin {
            bucket_start: start,
            bucket_end: end,
            count,
            avg_pred,
            actual_rate,
        });
    }
    out
}

/// Expected calibration error over equal-width bins.
pub fn expected_calibration_error(predictions: &[f64], outcomes: &[Outcome], bins: usize) -> f64 {
    if predictions.is_empty() || predictions.len() != outcomes.len() {
        return 0.0;
    }
    let n = predictions.len() as f64;
    calibration_bins(predictions, outcomes, bins)
        .into_iter()
        .filter(|b| b.count > 0)
        .map(|b| (b.count as f64 / n) * (b.avg_pred - b.actual_rate).abs())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::{Outcome, calibration_bins, evaluate_probs, expected_calibration_error};

    #[test]
    fn perfect_predictions_have_zero_brier() {
        let preds = vec![1.0, 0.0, 1.0];
        let outcomes = vec![Outcome::Win, Outcome::Loss, Outcome::Win];
        let m = evaluate_probs(&preds, &outcomes);
        assert_eq!(m.samples, 3);
        assert!(m.brier < 1e-12);
        assert!((m.accuracy - 1.0).abs() < 1e-12);
    }

    #[test]
    fn coin_flip_scores() {
        let preds = vec![0.5, 0.5];
        let outcomes = vec![Outcome::Win, Outcome::Loss];
        let m = evaluate_probs(&preds, &outcomes);
        assert!((m.brier - 0.25).abs() < 1e-12);
        assert!((m.log_loss - std::f64::consts::LN_2).abs() < 1e-12);
    }

    #[test]
    fn mismatched_lengths_are_empty() {
        let m = evaluate_probs(&[0.6], &[]);
        assert_eq!(m.samples, 0);
    }

    #[test]
    fn bins_cover_unit_interval() {
        let preds = vec![0.05, 0.55, 0.58, 0.99];
        let outcomes = vec![Outcome::Loss, Outcome::Win, Outcome::Loss, Outcome::Win];
        let bins = calibration_bins(&preds, &outcomes, 10);
        assert_eq!(bins.len(), 10);
        assert_eq!(bins[5].count, 2);
        assert!((bins[5].actual_rate - 0.5).abs() < 1e-12);
        assert_eq!(bins[9].count, 1);
        let ece = expected_calibration_error(&preds, &outcomes, 10);
        assert!(ece > 0.0 && ece < 1.0);
    }

    #[test]
    fn parses_feed_results() {
        assert_eq!(Outcome::from_result("W"), Some(Outcome::Win));
        assert_eq!(Outcome::from_result("W-wo"), Some(Outcome::Win));
        assert_eq!(Outcome::from_result("L"), Some(Outcome::Loss));
        assert_eq!(Outcome::from_result(""), None);
    }
}
