use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::metrics::{Metric, TeamStats};

const PROB_FLOOR: f64 = 0.01;
const PROB_CEIL: f64 = 0.99;

/// Weight table and metric handling rules for [`WinProbabilityScorer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// Raw correlation-derived weight per metric.
    pub weights: BTreeMap<Metric, f64>,
    /// Power applied to every raw weight before normalisation.
    #[serde(default = "default_exponent")]
    pub exponent: f64,
    /// Metrics where the smaller value earns the larger share.
    #[serde(default)]
    pub inverse: BTreeSet<Metric>,
    /// Metrics that can be zero or negative; both sides are shifted positive first.
    #[serde(default)]
    pub shifted: BTreeSet<Metric>,
}

fn default_exponent() -> f64 {
    2.0
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            weights: BTreeMap::from([
                (Metric::RunDifferential, 0.8884),
                (Metric::Ops, 0.8321),
                (Metric::Slg, 0.7997),
                (Metric::Obp, 0.7663),
                (Metric::EraPlus, 0.7644),
                (Metric::ExtraBaseHits, 0.7492),
                (Metric::LeftOnBasePct, 0.718),
                (Metric::RunsAboveReplacement, 0.6902),
                (Metric::Hits, 0.687),
                (Metric::IsolatedPower, 0.6832),
                (Metric::Era, 0.6446),
                (Metric::Fip, 0.6393),
                (Metric::Whip, 0.6176),
                (Metric::Rbi, 0.575),
            ]),
            exponent: default_exponent(),
            inverse: BTreeSet::from([Metric::Era, Metric::Fip, Metric::Whip]),
            shifted: BTreeSet::from([
                Metric::RunDifferential,
                Metric::ExtraBaseHits,
                Metric::Hits,
                Metric::Rbi,
            ]),
        }
    }
}

/// Win probability for the first team of a matchup. The opponent's
/// probability is always [`WinProbability::complement`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct WinProbability(f64);

impl WinProbability {
    pub fn value(self) -> f64 {
        self.0
    }

    pub fn complement(self) -> f64 {
        1.0 - self.0
    }
}

#[derive(Debug, Clone)]
pub struct WinProbabilityScorer {
    // Sorted by weight, heaviest first.
    weights: Vec<(Metric, f64)>,
    inverse: BTreeSet<Metric>,
    shifted: BTreeSet<Metric>,
}

impl Default for WinProbabilityScorer {
    fn default() -> Self {
        // The built-in table is known to be valid.
        Self::from_valid(&ScorerConfig::default())
    }
}

impl WinProbabilityScorer {
    pub fn new(config: &ScorerConfig) -> CoreResult<Self> {
        for (metric, weight) in &config.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(CoreError::InvalidWeight {
                    metric: *metric,
                    weight: *weight,
                });
            }
        }
        if let Some(metric) = config.inverse.intersection(&config.shifted).next() {
            return Err(CoreError::OverlappingPolarity { metric: *metric });
        }
        let total: f64 = config
            .weights
            .values()
            .map(|w| w.powf(config.exponent))
            .sum();
        if !config.exponent.is_finite() || !total.is_finite() || total <= 0.0 {
            return Err(CoreError::EmptyWeights);
        }
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: &ScorerConfig) -> Self {
        Self {
            weights: normalized_weights(&config.weights, config.exponent),
            inverse: config.inverse.clone(),
            shifted: config.shifted.clone(),
        }
    }

    /// Probability that `team1` beats `team2`, clamped to `[0.01, 0.99]`.
    ///
    /// Metrics missing from either side are skipped. With no usable overlap the
    /// result is exactly 0.5.
    pub fn score(&self, team1: &TeamStats, team2: &TeamStats) -> WinProbability {
        let mut team1_score = 0.0_f64;
        let mut team2_score = 0.0_f64;

        for &(metric, weight) in &self.weights {
            let Some((a, b)) = team1.paired(team2, metric) else {
                continue;
            };
            let (share1, share2) = self.shares(metric, a, b);
            debug!(%metric, weight, a, b, share1, share2, "metric contribution");
            team1_score += weight * share1;
            team2_score += weight * share2;
        }

        let total = team1_score + team2_score;
        if total == 0.0 {
            return WinProbability(0.5);
        }
        WinProbability((team1_score / total).clamp(PROB_FLOOR, PROB_CEIL))
    }

    fn shares(&self, metric: Metric, a: f64, b: f64) -> (f64, f64) {
        if a == 0.0 && b == 0.0 {
            return (0.5, 0.5);
        }
        if self.shifted.contains(&metric) {
            let floor = a.min(b);
            let a = a - floor + 1.0;
            let b = b - floor + 1.0;
            let total = a + b;
            return (a / total, b / total);
        }
        let total = a + b;
        if total == 0.0 {
            return (0.5, 0.5);
        }
        if self.inverse.contains(&metric) {
            (1.0 - a / total, 1.0 - b / total)
        } else {
            (a / total, b / total)
        }
    }
}

/// Raises each weight to `exponent` and rescales so the result sums to 1.
pub fn normalized_weights(weights: &BTreeMap<Metric, f64>, exponent: f64) -> Vec<(Metric, f64)> {
    let transformed: Vec<(Metric, f64)> = weights
        .iter()
        .map(|(m, w)| (*m, w.powf(exponent)))
        .collect();
    let total: f64 = transformed.iter().map(|(_, w)| w).sum();
    let mut out: Vec<(Metric, f64)> = transformed
        .into_iter()
        .map(|(m, w)| (m, w / total))
        .collect();
    out.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{ScorerConfig, WinProbabilityScorer, normalized_weights};
    use crate::error::CoreError;
    use crate::metrics::{Metric, TeamStats};

    fn stats(pairs: &[(&str, f64)]) -> TeamStats {
        TeamStats::from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn normalized_weights_sum_to_one_and_sharpen() {
        let config = ScorerConfig::default();
        let w = normalized_weights(&config.weights, config.exponent);
        let sum: f64 = w.iter().map(|(_, v)| v).sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert_eq!(w.first().map(|(m, _)| *m), Some(Metric::RunDifferential));
        assert_eq!(w.last().map(|(m, _)| *m), Some(Metric::Rbi));

        // Squaring widens the gap between strongest and weakest correlators.
        let raw_ratio = 0.8884 / 0.575;
        let ratio = w[0].1 / w[w.len() - 1].1;
        assert!(ratio > raw_ratio);
    }

    #[test]
    fn all_zero_overlap_is_exactly_even() {
        let a = stats(&[("OPS", 0.0), ("ERA", 0.0), ("run_differential", 0.0)]);
        let b = a.clone();
        let p = WinProbabilityScorer::default().score(&a, &b);
        assert_eq!(p.value(), 0.5);
    }

    #[test]
    fn empty_overlap_is_exactly_even() {
        let a = stats(&[("OPS", 0.8)]);
        let b = stats(&[("ERA", 3.5)]);
        let p = WinProbabilityScorer::default().score(&a, &b);
        assert_eq!(p.value(), 0.5);
    }

    #[test]
    fn single_metric_shares() {
        let scorer = WinProbabilityScorer::default();

        let p = scorer.score(&stats(&[("OPS", 0.9)]), &stats(&[("OPS", 0.6)]));
        assert!((p.value() - 0.6).abs() < 1e-12);

        let p = scorer.score(&stats(&[("ERA", 3.0)]), &stats(&[("ERA", 5.0)]));
        assert!((p.value() - 0.625).abs() < 1e-12);

        // Shifted: 50 vs -30 becomes 81 vs 1.
        let p = scorer.score(
            &stats(&[("run_differential", 50.0)]),
            &stats(&[("run_differential", -30.0)]),
        );
        assert!((p.value() - 81.0 / 82.0).abs() < 1e-12);
    }

    #[test]
    fn opposite_values_split_evenly() {
        let scorer = WinProbabilityScorer::default();

        let p = scorer.score(&stats(&[("OPS", 0.3)]), &stats(&[("OPS", -0.3)]));
        assert_eq!(p.value(), 0.5);

        let p = scorer.score(&stats(&[("ERA", 2.0)]), &stats(&[("ERA", -2.0)]));
        assert_eq!(p.value(), 0.5);
    }

    #[test]
    fn shifted_metric_with_one_side_at_zero() {
        // 0 vs 10 becomes 1 vs 11.
        let p = WinProbabilityScorer::default()
            .score(&stats(&[("Hits", 0.0)]), &stats(&[("Hits", 10.0)]));
        assert!((p.value() - 1.0 / 12.0).abs() < 1e-12);
        assert!((p.complement() - 11.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn probability_is_clamped() {
        let scorer = WinProbabilityScorer::default();
        let p = scorer.score(
            &stats(&[("run_differential", 500.0)]),
            &stats(&[("run_differential", -500.0)]),
        );
        assert_eq!(p.value(), 0.99);
        assert!((p.complement() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn alternate_weight_table() {
        let config = ScorerConfig {
            weights: BTreeMap::from([(Metric::Ops, 1.0), (Metric::Whip, 1.0)]),
            exponent: 1.0,
            inverse: [Metric::Whip].into(),
            shifted: Default::default(),
        };
        let scorer = WinProbabilityScorer::new(&config).unwrap();
        let a = stats(&[("OPS", 0.8), ("WHIP", 1.0)]);
        let b = stats(&[("OPS", 0.8), ("WHIP", 1.5)]);
        // OPS splits evenly; WHIP gives 0.6 vs 0.4.
        let p = scorer.score(&a, &b);
        assert!((p.value() - 0.55).abs() < 1e-12);
    }

    #[test]
    fn invalid_tables_are_rejected() {
        let mut config = ScorerConfig::default();
        config.weights.insert(Metric::Ops, -1.0);
        assert!(matches!(
            WinProbabilityScorer::new(&config),
            Err(CoreError::InvalidWeight { metric: Metric::Ops, .. })
        ));

        let config = ScorerConfig {
            weights: BTreeMap::new(),
            ..ScorerConfig::default()
        };
        assert_eq!(
            WinProbabilityScorer::new(&config).unwrap_err(),
            CoreError::EmptyWeights
        );

        let mut config = ScorerConfig::default();
        config.shifted.insert(Metric::Era);
        assert_eq!(
            WinProbabilityScorer::new(&config).unwrap_err(),
            CoreError::OverlappingPolarity { metric: Metric::Era }
        );
    }

    #[test]
    fn config_loads_from_json() {
        let raw = r#"{"weights": {"OPS": 0.8, "ERA": 0.6}, "inverse": ["ERA"]}"#;
        let config: ScorerConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.exponent, 2.0);
        assert!(config.shifted.is_empty());
        assert!(WinProbabilityScorer::new(&config).is_ok());
    }
}
