use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::compare::MetricPolarity;
use crate::composite::DEFAULT_TOTAL_METRICS;
use crate::matchup::Evaluator;
use crate::scorer::{ScorerConfig, WinProbabilityScorer};
use crate::sizing::BetSizer;

const DEFAULT_BANKROLL: f64 = 1000.0;
const DEFAULT_MAX_BET_PCT: f64 = 25.0;
const DEFAULT_MAX_EDGE: f64 = 1.30;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bankroll: f64,
    pub max_bet_percentage: f64,
    pub max_edge: f64,
    /// Denominator of the composite score's metric-advantage term.
    pub total_metrics: usize,
    /// JSON weight table replacing the built-in one.
    pub weights_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bankroll: DEFAULT_BANKROLL,
            max_bet_percentage: DEFAULT_MAX_BET_PCT,
            max_edge: DEFAULT_MAX_EDGE,
            total_metrics: DEFAULT_TOTAL_METRICS,
            weights_path: None,
        }
    }
}

impl Settings {
    /// Reads `MLB_EDGE_*` variables, keeping defaults for anything unset or
    /// unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let f64_var = |key: &str, default: f64| {
            lookup(key)
                .and_then(|val| val.trim().parse::<f64>().ok())
                .filter(|val| val.is_finite())
                .unwrap_or(default)
        };
        Self {
            bankroll: f64_var("MLB_EDGE_BANKROLL", DEFAULT_BANKROLL),
            max_bet_percentage: f64_var("MLB_EDGE_MAX_BET_PCT", DEFAULT_MAX_BET_PCT),
            max_edge: f64_var("MLB_EDGE_MAX_EDGE", DEFAULT_MAX_EDGE),
            total_metrics: lookup("MLB_EDGE_TOTAL_METRICS")
                .and_then(|val| val.trim().parse::<usize>().ok())
                .filter(|val| *val > 0)
                .unwrap_or(DEFAULT_TOTAL_METRICS),
            weights_path: lookup("MLB_EDGE_WEIGHTS")
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn bet_sizer(&self) -> Result<BetSizer> {
        BetSizer::new(self.max_edge, self.max_bet_percentage)
            .context("invalid bet sizing settings")
    }

    pub fn scorer(&self) -> Result<WinProbabilityScorer> {
        match &self.weights_path {
            Some(path) => {
                let config = load_scorer_config(path)?;
                WinProbabilityScorer::new(&config)
                    .with_context(|| format!("invalid weight table {}", path.display()))
            }
            None => Ok(WinProbabilityScorer::default()),
        }
    }

    pub fn evaluator(&self) -> Result<Evaluator> {
        let evaluator =
            Evaluator::new(self.scorer()?, MetricPolarity::default(), self.bet_sizer()?);
        Ok(evaluator.with_total_metrics(self.total_metrics))
    }
}

pub fn load_scorer_config(path: &Path) -> Result<ScorerConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read weight table {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse weight table {}", path.display()))
}
