use thiserror::Error;

use crate::metrics::Metric;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid odds {odds}: american odds must be non-zero and decimal odds above 1")]
    InvalidOdds { odds: f64 },

    #[error("probability {value} is outside (0, 1]")]
    InvalidProbability { value: f64 },

    #[error("max edge must be greater than 1, got {max_edge}")]
    InvalidMaxEdge { max_edge: f64 },

    #[error("max bet percentage must be within 0..=100, got {value}")]
    InvalidBetPercentage { value: f64 },

    #[error("bankroll must be finite and non-negative, got {value}")]
    InvalidBankroll { value: f64 },

    #[error("unknown metric '{name}'")]
    UnknownMetric { name: String },

    #[error("metric {metric} has non-finite value {value}")]
    NonFiniteMetric { metric: Metric, value: f64 },

    #[error("metric {metric} appears in two disjoint sets")]
    OverlappingPolarity { metric: Metric },

    #[error("metric {metric} has invalid weight {weight}")]
    InvalidWeight { metric: Metric, weight: f64 },

    #[error("weight table is empty or sums to zero")]
    EmptyWeights,

    #[error("total metrics must be positive")]
    InvalidTotalMetrics,
}

pub type CoreResult<T> = Result<T, CoreError>;
