use serde::Serialize;

use crate::error::{CoreError, CoreResult};

/// Edge at or below this value never produces a bet.
pub const NO_BET_EDGE: f64 = 1.0;

/// Scales a stake linearly from zero at edge 1.0 up to `max_bet_percentage`
/// of bankroll at `max_edge`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BetSizer {
    max_edge: f64,
    max_bet_percentage: f64,
}

impl BetSizer {
    pub fn new(max_edge: f64, max_bet_percentage: f64) -> CoreResult<Self> {
        if !max_edge.is_finite() || max_edge <= 1.0 {
            return Err(CoreError::InvalidMaxEdge { max_edge });
        }
        if !(0.0..=100.0).contains(&max_bet_percentage) {
            return Err(CoreError::InvalidBetPercentage {
                value: max_bet_percentage,
            });
        }
        Ok(Self {
            max_edge,
            max_bet_percentage,
        })
    }

    /// Suggested stake, or `None` when `edge <= 1.0`.
    ///
    /// Edges above `max_edge` are not capped, so the stake can exceed
    /// `max_bet_percentage` of bankroll.
    pub fn size(&self, edge: f64, bankroll: f64) -> CoreResult<Option<f64>> {
        if !bankroll.is_finite() || bankroll < 0.0 {
            return Err(CoreError::InvalidBankroll { value: bankroll });
        }
        if edge.is_nan() || edge <= NO_BET_EDGE {
            return Ok(None);
        }
        let edge_ratio = (edge - 1.0) / (self.max_edge - 1.0);
        let max_bet_size = (self.max_bet_percentage / 100.0) * bankroll;
        Ok(Some(edge_ratio * max_bet_size))
    }
}

pub fn calculate_bet_size(
    edge: f64,
    max_edge: f64,
    max_bet_percentage: f64,
    bankroll: f64,
) -> CoreResult<Option<f64>> {
    BetSizer::new(max_edge, max_bet_percentage)?.size(edge, bankroll)
}
