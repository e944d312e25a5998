use tracing::debug;

use crate::error::{CoreError, CoreResult};

const FACTOR_MIN: f64 = 0.01;
const FACTOR_MAX: f64 = 100.0;
const ADJUSTED_ODDS_LIMIT: f64 = 500.0;

/// Moves an American line by the ratio of model probability to market
/// probability, then clamps it to `[-500, 500]`.
///
/// A ratio above 1 shrinks positive odds and pushes negative odds further
/// negative.
pub fn calculate_adjusted_odds(
    original_odds: f64,
    predicted_prob: f64,
    implied_prob: f64,
) -> CoreResult<f64> {
    if original_odds == 0.0 || !original_odds.is_finite() {
        return Err(CoreError::InvalidOdds {
            odds: original_odds,
        });
    }
    check_probability(predicted_prob)?;
    check_probability(implied_prob)?;

    let adjustment_factor = (predicted_prob / implied_prob).clamp(FACTOR_MIN, FACTOR_MAX);
    let adjusted = if original_odds > 0.0 {
        original_odds / adjustment_factor
    } else {
        original_odds * adjustment_factor
    };
    let adjusted = adjusted.clamp(-ADJUSTED_ODDS_LIMIT, ADJUSTED_ODDS_LIMIT);
    debug!(
        original_odds,
        predicted_prob,
        implied_prob,
        adjustment_factor,
        adjusted,
        "adjusted odds"
    );
    Ok(adjusted)
}

/// Ratio of adjusted to original odds.
///
/// The two branches are not mirror images: for negative lines the ratio is
/// `adjusted / original`, for positive lines `original / adjusted`. Display
/// code multiplies the result by 100, so the asymmetry is kept as is.
pub fn calculate_edge(adjusted_odds: f64, original_odds: f64) -> CoreResult<f64> {
    if original_odds == 0.0 || !original_odds.is_finite() {
        return Err(CoreError::InvalidOdds {
            odds: original_odds,
        });
    }
    if original_odds < 0.0 {
        Ok(adjusted_odds / original_odds)
    } else {
        if adjusted_odds == 0.0 || !adjusted_odds.is_finite() {
            return Err(CoreError::InvalidOdds {
                odds: adjusted_odds,
            });
        }
        Ok(original_odds / adjusted_odds)
    }
}

fn check_probability(value: f64) -> CoreResult<()> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(CoreError::InvalidProbability { value })
    }
}
