use crate::error::{CoreError, CoreResult};

/// Converts American odds to decimal odds. Zero has no decimal equivalent.
pub fn american_to_decimal(odds: f64) -> CoreResult<f64> {
    if odds == 0.0 || !odds.is_finite() {
        return Err(CoreError::InvalidOdds { odds });
    }
    if odds > 0.0 {
        Ok(odds / 100.0 + 1.0)
    } else {
        Ok(100.0 / odds.abs() + 1.0)
    }
}

/// Inverse of [`american_to_decimal`], branching at evens (2.0).
pub fn decimal_to_american(decimal_odds: f64) -> CoreResult<f64> {
    if decimal_odds <= 1.0 || !decimal_odds.is_finite() {
        return Err(CoreError::InvalidOdds { odds: decimal_odds });
    }
    if decimal_odds >= 2.0 {
        Ok((decimal_odds - 1.0) * 100.0)
    } else {
        Ok(-100.0 / (decimal_odds - 1.0))
    }
}

/// Bookmaker-implied probability of an American line.
pub fn implied_probability(odds: f64) -> CoreResult<f64> {
    Ok(1.0 / american_to_decimal(odds)?)
}
