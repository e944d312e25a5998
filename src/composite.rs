use crate::error::{CoreError, CoreResult};

pub const DEFAULT_TOTAL_METRICS: usize = 15;
pub const PYTHAGOREAN_EXPONENT: f64 = 1.83;

const W_METRICS: f64 = 0.35;
const W_WIN_PROB: f64 = 0.25;
const W_RANK: f64 = 0.15;
const W_SEASON: f64 = 0.15;
const W_IMPLIED: f64 = 0.10;

#[derive(Debug, Clone, Copy)]
pub struct CompositeInputs {
    pub win_prob: f64,
    pub implied_prob: f64,
    pub season_win_pct: f64,
    /// Division rank, 1 is best.
    pub team_rank: u32,
    pub metrics_better: usize,
    pub total_metrics: usize,
}

/// Display-only ranking score. Never feeds back into probability or sizing.
pub fn calculate_team_score(inputs: &CompositeInputs) -> CoreResult<f64> {
    if inputs.total_metrics == 0 {
        return Err(CoreError::InvalidTotalMetrics);
    }
    let total = inputs.total_metrics as f64;
    let better = inputs.metrics_better as f64;
    let metric_advantage = (better - (total - better)) / total;
    let rank_term = (7.0 - inputs.team_rank as f64) / 6.0;

    Ok(W_METRICS * metric_advantage
        + W_WIN_PROB * inputs.win_prob
        + W_RANK * rank_term
        + W_SEASON * inputs.season_win_pct
        + W_IMPLIED * inputs.implied_prob)
}

/// Season win rate from a W/L record; 0.0 before any game is played.
pub fn season_win_pct(wins: u32, losses: u32) -> f64 {
    let games = wins + losses;
    if games == 0 {
        return 0.0;
    }
    wins as f64 / games as f64
}

/// Expected win rate from runs scored and allowed. `None` when there are no
/// runs on either side or an input is negative.
pub fn pythagorean_win_pct(runs_scored: f64, runs_allowed: f64) -> Option<f64> {
    if !runs_scored.is_finite() || !runs_allowed.is_finite() {
        return None;
    }
    if runs_scored < 0.0 || runs_allowed < 0.0 {
        return None;
    }
    let scored = runs_scored.powf(PYTHAGOREAN_EXPONENT);
    let allowed = runs_allowed.powf(PYTHAGOREAN_EXPONENT);
    let den = scored + allowed;
    if den == 0.0 {
        return None;
    }
    Some(scored / den)
}
