use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::calibration::{self, CalibrationBin, Metrics, Outcome};
use crate::error::CoreResult;
use crate::matchup::{Evaluator, MatchupInput, TeamInput};
use crate::metrics::TeamStats;
use crate::odds::american_to_decimal;

const CALIBRATION_BINS: usize = 10;

/// One historical game from the selected team's schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedGame {
    pub date: String,
    pub team: String,
    pub opponent: String,
    pub team_stats: TeamStats,
    pub opponent_stats: TeamStats,
    pub team_odds: f64,
    pub opponent_odds: f64,
    /// Feed result column, e.g. "W", "L", "W-wo".
    pub result: String,
}

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub team: String,
    pub initial_bankroll: f64,
    pub max_games: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettledBet {
    pub date: String,
    pub team: String,
    pub opponent: String,
    pub bet_size: f64,
    pub edge_pct: f64,
    pub profit: f64,
    pub bankroll_after: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub team: String,
    pub games_evaluated: usize,
    pub games_skipped: usize,
    pub total_bets: usize,
    pub total_profit: f64,
    pub biggest_profit: f64,
    pub biggest_loss: f64,
    pub initial_bankroll: f64,
    pub final_bankroll: f64,
    pub profitable_bet_pct: f64,
    /// Set when the bankroll ran out before the schedule did.
    pub busted: bool,
    pub model: Metrics,
    pub ece: f64,
    pub calibration: Vec<CalibrationBin>,
    pub history: Vec<SettledBet>,
}

/// Profit of a settled stake at American `odds`.
pub fn settle_bet(bet_size: f64, odds: f64, outcome: Outcome) -> CoreResult<f64> {
    match outcome {
        Outcome::Win => Ok(bet_size * (american_to_decimal(odds)? - 1.0)),
        Outcome::Loss => Ok(-bet_size),
    }
}

/// Strips doubleheader markers such as `"(1)"` from a schedule date.
pub fn clean_date(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0usize;
    for ch in raw.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out.trim().to_string()
}

/// Wins and decided games for `team` against `opponent` in a recorded
/// schedule. Rows with an unrecognised result are not counted.
pub fn head_to_head(games: &[RecordedGame], team: &str, opponent: &str) -> (usize, usize) {
    games
        .iter()
        .filter(|g| g.team == team && g.opponent == opponent)
        .filter_map(|g| Outcome::from_result(&g.result))
        .fold((0, 0), |(wins, played), outcome| match outcome {
            Outcome::Win => (wins + 1, played + 1),
            Outcome::Loss => (wins, played + 1),
        })
}

/// Replays `games` in order, betting on the selected team (as the home side)
/// whenever the model suggests a stake. The bankroll is updated after every
/// settled bet and sizes the next one.
pub fn simulate(
    evaluator: &Evaluator,
    games: &[RecordedGame],
    cfg: &BacktestConfig,
) -> BacktestReport {
    let mut bankroll = cfg.initial_bankroll;
    let mut total_bets = 0usize;
    let mut profitable_bets = 0usize;
    let mut total_profit = 0.0_f64;
    let mut biggest_profit = 0.0_f64;
    let mut biggest_loss = 0.0_f64;
    let mut history = Vec::new();
    let mut predictions = Vec::new();
    let mut outcomes = Vec::new();
    let mut games_evaluated = 0usize;
    let mut games_skipped = 0usize;
    let mut busted = false;

    let window = &games[..games.len().min(cfg.max_games)];
    for (idx, game) in window.iter().enumerate() {
        if game.team != cfg.team {
            continue;
        }
        if bankroll <= 0.0 {
            busted = true;
            break;
        }
        let Some(outcome) = Outcome::from_result(&game.result) else {
            warn!(date = %game.date, result = %game.result, "unrecognised result, skipping");
            games_skipped += 1;
            continue;
        };
        if game.team_stats.is_empty() || game.opponent_stats.is_empty() {
            warn!(date = %game.date, opponent = %game.opponent, "missing stats, skipping");
            games_skipped += 1;
            continue;
        }

        let date = clean_date(&game.date);
        let input = MatchupInput {
            date: Some(date.clone()),
            home: TeamInput {
                team: game.team.clone(),
                stats: game.team_stats.clone(),
                pitcher: None,
                american_odds: game.team_odds,
                season_win_pct: None,
                record: None,
                rank: None,
            },
            away: TeamInput {
                team: game.opponent.clone(),
                stats: game.opponent_stats.clone(),
                pitcher: None,
                american_odds: game.opponent_odds,
                season_win_pct: None,
                record: None,
                rank: None,
            },
        };
        let report = match evaluator.evaluate(&input, bankroll) {
            Ok(report) => report,
            Err(err) => {
                warn!(date = %game.date, error = %err, "evaluation failed, skipping");
                games_skipped += 1;
                continue;
            }
        };
        games_evaluated += 1;
        predictions.push(report.home.win_prob);
        outcomes.push(outcome);

        let side = &report.home;
        if let Some(bet_size) = side.bet_size.filter(|b| *b > 0.0) {
            let profit = match settle_bet(bet_size, game.team_odds, outcome) {
                Ok(profit) => profit,
                Err(err) => {
                    warn!(date = %game.date, error = %err, "settlement failed, skipping");
                    continue;
                }
            };
            total_bets += 1;
            if profit > 0.0 {
                profitable_bets += 1;
                biggest_profit = biggest_profit.max(profit);
            } else {
                biggest_loss = biggest_loss.min(profit);
            }
            bankroll += profit;
            total_profit += profit;
            history.push(SettledBet {
                date,
                team: game.team.clone(),
                opponent: game.opponent.clone(),
                bet_size,
                edge_pct: side.edge_pct,
                profit,
                bankroll_after: bankroll,
            });
        }

        info!(
            "processing game {}/{}... edge for {}: {:.2}%",
            idx + 1,
            window.len(),
            cfg.team,
            side.edge_pct
        );
    }

    let profitable_bet_pct = if total_bets > 0 {
        profitable_bets as f64 / total_bets as f64 * 100.0
    } else {
        0.0
    };

    BacktestReport {
        team: cfg.team.clone(),
        games_evaluated,
        games_skipped,
        total_bets,
        total_profit,
        biggest_profit,
        biggest_loss,
        initial_bankroll: cfg.initial_bankroll,
        final_bankroll: bankroll,
        profitable_bet_pct,
        busted,
        model: calibration::evaluate_probs(&predictions, &outcomes),
        ece: calibration::expected_calibration_error(&predictions, &outcomes, CALIBRATION_BINS),
        calibration: calibration::calibration_bins(&predictions, &outcomes, CALIBRATION_BINS),
        history,
    }
}
