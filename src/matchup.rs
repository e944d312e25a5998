use serde::{Deserialize, Serialize};
use tracing::info;

use crate::adjust::{calculate_adjusted_odds, calculate_edge};
use crate::compare::{MetricPolarity, compare_metrics};
use crate::composite::{
    CompositeInputs, DEFAULT_TOTAL_METRICS, calculate_team_score, pythagorean_win_pct,
    season_win_pct,
};
use crate::error::CoreResult;
use crate::metrics::{Metric, TeamStats};
use crate::odds::american_to_decimal;
use crate::scorer::WinProbabilityScorer;
use crate::sizing::BetSizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonRecord {
    pub wins: u32,
    pub losses: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamInput {
    pub team: String,
    pub stats: TeamStats,
    /// Starting pitcher's line; overrides the staff pitching metrics.
    #[serde(default)]
    pub pitcher: Option<TeamStats>,
    pub american_odds: f64,
    /// Takes precedence over `record`.
    #[serde(default)]
    pub season_win_pct: Option<f64>,
    #[serde(default)]
    pub record: Option<SeasonRecord>,
    #[serde(default)]
    pub rank: Option<u32>,
}

impl TeamInput {
    /// Stats used for the evaluation, and whether a pitcher line went into them.
    pub fn effective_stats(&self) -> (TeamStats, bool) {
        let mut stats = self.stats.clone();
        let used = match &self.pitcher {
            Some(pitcher) => stats.overlay_pitcher(pitcher),
            None => false,
        };
        (stats, used)
    }

    fn resolved_win_pct(&self) -> Option<f64> {
        self.season_win_pct
            .or_else(|| self.record.map(|r| season_win_pct(r.wins, r.losses)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchupInput {
    #[serde(default)]
    pub date: Option<String>,
    pub home: TeamInput,
    pub away: TeamInput,
}

#[derive(Debug, Clone, Serialize)]
pub struct SideReport {
    pub team: String,
    pub american_odds: f64,
    pub decimal_odds: f64,
    pub implied_prob: f64,
    pub win_prob: f64,
    pub adjusted_odds: f64,
    pub edge: f64,
    pub edge_pct: f64,
    /// `None` means no bet.
    pub bet_size: Option<f64>,
    pub metrics_better: usize,
    pub used_pitcher_stats: bool,
    /// Only present when both season win% and rank are known.
    pub score: Option<f64>,
    pub pythag_win_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchupReport {
    pub date: Option<String>,
    pub home: SideReport,
    pub away: SideReport,
    pub pythag_diff: Option<f64>,
}

/// Runs the full pipeline for one home/away matchup.
#[derive(Debug, Clone)]
pub struct Evaluator {
    scorer: WinProbabilityScorer,
    polarity: MetricPolarity,
    sizer: BetSizer,
    total_metrics: usize,
}

impl Evaluator {
    pub fn new(scorer: WinProbabilityScorer, polarity: MetricPolarity, sizer: BetSizer) -> Self {
        Self {
            scorer,
            polarity,
            sizer,
            total_metrics: DEFAULT_TOTAL_METRICS,
        }
    }

    pub fn with_total_metrics(mut self, total_metrics: usize) -> Self {
        self.total_metrics = total_metrics;
        self
    }

    pub fn evaluate(&self, input: &MatchupInput, bankroll: f64) -> CoreResult<MatchupReport> {
        let home_stats = input.home.effective_stats();
        let away_stats = input.away.effective_stats();

        // The away side is the scored side; home always takes the complement.
        let p_away = self.scorer.score(&away_stats.0, &home_stats.0);
        let away_prob = p_away.value();
        let home_prob = p_away.complement();

        let tally = compare_metrics(&home_stats.0, &away_stats.0, &self.polarity);

        let home = self.side(&input.home, home_stats, home_prob, tally.first, bankroll)?;
        let away = self.side(&input.away, away_stats, away_prob, tally.second, bankroll)?;

        let pythag_diff = match (home.pythag_win_pct, away.pythag_win_pct) {
            (Some(h), Some(a)) => Some(h - a),
            _ => None,
        };

        info!(
            home = %home.team,
            away = %away.team,
            home_prob,
            away_prob,
            home_edge = home.edge,
            away_edge = away.edge,
            "evaluated matchup"
        );

        Ok(MatchupReport {
            date: input.date.clone(),
            home,
            away,
            pythag_diff,
        })
    }

    fn side(
        &self,
        team: &TeamInput,
        (stats, used_pitcher_stats): (TeamStats, bool),
        win_prob: f64,
        metrics_better: usize,
        bankroll: f64,
    ) -> CoreResult<SideReport> {
        let decimal_odds = american_to_decimal(team.american_odds)?;
        let implied_prob = 1.0 / decimal_odds;
        let adjusted_odds = calculate_adjusted_odds(team.american_odds, win_prob, implied_prob)?;
        let edge = calculate_edge(adjusted_odds, team.american_odds)?;
        let bet_size = self.sizer.size(edge, bankroll)?;

        let score = match (team.resolved_win_pct(), team.rank) {
            (Some(season_win_pct), Some(team_rank)) => {
                Some(calculate_team_score(&CompositeInputs {
                    win_prob,
                    implied_prob,
                    season_win_pct,
                    team_rank,
                    metrics_better,
                    total_metrics: self.total_metrics,
                })?)
            }
            _ => None,
        };

        Ok(SideReport {
            team: team.team.clone(),
            american_odds: team.american_odds,
            decimal_odds,
            implied_prob,
            win_prob,
            adjusted_odds,
            edge,
            edge_pct: edge * 100.0,
            bet_size,
            metrics_better,
            used_pitcher_stats,
            score,
            pythag_win_pct: team_pythag(&stats),
        })
    }
}

fn team_pythag(stats: &TeamStats) -> Option<f64> {
    pythagorean_win_pct(stats.get(Metric::RunsScored)?, stats.get(Metric::RunsAllowed)?)
}

#[cfg(test)]
mod tests {
    use super::{Evaluator, MatchupInput, SeasonRecord, TeamInput};
    use crate::composite::{CompositeInputs, DEFAULT_TOTAL_METRICS, calculate_team_score};
    use crate::compare::MetricPolarity;
    use crate::metrics::TeamStats;
    use crate::scorer::WinProbabilityScorer;
    use crate::sizing::BetSizer;

    fn team(name: &str, odds: f64, pairs: &[(&str, f64)]) -> TeamInput {
        TeamInput {
            team: name.to_string(),
            stats: TeamStats::from_pairs(pairs.iter().copied()).unwrap(),
            pitcher: None,
            american_odds: odds,
            season_win_pct: Some(0.5),
            record: None,
            rank: Some(3),
        }
    }

    fn evaluator() -> Evaluator {
        Evaluator::new(
            WinProbabilityScorer::default(),
            MetricPolarity::default(),
            BetSizer::new(1.3, 25.0).unwrap(),
        )
    }

    #[test]
    fn home_probability_is_the_complement() {
        let input = MatchupInput {
            date: None,
            home: team("NYY", -150.0, &[("OPS", 0.78), ("ERA", 3.4), ("Hits", 1300.0)]),
            away: team("BOS", 130.0, &[("OPS", 0.72), ("ERA", 4.1), ("Hits", 1250.0)]),
        };
        let report = evaluator().evaluate(&input, 1000.0).unwrap();
        assert!((report.home.win_prob + report.away.win_prob - 1.0).abs() < 1e-12);
        assert!(report.home.win_prob > report.away.win_prob);
        assert_eq!(report.home.metrics_better, 3);
        assert_eq!(report.away.metrics_better, 0);
        assert!((report.home.edge_pct - report.home.edge * 100.0).abs() < 1e-12);
    }

    #[test]
    fn missing_rank_leaves_score_empty() {
        let mut home = team("NYY", -110.0, &[("OPS", 0.75)]);
        home.rank = None;
        let input = MatchupInput {
            date: Some("2024-06-01".to_string()),
            home,
            away: team("BOS", -110.0, &[("OPS", 0.75)]),
        };
        let report = evaluator().evaluate(&input, 1000.0).unwrap();
        assert!(report.home.score.is_none());
        assert!(report.away.score.is_some());
        assert!(report.pythag_diff.is_none());
    }

    #[test]
    fn zero_odds_surface_as_errors() {
        let input = MatchupInput {
            date: None,
            home: team("NYY", 0.0, &[("OPS", 0.75)]),
            away: team("BOS", -110.0, &[("OPS", 0.75)]),
        };
        assert!(evaluator().evaluate(&input, 1000.0).is_err());
    }

    #[test]
    fn starting_pitcher_moves_the_probability() {
        let mut away = team("BOS", -110.0, &[("ERA", 4.0)]);
        let home = team("NYY", -110.0, &[("ERA", 4.0)]);
        let input = MatchupInput {
            date: None,
            home: home.clone(),
            away: away.clone(),
        };
        let even = evaluator().evaluate(&input, 1000.0).unwrap();
        assert_eq!(even.away.win_prob, 0.5);
        assert!(!even.away.used_pitcher_stats);

        away.pitcher = Some(TeamStats::from_pairs([("ERA", 2.0)]).unwrap());
        let input = MatchupInput {
            date: None,
            home,
            away,
        };
        let report = evaluator().evaluate(&input, 1000.0).unwrap();
        assert!(report.away.used_pitcher_stats);
        assert!(!report.home.used_pitcher_stats);
        // ERA 2.0 vs 4.0 on the inverse scale.
        assert!((report.away.win_prob - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.away.metrics_better, 1);
    }

    #[test]
    fn season_record_feeds_the_composite_score() {
        let mut home = team("NYY", -110.0, &[("OPS", 0.80)]);
        home.season_win_pct = None;
        home.record = Some(SeasonRecord {
            wins: 60,
            losses: 40,
        });
        let input = MatchupInput {
            date: None,
            home,
            away: team("BOS", -110.0, &[("OPS", 0.75)]),
        };
        let report = evaluator().evaluate(&input, 1000.0).unwrap();
        assert_eq!(report.home.metrics_better, 1);
        let expected = calculate_team_score(&CompositeInputs {
            win_prob: report.home.win_prob,
            implied_prob: report.home.implied_prob,
            season_win_pct: 0.6,
            team_rank: 3,
            metrics_better: 1,
            total_metrics: DEFAULT_TOTAL_METRICS,
        })
        .unwrap();
        assert_eq!(report.home.score, Some(expected));

        let custom = evaluator().with_total_metrics(5).evaluate(&input, 1000.0).unwrap();
        assert_ne!(custom.home.score, report.home.score);
    }
}
