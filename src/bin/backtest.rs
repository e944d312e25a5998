use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use mlb_edge::backtest::{self, BacktestConfig, RecordedGame};
use mlb_edge::config::Settings;

const DEFAULT_GAMES_PATH: &str = "tests/fixtures/backtest_games.json";

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    mlb_edge::logging::init();

    let path = parse_str_arg("--games")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_GAMES_PATH));

    let mut settings = Settings::from_env();
    if let Some(v) = parse_f64_arg("--bankroll") {
        settings.bankroll = v;
    }
    if let Some(v) = parse_f64_arg("--max-edge") {
        settings.max_edge = v;
    }
    if let Some(v) = parse_f64_arg("--max-bet-pct") {
        settings.max_bet_percentage = v;
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let games: Vec<RecordedGame> =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;

    let team = parse_str_arg("--team")
        .or_else(|| games.first().map(|g| g.team.clone()))
        .ok_or_else(|| anyhow!("no games in {} and no --team given", path.display()))?;
    let max_games = parse_usize_arg("--max-games").unwrap_or(games.len());

    let evaluator = settings.evaluator()?;
    let cfg = BacktestConfig {
        team,
        initial_bankroll: settings.bankroll,
        max_games,
    };

    tracing::info!(team = %cfg.team, games = games.len(), max_games, "starting backtest");
    let report = backtest::simulate(&evaluator, &games, &cfg);

    if has_flag("--json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("Backtest Results ({}):", report.team);
    println!("Games Evaluated: {}", report.games_evaluated);
    if report.games_skipped > 0 {
        println!("Games Skipped: {}", report.games_skipped);
    }
    println!("Total Bets: {}", report.total_bets);
    println!("Total Profit/Loss: {:.2}", report.total_profit);
    println!("Biggest Profit: {:.2}", report.biggest_profit);
    println!("Biggest Loss: {:.2}", report.biggest_loss);
    println!("Starting Bankroll: {:.2}", report.initial_bankroll);
    println!("Ending Bankroll: {:.2}", report.final_bankroll);
    println!("Profitable Bets: {:.2}%", report.profitable_bet_pct);
    if report.busted {
        println!("Bankroll exhausted before the end of the schedule.");
    }
    println!(
        "Model: samples={} brier={:.4} log_loss={:.4} accuracy={:.3}",
        report.model.samples, report.model.brier, report.model.log_loss, report.model.accuracy
    );
    println!("Calibration: ece={:.4}", report.ece);
    for bin in report.calibration.iter().filter(|b| b.count > 0) {
        println!(
            "  [{:.1}, {:.1}) n={} avg_pred={:.3} actual={:.3}",
            bin.bucket_start, bin.bucket_end, bin.count, bin.avg_pred, bin.actual_rate
        );
    }

    let window = &games[..games.len().min(cfg.max_games)];
    let opponents: BTreeSet<&str> = window
        .iter()
        .filter(|g| g.team == cfg.team)
        .map(|g| g.opponent.as_str())
        .collect();
    if !opponents.is_empty() {
        println!("Head-to-Head:");
        for opponent in opponents {
            let (wins, played) = backtest::head_to_head(window, &cfg.team, opponent);
            println!("  vs {opponent}: {wins}-{}", played - wins);
        }
    }

    Ok(())
}

fn parse_str_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}=")) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn parse_f64_arg(name: &str) -> Option<f64> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}="))
            && let Ok(v) = raw.trim().parse::<f64>()
        {
            return Some(v);
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && let Ok(v) = next.trim().parse::<f64>()
        {
            return Some(v);
        }
    }
    None
}

fn parse_usize_arg(name: &str) -> Option<usize> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}="))
            && let Ok(v) = raw.trim().parse::<usize>()
        {
            return Some(v);
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && let Ok(v) = next.trim().parse::<usize>()
        {
            return Some(v);
        }
    }
    None
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}
