use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use mlb_edge::backtest::{self, RecordedGame};
use mlb_edge::config::Settings;
use mlb_edge::matchup::{MatchupInput, MatchupReport, SideReport};

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    mlb_edge::logging::init();

    let path = positional_arg()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/matchup.json"));

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
    let mut input: MatchupInput =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    if input.date.is_none() {
        input.date = Some(chrono::Local::now().format("%Y-%m-%d").to_string());
    }

    let report = settings
        .evaluator()?
        .evaluate(&input, settings.bankroll)
        .context("evaluate matchup")?;

    if has_flag("--json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    print_report(&report);

    if let Some(schedule) = parse_str_arg("--schedule") {
        let raw = fs::read_to_string(&schedule).with_context(|| format!("read {schedule}"))?;
        let games: Vec<RecordedGame> =
            serde_json::from_str(&raw).with_context(|| format!("parse {schedule}"))?;
        let (wins, played) = backtest::head_to_head(&games, &report.home.team, &report.away.team);
        println!();
        println!(
            "Head-to-Head Record: {} has won {} out of {} games against {} this season",
            report.home.team, wins, played, report.away.team
        );
    }
    Ok(())
}

fn print_report(report: &MatchupReport) {
    let home = &report.home;
    let away = &report.away;

    println!();
    println!("{} (Home) vs {} (Away):", home.team, away.team);
    if let Some(date) = &report.date {
        println!("Date: {date}");
    }
    println!("Win Probability for {}: {:.2}%", away.team, away.win_prob * 100.0);
    println!("Win Probability for {}: {:.2}%", home.team, home.win_prob * 100.0);

    println!();
    println!("Odds and Edge Calculation:");
    print_side(home, "Home");
    print_side(away, "Away");

    println!();
    println!("{} is better in {} metrics.", home.team, home.metrics_better);
    println!("{} is better in {} metrics.", away.team, away.metrics_better);

    if home.score.is_some() || away.score.is_some() {
        println!();
        println!("Team Scores:");
        for side in [home, away] {
            if let Some(score) = side.score {
                println!("{} Score: {:.4}", side.team, score);
            }
        }
    }

    if let (Some(h), Some(a), Some(diff)) =
        (home.pythag_win_pct, away.pythag_win_pct, report.pythag_diff)
    {
        println!();
        println!("Pythagorean Winning Percentage:");
        println!("{} Pythagorean Win%: {:.4}", home.team, h);
        println!("{} Pythagorean Win%: {:.4}", away.team, a);
        println!(
            "Pythagorean Win% Difference ({} - {}): {:.4}",
            home.team, away.team, diff
        );
    }

    println!();
    println!("Bet Suggestions:");
    for side in [home, away] {
        match side.bet_size {
            Some(bet) => println!("  Suggested bet size for {}: ${:.2}", side.team, bet),
            None => println!("  No bet suggested for {} (Edge <= 1%)", side.team),
        }
    }
}

fn print_side(side: &SideReport, label: &str) {
    println!("{} ({label}):", side.team);
    if side.used_pitcher_stats {
        println!("  Using starting pitcher stats");
    }
    println!("  Original odds: {}", side.american_odds);
    println!("  Implied probability: {:.2}%", side.implied_prob * 100.0);
    println!("  Adjusted odds: {:.2}", side.adjusted_odds);
    println!("  Edge: {:.2}%", side.edge_pct);
}

fn positional_arg() -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut idx = 0;
    while idx < args.len() {
        let arg = &args[idx];
        if arg.starts_with("--") {
            // Value flags consume the following argument.
            if !arg.contains('=') && arg != "--json" {
                idx += 1;
            }
        } else {
            return Some(arg.clone());
        }
        idx += 1;
    }
    None
}

fn parse_str_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}="))
            && !raw.trim().is_empty()
        {
            return Some(raw.trim().to_string());
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
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

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}
