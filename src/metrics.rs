use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Season statistics understood by the model. The string form matches the
/// column names of the statistics feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "run_differential")]
    RunDifferential,
    #[serde(rename = "OPS")]
    Ops,
    #[serde(rename = "SLG")]
    Slg,
    #[serde(rename = "OBP")]
    Obp,
    #[serde(rename = "ERA+")]
    EraPlus,
    #[serde(rename = "XBH")]
    ExtraBaseHits,
    #[serde(rename = "LOB%")]
    LeftOnBasePct,
    #[serde(rename = "RAR")]
    RunsAboveReplacement,
    #[serde(rename = "Hits")]
    Hits,
    #[serde(rename = "ISO")]
    IsolatedPower,
    #[serde(rename = "ERA")]
    Era,
    #[serde(rename = "FIP")]
    Fip,
    #[serde(rename = "WHIP")]
    Whip,
    #[serde(rename = "RBI")]
    Rbi,
    #[serde(rename = "ERA-")]
    EraMinus,
    #[serde(rename = "FIP-")]
    FipMinus,
    #[serde(rename = "R")]
    RunsAllowedByPitcher,
    #[serde(rename = "ER")]
    EarnedRuns,
    #[serde(rename = "RunsScored")]
    RunsScored,
    #[serde(rename = "RunsAllowed")]
    RunsAllowed,
}

impl Metric {
    pub const ALL: [Metric; 20] = [
        Metric::RunDifferential,
        Metric::Ops,
        Metric::Slg,
        Metric::Obp,
        Metric::EraPlus,
        Metric::ExtraBaseHits,
        Metric::LeftOnBasePct,
        Metric::RunsAboveReplacement,
        Metric::Hits,
        Metric::IsolatedPower,
        Metric::Era,
        Metric::Fip,
        Metric::Whip,
        Metric::Rbi,
        Metric::EraMinus,
        Metric::FipMinus,
        Metric::RunsAllowedByPitcher,
        Metric::EarnedRuns,
        Metric::RunsScored,
        Metric::RunsAllowed,
    ];

    /// Metrics taken from the starting pitcher's line instead of the staff
    /// totals when a pitcher is named.
    pub const PITCHER: [Metric; 8] = [
        Metric::Era,
        Metric::Fip,
        Metric::Whip,
        Metric::EraMinus,
        Metric::FipMinus,
        Metric::RunsAllowedByPitcher,
        Metric::EarnedRuns,
        Metric::LeftOnBasePct,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::RunDifferential => "run_differential",
            Metric::Ops => "OPS",
            Metric::Slg => "SLG",
            Metric::Obp => "OBP",
            Metric::EraPlus => "ERA+",
            Metric::ExtraBaseHits => "XBH",
            Metric::LeftOnBasePct => "LOB%",
            Metric::RunsAboveReplacement => "RAR",
            Metric::Hits => "Hits",
            Metric::IsolatedPower => "ISO",
            Metric::Era => "ERA",
            Metric::Fip => "FIP",
            Metric::Whip => "WHIP",
            Metric::Rbi => "RBI",
            Metric::EraMinus => "ERA-",
            Metric::FipMinus => "FIP-",
            Metric::RunsAllowedByPitcher => "R",
            Metric::EarnedRuns => "ER",
            Metric::RunsScored => "RunsScored",
            Metric::RunsAllowed => "RunsAllowed",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let key = raw.trim();
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.name() == key)
            .ok_or_else(|| CoreError::UnknownMetric {
                name: key.to_string(),
            })
    }
}

/// One team's statistics for a single evaluation.
///
/// Keys are restricted to [`Metric`]; values must be finite. A metric that is
/// simply absent is allowed and gets skipped by the scorer and comparator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, f64>",
    into = "BTreeMap<String, f64>"
)]
pub struct TeamStats {
    values: BTreeMap<Metric, f64>,
}

impl TeamStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> CoreResult<Self> {
        let mut stats = Self::new();
        for (name, value) in pairs {
            stats.insert(name.parse()?, value)?;
        }
        Ok(stats)
    }

    pub fn insert(&mut self, metric: Metric, value: f64) -> CoreResult<()> {
        if !value.is_finite() {
            return Err(CoreError::NonFiniteMetric { metric, value });
        }
        self.values.insert(metric, value);
        Ok(())
    }

    pub fn with(mut self, metric: Metric, value: f64) -> CoreResult<Self> {
        self.insert(metric, value)?;
        Ok(self)
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.values.iter().map(|(m, v)| (*m, *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replaces the pitching metrics with the starter's values. Other keys in
    /// `pitcher` are ignored. Returns whether anything was replaced.
    pub fn overlay_pitcher(&mut self, pitcher: &TeamStats) -> bool {
        let mut used = false;
        for metric in Metric::PITCHER {
            if let Some(value) = pitcher.get(metric) {
                self.values.insert(metric, value);
                used = true;
            }
        }
        used
    }

    /// Values for `metric` on both sides, or `None` if either side lacks it.
    pub fn paired(&self, other: &TeamStats, metric: Metric) -> Option<(f64, f64)> {
        Some((self.get(metric)?, other.get(metric)?))
    }
}

impl TryFrom<BTreeMap<String, f64>> for TeamStats {
    type Error = CoreError;

    fn try_from(raw: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        TeamStats::from_pairs(raw.iter().map(|(k, v)| (k.as_str(), *v)))
    }
}

impl From<TeamStats> for BTreeMap<String, f64> {
    fn from(stats: TeamStats) -> Self {
        stats
            .values
            .into_iter()
            .map(|(m, v)| (m.name().to_string(), v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Metric, TeamStats};
    use crate::error::CoreError;

    #[test]
    fn metric_names_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(metric.name().parse::<Metric>().unwrap(), metric);
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = TeamStats::from_pairs([("OPS", 0.75), ("wRC+", 110.0)]).unwrap_err();
        assert_eq!(
            err,
            CoreError::UnknownMetric {
                name: "wRC+".to_string()
            }
        );
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let err = TeamStats::new().with(Metric::Era, f64::NAN).unwrap_err();
        assert!(matches!(err, CoreError::NonFiniteMetric { metric: Metric::Era, .. }));
    }

    #[test]
    fn deserializes_from_feed_column_names() {
        let stats: TeamStats =
            serde_json::from_str(r#"{"OPS": 0.812, "ERA+": 104, "LOB%": 0.72}"#).unwrap();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats.get(Metric::EraPlus), Some(104.0));
        assert!(serde_json::from_str::<TeamStats>(r#"{"Runs": 1}"#).is_err());
    }

    #[test]
    fn pitcher_line_replaces_staff_pitching() {
        let mut stats =
            TeamStats::from_pairs([("OPS", 0.75), ("ERA", 4.1), ("LOB%", 0.70), ("R", 640.0)])
                .unwrap();
        let starter =
            TeamStats::from_pairs([("ERA", 2.6), ("LOB%", 0.78), ("OPS", 0.55)]).unwrap();
        assert!(stats.overlay_pitcher(&starter));
        assert_eq!(stats.get(Metric::Era), Some(2.6));
        assert_eq!(stats.get(Metric::LeftOnBasePct), Some(0.78));
        // Batting and untouched pitching keys keep the team values.
        assert_eq!(stats.get(Metric::Ops), Some(0.75));
        assert_eq!(stats.get(Metric::RunsAllowedByPitcher), Some(640.0));

        let batting_only = TeamStats::from_pairs([("OPS", 0.9)]).unwrap();
        assert!(!stats.overlay_pitcher(&batting_only));
        assert!(!stats.overlay_pitcher(&TeamStats::new()));
        assert_eq!(stats.get(Metric::Ops), Some(0.75));
    }

    #[test]
    fn paired_requires_both_sides() {
        let a = TeamStats::from_pairs([("OPS", 0.8), ("ERA", 3.1)]).unwrap();
        let b = TeamStats::from_pairs([("OPS", 0.7)]).unwrap();
        assert_eq!(a.paired(&b, Metric::Ops), Some((0.8, 0.7)));
        assert_eq!(a.paired(&b, Metric::Era), None);
    }
}
