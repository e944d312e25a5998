use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::metrics::{Metric, TeamStats};

/// Which direction counts as "better" for each metric. The two sets are
/// disjoint; metrics in neither set are ignored by the comparator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PolarityTable")]
pub struct MetricPolarity {
    higher_is_better: BTreeSet<Metric>,
    lower_is_better: BTreeSet<Metric>,
}

#[derive(Deserialize)]
struct PolarityTable {
    higher_is_better: BTreeSet<Metric>,
    lower_is_better: BTreeSet<Metric>,
}

impl TryFrom<PolarityTable> for MetricPolarity {
    type Error = CoreError;

    fn try_from(table: PolarityTable) -> Result<Self, Self::Error> {
        MetricPolarity::new(table.higher_is_better, table.lower_is_better)
    }
}

impl MetricPolarity {
    pub fn new(
        higher_is_better: impl IntoIterator<Item = Metric>,
        lower_is_better: impl IntoIterator<Item = Metric>,
    ) -> CoreResult<Self> {
        let higher_is_better: BTreeSet<Metric> = higher_is_better.into_iter().collect();
        let lower_is_better: BTreeSet<Metric> = lower_is_better.into_iter().collect();
        if let Some(metric) = higher_is_better.intersection(&lower_is_better).next() {
            return Err(CoreError::OverlappingPolarity { metric: *metric });
        }
        Ok(Self {
            higher_is_better,
            lower_is_better,
        })
    }
}

impl Default for MetricPolarity {
    fn default() -> Self {
        Self {
            higher_is_better: BTreeSet::from([
                Metric::RunDifferential,
                Metric::Ops,
                Metric::Slg,
                Metric::Obp,
                Metric::ExtraBaseHits,
                Metric::Hits,
                Metric::IsolatedPower,
                Metric::RunsAboveReplacement,
                Metric::Rbi,
                Metric::LeftOnBasePct,
            ]),
            lower_is_better: BTreeSet::from([
                Metric::Era,
                Metric::Fip,
                Metric::Whip,
                Metric::EraMinus,
                Metric::FipMinus,
                Metric::RunsAllowedByPitcher,
                Metric::EarnedRuns,
            ]),
        }
    }
}

/// Metrics won by each side. Ties go to neither, so the two counts need not
/// add up to the number of shared metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricTally {
    pub first: usize,
    pub second: usize,
}

pub fn compare_metrics(
    first: &TeamStats,
    second: &TeamStats,
    polarity: &MetricPolarity,
) -> MetricTally {
    let mut tally = MetricTally::default();
    for (metric, a) in first.iter() {
        let Some(b) = second.get(metric) else {
            continue;
        };
        let (first_wins, second_wins) = if polarity.higher_is_better.contains(&metric) {
            (a > b, b > a)
        } else if polarity.lower_is_better.contains(&metric) {
            (a < b, b < a)
        } else {
            continue;
        };
        if first_wins {
            tally.first += 1;
        } else if second_wins {
            tally.second += 1;
        }
    }
    tally
}
