pub mod adjust;
pub mod backtest;
pub mod calibration;
pub mod compare;
pub mod composite;
pub mod config;
pub mod error;
pub mod logging;
pub mod matchup;
pub mod metrics;
pub mod odds;
pub mod scorer;
pub mod sizing;

pub use error::{CoreError, CoreResult};
pub use metrics::{Metric, TeamStats};
