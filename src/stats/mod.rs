//! Stats module - weekly metrics and number formatting

mod calculator;
pub mod format;

pub use calculator::{ComparisonGap, MetricsCalculator, MetricsError, WeeklyMetric};
