//! Metrics Calculator Module
//! Derives the latest-week and year-to-date sales metrics from a week-indexed table.

use crate::data::{WeekIndexedTable, WeekKey};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    #[error("No year columns found")]
    NoYearColumns,
    #[error("Column '{0}' is not in the table")]
    UnknownColumn(String),
    #[error("No values reported for {year} yet")]
    EmptyData { year: String },
}

/// Why the prior-year comparison could not be made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonGap {
    /// Only one year column exists.
    NoPriorYear,
    /// The prior year has no value for the latest week.
    MissingPriorValue { year: String },
}

/// Snapshot of the metrics for the most recently reported week.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyMetric {
    pub week: WeekKey,
    pub current_year: String,
    pub prior_year: Option<String>,
    pub current_value: f64,
    pub prior_value: Option<f64>,
    pub delta: Option<f64>,
    pub year_to_date_total: f64,
    /// Prior-year total over the rows up to and including the latest week.
    pub prior_year_to_date: Option<f64>,
    /// Number of weeks with a current-year value.
    pub reported_weeks: usize,
}

impl WeeklyMetric {
    /// Relative change against the same week last year.
    pub fn change_ratio(&self) -> Option<f64> {
        match (self.delta, self.prior_value) {
            (Some(delta), Some(prior)) if prior != 0.0 => Some(delta / prior),
            _ => None,
        }
    }

    /// Year-to-date difference against the prior year over the same weeks.
    pub fn year_to_date_delta(&self) -> Option<f64> {
        self.prior_year_to_date
            .map(|prior| self.year_to_date_total - prior)
    }

    pub fn comparison_gap(&self) -> Option<ComparisonGap> {
        match (&self.prior_year, self.prior_value) {
            (None, _) => Some(ComparisonGap::NoPriorYear),
            (Some(year), None) => Some(ComparisonGap::MissingPriorValue { year: year.clone() }),
            (Some(_), Some(_)) => None,
        }
    }
}

/// Handles the weekly metric derivation.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Compute the metrics for the latest week with a current-year value.
    ///
    /// `year_columns` must be in ascending order; the last entry is the current
    /// year and the one before it (if any) the prior year.
    pub fn compute_metrics(
        table: &WeekIndexedTable,
        year_columns: &[String],
    ) -> Result<WeeklyMetric, MetricsError> {
        let current_year = year_columns.last().ok_or(MetricsError::NoYearColumns)?;
        let prior_year = year_columns
            .len()
            .checked_sub(2)
            .and_then(|i| year_columns.get(i));

        let current = table
            .column(current_year)
            .ok_or_else(|| MetricsError::UnknownColumn(current_year.clone()))?;

        let reported: Vec<(usize, f64)> = current.present().collect();
        let &(latest_row, current_value) = reported.last().ok_or_else(|| MetricsError::EmptyData {
            year: current_year.clone(),
        })?;

        let week = table.keys()[latest_row].clone();
        let year_to_date_total: f64 = reported.iter().map(|(_, v)| v).sum();

        // Lookup failures degrade to "comparison unavailable"
        let prior_column = prior_year.and_then(|year| table.column(year));
        let prior_value = prior_year.and_then(|year| table.value(year, &week));
        let prior_year_to_date = prior_column.map(|column| {
            column
                .present()
                .take_while(|&(row, _)| row <= latest_row)
                .map(|(_, v)| v)
                .sum::<f64>()
        });

        let metric = WeeklyMetric {
            week,
            current_year: current_year.clone(),
            prior_year: prior_year.cloned(),
            current_value,
            prior_value,
            delta: prior_value.map(|prior| current_value - prior),
            year_to_date_total,
            prior_year_to_date,
            reported_weeks: reported.len(),
        };

        debug!(
            week = %metric.week,
            year = %metric.current_year,
            value = metric.current_value,
            ytd = metric.year_to_date_total,
            "computed weekly metric"
        );

        Ok(metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{normalize, select_year_columns, RawTable};

    fn table(headers: &[&str], rows: &[&[&str]]) -> WeekIndexedTable {
        let raw = RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| {
                    r.iter()
                        .map(|c| (!c.is_empty()).then(|| c.to_string()))
                        .collect()
                })
                .collect(),
        );
        normalize(&raw, "Uke").unwrap()
    }

    fn years(table: &WeekIndexedTable) -> Vec<String> {
        select_year_columns(table)
    }

    #[test]
    fn latest_week_skips_missing_values() {
        let t = table(&["Uke", "2025"], &[&["1", "100"], &["2", ""], &["3", "250"]]);
        let metric = MetricsCalculator::compute_metrics(&t, &years(&t)).unwrap();

        assert_eq!(metric.week, WeekKey::Number(3));
        assert_eq!(metric.current_value, 250.0);
        assert_eq!(metric.year_to_date_total, 350.0);
        assert_eq!(metric.reported_weeks, 2);
        assert_eq!(metric.comparison_gap(), Some(ComparisonGap::NoPriorYear));
    }

    #[test]
    fn trailing_empty_weeks_do_not_move_latest_week() {
        let t = table(
            &["Uke", "2025"],
            &[&["1", "100"], &["2", "150"], &["3", ""], &["4", ""]],
        );
        let metric = MetricsCalculator::compute_metrics(&t, &years(&t)).unwrap();
        assert_eq!(metric.week, WeekKey::Number(2));
        assert_eq!(metric.year_to_date_total, 250.0);
    }

    #[test]
    fn end_to_end_week_over_year() {
        let t = table(
            &["Uke", "2024", "2025"],
            &[&["1", "1000", "1100"], &["2", "900", ""], &["3", "950", "1050"]],
        );
        let metric = MetricsCalculator::compute_metrics(&t, &years(&t)).unwrap();

        assert_eq!(metric.week, WeekKey::Number(3));
        assert_eq!(metric.current_year, "2025");
        assert_eq!(metric.prior_year.as_deref(), Some("2024"));
        assert_eq!(metric.current_value, 1050.0);
        assert_eq!(metric.prior_value, Some(950.0));
        assert_eq!(metric.delta, Some(100.0));
        assert_eq!(metric.year_to_date_total, 2150.0);
        assert_eq!(metric.prior_year_to_date, Some(2850.0));
        assert_eq!(metric.year_to_date_delta(), Some(-700.0));
        assert_eq!(metric.comparison_gap(), None);
    }

    #[test]
    fn missing_prior_value_is_not_an_error() {
        let t = table(
            &["Uke", "2024", "2025"],
            &[&["1", "1000", "1100"], &["3", "", "1050"]],
        );
        let metric = MetricsCalculator::compute_metrics(&t, &years(&t)).unwrap();

        assert_eq!(metric.prior_value, None);
        assert_eq!(metric.delta, None);
        assert_eq!(metric.change_ratio(), None);
        assert_eq!(
            metric.comparison_gap(),
            Some(ComparisonGap::MissingPriorValue {
                year: "2024".into()
            })
        );
    }

    #[test]
    fn unknown_prior_column_degrades() {
        let t = table(&["Uke", "2025"], &[&["1", "10"]]);
        let year_columns = vec!["2024".to_string(), "2025".to_string()];
        let metric = MetricsCalculator::compute_metrics(&t, &year_columns).unwrap();

        assert_eq!(metric.prior_value, None);
        assert_eq!(metric.prior_year_to_date, None);
    }

    #[test]
    fn no_year_columns() {
        let t = table(&["Uke", "Kommentar"], &[&["1", "x"]]);
        let err = MetricsCalculator::compute_metrics(&t, &years(&t)).unwrap_err();
        assert_eq!(err, MetricsError::NoYearColumns);
    }

    #[test]
    fn empty_current_year() {
        let t = table(&["Uke", "2024", "2025"], &[&["1", "10", ""], &["2", "12", ""]]);
        let err = MetricsCalculator::compute_metrics(&t, &years(&t)).unwrap_err();
        assert_eq!(
            err,
            MetricsError::EmptyData {
                year: "2025".into()
            }
        );
    }

    #[test]
    fn change_ratio_against_prior() {
        let t = table(&["Uke", "2024", "2025"], &[&["1", "200", "250"]]);
        let metric = MetricsCalculator::compute_metrics(&t, &years(&t)).unwrap();
        assert_eq!(metric.change_ratio(), Some(0.25));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let raw = RawTable::new(
            vec!["Uke".into(), "2024".into(), "2025".into()],
            vec![
                vec![Some("1".into()), Some("1000".into()), Some("1100".into())],
                vec![Some("2".into()), Some("900".into()), None],
            ],
        );
        let run = || {
            let t = normalize(&raw, "Uke").unwrap();
            MetricsCalculator::compute_metrics(&t, &select_year_columns(&t)).unwrap()
        };
        assert_eq!(run(), run());
    }
}
