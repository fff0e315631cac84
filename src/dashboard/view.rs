//! Dashboard view model: labeled metrics, the display table and the chart.

use crate::charts::LineChart;
use crate::config::{DashboardConfig, LayoutMode};
use crate::data::{
    find_key_column, is_ledger, normalize, select_year_columns, summarize, LedgerSummary, RawTable,
    WeekIndexedTable, WeekKey, REVENUE_COLUMN,
};
use crate::stats::format::{format_amount, format_cell, format_count, format_delta, format_percent};
use crate::stats::{ComparisonGap, MetricsCalculator, WeeklyMetric};
use std::time::Instant;

use super::DashboardError;

/// Direction of a change, used to color deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn of(delta: f64) -> Self {
        if delta.round() > 0.0 {
            Trend::Up
        } else if delta.round() < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}

/// A labeled scalar metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricCard {
    pub label: String,
    pub value: String,
    pub delta: Option<String>,
    pub trend: Option<Trend>,
    pub caption: Option<String>,
}

impl MetricCard {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            delta: None,
            trend: None,
            caption: None,
        }
    }

    fn with_delta(mut self, delta: String, trend: Trend) -> Self {
        self.delta = Some(delta);
        self.trend = Some(trend);
        self
    }

    fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A message for the user, with optional guidance.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    pub hint: Option<String>,
}

impl Notice {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Formatted table for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DisplayTable {
    fn from_weekly(table: &WeekIndexedTable) -> Self {
        let mut headers = vec![table.key_column().to_string()];
        headers.extend(table.columns().iter().map(|c| c.name.clone()));

        let rows = table
            .keys()
            .iter()
            .enumerate()
            .map(|(row, key)| {
                let mut cells = vec![key.to_string()];
                cells.extend(table.columns().iter().map(|c| format_cell(c.values[row])));
                cells
            })
            .collect();

        Self { headers, rows }
    }

    fn from_raw(raw: &RawTable) -> Self {
        Self {
            headers: raw.headers().to_vec(),
            rows: raw
                .rows()
                .iter()
                .map(|row| row.iter().map(|c| c.clone().unwrap_or_default()).collect())
                .collect(),
        }
    }
}

/// Everything the presentation layer needs for one render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub title: String,
    pub headline: String,
    pub metrics: Vec<MetricCard>,
    pub notices: Vec<Notice>,
    pub table: DisplayTable,
    pub chart: Option<LineChart>,
    /// When the underlying sheet was fetched.
    pub fetched_at: Option<Instant>,
}

fn week_label(week: &WeekKey) -> String {
    match week {
        WeekKey::Number(n) => format!("Uke {}", n),
        WeekKey::Label(label) => label.clone(),
    }
}

fn headline(rows: usize) -> String {
    format!("Data hentet vellykket! Viser {} rader.", rows)
}

/// Build the view for a fetched sheet according to the configured layout.
pub fn build_view(raw: &RawTable, config: &DashboardConfig) -> Result<DashboardView, DashboardError> {
    match config.layout {
        LayoutMode::Weekly => weekly_view(raw, config),
        LayoutMode::Ledger => Ok(ledger_view(raw, config)),
        LayoutMode::Auto => {
            if find_key_column(raw, &config.key_column).is_none() && is_ledger(raw) {
                Ok(ledger_view(raw, config))
            } else {
                weekly_view(raw, config)
            }
        }
    }
}

fn weekly_view(raw: &RawTable, config: &DashboardConfig) -> Result<DashboardView, DashboardError> {
    let table = normalize(raw, &config.key_column)?;
    let years = select_year_columns(&table);
    let metric = MetricsCalculator::compute_metrics(&table, &years)?;

    let chart = LineChart::from_table(
        &table,
        &years,
        &format!("Salg per {}", table.key_column().to_lowercase()),
        &config.currency_suffix,
    );

    Ok(DashboardView {
        title: config.title.clone(),
        headline: headline(table.len()),
        metrics: weekly_cards(&metric, &config.currency_suffix),
        notices: comparison_notice(&metric).into_iter().collect(),
        table: DisplayTable::from_weekly(&table),
        chart: Some(chart),
        fetched_at: None,
    })
}

fn weekly_cards(metric: &WeeklyMetric, suffix: &str) -> Vec<MetricCard> {
    let week = week_label(&metric.week);
    let mut cards = Vec::with_capacity(4);

    cards.push(
        MetricCard::new("Siste rapporterte uke", week.clone()).with_caption(format!(
            "{} uker med tall i {}",
            metric.reported_weeks, metric.current_year
        )),
    );

    let mut current = MetricCard::new(
        format!("Salg {} ({})", week.to_lowercase(), metric.current_year),
        format_amount(metric.current_value, suffix),
    );
    if let Some(delta) = metric.delta {
        let text = match metric.change_ratio() {
            Some(ratio) => format!("{} ({})", format_delta(delta, suffix), format_percent(ratio)),
            None => format_delta(delta, suffix),
        };
        current = current.with_delta(text, Trend::of(delta));
    }
    cards.push(current);

    let prior_label = match &metric.prior_year {
        Some(year) => format!("Samme uke {}", year),
        None => "Samme uke i fjor".to_string(),
    };
    let prior_value = metric
        .prior_value
        .map(|v| format_amount(v, suffix))
        .unwrap_or_else(|| "Ikke tilgjengelig".to_string());
    cards.push(MetricCard::new(prior_label, prior_value));

    let mut ytd = MetricCard::new(
        format!("Hittil i år ({})", metric.current_year),
        format_amount(metric.year_to_date_total, suffix),
    );
    if let (Some(delta), Some(year)) = (metric.year_to_date_delta(), &metric.prior_year) {
        ytd = ytd
            .with_delta(format_delta(delta, suffix), Trend::of(delta))
            .with_caption(format!("mot samme periode {}", year));
    }
    cards.push(ytd);

    cards
}

fn comparison_notice(metric: &WeeklyMetric) -> Option<Notice> {
    let week = week_label(&metric.week).to_lowercase();
    match metric.comparison_gap()? {
        ComparisonGap::NoPriorYear => Some(Notice::new(
            Severity::Info,
            format!(
                "Arket har bare tall for {}, så det er ingenting å sammenligne med.",
                metric.current_year
            ),
        )),
        ComparisonGap::MissingPriorValue { year } => Some(
            Notice::new(
                Severity::Info,
                format!("Sammenligning med {} er ikke tilgjengelig for {}.", year, week),
            )
            .with_hint(format!("Kolonnen '{}' mangler tall for {}.", year, week)),
        ),
    }
}

fn ledger_view(raw: &RawTable, config: &DashboardConfig) -> DashboardView {
    let LedgerSummary {
        table,
        row_count,
        revenue_total,
        sales_count,
    } = summarize(raw);

    let mut metrics = Vec::new();
    let mut notices = Vec::new();

    match revenue_total {
        Some(total) => metrics.push(MetricCard::new(
            "Total Omsetning",
            format_amount(total, &config.currency_suffix),
        )),
        None => notices.push(Notice::new(
            Severity::Warning,
            format!("Finner ikke kolonnen '{}'", REVENUE_COLUMN),
        )),
    }
    if let Some(count) = sales_count {
        metrics.push(MetricCard::new("Totalt Antall Salg", format_count(count)));
    }

    DashboardView {
        title: config.title.clone(),
        headline: headline(row_count),
        metrics,
        notices,
        table: DisplayTable::from_raw(&table),
        chart: None,
        fetched_at: None,
    }
}
