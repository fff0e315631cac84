//! Sales Ledger Module
//! Handles the per-sale sheet layout: optional `Dato`, `Omsetning` and `Antall`
//! columns plus anything else shown verbatim.

use super::coerce::{parse_date, parse_number};
use super::loader::RawTable;
use chrono::NaiveDate;
use std::cmp::Ordering;
use tracing::debug;

pub const DATE_COLUMN: &str = "Dato";
pub const REVENUE_COLUMN: &str = "Omsetning";
pub const COUNT_COLUMN: &str = "Antall";

/// Totals and the display-ready table of a sales ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSummary {
    /// Rows sorted newest first when a date column exists.
    pub table: RawTable,
    pub row_count: usize,
    /// `None` when the sheet has no revenue column.
    pub revenue_total: Option<f64>,
    /// `None` when the sheet has no count column.
    pub sales_count: Option<f64>,
}

/// True when the sheet looks like a ledger (any of the known columns present).
pub fn is_ledger(raw: &RawTable) -> bool {
    [DATE_COLUMN, REVENUE_COLUMN, COUNT_COLUMN]
        .iter()
        .any(|name| raw.has_column(name))
}

fn column_total(raw: &RawTable, name: &str) -> Option<f64> {
    let col = raw.column_index(name)?;
    Some(
        (0..raw.height())
            .filter_map(|row| raw.cell(row, col).and_then(parse_number))
            .sum(),
    )
}

/// Summarize a ledger sheet.
///
/// Dates are rewritten to ISO form; unparseable dates become empty and sort
/// last. The sort is stable.
pub fn summarize(raw: &RawTable) -> LedgerSummary {
    let table = match raw.column_index(DATE_COLUMN) {
        Some(col) => sort_by_date_desc(raw, col),
        None => raw.clone(),
    };

    let summary = LedgerSummary {
        row_count: table.height(),
        revenue_total: column_total(&table, REVENUE_COLUMN),
        sales_count: column_total(&table, COUNT_COLUMN),
        table,
    };
    debug!(
        rows = summary.row_count,
        revenue = ?summary.revenue_total,
        count = ?summary.sales_count,
        "summarized ledger"
    );
    summary
}

fn sort_by_date_desc(raw: &RawTable, col: usize) -> RawTable {
    let mut dated: Vec<(Option<NaiveDate>, Vec<Option<String>>)> = raw
        .rows()
        .iter()
        .map(|row| {
            let date = row.get(col).and_then(|c| c.as_deref()).and_then(parse_date);
            let mut row = row.clone();
            if let Some(cell) = row.get_mut(col) {
                *cell = date.map(|d| d.format("%Y-%m-%d").to_string());
            }
            (date, row)
        })
        .collect();

    dated.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    RawTable::new(
        raw.headers().to_vec(),
        dated.into_iter().map(|(_, row)| row).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| {
                    r.iter()
                        .map(|c| (!c.is_empty()).then(|| c.to_string()))
                        .collect()
                })
                .collect(),
        )
    }

    #[test]
    fn sorts_newest_first_with_bad_dates_last() {
        let sheet = raw(
            &["Dato", "Omsetning", "Antall", "Selger"],
            &[
                &["01.03.2025", "1 000 kr", "2", "Kari"],
                &["ukjent", "500", "1", "Ola"],
                &["2025-03-05", "2 500", "3", "Per"],
                &["02.03.2025", "N/A", "", "Kari"],
            ],
        );
        let summary = summarize(&sheet);

        let dates: Vec<Option<&str>> = (0..summary.table.height())
            .map(|row| summary.table.cell(row, 0))
            .collect();
        assert_eq!(
            dates,
            vec![Some("2025-03-05"), Some("2025-03-02"), Some("2025-03-01"), None]
        );
        assert_eq!(summary.table.cell(3, 3), Some("Ola"));
        assert_eq!(summary.row_count, 4);
        assert_eq!(summary.revenue_total, Some(4000.0));
        assert_eq!(summary.sales_count, Some(6.0));
    }

    #[test]
    fn missing_columns_have_no_totals() {
        let sheet = raw(&["Dato", "Selger"], &[&["2025-01-01", "Kari"]]);
        let summary = summarize(&sheet);

        assert!(is_ledger(&sheet));
        assert_eq!(summary.revenue_total, None);
        assert_eq!(summary.sales_count, None);
    }

    #[test]
    fn keeps_order_without_date_column() {
        let sheet = raw(&["Omsetning"], &[&["3"], &["1"], &["2"]]);
        let summary = summarize(&sheet);
        assert_eq!(summary.table, sheet);
        assert_eq!(summary.revenue_total, Some(6.0));
    }

    #[test]
    fn other_sheets_are_not_ledgers() {
        let sheet = raw(&["Uke", "2025"], &[&["1", "10"]]);
        assert!(!is_ledger(&sheet));
    }
}
