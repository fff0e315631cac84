//! Data module - sheet loading, caching and normalization

mod cache;
mod coerce;
mod ledger;
mod loader;
mod processor;

pub use cache::{CachedSheet, SheetCache};
pub use ledger::{is_ledger, summarize, LedgerSummary, REVENUE_COLUMN};
pub use loader::{source_for, LoaderError, RawTable, SheetSource};
pub use processor::{
    find_key_column, normalize, select_year_columns, NormalizeError, WeekIndexedTable, WeekKey,
};
