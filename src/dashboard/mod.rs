//! Dashboard module - pipeline, view model and user-facing errors

mod pipeline;
mod view;

pub use pipeline::Pipeline;
pub use view::{build_view, DashboardView, DisplayTable, MetricCard, Notice, Severity, Trend};

use crate::data::{LoaderError, NormalizeError};
use crate::stats::MetricsError;
use thiserror::Error;

/// Any failure of a render pass. None of them is fatal to the process.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    Fetch(#[from] LoaderError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

impl DashboardError {
    /// Missing data is informational; everything else is an error.
    pub fn severity(&self) -> Severity {
        match self {
            DashboardError::Metrics(MetricsError::NoYearColumns)
            | DashboardError::Metrics(MetricsError::EmptyData { .. }) => Severity::Info,
            _ => Severity::Error,
        }
    }

    /// Full-page message shown instead of the dashboard.
    pub fn notice(&self) -> Notice {
        let severity = self.severity();
        match self {
            DashboardError::Fetch(e) => Notice::new(
                severity,
                format!(
                    "Kunne ikke laste data. Sjekk at Google Sheet-lenken er riktig og at arket er delt offentlig (eller som CSV). ({})",
                    e
                ),
            )
            .with_hint("Tips: Sjekk at sheet_url i dashboard.json peker til ditt eget Google Sheet."),
            DashboardError::Normalize(NormalizeError::MissingKeyColumn { label, available }) => {
                Notice::new(severity, format!("Finner ikke kolonnen '{}' i arket.", label)).with_hint(
                    format!(
                        "Sjekk overskriftsraden: den må ha en kolonne som heter '{}'. Fant: {}.",
                        label,
                        available.join(", ")
                    ),
                )
            }
            DashboardError::Normalize(NormalizeError::UnresolvedKey { line, column }) => {
                Notice::new(severity, format!("Rad {} mangler verdi i kolonnen '{}'.", line, column))
                    .with_hint("Fyll inn ukenummer eller fjern raden.")
            }
            DashboardError::Metrics(MetricsError::NoYearColumns) => Notice::new(
                severity,
                "Arket har ingen årskolonner ennå.",
            )
            .with_hint("Legg til en kolonne per år, for eksempel '2024' og '2025'."),
            DashboardError::Metrics(MetricsError::EmptyData { year }) => Notice::new(
                severity,
                format!("Ingen salgstall registrert for {} ennå.", year),
            ),
            DashboardError::Metrics(e @ MetricsError::UnknownColumn(_)) => {
                Notice::new(severity, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_data_is_informational() {
        assert_eq!(
            DashboardError::from(MetricsError::NoYearColumns).severity(),
            Severity::Info
        );
        assert_eq!(
            DashboardError::from(MetricsError::EmptyData { year: "2025".into() }).severity(),
            Severity::Info
        );
        assert_eq!(
            DashboardError::from(LoaderError::NoData).severity(),
            Severity::Error
        );
    }

    #[test]
    fn unresolved_key_points_at_line() {
        let err = DashboardError::from(NormalizeError::UnresolvedKey {
            line: 7,
            column: "Uke".into(),
        });
        assert_eq!(err.notice().message, "Rad 7 mangler verdi i kolonnen 'Uke'.");
    }
}
