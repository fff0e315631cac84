//! Dashboard pipeline: fetch (through the cache), normalize, derive, build the view.

use crate::config::DashboardConfig;
use crate::data::{source_for, CachedSheet, LoaderError, RawTable, SheetCache, SheetSource};
use tracing::{info, warn};

use super::{build_view, DashboardError, DashboardView};

/// Runs the whole pipeline end to end on every call. Only the raw fetch is cached.
pub struct Pipeline {
    config: DashboardConfig,
    source: Box<dyn SheetSource>,
    cache: SheetCache,
}

impl Pipeline {
    /// Build a pipeline with the source implied by the configured URL.
    pub fn new(config: DashboardConfig) -> Result<Self, LoaderError> {
        let source = source_for(&config.sheet_url, config.request_timeout())?;
        Ok(Self::with_source(config, source))
    }

    pub fn with_source(config: DashboardConfig, source: Box<dyn SheetSource>) -> Self {
        let cache = SheetCache::new(config.cache_ttl());
        Self {
            config,
            source,
            cache,
        }
    }

    fn fetch(&self) -> Result<CachedSheet, LoaderError> {
        let url = &self.config.sheet_url;
        self.cache.get_or_fetch(url, || {
            let bytes = self.source.fetch(url)?;
            RawTable::from_csv(&bytes)
        })
    }

    /// Fetch and build the dashboard. Every failure comes back as a `DashboardError`.
    pub fn run(&self) -> Result<DashboardView, DashboardError> {
        let sheet = self.fetch().inspect_err(|e| warn!("fetch failed: {e}"))?;
        let mut view = build_view(&sheet.table, &self.config)?;
        view.fetched_at = Some(sheet.fetched_at);
        info!(
            rows = sheet.table.height(),
            metrics = view.metrics.len(),
            "dashboard built"
        );
        Ok(view)
    }

    /// Drop the cached sheet so the next run refetches.
    pub fn invalidate(&self) {
        self.cache.invalidate(&self.config.sheet_url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NormalizeError;
    use crate::dashboard::Severity;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubSource {
        body: &'static str,
        calls: Arc<AtomicUsize>,
    }

    impl SheetSource for StubSource {
        fn fetch(&self, _location: &str) -> Result<Vec<u8>, LoaderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.as_bytes().to_vec())
        }
    }

    struct FailingSource;

    impl SheetSource for FailingSource {
        fn fetch(&self, location: &str) -> Result<Vec<u8>, LoaderError> {
            Err(LoaderError::Io {
                path: location.into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            })
        }
    }

    fn pipeline(body: &'static str) -> (Pipeline, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = StubSource {
            body,
            calls: Arc::clone(&calls),
        };
        (
            Pipeline::with_source(DashboardConfig::default(), Box::new(source)),
            calls,
        )
    }

    #[test]
    fn runs_end_to_end_from_csv() {
        let (pipeline, _) = pipeline("Uke,2024,2025\n1,1000,1100\n2,900,\n3,950,1050\n");
        let view = pipeline.run().unwrap();

        assert_eq!(view.metrics[1].value, "1,050 kr");
        assert_eq!(view.metrics[2].value, "950 kr");
        assert_eq!(view.metrics[3].value, "2,150 kr");
        assert!(view.fetched_at.is_some());
    }

    #[test]
    fn repeated_runs_share_cached_fetch() {
        let (pipeline, calls) = pipeline("Uke,2025\n1,10\n2,20\n");
        let first = pipeline.run().unwrap();
        let second = pipeline.run().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);

        pipeline.invalidate();
        pipeline.run().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn fetch_failure_is_an_error_notice() {
        let pipeline = Pipeline::with_source(DashboardConfig::default(), Box::new(FailingSource));
        let err = pipeline.run().unwrap_err();

        assert!(matches!(err, DashboardError::Fetch(_)));
        let notice = err.notice();
        assert_eq!(notice.severity, Severity::Error);
        assert!(notice.message.starts_with("Kunne ikke laste data"));
    }

    #[test]
    fn missing_key_column_is_reported_with_guidance() {
        let (pipeline, _) = pipeline("Week,2025\n1,10\n");
        let err = pipeline.run().unwrap_err();

        assert!(matches!(
            err,
            DashboardError::Normalize(NormalizeError::MissingKeyColumn { .. })
        ));
        assert!(err.notice().hint.unwrap().contains("Uke"));
    }

    #[test]
    fn empty_year_is_informational() {
        let (pipeline, _) = pipeline("Uke,2024,2025\n1,10,\n");
        let err = pipeline.run().unwrap_err();
        assert_eq!(err.notice().severity, Severity::Info);
    }
}
