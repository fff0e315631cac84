//! Salgsdashboard Main Application
//! Main window with control panel and dashboard panel.

use crate::charts::{ChartRenderer, LineChart};
use crate::config::DashboardConfig;
use crate::dashboard::{DashboardError, DashboardView, Notice, Pipeline, Severity};
use crate::gui::{ControlPanel, ControlPanelAction, DashboardPanel, PanelState};
use anyhow::Context;
use egui::SidePanel;
use std::path::Path;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info};

const EXPORT_WIDTH: u32 = 1400;
const EXPORT_HEIGHT: u32 = 800;

/// Dashboard result from background thread
enum LoadResult {
    Complete(Box<DashboardView>),
    Error(Notice),
}

/// When the next automatic reload is due: one TTL after the sheet was fetched,
/// or one TTL after the last attempt when no sheet came back.
fn reload_deadline(
    fetched_at: Option<Instant>,
    attempted_at: Option<Instant>,
    ttl: Duration,
) -> Option<Instant> {
    fetched_at.or(attempted_at).map(|at| at + ttl)
}

/// Main application window.
pub struct DashboardApp {
    pipeline: Option<Arc<Pipeline>>,
    control_panel: ControlPanel,
    dashboard_panel: DashboardPanel,
    ttl: Duration,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
    last_run: Option<Instant>,
    reload_at: Option<Instant>,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let control_panel = ControlPanel::new(&config);
        let mut dashboard_panel = DashboardPanel::new();
        let ttl = config.cache_ttl();

        let pipeline = match Pipeline::new(config) {
            Ok(pipeline) => Some(Arc::new(pipeline)),
            Err(e) => {
                error!("could not set up sheet source: {e}");
                dashboard_panel.state = PanelState::Failed(DashboardError::from(e).notice());
                None
            }
        };

        let mut app = Self {
            pipeline,
            control_panel,
            dashboard_panel,
            ttl,
            load_rx: None,
            is_loading: false,
            last_run: None,
            reload_at: None,
        };
        app.start_load(false);
        app
    }

    /// Run the pipeline in a background thread
    fn start_load(&mut self, force: bool) {
        if self.is_loading {
            return; // Already loading
        }
        let Some(pipeline) = self.pipeline.clone() else {
            return;
        };

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        self.is_loading = true;
        self.last_run = Some(Instant::now());
        self.control_panel.set_status("Henter data...");

        thread::spawn(move || {
            if force {
                pipeline.invalidate();
            }
            let result = match pipeline.run() {
                Ok(view) => LoadResult::Complete(Box::new(view)),
                Err(e) => {
                    error!("dashboard pass failed: {e}");
                    LoadResult::Error(e.notice())
                }
            };
            let _ = tx.send(result);
        });
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete(view)) => {
                self.control_panel.fetched_at = view.fetched_at;
                self.control_panel.export_enabled = view.chart.is_some();
                self.control_panel.set_status(&view.headline);
                self.reload_at = reload_deadline(view.fetched_at, self.last_run, self.ttl);
                self.dashboard_panel.state = PanelState::Ready(*view);
                self.is_loading = false;
            }
            Ok(LoadResult::Error(notice)) => {
                self.control_panel.export_enabled = false;
                self.control_panel.set_status(&notice.message);
                self.dashboard_panel.state = PanelState::Failed(notice);
                self.reload_at = reload_deadline(None, self.last_run, self.ttl);
                self.is_loading = false;
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => {
                // Put receiver back, still running
                self.load_rx = Some(rx);
            }
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                error!("dashboard worker exited without a result");
                let notice = Notice::new(Severity::Error, "Henting ble avbrutt.")
                    .with_hint("Prøv «Hent på nytt». Se loggen hvis feilen gjentar seg.");
                self.control_panel.export_enabled = false;
                self.control_panel.set_status(&notice.message);
                self.dashboard_panel.state = PanelState::Failed(notice);
                self.reload_at = reload_deadline(None, self.last_run, self.ttl);
                self.is_loading = false;
            }
        }
    }

    fn export_chart(chart: &LineChart, path: &Path) -> anyhow::Result<()> {
        let png = ChartRenderer::render_line_chart_to_bytes(chart, EXPORT_WIDTH, EXPORT_HEIGHT)
            .context("rendering chart")?;
        std::fs::write(path, png).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Handle PNG export - render the chart off-screen and save it
    fn handle_export_chart(&mut self) {
        let Some(chart) = self.dashboard_panel.view().and_then(|v| v.chart.clone()) else {
            self.control_panel.set_status("Ingen graf å eksportere");
            return;
        };

        // Ask user for output location
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name("salg_per_uke.png")
            .save_file()
        else {
            return; // User cancelled
        };

        match Self::export_chart(&chart, &path) {
            Ok(()) => {
                info!(path = %path.display(), "chart exported");
                self.control_panel
                    .set_status(&format!("Graf lagret: {}", path.display()));
                if let Err(e) = open::that(&path) {
                    error!("could not open exported chart: {e}");
                }
            }
            Err(e) => {
                error!("chart export failed: {e:#}");
                self.control_panel
                    .set_status(&format!("Eksport feilet: {e:#}"));
            }
        }
    }

    /// Re-run the pipeline once the cached sheet has expired.
    fn schedule_reload(&mut self, ctx: &egui::Context) {
        if self.is_loading {
            return;
        }
        let Some(due) = self.reload_at else {
            return;
        };

        let now = Instant::now();
        if now >= due {
            info!("cache expired, reloading dashboard");
            self.start_load(false);
        } else {
            ctx.request_repaint_after(due - now);
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        } else {
            self.schedule_reload(ctx);
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui, self.is_loading) {
                        ControlPanelAction::Refresh => self.start_load(false),
                        ControlPanelAction::ForceReload => self.start_load(true),
                        ControlPanelAction::ExportChart => self.handle_export_chart(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Dashboard
        egui::CentralPanel::default().show(ctx, |ui| {
            self.dashboard_panel.show(ui);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::DisplayTable;
    use crate::data::{RawTable, SheetCache};
    use std::sync::mpsc::Sender;

    const TTL: Duration = Duration::from_secs(600);

    fn idle_app() -> DashboardApp {
        let config = DashboardConfig::default();
        DashboardApp {
            pipeline: None,
            control_panel: ControlPanel::new(&config),
            dashboard_panel: DashboardPanel::new(),
            ttl: TTL,
            load_rx: None,
            is_loading: false,
            last_run: None,
            reload_at: None,
        }
    }

    fn loading(app: &mut DashboardApp, started: Instant) -> Sender<LoadResult> {
        let (tx, rx) = channel();
        app.load_rx = Some(rx);
        app.is_loading = true;
        app.last_run = Some(started);
        tx
    }

    fn sheet(header: &str) -> RawTable {
        RawTable::new(vec![header.to_string()], vec![vec![Some("1".to_string())]])
    }

    fn view(fetched_at: Instant) -> DashboardView {
        DashboardView {
            title: "Salg".into(),
            headline: "Data hentet vellykket! Viser 1 rader.".into(),
            metrics: Vec::new(),
            notices: Vec::new(),
            table: DisplayTable::default(),
            chart: None,
            fetched_at: Some(fetched_at),
        }
    }

    #[test]
    fn reload_deadline_prefers_fetch_time() {
        let started = Instant::now();
        let fetched = started + Duration::from_millis(2);

        assert_eq!(reload_deadline(Some(fetched), Some(started), TTL), Some(fetched + TTL));
        assert_eq!(reload_deadline(None, Some(started), TTL), Some(started + TTL));
        assert_eq!(reload_deadline(None, None, TTL), None);
    }

    #[test]
    fn timed_reload_finds_the_cached_sheet_expired() {
        let started = Instant::now();
        let fetched = started + Duration::from_millis(2);
        let cache = SheetCache::new(TTL);
        cache.get_or_fetch_at("sheet", fetched, || Ok(sheet("v1"))).unwrap();

        let mut app = idle_app();
        let tx = loading(&mut app, started);
        tx.send(LoadResult::Complete(Box::new(view(fetched)))).unwrap();
        app.check_load_results();

        assert!(!app.is_loading);
        let due = app.reload_at.unwrap();
        assert_eq!(due, fetched + TTL);

        // The worker reads the clock after the deadline has passed
        let reloaded = cache
            .get_or_fetch_at("sheet", due, || Ok(sheet("v2")))
            .unwrap();
        assert_eq!(reloaded.table.headers().to_vec(), vec!["v2".to_string()]);
    }

    #[test]
    fn failed_load_retries_one_ttl_after_the_attempt() {
        let started = Instant::now();
        let mut app = idle_app();
        let tx = loading(&mut app, started);
        tx.send(LoadResult::Error(Notice::new(Severity::Error, "Kunne ikke laste data.")))
            .unwrap();
        app.check_load_results();

        assert!(matches!(app.dashboard_panel.state, PanelState::Failed(_)));
        assert_eq!(app.reload_at, Some(started + TTL));
    }

    #[test]
    fn vanished_worker_shows_an_error() {
        let started = Instant::now();
        let mut app = idle_app();
        drop(loading(&mut app, started));
        app.check_load_results();

        assert!(!app.is_loading);
        match &app.dashboard_panel.state {
            PanelState::Failed(notice) => {
                assert_eq!(notice.severity, Severity::Error);
                assert!(notice.message.starts_with("Henting ble avbrutt"));
            }
            _ => panic!("expected a failed panel"),
        }
        assert_eq!(app.control_panel.status, "Henting ble avbrutt.");
        assert_eq!(app.reload_at, Some(started + TTL));
    }

    #[test]
    fn pending_worker_keeps_loading() {
        let mut app = idle_app();
        let _tx = loading(&mut app, Instant::now());
        app.check_load_results();

        assert!(app.is_loading);
        assert!(app.load_rx.is_some());
        assert!(matches!(app.dashboard_panel.state, PanelState::Loading));
    }
}
