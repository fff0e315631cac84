//! Control Panel Widget
//! Left side panel with the data source, refresh controls and status.

use crate::config::DashboardConfig;
use egui::{Color32, RichText};
use std::time::{Duration, Instant};

/// Actions that can be triggered from the control panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPanelAction {
    None,
    /// Re-run the dashboard, reusing a cached sheet when fresh
    Refresh,
    /// Drop the cached sheet and fetch again
    ForceReload,
    ExportChart,
}

/// Left side control panel with source information and refresh controls.
pub struct ControlPanel {
    pub title: String,
    pub source: String,
    pub ttl: Duration,
    pub status: String,
    pub fetched_at: Option<Instant>,
    pub export_enabled: bool,
}

impl ControlPanel {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            title: config.title.clone(),
            source: config.sheet_url.clone(),
            ttl: config.cache_ttl(),
            status: "Klar".to_string(),
            fetched_at: None,
            export_enabled: false,
        }
    }

    /// Set status text
    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }

    fn minutes(d: Duration) -> u64 {
        d.as_secs() / 60
    }

    /// "Hentet for 3 min siden" style text for the fetch age.
    pub fn fetch_age_text(&self, now: Instant) -> String {
        match self.fetched_at {
            Some(at) => {
                let age = now.saturating_duration_since(at);
                if age < Duration::from_secs(60) {
                    "Hentet akkurat nå".to_string()
                } else {
                    format!("Hentet for {} min siden", Self::minutes(age))
                }
            }
            None => "Ikke hentet ennå".to_string(),
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui, is_loading: bool) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new(format!("📊 {}", self.title))
                    .size(20.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Datakilde").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.add(egui::Label::new(RichText::new(&self.source).size(11.0)).wrap());
                ui.add_space(4.0);
                ui.label(
                    RichText::new(self.fetch_age_text(Instant::now()))
                        .size(12.0)
                        .color(Color32::GRAY),
                );
                ui.label(
                    RichText::new(format!(
                        "Data mellomlagres i {} min",
                        Self::minutes(self.ttl).max(1)
                    ))
                    .size(11.0)
                    .color(Color32::GRAY),
                );
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Actions Section =====
        ui.label(RichText::new("⚙ Handlinger").size(14.0).strong());
        ui.add_space(5.0);

        ui.add_enabled_ui(!is_loading, |ui| {
            if ui
                .add_sized([ui.available_width(), 30.0], egui::Button::new("🔄 Oppdater"))
                .on_hover_text("Bruker mellomlagret data hvis den er fersk")
                .clicked()
            {
                action = ControlPanelAction::Refresh;
            }
            ui.add_space(4.0);
            if ui
                .add_sized([ui.available_width(), 30.0], egui::Button::new("⬇ Hent på nytt"))
                .on_hover_text("Henter arket på nytt med en gang")
                .clicked()
            {
                action = ControlPanelAction::ForceReload;
            }
        });

        ui.add_space(4.0);
        ui.add_enabled_ui(self.export_enabled && !is_loading, |ui| {
            if ui
                .add_sized([ui.available_width(), 30.0], egui::Button::new("🖼 Eksporter graf (PNG)"))
                .clicked()
            {
                action = ControlPanelAction::ExportChart;
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Status Section =====
        ui.horizontal(|ui| {
            if is_loading {
                ui.spinner();
            }
            ui.label(RichText::new(&self.status).size(12.0));
        });

        action
    }
}
