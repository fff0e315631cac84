//! Dashboard Panel Widget
//! Central area: metric cards, notices, the weekly chart and the data table,
//! or a full-page message when the pass failed.

use crate::charts::ChartPlotter;
use crate::dashboard::{DashboardView, Notice, Severity};
use egui::{Color32, RichText, ScrollArea};

const CHART_HEIGHT: f32 = 320.0;
const CARD_SPACING: f32 = 12.0;

/// What the central panel currently shows.
pub enum PanelState {
    Loading,
    Ready(DashboardView),
    Failed(Notice),
}

pub struct DashboardPanel {
    pub state: PanelState,
}

impl Default for DashboardPanel {
    fn default() -> Self {
        Self {
            state: PanelState::Loading,
        }
    }
}

fn severity_color(severity: Severity) -> Color32 {
    match severity {
        Severity::Info => Color32::from_rgb(52, 152, 219),
        Severity::Warning => Color32::from_rgb(243, 156, 18),
        Severity::Error => Color32::from_rgb(220, 53, 69),
    }
}

impl DashboardPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> Option<&DashboardView> {
        match &self.state {
            PanelState::Ready(view) => Some(view),
            _ => None,
        }
    }

    /// Draw the panel
    pub fn show(&self, ui: &mut egui::Ui) {
        match &self.state {
            PanelState::Loading => {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
            }
            PanelState::Failed(notice) => Self::draw_full_page_notice(ui, notice),
            PanelState::Ready(view) => {
                ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| Self::draw_view(ui, view));
            }
        }
    }

    fn draw_view(ui: &mut egui::Ui, view: &DashboardView) {
        ui.add_space(8.0);
        ui.label(RichText::new(format!("📊 {}", view.title)).size(26.0).strong());
        ui.add_space(6.0);
        ui.label(
            RichText::new(&view.headline)
                .size(13.0)
                .color(Color32::from_rgb(40, 167, 69)),
        );
        ui.add_space(12.0);

        // Metric cards wrap onto new lines when the window is narrow
        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing = egui::vec2(CARD_SPACING, CARD_SPACING);
            for card in &view.metrics {
                ChartPlotter::draw_metric_card(ui, card);
            }
        });

        for notice in &view.notices {
            ui.add_space(8.0);
            Self::draw_notice(ui, notice);
        }

        if let Some(chart) = &view.chart {
            ui.add_space(16.0);
            ui.label(RichText::new(&chart.title).size(16.0).strong());
            ui.add_space(4.0);
            ChartPlotter::draw_line_chart(ui, chart, CHART_HEIGHT);
        }

        ui.add_space(16.0);
        ui.label(RichText::new("Siste salgsdata").size(16.0).strong());
        ui.add_space(4.0);
        ChartPlotter::draw_data_table(ui, &view.table);
    }

    fn draw_notice(ui: &mut egui::Ui, notice: &Notice) {
        let color = severity_color(notice.severity);
        egui::Frame::none()
            .stroke(egui::Stroke::new(1.5, color))
            .rounding(6.0)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.label(RichText::new(&notice.message).size(13.0).color(color));
                if let Some(hint) = &notice.hint {
                    ui.label(RichText::new(hint).size(12.0).color(Color32::GRAY));
                }
            });
    }

    fn draw_full_page_notice(ui: &mut egui::Ui, notice: &Notice) {
        let color = severity_color(notice.severity);
        let icon = match notice.severity {
            Severity::Info => "ℹ",
            Severity::Warning | Severity::Error => "⚠",
        };

        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.3);
            ui.label(RichText::new(icon).size(40.0).color(color));
            ui.add_space(8.0);
            ui.label(RichText::new(&notice.message).size(18.0).color(color));
            if let Some(hint) = &notice.hint {
                ui.add_space(6.0);
                ui.label(RichText::new(hint).size(13.0).color(Color32::GRAY));
            }
        });
    }
}
