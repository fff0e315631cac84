//! Chart Plotter Module
//! Builds the weekly line chart and draws dashboard widgets using egui_plot.

use crate::dashboard::{DisplayTable, MetricCard, Trend};
use crate::data::WeekIndexedTable;
use crate::stats::format::format_thousands;
use egui::{Color32, RichText, ScrollArea};
use egui_plot::{uniform_grid_spacer, Legend, Line, Plot, PlotPoints, Points};

/// Color palette for year series, oldest first
pub const PALETTE: [Color32; 8] = [
    Color32::from_rgb(149, 165, 166), // Grey
    Color32::from_rgb(155, 89, 182),  // Purple
    Color32::from_rgb(243, 156, 18),  // Orange
    Color32::from_rgb(26, 188, 156),  // Teal
    Color32::from_rgb(231, 76, 60),   // Red
    Color32::from_rgb(46, 204, 113),  // Green
    Color32::from_rgb(233, 30, 99),   // Pink
    Color32::from_rgb(96, 125, 139),  // Blue Grey
];

/// The current year is always drawn in this color
pub const CURRENT_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue

const UP_COLOR: Color32 = Color32::from_rgb(40, 167, 69);
const DOWN_COLOR: Color32 = Color32::from_rgb(220, 53, 69);

const CARD_WIDTH: f32 = 210.0;
const TABLE_HEIGHT: f32 = 420.0;

/// One line of the chart. Points are `[x, y]` with x = row position.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
}

/// Multi-series line chart: x-axis = week, one series per year column.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Tick label for each row position.
    pub x_labels: Vec<String>,
    /// Oldest year first; the last series is the current year.
    pub series: Vec<ChartSeries>,
}

impl LineChart {
    /// One series per listed column; missing cells leave gaps in the points.
    pub fn from_table(table: &WeekIndexedTable, columns: &[String], title: &str, y_label: &str) -> Self {
        let series = columns
            .iter()
            .filter_map(|name| table.column(name))
            .map(|column| ChartSeries {
                name: column.name.clone(),
                points: column
                    .present()
                    .map(|(row, value)| [row as f64, value])
                    .collect(),
            })
            .collect();

        Self {
            title: title.to_string(),
            x_label: table.key_column().to_string(),
            y_label: y_label.to_string(),
            x_labels: table.keys().iter().map(|k| k.to_string()).collect(),
            series,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }

    /// Tick label for an x value; empty between rows.
    pub fn x_label_at(&self, x: f64) -> String {
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        self.x_labels
            .get(idx as usize)
            .cloned()
            .unwrap_or_default()
    }

    /// Min and max over all points, `None` for an empty chart.
    pub fn y_range(&self) -> Option<(f64, f64)> {
        let mut values = self.series.iter().flat_map(|s| s.points.iter().map(|p| p[1]));
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    pub fn series_color(&self, idx: usize) -> Color32 {
        if idx + 1 == self.series.len() {
            CURRENT_COLOR
        } else {
            PALETTE[idx % PALETTE.len()]
        }
    }
}

/// Draws dashboard widgets.
pub struct ChartPlotter;

impl ChartPlotter {
    fn trend_color(trend: Option<Trend>, fallback: Color32) -> Color32 {
        match trend {
            Some(Trend::Up) => UP_COLOR,
            Some(Trend::Down) => DOWN_COLOR,
            Some(Trend::Flat) | None => fallback,
        }
    }

    /// Draw one labeled metric.
    pub fn draw_metric_card(ui: &mut egui::Ui, card: &MetricCard) {
        let text_color = ui.visuals().text_color();
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(8.0)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(CARD_WIDTH);
                ui.vertical(|ui| {
                    ui.label(RichText::new(&card.label).size(12.0).color(Color32::GRAY));
                    ui.label(RichText::new(&card.value).size(24.0).strong());
                    if let Some(delta) = &card.delta {
                        let arrow = match card.trend {
                            Some(Trend::Up) => "▲ ",
                            Some(Trend::Down) => "▼ ",
                            _ => "",
                        };
                        ui.label(
                            RichText::new(format!("{}{}", arrow, delta))
                                .size(13.0)
                                .color(Self::trend_color(card.trend, text_color)),
                        );
                    }
                    if let Some(caption) = &card.caption {
                        ui.label(RichText::new(caption).size(11.0).color(Color32::GRAY));
                    }
                });
            });
    }

    /// Draw the weekly line chart.
    pub fn draw_line_chart(ui: &mut egui::Ui, chart: &LineChart, height: f32) {
        let labels = chart.clone();

        Plot::new(format!("line_{}", chart.title))
            .height(height)
            .legend(Legend::default())
            .allow_zoom(true)
            .allow_drag(true)
            .allow_scroll(false)
            .x_axis_label(chart.x_label.clone())
            .y_axis_label(chart.y_label.clone())
            .x_grid_spacer(uniform_grid_spacer(|_input| [1.0, 4.0, 13.0]))
            .x_axis_formatter(move |mark, _range| labels.x_label_at(mark.value))
            .y_axis_formatter(|mark, _range| format_thousands(mark.value))
            .show(ui, |plot_ui| {
                for (idx, series) in chart.series.iter().enumerate() {
                    if series.points.is_empty() {
                        continue;
                    }
                    let color = chart.series_color(idx);
                    let width = if idx + 1 == chart.series.len() { 2.5 } else { 1.5 };

                    let line: PlotPoints = series.points.iter().copied().collect();
                    plot_ui.line(Line::new(line).color(color).width(width).name(&series.name));

                    let markers: PlotPoints = series.points.iter().copied().collect();
                    plot_ui.points(
                        Points::new(markers)
                            .radius(2.5)
                            .color(color)
                            .name(&series.name),
                    );
                }
            });
    }

    /// Draw the full data table.
    pub fn draw_data_table(ui: &mut egui::Ui, table: &DisplayTable) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ScrollArea::both()
                    .id_salt("data_table_scroll")
                    .max_height(TABLE_HEIGHT)
                    .auto_shrink([false, true])
                    .show(ui, |ui| {
                        egui::Grid::new("data_table")
                            .striped(true)
                            .min_col_width(60.0)
                            .spacing([12.0, 4.0])
                            .show(ui, |ui| {
                                for header in &table.headers {
                                    ui.label(RichText::new(header).strong().size(12.0));
                                }
                                ui.end_row();

                                for row in &table.rows {
                                    for cell in row {
                                        ui.label(RichText::new(cell).size(12.0));
                                    }
                                    ui.end_row();
                                }
                            });
                    });
            });
    }
}
