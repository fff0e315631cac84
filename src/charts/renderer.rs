//! Static Chart Renderer Module
//! Renders the weekly line chart to PNG bytes with plotters, for export.

use crate::charts::LineChart;
use crate::stats::format::format_thousands;
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Nothing to draw")]
    EmptyChart,
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Image buffer has the wrong size")]
    Buffer,
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

fn to_rgb(color: egui::Color32) -> RGBColor {
    RGBColor(color.r(), color.g(), color.b())
}

/// Renders charts off-screen.
pub struct ChartRenderer;

impl ChartRenderer {
    /// Render `chart` as a PNG image of `width` x `height` pixels.
    pub fn render_line_chart_to_bytes(
        chart: &LineChart,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let (y_min, y_max) = chart.y_range().ok_or(RenderError::EmptyChart)?;
        // Leave headroom and keep a flat series visible
        let pad = ((y_max - y_min) * 0.08).max(y_max.abs() * 0.05).max(1.0);
        let x_max = chart.x_labels.len().saturating_sub(1).max(1) as f64;

        let mut buffer = vec![0u8; (width as usize) * (height as usize) * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let mut ctx = ChartBuilder::on(&root)
                .caption(&chart.title, ("sans-serif", 28))
                .margin(20)
                .x_label_area_size(45)
                .y_label_area_size(90)
                .build_cartesian_2d(-0.5..x_max + 0.5, (y_min - pad)..(y_max + pad))
                .map_err(draw_err)?;

            let x_fmt = |x: &f64| chart.x_label_at(*x);
            let y_fmt = |y: &f64| format_thousands(*y);
            ctx.configure_mesh()
                .x_desc(chart.x_label.as_str())
                .y_desc(chart.y_label.as_str())
                .x_labels(chart.x_labels.len().clamp(2, 26))
                .x_label_formatter(&x_fmt)
                .y_label_formatter(&y_fmt)
                .light_line_style(RGBColor(235, 235, 235).stroke_width(1))
                .draw()
                .map_err(draw_err)?;

            for (idx, series) in chart.series.iter().enumerate() {
                if series.points.is_empty() {
                    continue;
                }
                let color = to_rgb(chart.series_color(idx));
                let stroke = if idx + 1 == chart.series.len() { 3 } else { 2 };

                ctx.draw_series(LineSeries::new(
                    series.points.iter().map(|p| (p[0], p[1])),
                    color.stroke_width(stroke),
                ))
                .map_err(draw_err)?
                .label(series.name.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(3)));

                ctx.draw_series(
                    series
                        .points
                        .iter()
                        .map(|p| Circle::new((p[0], p[1]), 3, color.filled())),
                )
                .map_err(draw_err)?;
            }

            ctx.configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(&WHITE.mix(0.85))
                .border_style(&BLACK)
                .draw()
                .map_err(draw_err)?;

            root.present().map_err(draw_err)?;
        }

        let image = RgbImage::from_raw(width, height, buffer).ok_or(RenderError::Buffer)?;
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        debug!(bytes = png.len(), width, height, "rendered chart png");
        Ok(png)
    }
}
