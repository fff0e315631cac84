//! Charts module - Chart rendering

mod plotter;
mod renderer;

pub use plotter::{ChartPlotter, ChartSeries, LineChart};
pub use renderer::ChartRenderer;
