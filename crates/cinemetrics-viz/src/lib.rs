//! Cinemetrics charts
//!
//! Renders the analysis as SVG files, one per chart kind:
//! - revenue vs budget scatter
//! - median ROI by genre
//! - yearly trends (four panels)
//! - franchise vs standalone comparison (four panels)

pub mod series;
pub mod visualizer;

pub use series::{FranchiseMetric, YearStats};
pub use visualizer::{ChartError, ChartKind, ChartOutcome, ChartReport, Visualizer};
