//! Chart rendering to SVG

use crate::series::{self, FranchiseMetric, YearStats};
use cinemetrics_core::{Diagnostic, DiagnosticCode, Severity, Table};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};

const STANDALONE_COLOR: RGBColor = RGBColor(0xA2, 0x3B, 0x72);
const FRANCHISE_COLOR: RGBColor = RGBColor(0x2E, 0x86, 0xAB);
const TEAL: RGBColor = RGBColor(0x00, 0x80, 0x80);
const ORANGE: RGBColor = RGBColor(0xFF, 0xA5, 0x00);
const PURPLE: RGBColor = RGBColor(0x80, 0x00, 0x80);

const FONT: &str = "sans-serif";

/// Errors while writing charts
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("Failed to create {0}: {1}")]
    Io(String, String),

    #[error("Failed to draw {0}: {1}")]
    Draw(String, String),
}

/// The charts the Visualizer knows how to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    RevenueVsBudget,
    GenreRoi,
    YearlyTrends,
    FranchiseComparison,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        Self::RevenueVsBudget,
        Self::GenreRoi,
        Self::YearlyTrends,
        Self::FranchiseComparison,
    ];

    /// Output file name, stable across runs
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::RevenueVsBudget => "revenue_vs_budget.svg",
            Self::GenreRoi => "genre_roi.svg",
            Self::YearlyTrends => "yearly_trends.svg",
            Self::FranchiseComparison => "franchise_comparison.svg",
        }
    }
}

/// Result of drawing a single chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartOutcome {
    /// Chart written to this path
    Written(PathBuf),

    /// Not enough data; the reason is kept for the report
    Skipped(String),
}

impl ChartOutcome {
    fn skipped(reason: &str) -> Self {
        Self::Skipped(reason.to_string())
    }
}

/// Charts written and charts skipped in one rendering pass
#[derive(Debug, Clone, Default)]
pub struct ChartReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<Diagnostic>,
}

/// Renders charts for an analysis table
#[derive(Debug, Clone)]
pub struct Visualizer {
    table: Table,
    output_dir: PathBuf,
}

impl Visualizer {
    /// Prepare the table for plotting; charts go to `output_dir`
    pub fn new(table: Table, output_dir: impl Into<PathBuf>) -> Self {
        let table = series::prepare(table);
        tracing::info!("Visualizer data preparation complete.");
        Self {
            table,
            output_dir: output_dir.into(),
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path a chart is written to
    pub fn chart_path(&self, kind: ChartKind) -> PathBuf {
        self.output_dir.join(kind.file_name())
    }

    /// Draw every chart; charts lacking data are skipped with a warning
    pub fn render_all(&self) -> Result<ChartReport, ChartError> {
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| ChartError::Io(self.output_dir.display().to_string(), e.to_string()))?;

        let mut report = ChartReport::default();
        for kind in ChartKind::ALL {
            match self.render(kind)? {
                ChartOutcome::Written(path) => {
                    tracing::info!("Chart saved to {}", path.display());
                    report.written.push(path);
                }
                ChartOutcome::Skipped(reason) => {
                    tracing::warn!("{} skipped: {}", kind.file_name(), reason);
                    report.skipped.push(
                        Diagnostic::new(
                            DiagnosticCode::ChartSkipped,
                            Severity::Warn,
                            format!("{} skipped: {}", kind.file_name(), reason),
                        )
                        .with_stage("visualize"),
                    );
                }
            }
        }
        Ok(report)
    }

    /// Draw one chart
    pub fn render(&self, kind: ChartKind) -> Result<ChartOutcome, ChartError> {
        match kind {
            ChartKind::RevenueVsBudget => self.plot_revenue_vs_budget(),
            ChartKind::GenreRoi => self.plot_genre_roi(),
            ChartKind::YearlyTrends => self.plot_yearly_trends(),
            ChartKind::FranchiseComparison => self.plot_franchise_comparison(),
        }
    }

    /// Scatter of revenue against budget, colored by franchise status
    pub fn plot_revenue_vs_budget(&self) -> Result<ChartOutcome, ChartError> {
        let (standalone, franchise) = series::budget_revenue_points(&self.table);
        if standalone.is_empty() && franchise.is_empty() {
            return Ok(ChartOutcome::skipped("no rows with both budget and revenue"));
        }

        let path = self.chart_path(ChartKind::RevenueVsBudget);
        let all = || standalone.iter().chain(franchise.iter());
        let x_range = padded_range(all().map(|p| p.0));
        let y_range = padded_range(all().map(|p| p.1));

        draw(&path, (1000, 600), |root| {
            let mut chart = ChartBuilder::on(root)
                .caption("Financial Performance: Revenue vs. Budget", (FONT, 24))
                .margin(15)
                .x_label_area_size(45)
                .y_label_area_size(65)
                .build_cartesian_2d(x_range, y_range)?;

            chart
                .configure_mesh()
                .x_desc("Budget (M USD)")
                .y_desc("Revenue (M USD)")
                .draw()?;

            for (name, color, points) in [
                ("Standalone", STANDALONE_COLOR, &standalone),
                ("Franchise", FRANCHISE_COLOR, &franchise),
            ] {
                if points.is_empty() {
                    continue;
                }
                chart
                    .draw_series(points.iter().map(|&p| Circle::new(p, 6, color.mix(0.6).filled())))?
                    .label(name)
                    .legend(move |(x, y)| Circle::new((x + 8, y), 5, color.filled()));
            }

            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
            Ok(())
        })?;

        Ok(ChartOutcome::Written(path))
    }

    /// Horizontal bars of median ROI per genre
    pub fn plot_genre_roi(&self) -> Result<ChartOutcome, ChartError> {
        let medians = series::genre_median_roi(&self.table);
        if medians.is_empty() {
            return Ok(ChartOutcome::skipped("no genre data available for ROI plot"));
        }

        let path = self.chart_path(ChartKind::GenreRoi);
        let count = medians.len() as i32;
        let max_roi = medians.iter().map(|(_, roi)| *roi).fold(1.0_f64, f64::max);
        let height = 120 + 40 * medians.len() as u32;

        draw(&path, (1100, height.max(400)), |root| {
            let mut chart = ChartBuilder::on(root)
                .caption("Median Return on Investment (ROI) by Genre", (FONT, 24))
                .margin(15)
                .x_label_area_size(45)
                .y_label_area_size(140)
                .build_cartesian_2d(0.0..max_roi * 1.15, (0..count).into_segmented())?;

            chart
                .configure_mesh()
                .disable_y_mesh()
                .x_desc("ROI Multiplier")
                .y_labels(medians.len())
                .y_label_formatter(&|v| match v {
                    SegmentValue::CenterOf(i) => medians
                        .get(*i as usize)
                        .map(|(genre, _)| genre.clone())
                        .unwrap_or_default(),
                    _ => String::new(),
                })
                .draw()?;

            chart.draw_series(medians.iter().enumerate().map(|(i, (_, roi))| {
                let i = i as i32;
                let mut bar = Rectangle::new(
                    [(0.0, SegmentValue::Exact(i)), (*roi, SegmentValue::Exact(i + 1))],
                    TEAL.filled(),
                );
                bar.set_margin(4, 4, 0, 0);
                bar
            }))?;

            chart.draw_series(medians.iter().enumerate().map(|(i, (_, roi))| {
                Text::new(
                    format!("{:.2}x", roi),
                    (*roi + max_roi * 0.01, SegmentValue::CenterOf(i as i32)),
                    (FONT, 13),
                )
            }))?;
            Ok(())
        })?;

        Ok(ChartOutcome::Written(path))
    }

    /// Four panels of yearly aggregates
    pub fn plot_yearly_trends(&self) -> Result<ChartOutcome, ChartError> {
        let years = series::yearly_trends(&self.table);
        if years.is_empty() {
            return Ok(ChartOutcome::skipped("no release years available"));
        }

        let path = self.chart_path(ChartKind::YearlyTrends);
        let first = years.first().map(|y| y.year).unwrap_or_default();
        let last = years.last().map(|y| y.year).unwrap_or_default();
        let x_range = (first - 1)..(last + 1);

        type Metric = fn(&YearStats) -> Option<f64>;
        let panels: [(&str, RGBColor, Metric); 4] = [
            ("Movies Released", BLUE, |y| Some(y.movie_count as f64)),
            ("Avg Revenue (M USD)", GREEN, |y| y.revenue_mean),
            ("Avg Budget (M USD)", ORANGE, |y| y.budget_mean),
            ("Avg ROI", PURPLE, |y| y.roi_mean),
        ];

        draw(&path, (1400, 1000), |root| {
            let root = root.titled("Yearly Box Office Performance Trends", (FONT, 30))?;
            let areas = root.split_evenly((2, 2));

            for (area, (title, color, metric)) in areas.iter().zip(panels) {
                let points: Vec<(i32, f64)> = years
                    .iter()
                    .filter_map(|y| metric(y).map(|v| (y.year, v)))
                    .collect();

                let mut chart = ChartBuilder::on(area)
                    .caption(title, (FONT, 20))
                    .margin(15)
                    .x_label_area_size(35)
                    .y_label_area_size(60)
                    .build_cartesian_2d(x_range.clone(), padded_range(points.iter().map(|p| p.1)))?;

                chart.configure_mesh().draw()?;
                chart.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?;
                chart.draw_series(points.iter().map(|&p| Circle::new(p, 4, color.filled())))?;
            }
            Ok(())
        })?;

        Ok(ChartOutcome::Written(path))
    }

    /// Standalone vs franchise means across four metrics
    ///
    /// Skipped unless both categories are present.
    pub fn plot_franchise_comparison(&self) -> Result<ChartOutcome, ChartError> {
        if series::franchise_categories(&self.table) < 2 {
            return Ok(ChartOutcome::skipped("only one category (Franchise/Standalone) found"));
        }

        let metrics = series::franchise_means(&self.table);
        let path = self.chart_path(ChartKind::FranchiseComparison);
        let labels = ["Standalone", "Franchise"];

        draw(&path, (1200, 1000), |root| {
            let root = root.titled("Franchise vs. Standalone Performance", (FONT, 30))?;
            let areas = root.split_evenly((2, 2));

            for (area, metric) in areas.iter().zip(&metrics) {
                draw_category_bars(area, metric, &labels)?;
            }
            Ok(())
        })?;

        Ok(ChartOutcome::Written(path))
    }
}

type DrawResult = Result<(), DrawingAreaErrorKind<std::io::Error>>;

fn draw_category_bars(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    metric: &FranchiseMetric,
    labels: &[&str; 2],
) -> DrawResult {
    let values = [metric.standalone.unwrap_or(0.0), metric.franchise.unwrap_or(0.0)];
    let top = values.iter().copied().fold(0.0_f64, f64::max).max(1.0) * 1.15;

    let mut chart = ChartBuilder::on(area)
        .caption(format!("Avg {}", metric.title), (FONT, 20))
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d((0..2).into_segmented(), 0.0..top)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(2)
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => labels.get(*i as usize).map(|s| s.to_string()).unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;

    chart.draw_series(
        values
            .iter()
            .zip([STANDALONE_COLOR, FRANCHISE_COLOR])
            .enumerate()
            .map(|(i, (value, color))| {
                let i = i as i32;
                let mut bar = Rectangle::new(
                    [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *value)],
                    color.filled(),
                );
                bar.set_margin(0, 0, 20, 20);
                bar
            }),
    )?;
    Ok(())
}

/// Create the SVG, run `body` against its root and flush it to disk
fn draw(path: &Path, size: (u32, u32), body: impl FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> DrawResult) -> Result<(), ChartError> {
    let draw_err = |e: DrawingAreaErrorKind<std::io::Error>| ChartError::Draw(path.display().to_string(), e.to_string());

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;
    body(&root).map_err(draw_err)?;
    root.present().map_err(draw_err)
}

/// Axis range covering `values` with 10% padding on both sides
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }

    let span = (max - min).abs();
    let pad = if span > 0.0 { span * 0.1 } else { max.abs().max(1.0) * 0.1 };
    let low = if min >= 0.0 { (min - pad).max(0.0) } else { min - pad };
    low..(max + pad)
}
