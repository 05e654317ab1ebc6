//! Cinemetrics engine
//!
//! This crate implements the pipeline logic:
//! - Transformer (Raw Records to Clean Table, as named stages)
//! - Credit enrichment
//! - Analyzer (KPIs, rankings, group comparisons)
//! - Transform pipeline with pluggable sinks

pub mod aggregate;
pub mod analyzer;
pub mod enrichment;
pub mod pipeline;
pub mod query;
pub mod transformer;

pub use analyzer::{add_kpis, AnalysisError, Analyzer};
pub use enrichment::enrich_with_credits;
pub use pipeline::{CsvFileSink, MemorySink, PipelineOutput, TableSink, TransformPipeline};
pub use query::{list_contains, list_contains_all, KpiRanking, RankQuery};
pub use transformer::{Stage, TransformError, TransformOutput, Transformer};
