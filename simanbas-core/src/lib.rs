pub mod client;
pub mod export;
pub mod format;
pub mod histogram;
pub mod quality;
pub mod query;
pub mod sample;
pub mod scores;
pub mod session;

pub use simanbas_common::{Result, SimanbasError};
pub use client::{error_message, ApiClient};
pub use export::{
    export_csv, export_json, print_quality_summary, render_histogram, render_option_stats,
    render_question, resolve_export_path,
};
pub use format::{format_datetime, format_metric, truncate_text};
pub use histogram::{build_histogram, validate_bin_count, Histogram, HistogramBin, DEFAULT_BIN_COUNT, MAX_BIN_COUNT};
pub use quality::{needs_review, DifficultyBand, DiscriminationBand, QualitySummary};
pub use query::SummaryFilter;
pub use sample::{bin_metric, extract_sample, parse_sample, quality_points, Metric, MetricDistributions};
pub use scores::parse_scores;
pub use session::Session;
