//! Pipeline orchestration: raw scrape in, saved and exported content plan
//! out.
//!
//! [`Pipeline::run`] drives normalization, validation, indexing, engagement
//! analysis, plan generation, persistence, and export for one data key and
//! reports how far it got in a [`PipelineResult`]. Username intake and the
//! pending queue feed it new keys.

pub mod error;
pub mod export;
pub mod pipeline;
pub mod result;

pub use error::PipelineError;
pub use export::{creative_key, export_plan, recommendations_key, ExportReport};
pub use pipeline::{
    bucket_from_config, generator_from_config, raw_upload_key, Pipeline, QueueReport,
    DEFAULT_RESULTS_LIMIT,
};
pub use result::{NewBusinessSuggestions, PipelineResult, Stage};
