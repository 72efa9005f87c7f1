//! Profile scraping, raw-data normalization, and schema validation.
//!
//! [`normalize`] turns whatever the scraping actor produced (or an
//! already-canonical document) into a [`postplan_core::CanonicalDataset`];
//! [`validate`] is the gate the orchestrator checks before analysis.

pub mod apify;
pub mod error;
pub mod normalize;
pub mod types;
pub mod validate;

pub use apify::{ApifyScraper, ProfileScraper};
pub use error::{NormalizeError, ScrapeError};
pub use normalize::normalize;
pub use validate::{check, validate, ValidationIssue};
