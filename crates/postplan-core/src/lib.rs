//! Shared domain types and configuration for postplan.
//!
//! Every stage of the content pipeline speaks in terms of the canonical
//! dataset defined here: posts, a time-ordered engagement history, and the
//! account profile they were scraped from.

pub mod app_config;
pub mod config;
pub mod error;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use types::{
    parse_timestamp, AccountType, CanonicalDataset, EngagementRecord, Post, Profile,
};
