//! Canonical data model shared by every pipeline stage.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single piece of published content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub caption: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    /// Likes plus comments.
    pub engagement: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    /// ISO-8601 publication time. May be empty when the source omitted it.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub url: String,
    /// Source media tag, e.g. `"Image"`, `"Video"`, `"Sidecar"`.
    #[serde(rename = "type", default)]
    pub post_type: String,
}

/// One point of the engagement time series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementRecord {
    pub timestamp: String,
    pub engagement: u64,
}

/// Account classification attached to a scraped profile.
///
/// The two named special cases drive the orchestrator's zero-post branches;
/// any other tag is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AccountType {
    #[default]
    Unknown,
    BusinessNoPosts,
    PrivateAccount,
    Other(String),
}

impl AccountType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            AccountType::Unknown => "unknown",
            AccountType::BusinessNoPosts => "business_no_posts",
            AccountType::PrivateAccount => "private_account",
            AccountType::Other(tag) => tag,
        }
    }
}

impl From<String> for AccountType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "unknown" | "" => AccountType::Unknown,
            "business_no_posts" => AccountType::BusinessNoPosts,
            "private_account" => AccountType::PrivateAccount,
            _ => AccountType::Other(value),
        }
    }
}

impl From<AccountType> for String {
    fn from(value: AccountType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account metadata from the scrape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub username: String,
    #[serde(rename = "fullName", default)]
    pub full_name: String,
    #[serde(rename = "followersCount", default)]
    pub followers_count: u64,
    #[serde(rename = "followsCount", default)]
    pub follows_count: u64,
    #[serde(default)]
    pub biography: String,
    #[serde(default)]
    pub account_type: AccountType,
}

/// The normalized unit handed between stages.
///
/// Built once by the normalizer and never mutated afterwards; analysis
/// stages produce their own result types instead of writing back here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalDataset {
    pub posts: Vec<Post>,
    pub engagement_history: Vec<EngagementRecord>,
    #[serde(default)]
    pub profile: Profile,
}

/// Offset-carrying layouts not covered by RFC 3339: missing seconds and
/// basic-format offsets (`+0000`).
const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

/// Layouts read as UTC, with or without a trailing `Z`.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse the timestamp formats seen in scrape output.
///
/// Accepts RFC 3339 (`2024-01-01T00:00:00Z`, `...000Z`, offsets), ISO 8601
/// without seconds (`2024-01-01T10:30Z`), basic-format offsets (`+0000`),
/// naive `YYYY-MM-DD[T ]HH:MM[:SS[.fff]]` and bare dates. Naive values are
/// taken as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let (local, zulu) = match raw.strip_suffix(['Z', 'z']) {
        Some(local) => (local, true),
        None => (raw, false),
    };
    if !zulu {
        for fmt in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
                return Some(dt.with_timezone(&Utc));
            }
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(local, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(local, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
