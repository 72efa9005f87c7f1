//! Structured outputs of the analysis and recommendation stages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A caption, its hashtags, and a call to action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecommendation {
    pub caption: String,
    pub hashtags: Vec<String>,
    pub call_to_action: String,
}

/// A predicted next post, with a prompt for an image generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextPostPrediction {
    pub caption: String,
    pub hashtags: Vec<String>,
    pub call_to_action: String,
    pub image_prompt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub unique_value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImprovementRecommendation {
    #[serde(default)]
    pub recommendation: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub implementation: String,
}

/// Business-versus-personal classification from captions and hashtags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountClass {
    #[serde(rename = "Business/Brand")]
    Business,
    Personal,
    #[default]
    Unknown,
}

impl AccountClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AccountClass::Business => "Business/Brand",
            AccountClass::Personal => "Personal",
            AccountClass::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for AccountClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountTypeAnalysis {
    pub account_type: AccountClass,
    /// 0 for `Unknown`, otherwise in `[60, 100]`.
    pub confidence: f64,
    pub analysis: String,
}

/// Engagement totals for one content type or hashtag category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub count: usize,
    pub total_engagement: u64,
    pub average_engagement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementAnalysis {
    /// Only groups with at least one post appear.
    pub content_type_analysis: BTreeMap<String, GroupStats>,
    pub category_analysis: BTreeMap<String, GroupStats>,
    pub best_performing_content: Option<String>,
    pub best_performing_category: Option<String>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostingTrends {
    pub most_active_day: Option<String>,
    pub most_active_hour: Option<u32>,
    /// `most_active_hour` on a 12-hour clock, e.g. `"3 PM"`.
    pub hour_formatted: Option<String>,
    pub posts_per_day: f64,
    pub day_distribution: BTreeMap<String, usize>,
    pub hour_distribution: BTreeMap<u32, usize>,
    /// Month name to post count, for months above 1.2× the monthly mean.
    pub high_activity_months: BTreeMap<String, usize>,
    pub summary: String,
}

/// A forecast date flagged as trending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingTopic {
    pub date: String,
    pub value: f64,
    pub topic: String,
}

/// Per-stage outputs gathered while a plan is assembled.
///
/// Each field is filled independently; later prompts use whatever earlier
/// stages produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisBundle {
    pub account_type: Option<AccountTypeAnalysis>,
    pub engagement: Option<EngagementAnalysis>,
    pub posting_trends: Option<PostingTrends>,
    pub trending_topics: Option<Vec<TrendingTopic>>,
    pub next_post: Option<NextPostPrediction>,
    pub improvements: Option<Vec<ImprovementRecommendation>>,
    pub competitors: Option<Vec<Competitor>>,
}

/// The full output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPlan {
    pub username: String,
    pub generated_date: String,
    pub profile_analysis: AccountTypeAnalysis,
    pub engagement_analysis: EngagementAnalysis,
    pub posting_trends: PostingTrends,
    pub next_post_prediction: NextPostPrediction,
    pub improvement_recommendations: Vec<ImprovementRecommendation>,
    pub competitors: Vec<Competitor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trending_topics: Option<Vec<TrendingTopic>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_recommendations: Option<BTreeMap<String, Vec<ContentRecommendation>>>,
}

/// Reads a string field, accepting numbers and booleans as text.
pub(crate) fn text_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads a hashtag list given either as an array or as one space-separated
/// string.
pub(crate) fn hashtag_field(value: &Value, key: &str) -> Option<Vec<String>> {
    let tags: Vec<String> = match value.get(key)? {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Value::String(s) => s.split_whitespace().map(str::to_string).collect(),
        _ => return None,
    };
    Some(tags).filter(|t| !t.is_empty())
}
