//! Recommendation engine: retrieval context, prompting, and the fallbacks
//! that keep every output well formed.
//!
//! Every public method returns a usable value even when the generator fails
//! or answers with something unparseable. Competitor and improvement lists
//! always have exactly [`COMPETITOR_COUNT`] and [`IMPROVEMENT_COUNT`]
//! entries.

mod insights;
mod parse;
mod prompts;

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use postplan_core::{parse_timestamp, CanonicalDataset, Post, Profile};
use regex::Regex;
use serde_json::Value;

pub use insights::{analyze_account_type, analyze_engagement, analyze_posting_trends};

use crate::error::{AnalysisError, GenerateError};
use crate::forecast::{trending_topics, EngagementForecast, DEFAULT_TRENDING_TOPICS};
use crate::generator::TextGenerator;
use crate::index::SimilarityIndex;
use crate::types::{
    hashtag_field, text_field, AnalysisBundle, Competitor, ContentPlan, ContentRecommendation,
    ImprovementRecommendation, NextPostPrediction,
};
use insights::most_common;
use parse::{heuristic_recommendation, parse_json, recommendation_from_json};
use prompts::ResponseShape;

pub const COMPETITOR_COUNT: usize = 10;
pub const IMPROVEMENT_COUNT: usize = 5;
pub const RECOMMENDATIONS_PER_TOPIC: usize = 3;

/// Similar captions pulled from the index per prompt.
pub const CONTEXT_DOCS: usize = 3;

/// Topics used for batch recommendations when no period is trending.
pub const FALLBACK_TOPICS: [&str; 3] = [
    "summer fashion",
    "product promotion",
    "customer engagement",
];

const IMAGE_PROMPT_FALLBACK: &str =
    "A high-quality, professional image that matches the caption and hashtags.";

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+)").expect("valid regex"));

fn fallback_next_post() -> NextPostPrediction {
    NextPostPrediction {
        caption: "Check out our latest updates!".to_string(),
        hashtags: vec!["#New".to_string(), "#Update".to_string()],
        call_to_action: "Visit our profile for more".to_string(),
        image_prompt: "Modern lifestyle image with vibrant colors".to_string(),
    }
}

fn fallback_competitors() -> Vec<Competitor> {
    (1..=COMPETITOR_COUNT)
        .map(|i| Competitor {
            account_name: format!("competitor_{i}"),
            reason: "Similar content and audience".to_string(),
            unique_value: "Different approach to similar topics".to_string(),
        })
        .collect()
}

fn default_improvements() -> Vec<ImprovementRecommendation> {
    [
        (
            "Post more consistently",
            "Regular posting helps maintain audience engagement",
            "Create a content calendar and schedule posts in advance",
        ),
        (
            "Engage more with followers",
            "Higher engagement leads to better reach and loyalty",
            "Respond to comments and messages promptly",
        ),
        (
            "Use more relevant hashtags",
            "Proper hashtags increase discoverability",
            "Research trending hashtags in your niche",
        ),
        (
            "Improve visual consistency",
            "Consistent aesthetics create a recognizable brand",
            "Use similar filters and color schemes across posts",
        ),
        (
            "Collaborate with similar accounts",
            "Collaborations expose your account to new audiences",
            "Reach out to complementary accounts for partnership opportunities",
        ),
    ]
    .into_iter()
    .map(|(recommendation, reasoning, implementation)| ImprovementRecommendation {
        recommendation: recommendation.to_string(),
        reasoning: reasoning.to_string(),
        implementation: implementation.to_string(),
    })
    .collect()
}

/// Generator output after the parse chain and reformat round trip.
enum Completion {
    Json(Value),
    /// Nothing parsed; the original response text.
    Text(String),
}

/// Items of a list-shaped response: a bare array, an array under
/// `list_key`, or a single object carrying `item_key`.
fn list_items(value: Value, list_key: &str, item_key: &str) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => match map.remove(list_key) {
            Some(Value::Array(items)) => Some(items),
            Some(_) => None,
            None if map.contains_key(item_key) => Some(vec![Value::Object(map)]),
            None => None,
        },
        _ => None,
    }
}

/// Builds prompts, calls the generator, and repairs what comes back.
pub struct RecommendationEngine {
    generator: Arc<dyn TextGenerator>,
}

impl RecommendationEngine {
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Sends `prompt`, then runs the parse chain. If nothing parses, asks the
    /// generator once to reformat its answer as `shape`.
    async fn complete(
        &self,
        prompt: &str,
        shape: ResponseShape,
    ) -> Result<Completion, GenerateError> {
        let text = self.generator.generate(prompt).await?;
        if let Some(value) = parse_json(&text) {
            return Ok(Completion::Json(value));
        }

        tracing::warn!(?shape, "no JSON in generator response, requesting reformat");
        match self.generator.generate(&prompts::reformat(&text, shape)).await {
            Ok(reformatted) => {
                if let Some(value) = parse_json(&reformatted) {
                    return Ok(Completion::Json(value));
                }
                tracing::warn!(?shape, "reformatted response still not JSON");
            }
            Err(e) => {
                tracing::warn!(?shape, error = %e, "reformat request failed");
            }
        }
        Ok(Completion::Text(text))
    }

    /// Up to [`CONTEXT_DOCS`] similar captions, or three synthetic lines
    /// about `topic` when the index returns none.
    fn retrieval_context(index: &SimilarityIndex, topic: &str) -> Vec<String> {
        let hits = index.query(topic, CONTEXT_DOCS);
        if hits.is_empty() {
            tracing::debug!(topic, "no similar documents, using synthetic context");
            return prompts::synthetic_context(topic);
        }
        hits.into_iter().map(|hit| hit.document).collect()
    }

    /// One caption, hashtag set, and call to action for `topic`.
    pub async fn generate_recommendation(
        &self,
        index: &SimilarityIndex,
        topic: &str,
    ) -> ContentRecommendation {
        let context = Self::retrieval_context(index, topic);
        let prompt = prompts::recommendation(topic, &context);

        match self.complete(&prompt, ResponseShape::Recommendation).await {
            Ok(Completion::Json(value)) => {
                let fallback = heuristic_recommendation("", topic);
                recommendation_from_json(&value, fallback)
                    .unwrap_or_else(|| heuristic_recommendation(&value.to_string(), topic))
            }
            Ok(Completion::Text(text)) => heuristic_recommendation(&text, topic),
            Err(e) => {
                tracing::warn!(
                    topic,
                    error = %e,
                    "recommendation generation failed, using fallback"
                );
                heuristic_recommendation("", topic)
            }
        }
    }

    /// `per_topic` recommendations for each non-blank topic from one batched
    /// call. Topics the batch answer misses or under-fills are completed
    /// through [`Self::generate_recommendation`].
    pub async fn generate_batch_recommendations(
        &self,
        index: &SimilarityIndex,
        topics: &[String],
        per_topic: usize,
    ) -> BTreeMap<String, Vec<ContentRecommendation>> {
        let topics: Vec<String> = topics
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if topics.is_empty() || per_topic == 0 {
            tracing::warn!("no valid topics for batch recommendations");
            return BTreeMap::new();
        }

        let contexts: Vec<(String, Vec<String>)> = topics
            .iter()
            .map(|t| (t.clone(), Self::retrieval_context(index, t)))
            .collect();
        let prompt = prompts::batch(&topics, &contexts, per_topic);

        // Only the parse chain here; no reformat round trip.
        let batch = match self.generator.generate(&prompt).await {
            Ok(text) => match parse_json(&text) {
                Some(Value::Object(map)) => map,
                _ => {
                    tracing::warn!("batch response was not a JSON object");
                    serde_json::Map::new()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "batch generation failed");
                serde_json::Map::new()
            }
        };

        let mut out = BTreeMap::new();
        for topic in topics {
            let mut recs: Vec<ContentRecommendation> = match batch.get(&topic) {
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(|item| {
                        recommendation_from_json(item, heuristic_recommendation("", &topic))
                    })
                    .collect(),
                _ => {
                    tracing::warn!(
                        topic = %topic,
                        "topic missing from batch response, generating individually"
                    );
                    Vec::new()
                }
            };
            while recs.len() < per_topic {
                recs.push(self.generate_recommendation(index, &topic).await);
            }
            recs.truncate(per_topic);
            out.insert(topic, recs);
        }

        tracing::info!(topics = out.len(), "generated batch recommendations");
        out
    }

    /// Predicts the account's next post from its recent captions, common
    /// hashtags, and whatever analyses `bundle` already holds.
    pub async fn generate_next_post_prediction(
        &self,
        posts: &[Post],
        bundle: &AnalysisBundle,
    ) -> NextPostPrediction {
        let prompt = prompts::next_post(&next_post_context(posts, bundle));

        match self.complete(&prompt, ResponseShape::NextPost).await {
            Ok(Completion::Json(value)) if value.is_object() => {
                let fallback = fallback_next_post();
                NextPostPrediction {
                    caption: text_field(&value, "caption").unwrap_or(fallback.caption),
                    hashtags: hashtag_field(&value, "hashtags").unwrap_or(fallback.hashtags),
                    call_to_action: text_field(&value, "call_to_action")
                        .unwrap_or(fallback.call_to_action),
                    image_prompt: text_field(&value, "image_prompt")
                        .unwrap_or_else(|| IMAGE_PROMPT_FALLBACK.to_string()),
                }
            }
            Ok(_) => {
                tracing::warn!("next-post response unusable, using fallback prediction");
                fallback_next_post()
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "next-post prediction failed, using fallback prediction"
                );
                fallback_next_post()
            }
        }
    }

    /// Exactly [`COMPETITOR_COUNT`] similar accounts.
    pub async fn identify_competitors(&self, posts: &[Post], profile: &Profile) -> Vec<Competitor> {
        let prompt = prompts::competitors(&competitor_context(posts, profile), COMPETITOR_COUNT);

        let mut competitors = match self.complete(&prompt, ResponseShape::Competitors).await {
            Ok(Completion::Json(value)) => match list_items(value, "competitors", "account_name") {
                Some(items) => items
                    .into_iter()
                    .filter_map(|item| serde_json::from_value::<Competitor>(item).ok())
                    .filter(|c| !c.account_name.trim().is_empty())
                    .collect(),
                None => {
                    tracing::warn!("competitor response had unexpected shape");
                    fallback_competitors()
                }
            },
            Ok(Completion::Text(_)) => {
                tracing::warn!("competitor response was not JSON");
                fallback_competitors()
            }
            Err(e) => {
                tracing::warn!(error = %e, "competitor identification failed");
                fallback_competitors()
            }
        };

        while competitors.len() < COMPETITOR_COUNT {
            competitors.push(Competitor {
                account_name: format!("suggested_account_{}", competitors.len() + 1),
                reason: "Similar content and target audience".to_string(),
                unique_value: "Different perspective on similar topics".to_string(),
            });
        }
        competitors.truncate(COMPETITOR_COUNT);
        competitors
    }

    /// Exactly [`IMPROVEMENT_COUNT`] improvement items.
    pub async fn generate_improvement_recommendations(
        &self,
        bundle: &AnalysisBundle,
    ) -> Vec<ImprovementRecommendation> {
        let prompt = prompts::improvements(&improvement_context(bundle), IMPROVEMENT_COUNT);

        let mut recommendations = match self.complete(&prompt, ResponseShape::Improvements).await {
            Ok(Completion::Json(value)) => {
                match list_items(value, "recommendations", "recommendation") {
                    Some(items) => items
                        .into_iter()
                        .filter_map(|item| {
                            serde_json::from_value::<ImprovementRecommendation>(item).ok()
                        })
                        .filter(|r| !r.recommendation.trim().is_empty())
                        .collect(),
                    None => {
                        tracing::warn!("improvement response had unexpected shape");
                        default_improvements()
                    }
                }
            }
            Ok(Completion::Text(_)) => {
                tracing::warn!("improvement response was not JSON");
                default_improvements()
            }
            Err(e) => {
                tracing::warn!(error = %e, "improvement generation failed");
                default_improvements()
            }
        };

        while recommendations.len() < IMPROVEMENT_COUNT {
            recommendations.push(ImprovementRecommendation {
                recommendation: format!("Generic recommendation {}", recommendations.len() + 1),
                reasoning: "This will help improve your account performance".to_string(),
                implementation: "Follow best practices for Instagram growth".to_string(),
            });
        }
        recommendations.truncate(IMPROVEMENT_COUNT);
        recommendations
    }

    /// Runs every analysis and generation step for one account.
    ///
    /// `forecast` supplies trending topics when present; otherwise batch
    /// recommendations use [`FALLBACK_TOPICS`].
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::NoPosts`] if `dataset` has no posts.
    pub async fn build_content_plan(
        &self,
        username: &str,
        dataset: &CanonicalDataset,
        forecast: Option<&EngagementForecast>,
        index: &SimilarityIndex,
        now: DateTime<Utc>,
    ) -> Result<ContentPlan, AnalysisError> {
        let posts = dataset.posts.as_slice();
        if posts.is_empty() {
            tracing::error!(username, "cannot build content plan without posts");
            return Err(AnalysisError::NoPosts);
        }

        let profile_analysis = analyze_account_type(posts);
        let engagement_analysis = analyze_engagement(posts);
        let posting_trends = analyze_posting_trends(posts);
        let trending = forecast
            .map(|f| trending_topics(f, DEFAULT_TRENDING_TOPICS))
            .filter(|t| !t.is_empty());
        let mut bundle = AnalysisBundle {
            account_type: Some(profile_analysis.clone()),
            engagement: Some(engagement_analysis.clone()),
            posting_trends: Some(posting_trends.clone()),
            trending_topics: trending.clone(),
            ..AnalysisBundle::default()
        };

        let next_post_prediction = self.generate_next_post_prediction(posts, &bundle).await;
        bundle.next_post = Some(next_post_prediction.clone());

        let competitors = self.identify_competitors(posts, &dataset.profile).await;
        bundle.competitors = Some(competitors.clone());

        let improvement_recommendations = self.generate_improvement_recommendations(&bundle).await;
        bundle.improvements = Some(improvement_recommendations.clone());

        let topics: Vec<String> = match &trending {
            Some(trending) => trending.iter().map(|t| t.topic.clone()).collect(),
            None => FALLBACK_TOPICS.iter().map(|t| (*t).to_string()).collect(),
        };
        let topic_recommendations = self
            .generate_batch_recommendations(index, &topics, RECOMMENDATIONS_PER_TOPIC)
            .await;

        tracing::info!(
            username,
            posts = posts.len(),
            improvements = improvement_recommendations.len(),
            trending = trending.as_ref().map_or(0, Vec::len),
            "content plan generated"
        );

        Ok(ContentPlan {
            username: username.to_string(),
            generated_date: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            profile_analysis,
            engagement_analysis,
            posting_trends,
            next_post_prediction,
            improvement_recommendations,
            competitors,
            trending_topics: trending,
            topic_recommendations: Some(topic_recommendations).filter(|m| !m.is_empty()),
        })
    }
}

/// Context block for the next-post prompt.
fn next_post_context(posts: &[Post], bundle: &AnalysisBundle) -> String {
    let mut dated: Vec<(Option<DateTime<Utc>>, &Post)> = posts
        .iter()
        .map(|p| (parse_timestamp(&p.timestamp), p))
        .collect();
    dated.sort_by_key(|(ts, _)| *ts);
    let recent = &dated[dated.len().saturating_sub(5)..];

    let mut lines: Vec<String> = recent
        .iter()
        .map(|(_, p)| format!("Recent caption: {}", p.caption))
        .collect();

    let common = most_common(posts.iter().flat_map(|p| p.hashtags.iter().cloned()), 10);
    lines.push(format!("Commonly used hashtags: {}", common.join(", ")));

    if let Some(account) = &bundle.account_type {
        lines.push(format!("Account type: {}", account.account_type));
    }
    if let Some(category) = bundle
        .engagement
        .as_ref()
        .and_then(|e| e.best_performing_category.as_deref())
    {
        lines.push(format!("Best performing content category: {category}"));
    }
    if let Some(trends) = &bundle.posting_trends {
        lines.push(format!("Posting trends: {}", trends.summary));
    }
    if let Some(topics) = trending_line(bundle) {
        lines.push(topics);
    }
    lines.join("\n")
}

fn trending_line(bundle: &AnalysisBundle) -> Option<String> {
    let topics = bundle.trending_topics.as_deref().filter(|t| !t.is_empty())?;
    let names: Vec<&str> = topics.iter().map(|t| t.topic.as_str()).collect();
    Some(format!("Trending topics: {}", names.join(", ")))
}

/// Context block for the competitor prompt.
fn competitor_context(posts: &[Post], profile: &Profile) -> String {
    let mut lines = Vec::new();
    if !profile.biography.trim().is_empty() {
        lines.push(format!("Account bio: {}", profile.biography.trim()));
    }

    let hashtags = most_common(posts.iter().flat_map(|p| p.hashtags.iter().cloned()), 10);
    lines.push(format!("Top hashtags used: {}", hashtags.join(", ")));

    let mentions = most_common(
        posts.iter().flat_map(|p| {
            MENTION_RE
                .captures_iter(&p.caption)
                .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
                .collect::<Vec<_>>()
        }),
        5,
    );
    lines.push(format!("Accounts frequently mentioned: {}", mentions.join(", ")));
    lines.join("\n")
}

/// Context block for the improvement prompt.
fn improvement_context(bundle: &AnalysisBundle) -> String {
    let mut lines = Vec::new();
    if let Some(account) = &bundle.account_type {
        lines.push(format!("Account type: {}", account.account_type));
        lines.push(format!("Account analysis: {}", account.analysis));
    }
    if let Some(engagement) = &bundle.engagement {
        lines.push(format!("Engagement analysis: {}", engagement.summary));
    }
    if let Some(trends) = &bundle.posting_trends {
        lines.push(format!("Posting trends: {}", trends.summary));
    }
    if let Some(topics) = trending_line(bundle) {
        lines.push(topics);
    }
    if let Some(competitors) = bundle.competitors.as_deref().filter(|c| !c.is_empty()) {
        let names: Vec<&str> = competitors.iter().map(|c| c.account_name.as_str()).collect();
        lines.push(format!("Similar accounts: {}", names.join(", ")));
    }
    lines.join("\n")
}

#[cfg(test)]
#[path = "recommend_test.rs"]
mod tests;
