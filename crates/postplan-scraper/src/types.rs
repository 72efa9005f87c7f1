//! Wire types for scrape output and the Apify REST API.
//!
//! These mirror the JSON the `apify/instagram-profile-scraper` actor emits.
//! Every field is optional or defaulted because the actor omits or nulls
//! fields freely (hidden like counts, posts without captions, private
//! profiles with no `latestPosts`).

use serde::{Deserialize, Deserializer, Serialize};

/// Treat `null` the same as a missing field.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept a string, a number, or `null` and produce a string.
///
/// Post IDs arrive as strings from the actor but as numbers in some
/// hand-assembled canonical documents.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

/// Clamp a signed count to zero. The actor reports hidden like counts as `-1`.
pub(crate) fn non_negative(count: Option<i64>) -> u64 {
    count.and_then(|c| u64::try_from(c).ok()).unwrap_or(0)
}

/// First element of the actor's dataset: one profile with its recent posts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstagramProfileItem {
    #[serde(default, deserialize_with = "nullable")]
    pub username: String,
    #[serde(rename = "fullName", default, deserialize_with = "nullable")]
    pub full_name: String,
    #[serde(rename = "followersCount", default)]
    pub followers_count: Option<i64>,
    #[serde(rename = "followsCount", default)]
    pub follows_count: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub biography: String,
    #[serde(default)]
    pub account_type: Option<String>,
    /// Kept untyped so a malformed entry can be skipped without rejecting
    /// the whole profile.
    #[serde(rename = "latestPosts", default)]
    pub latest_posts: serde_json::Value,
}

/// One entry of `latestPosts`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstagramPostItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub caption: String,
    #[serde(default, deserialize_with = "nullable")]
    pub hashtags: Vec<String>,
    #[serde(rename = "likesCount", default)]
    pub likes_count: Option<i64>,
    #[serde(rename = "commentsCount", default)]
    pub comments_count: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    #[serde(rename = "type", default, deserialize_with = "nullable")]
    pub post_type: String,
    #[serde(rename = "childPosts", default, deserialize_with = "nullable")]
    pub child_posts: Vec<serde_json::Value>,
}

/// A post inside an already-canonical document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CanonicalPostWire {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub caption: String,
    #[serde(default, deserialize_with = "nullable")]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub engagement: Option<i64>,
    #[serde(default)]
    pub likes: Option<i64>,
    #[serde(default)]
    pub comments: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    #[serde(rename = "type", default, deserialize_with = "nullable")]
    pub post_type: String,
}

/// An engagement record inside an already-canonical document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngagementRecordWire {
    #[serde(default, deserialize_with = "nullable")]
    pub timestamp: String,
    #[serde(default)]
    pub engagement: Option<i64>,
}

/// Already-canonical document: `{posts, engagement_history, profile?}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CanonicalDocumentWire {
    #[serde(default, deserialize_with = "nullable")]
    pub posts: Vec<CanonicalPostWire>,
    #[serde(default, deserialize_with = "nullable")]
    pub engagement_history: Vec<EngagementRecordWire>,
    #[serde(default, deserialize_with = "nullable")]
    pub profile: postplan_core::Profile,
}

/// Input for the `apify/instagram-profile-scraper` actor.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileScraperInput {
    pub usernames: Vec<String>,
    #[serde(rename = "resultsLimit")]
    pub results_limit: u32,
    #[serde(rename = "proxyConfig")]
    pub proxy_config: ProxyConfig,
    #[serde(rename = "scrapeType")]
    pub scrape_type: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProxyConfig {
    #[serde(rename = "useApifyProxy")]
    pub use_apify_proxy: bool,
}

/// Actor run metadata returned by the run endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct RunData {
    pub id: String,
    pub status: String,
    #[serde(rename = "defaultDatasetId")]
    pub default_dataset_id: String,
}

/// Apify wraps single-object responses in `{"data": ...}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn post_item_tolerates_nulls() {
        let item: InstagramPostItem = serde_json::from_value(json!({
            "id": "17",
            "caption": null,
            "hashtags": null,
            "likesCount": null,
            "commentsCount": 4,
            "timestamp": null,
        }))
        .unwrap();
        assert_eq!(item.id, "17");
        assert!(item.caption.is_empty());
        assert!(item.hashtags.is_empty());
        assert_eq!(non_negative(item.likes_count), 0);
        assert_eq!(non_negative(item.comments_count), 4);
    }

    #[test]
    fn numeric_ids_become_strings() {
        let item: CanonicalPostWire = serde_json::from_value(json!({"id": 42})).unwrap();
        assert_eq!(item.id, "42");
    }

    #[test]
    fn hidden_like_counts_clamp_to_zero() {
        assert_eq!(non_negative(Some(-1)), 0);
        assert_eq!(non_negative(Some(12)), 12);
    }

    #[test]
    fn scraper_input_uses_actor_field_names() {
        let input = ProfileScraperInput {
            usernames: vec!["acme".to_string()],
            results_limit: 10,
            proxy_config: ProxyConfig {
                use_apify_proxy: true,
            },
            scrape_type: "posts",
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(
            value,
            json!({
                "usernames": ["acme"],
                "resultsLimit": 10,
                "proxyConfig": {"useApifyProxy": true},
                "scrapeType": "posts",
            })
        );
    }
}
