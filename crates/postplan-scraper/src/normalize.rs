//! Normalization from raw scrape payloads to [`CanonicalDataset`].
//!
//! Two input shapes are recognized:
//!
//! - the actor's native output: an array whose first element is a profile
//!   carrying a `latestPosts` array;
//! - an already-canonical document with `posts` and `engagement_history`.
//!
//! Anything else is reported as [`NormalizeError::UnsupportedFormat`].

use chrono::{DateTime, Duration, Utc};
use postplan_core::{
    parse_timestamp, AccountType, CanonicalDataset, EngagementRecord, Post, Profile,
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::NormalizeError;
use crate::types::{
    non_negative, CanonicalDocumentWire, InstagramPostItem, InstagramProfileItem,
};

/// Engagement values for the synthetic history, newest first.
const SYNTHETIC_ENGAGEMENT: [u64; 3] = [1000, 900, 800];

/// Normalizes a raw scrape payload into a [`CanonicalDataset`].
///
/// `now` anchors the synthetic engagement history produced when a profile
/// has no captioned posts, so two calls with the same input and `now`
/// return identical datasets.
///
/// # Errors
///
/// Returns [`NormalizeError::UnsupportedFormat`] if the payload matches
/// neither recognized shape, or [`NormalizeError::Deserialize`] if the
/// profile or canonical document cannot be decoded.
pub fn normalize(raw: &Value, now: DateTime<Utc>) -> Result<CanonicalDataset, NormalizeError> {
    if let Some(profile) = native_profile(raw) {
        let item = InstagramProfileItem::deserialize(profile).map_err(|source| {
            NormalizeError::Deserialize {
                context: "instagram profile".to_string(),
                source,
            }
        })?;
        return Ok(normalize_instagram(item, now));
    }

    if is_canonical(raw) {
        let doc = CanonicalDocumentWire::deserialize(raw).map_err(|source| {
            NormalizeError::Deserialize {
                context: "canonical dataset".to_string(),
                source,
            }
        })?;
        return normalize_canonical(doc);
    }

    Err(NormalizeError::UnsupportedFormat(describe_shape(raw)))
}

/// Returns the first array element when it is an object with `latestPosts`.
fn native_profile(raw: &Value) -> Option<&Value> {
    raw.as_array()
        .and_then(|items| items.first())
        .filter(|first| first.get("latestPosts").is_some())
}

fn is_canonical(raw: &Value) -> bool {
    raw.as_object()
        .is_some_and(|o| o.contains_key("posts") && o.contains_key("engagement_history"))
}

fn describe_shape(raw: &Value) -> String {
    match raw {
        Value::Array(items) if items.is_empty() => "empty array".to_string(),
        Value::Array(_) => "array without latestPosts in first element".to_string(),
        Value::Object(_) => "object without posts and engagement_history".to_string(),
        Value::Null => "null".to_string(),
        _ => "scalar value".to_string(),
    }
}

fn normalize_instagram(item: InstagramProfileItem, now: DateTime<Utc>) -> CanonicalDataset {
    let entries = item.latest_posts.as_array().map_or(&[][..], Vec::as_slice);
    tracing::debug!(
        username = %item.username,
        entries = entries.len(),
        "normalizing instagram profile"
    );

    let mut posts = Vec::with_capacity(entries.len());
    let mut engagement_history = Vec::with_capacity(entries.len());

    for (idx, entry) in entries.iter().enumerate() {
        let post_item = match InstagramPostItem::deserialize(entry) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(index = idx, error = %e, "skipping malformed latestPosts entry");
                continue;
            }
        };

        if !post_item.child_posts.is_empty() {
            tracing::debug!(
                post_id = %post_item.id,
                children = post_item.child_posts.len(),
                "carousel post"
            );
        }

        let Some(post) = post_from_item(post_item) else {
            continue;
        };

        if !post.timestamp.is_empty() {
            engagement_history.push(EngagementRecord {
                timestamp: post.timestamp.clone(),
                engagement: post.engagement,
            });
        }
        posts.push(post);
    }

    if posts.is_empty() {
        tracing::warn!(
            username = %item.username,
            "no captioned posts in scrape; using synthetic engagement history"
        );
        engagement_history = synthetic_history(now);
    }

    sort_history(&mut engagement_history);

    let profile = Profile {
        username: item.username,
        full_name: item.full_name,
        followers_count: non_negative(item.followers_count),
        follows_count: non_negative(item.follows_count),
        biography: item.biography,
        account_type: item
            .account_type
            .map_or(AccountType::Unknown, AccountType::from),
    };

    CanonicalDataset {
        posts,
        engagement_history,
        profile,
    }
}

/// Builds a [`Post`], or `None` when the entry has no caption.
///
/// Engagement is always recomputed from likes and comments.
fn post_from_item(item: InstagramPostItem) -> Option<Post> {
    if item.caption.trim().is_empty() {
        return None;
    }
    let likes = non_negative(item.likes_count);
    let comments = non_negative(item.comments_count);
    Some(Post {
        id: item.id,
        caption: item.caption,
        hashtags: item.hashtags,
        engagement: likes + comments,
        likes,
        comments,
        timestamp: item.timestamp,
        url: item.url,
        post_type: item.post_type,
    })
}

fn normalize_canonical(doc: CanonicalDocumentWire) -> Result<CanonicalDataset, NormalizeError> {
    let posts = doc
        .posts
        .into_iter()
        .filter(|p| !p.caption.trim().is_empty())
        .map(|p| {
            let likes = non_negative(p.likes);
            let comments = non_negative(p.comments);
            let engagement = p
                .engagement
                .map_or(likes + comments, |e| non_negative(Some(e)));
            Post {
                id: p.id,
                caption: p.caption,
                hashtags: p.hashtags,
                engagement,
                likes,
                comments,
                timestamp: p.timestamp,
                url: p.url,
                post_type: p.post_type,
            }
        })
        .collect();

    let mut engagement_history = doc
        .engagement_history
        .into_iter()
        .enumerate()
        .map(|(idx, record)| {
            let engagement = record.engagement.ok_or_else(|| {
                NormalizeError::UnsupportedFormat(format!(
                    "engagement_history[{idx}] has no engagement value"
                ))
            })?;
            Ok(EngagementRecord {
                timestamp: record.timestamp,
                engagement: non_negative(Some(engagement)),
            })
        })
        .collect::<Result<Vec<_>, NormalizeError>>()?;

    sort_history(&mut engagement_history);

    Ok(CanonicalDataset {
        posts,
        engagement_history,
        profile: doc.profile,
    })
}

/// Three records at `now`, `now - 1d`, `now - 2d` with decreasing engagement.
fn synthetic_history(now: DateTime<Utc>) -> Vec<EngagementRecord> {
    SYNTHETIC_ENGAGEMENT
        .iter()
        .zip(0i64..)
        .map(|(&engagement, days)| EngagementRecord {
            timestamp: (now - Duration::days(days))
                .format("%Y-%m-%dT%H:%M:%S.000Z")
                .to_string(),
            engagement,
        })
        .collect()
}

/// Chronological sort; unparseable timestamps sort first, by raw string.
fn sort_history(history: &mut [EngagementRecord]) {
    history.sort_by(|a, b| {
        parse_timestamp(&a.timestamp)
            .cmp(&parse_timestamp(&b.timestamp))
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
