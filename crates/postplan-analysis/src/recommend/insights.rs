//! Deterministic account analyses computed from posts alone.

use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};
use postplan_core::{parse_timestamp, Post};

use crate::types::{
    AccountClass, AccountTypeAnalysis, EngagementAnalysis, GroupStats, PostingTrends,
};

const BUSINESS_TERMS: &[&str] = &[
    "product",
    "sale",
    "discount",
    "offer",
    "brand",
    "business",
    "shop",
    "store",
    "buy",
    "purchase",
    "collection",
    "launch",
];

const BUSINESS_HASHTAGS: &[&str] = &[
    "#business",
    "#brand",
    "#product",
    "#sale",
    "#shop",
    "#store",
    "#entrepreneur",
    "#marketing",
];

/// Content types in tie-break order.
const CONTENT_TYPES: &[&str] = &["photo", "video", "carousel", "text_only"];

/// Hashtag categories in tie-break order.
const HASHTAG_CATEGORIES: &[(&str, &[&str])] = &[
    ("product", &["#product", "#sale", "#shop", "#store", "#buy"]),
    ("lifestyle", &["#lifestyle", "#life", "#daily", "#everyday"]),
    ("motivation", &["#motivation", "#inspire", "#success", "#goals"]),
    ("fashion", &["#fashion", "#style", "#outfit", "#clothing"]),
    ("food", &["#food", "#recipe", "#cooking", "#foodie"]),
    ("travel", &["#travel", "#vacation", "#trip", "#adventure"]),
    ("fitness", &["#fitness", "#workout", "#gym", "#health"]),
];

/// Counts in first-seen order.
pub(crate) fn tally<K: PartialEq>(items: impl IntoIterator<Item = K>) -> Vec<(K, usize)> {
    let mut counts: Vec<(K, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(k, _)| *k == item) {
            Some((_, n)) => *n += 1,
            None => counts.push((item, 1)),
        }
    }
    counts
}

/// The `n` most frequent items, ties broken by first appearance.
pub(crate) fn most_common<K: PartialEq>(items: impl IntoIterator<Item = K>, n: usize) -> Vec<K> {
    let mut counts = tally(items);
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(n).map(|(k, _)| k).collect()
}

/// First entry with the highest count.
fn first_max<K: Clone>(counts: &[(K, usize)]) -> Option<K> {
    let mut best: Option<&(K, usize)> = None;
    for entry in counts {
        if best.is_none_or(|b| entry.1 > b.1) {
            best = Some(entry);
        }
    }
    best.map(|(k, _)| k.clone())
}

/// Classifies the account as business or personal.
///
/// Business when more than 60% of captions use a business term, or when
/// business hashtags outnumber half the post count.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn analyze_account_type(posts: &[Post]) -> AccountTypeAnalysis {
    if posts.is_empty() {
        return AccountTypeAnalysis {
            account_type: AccountClass::Unknown,
            confidence: 0.0,
            analysis: "Insufficient data to determine account type".to_string(),
        };
    }

    let business_count = posts
        .iter()
        .filter(|p| {
            let caption = p.caption.to_lowercase();
            BUSINESS_TERMS.iter().any(|term| caption.contains(term))
        })
        .count();

    let business_hashtag_count = posts
        .iter()
        .flat_map(|p| &p.hashtags)
        .filter(|tag| {
            let tag = tag.to_lowercase();
            BUSINESS_HASHTAGS.iter().any(|bh| tag.contains(bh))
        })
        .count();

    let total = posts.len();
    let business_pct = business_count as f64 / total as f64 * 100.0;

    if business_pct > 60.0 || business_hashtag_count as f64 > total as f64 * 0.5 {
        let confidence = business_pct.clamp(60.0, 100.0);
        AccountTypeAnalysis {
            account_type: AccountClass::Business,
            confidence,
            analysis: format!(
                "Account appears to be for business/branding purposes with {confidence:.1}% confidence. \
                 Found {business_count} posts with business-related terms and {business_hashtag_count} \
                 business-related hashtags."
            ),
        }
    } else {
        let confidence = (100.0 - business_pct).clamp(60.0, 100.0);
        AccountTypeAnalysis {
            account_type: AccountClass::Personal,
            confidence,
            analysis: format!(
                "Account appears to be for personal use with {confidence:.1}% confidence. \
                 Only {business_count} out of {total} posts contain business-related terms."
            ),
        }
    }
}

fn content_type(post: &Post) -> &'static str {
    match post.post_type.to_lowercase().as_str() {
        "video" | "reel" | "clips" => "video",
        "sidecar" | "carousel" | "carousel_album" => "carousel",
        "text" | "text_only" => "text_only",
        _ => "photo",
    }
}

#[allow(clippy::cast_precision_loss)]
fn group_stats(count: usize, total_engagement: u64) -> GroupStats {
    GroupStats {
        count,
        total_engagement,
        average_engagement: total_engagement as f64 / count as f64,
    }
}

/// Picks the group with the highest average, earliest in `order` on ties.
fn best_group(order: &[&str], stats: &BTreeMap<String, GroupStats>) -> Option<String> {
    let mut best: Option<(&str, f64)> = None;
    for name in order {
        if let Some(s) = stats.get(*name) {
            if best.is_none_or(|(_, avg)| s.average_engagement > avg) {
                best = Some((*name, s.average_engagement));
            }
        }
    }
    best.map(|(name, _)| name.to_string())
}

/// Mean engagement by content type and by hashtag category.
#[must_use]
pub fn analyze_engagement(posts: &[Post]) -> EngagementAnalysis {
    let mut by_type: BTreeMap<&str, (usize, u64)> = BTreeMap::new();
    let mut by_category: BTreeMap<&str, (usize, u64)> = BTreeMap::new();

    for post in posts {
        let entry = by_type.entry(content_type(post)).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += post.engagement;

        let tags: Vec<String> = post.hashtags.iter().map(|t| t.to_lowercase()).collect();
        for (category, category_tags) in HASHTAG_CATEGORIES {
            if category_tags.iter().any(|ct| tags.iter().any(|t| t == ct)) {
                let entry = by_category.entry(*category).or_insert((0, 0));
                entry.0 += 1;
                entry.1 += post.engagement;
            }
        }
    }

    let content_type_analysis: BTreeMap<String, GroupStats> = by_type
        .into_iter()
        .map(|(name, (count, total))| (name.to_string(), group_stats(count, total)))
        .collect();
    let category_analysis: BTreeMap<String, GroupStats> = by_category
        .into_iter()
        .map(|(name, (count, total))| (name.to_string(), group_stats(count, total)))
        .collect();

    let category_order: Vec<&str> = HASHTAG_CATEGORIES.iter().map(|(name, _)| *name).collect();
    let best_content = best_group(CONTENT_TYPES, &content_type_analysis);
    let best_category = best_group(&category_order, &category_analysis);

    let summary = match (&best_content, &best_category) {
        (Some(content), Some(category)) => format!(
            "The account performs best with {content} content about {category}. \
             Average engagement for {content} content is {:.1}, and for {category} content is {:.1}.",
            content_type_analysis[content].average_engagement,
            category_analysis[category].average_engagement,
        ),
        _ => "Insufficient data to determine best performing content.".to_string(),
    };

    EngagementAnalysis {
        content_type_analysis,
        category_analysis,
        best_performing_content: best_content,
        best_performing_category: best_category,
        summary,
    }
}

fn format_hour(hour: u32) -> String {
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    let meridiem = if hour < 12 { "AM" } else { "PM" };
    format!("{display} {meridiem}")
}

/// Day-of-week, hour-of-day, and monthly posting patterns.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn analyze_posting_trends(posts: &[Post]) -> PostingTrends {
    let timestamps: Vec<_> = posts
        .iter()
        .filter_map(|p| parse_timestamp(&p.timestamp))
        .collect();

    let (Some(first), Some(last)) = (timestamps.iter().min(), timestamps.iter().max()) else {
        return PostingTrends {
            most_active_day: None,
            most_active_hour: None,
            hour_formatted: None,
            posts_per_day: 0.0,
            day_distribution: BTreeMap::new(),
            hour_distribution: BTreeMap::new(),
            high_activity_months: BTreeMap::new(),
            summary: "Insufficient timestamp data to analyze posting trends.".to_string(),
        };
    };

    let day_counts = tally(timestamps.iter().map(|t| t.format("%A").to_string()));
    let hour_counts = tally(timestamps.iter().map(Timelike::hour));
    let month_counts = tally(timestamps.iter().map(|t| (t.month(), t.format("%B").to_string())));

    let most_active_day = first_max(&day_counts);
    let most_active_hour = first_max(&hour_counts);
    let hour_formatted = most_active_hour.map(format_hour);

    let total = timestamps.len() as f64;
    let days_range = (*last - *first).num_days() + 1;
    let posts_per_day = total / days_range as f64;

    let monthly_mean = total / 12.0;
    let mut high_months: Vec<(u32, String, usize)> = month_counts
        .into_iter()
        .filter(|(_, count)| *count as f64 > monthly_mean * 1.2)
        .map(|((number, name), count)| (number, name, count))
        .collect();
    high_months.sort_by_key(|(number, _, _)| *number);

    let posting_pattern = match (&most_active_day, &hour_formatted) {
        (Some(day), Some(hour)) => format!("Posts most frequently on {day}s at around {hour}."),
        _ => "No clear posting pattern detected.".to_string(),
    };
    let seasonal_pattern = if high_months.is_empty() {
        "No clear seasonal posting pattern detected.".to_string()
    } else {
        let names: Vec<&str> = high_months.iter().map(|(_, name, _)| name.as_str()).collect();
        format!("Higher posting activity during: {}.", names.join(", "))
    };

    PostingTrends {
        most_active_day,
        most_active_hour,
        hour_formatted,
        posts_per_day,
        day_distribution: day_counts.into_iter().collect(),
        hour_distribution: hour_counts.into_iter().collect(),
        high_activity_months: high_months
            .into_iter()
            .map(|(_, name, count)| (name, count))
            .collect(),
        summary: format!(
            "{posting_pattern} Average posting frequency is {posts_per_day:.1} posts per day. {seasonal_pattern}"
        ),
    }
}

#[cfg(test)]
#[path = "insights_test.rs"]
mod tests;
