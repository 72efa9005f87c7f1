//! Recovering structured JSON from free-text generator output.
//!
//! [`parse_json`] runs a fixed chain of strategies and stops at the first
//! success. When every strategy fails the engine asks the generator to
//! reformat its answer; [`heuristic_recommendation`] is the last resort and
//! never fails.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::types::ContentRecommendation;

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\w+").expect("valid regex"));

/// Phrases that mark a line as a call to action.
const CTA_PHRASES: &[&str] = &[
    "click",
    "check out",
    "visit",
    "learn more",
    "shop now",
    "follow",
];

pub(crate) const DEFAULT_CALL_TO_ACTION: &str = "Click the link in bio to learn more!";

/// Lines at most this long are not taken as a caption.
const MIN_CAPTION_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Strategy {
    /// From the first `{` to the last `}`.
    BraceSpan,
    /// The whole response, minus surrounding code fences.
    WholeText,
}

#[derive(Debug, Error)]
pub(crate) enum ParseFailure {
    #[error("no brace-delimited span")]
    NoBraces,

    #[error("invalid JSON: {0}")]
    Invalid(#[source] serde_json::Error),
}

/// Tried in order by [`parse_json`].
pub(crate) const STRATEGIES: [Strategy; 2] = [Strategy::BraceSpan, Strategy::WholeText];

fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

impl Strategy {
    pub(crate) fn attempt(self, text: &str) -> Result<Value, ParseFailure> {
        let candidate = match self {
            Strategy::BraceSpan => {
                let start = text.find('{').ok_or(ParseFailure::NoBraces)?;
                let end = text.rfind('}').ok_or(ParseFailure::NoBraces)?;
                if end < start {
                    return Err(ParseFailure::NoBraces);
                }
                &text[start..=end]
            }
            Strategy::WholeText => strip_code_blocks(text),
        };
        serde_json::from_str(candidate).map_err(ParseFailure::Invalid)
    }
}

/// First strategy result that parses, or `None`.
pub(crate) fn parse_json(text: &str) -> Option<Value> {
    let text = text.trim();
    STRATEGIES
        .iter()
        .find_map(|strategy| match strategy.attempt(text) {
            Ok(value) => Some(value),
            Err(failure) => {
                tracing::debug!(?strategy, %failure, "parse strategy failed");
                None
            }
        })
}

/// Reads a recommendation object. Blank or missing fields are taken from
/// `fallback`. `None` if `value` is not an object.
pub(crate) fn recommendation_from_json(
    value: &Value,
    fallback: ContentRecommendation,
) -> Option<ContentRecommendation> {
    if !value.is_object() {
        return None;
    }
    Some(ContentRecommendation {
        caption: crate::types::text_field(value, "caption").unwrap_or(fallback.caption),
        hashtags: crate::types::hashtag_field(value, "hashtags").unwrap_or(fallback.hashtags),
        call_to_action: crate::types::text_field(value, "call_to_action")
            .unwrap_or(fallback.call_to_action),
    })
}

/// Builds a recommendation from unstructured text.
///
/// Caption is the first line longer than 20 characters. Hashtags are every
/// `#word` in the text, or the capitalized topic words plus `#MustSee`. The
/// call to action is the first line with a known call-to-action phrase.
pub(crate) fn heuristic_recommendation(text: &str, topic: &str) -> ContentRecommendation {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();

    let caption = lines
        .iter()
        .find(|line| line.chars().count() > MIN_CAPTION_CHARS)
        .map_or_else(|| format!("Exciting content about {topic}"), |l| (*l).to_string());

    let mut hashtags: Vec<String> = HASHTAG_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();
    if hashtags.is_empty() {
        hashtags = topic
            .split_whitespace()
            .map(|word| format!("#{}", capitalize(word)))
            .collect();
        hashtags.push("#MustSee".to_string());
    }

    let call_to_action = lines
        .iter()
        .find(|line| {
            let lower = line.to_lowercase();
            CTA_PHRASES.iter().any(|phrase| lower.contains(phrase))
        })
        .map_or_else(|| DEFAULT_CALL_TO_ACTION.to_string(), |l| (*l).to_string());

    ContentRecommendation {
        caption,
        hashtags,
        call_to_action,
    }
}

/// Upper-cases the first character and lower-cases the rest.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
