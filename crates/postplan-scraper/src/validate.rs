//! Minimum-shape gate applied before analysis.

use postplan_core::CanonicalDataset;
use thiserror::Error;

/// The first reason a dataset failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("posts is empty")]
    NoPosts,

    #[error("engagement_history is empty")]
    NoEngagementHistory,

    /// No post has an id and a caption.
    #[error("no post has id, caption and engagement")]
    NoCompletePost,

    /// The record at this index has no timestamp.
    #[error("engagement_history[{index}] is missing its timestamp")]
    IncompleteRecord { index: usize },
}

/// Checks that `dataset` carries what downstream stages need.
///
/// # Errors
///
/// Returns the first [`ValidationIssue`] found.
pub fn check(dataset: &CanonicalDataset) -> Result<(), ValidationIssue> {
    if dataset.posts.is_empty() {
        return Err(ValidationIssue::NoPosts);
    }
    if dataset.engagement_history.is_empty() {
        return Err(ValidationIssue::NoEngagementHistory);
    }
    if !dataset
        .posts
        .iter()
        .any(|p| !p.id.is_empty() && !p.caption.is_empty())
    {
        return Err(ValidationIssue::NoCompletePost);
    }
    if let Some(index) = dataset
        .engagement_history
        .iter()
        .position(|r| r.timestamp.trim().is_empty())
    {
        return Err(ValidationIssue::IncompleteRecord { index });
    }
    Ok(())
}

/// Returns `true` when `dataset` passes [`check`]; logs the issue otherwise.
#[must_use]
pub fn validate(dataset: &CanonicalDataset) -> bool {
    match check(dataset) {
        Ok(()) => true,
        Err(issue) => {
            tracing::warn!(
                username = %dataset.profile.username,
                issue = %issue,
                "dataset failed validation"
            );
            false
        }
    }
}
