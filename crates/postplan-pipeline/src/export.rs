//! Upload of per-username plan sections to the tasks bucket.

use postplan_analysis::{
    AccountTypeAnalysis, Competitor, ContentPlan, ImprovementRecommendation,
};
use postplan_storage::{put_json, BlobStore};
use serde::Serialize;

pub const RECOMMENDATIONS_SECTION: &str = "recommendations";
pub const CREATIVE_SECTION: &str = "creative";

#[must_use]
pub fn recommendations_key(username: &str) -> String {
    format!("recommendations/{username}/content_analysis.json")
}

#[must_use]
pub fn creative_key(username: &str) -> String {
    format!("next_post/{username}/next_post_prediction.json")
}

#[derive(Serialize)]
struct RecommendationsDocument<'a> {
    profile_analysis: &'a AccountTypeAnalysis,
    improvement_recommendations: &'a [ImprovementRecommendation],
    competitors: &'a [Competitor],
}

/// Which sections reached the bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub uploaded: Vec<&'static str>,
    pub failed: Vec<&'static str>,
}

impl ExportReport {
    #[must_use]
    pub fn all_uploaded(&self) -> bool {
        self.failed.is_empty() && !self.uploaded.is_empty()
    }
}

/// Uploads the recommendations and creative sections of `plan`.
///
/// Each section is uploaded independently; a failure is logged and recorded
/// in the report without stopping the other upload.
pub async fn export_plan(store: &dyn BlobStore, plan: &ContentPlan) -> ExportReport {
    let mut report = ExportReport::default();
    let username = plan.username.trim();
    if username.is_empty() {
        tracing::error!("content plan has no username; nothing exported");
        report.failed = vec![RECOMMENDATIONS_SECTION, CREATIVE_SECTION];
        return report;
    }

    let creative = &plan.next_post_prediction;
    if creative.caption.is_empty() || creative.image_prompt.is_empty() {
        tracing::warn!(username, "creative section is incomplete");
    }

    let recommendations = RecommendationsDocument {
        profile_analysis: &plan.profile_analysis,
        improvement_recommendations: &plan.improvement_recommendations,
        competitors: &plan.competitors,
    };

    let recommendations_path = recommendations_key(username);
    let creative_path = creative_key(username);
    let uploads = [
        (
            RECOMMENDATIONS_SECTION,
            &recommendations_path,
            put_json(store, &recommendations_path, &recommendations).await,
        ),
        (
            CREATIVE_SECTION,
            &creative_path,
            put_json(store, &creative_path, creative).await,
        ),
    ];

    for (section, key, outcome) in uploads {
        match outcome {
            Ok(()) => {
                tracing::info!(
                    bucket = %store.bucket(),
                    key = %key,
                    section,
                    "exported plan section"
                );
                report.uploaded.push(section);
            }
            Err(e) => {
                tracing::error!(
                    stage = "export",
                    bucket = %store.bucket(),
                    key = %key,
                    section,
                    error = %e,
                    "plan section export failed"
                );
                report.failed.push(section);
            }
        }
    }

    if !report.failed.is_empty() {
        tracing::warn!(username, failed = ?report.failed, "partial export failure");
    }
    report
}
