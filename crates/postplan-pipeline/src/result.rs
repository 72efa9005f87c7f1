//! Outcome of one pipeline run.

use postplan_analysis::ContentPlan;
use serde::Serialize;

use crate::export::ExportReport;

/// Furthest point a run reached, in execution order.
///
/// Every flag on [`PipelineResult`] is derived from this, so a later flag can
/// never be set while an earlier one is clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    DataRetrieved,
    PostsIndexed,
    EngagementAnalyzed,
    PlanGenerated,
    PlanSaved,
    Exported,
}

/// Starter content for a business profile that has not posted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBusinessSuggestions {
    pub content_suggestions: Vec<String>,
    pub first_week_plan: Vec<String>,
}

impl Default for NewBusinessSuggestions {
    fn default() -> Self {
        Self {
            content_suggestions: vec![
                "Create introductory posts about your business".to_string(),
                "Share your brand story and mission".to_string(),
                "Post product/service highlights".to_string(),
            ],
            first_week_plan: vec![
                "Day 1: Brand introduction".to_string(),
                "Day 3: Product showcase".to_string(),
                "Day 5: Customer testimonial request".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub success: bool,
    pub message: String,
    pub stage: Stage,
    pub data_retrieved: bool,
    pub posts_indexed: usize,
    pub engagement_analyzed: bool,
    pub plan_generated: bool,
    pub plan_saved: bool,
    /// Every export section uploaded.
    pub exported_plan_sections: bool,
    /// Names of the sections that did upload.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exported_sections: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_plan: Option<ContentPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<NewBusinessSuggestions>,
}

impl PipelineResult {
    fn at(stage: Stage, posts_indexed: usize, success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
            stage,
            data_retrieved: stage >= Stage::DataRetrieved,
            posts_indexed,
            engagement_analyzed: stage >= Stage::EngagementAnalyzed,
            plan_generated: stage >= Stage::PlanGenerated,
            plan_saved: stage >= Stage::PlanSaved,
            exported_plan_sections: stage >= Stage::Exported,
            exported_sections: Vec::new(),
            content_plan: None,
            suggestions: None,
        }
    }

    pub(crate) fn failed(stage: Stage, posts_indexed: usize, message: impl Into<String>) -> Self {
        Self::at(stage, posts_indexed, false, message)
    }

    pub(crate) fn private_account() -> Self {
        Self::failed(Stage::Start, 0, "Private account cannot be analyzed")
    }

    pub(crate) fn new_business() -> Self {
        Self {
            suggestions: Some(NewBusinessSuggestions::default()),
            ..Self::at(Stage::Start, 0, true, "New business account detected")
        }
    }

    /// The plan was saved; `report` decides whether the run counts as
    /// exported. A partial export still succeeds.
    pub(crate) fn completed(posts_indexed: usize, report: ExportReport, plan: ContentPlan) -> Self {
        let stage = if report.all_uploaded() {
            Stage::Exported
        } else {
            Stage::PlanSaved
        };
        Self {
            exported_sections: report.uploaded.iter().map(|s| (*s).to_string()).collect(),
            content_plan: Some(plan),
            ..Self::at(stage, posts_indexed, true, "Content plan generated successfully")
        }
    }
}
