//! `POST /api/v1/recommendations`: scrape a username, run the pipeline, and
//! return the content plan (or `null` when no plan was produced).

use axum::{extract::State, Extension, Json};
use postplan_analysis::ContentPlan;
use serde::{Deserialize, Serialize};

use super::{normalize_results_limit, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct RecommendationRequest {
    pub username: String,
    #[serde(default)]
    pub results_limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(super) struct RecommendationOutput {
    pub output: Option<ContentPlan>,
}

pub(super) async fn create_recommendations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RecommendationRequest>,
) -> Result<Json<ApiResponse<RecommendationOutput>>, ApiError> {
    let rid = &req_id.0;

    let username = body.username.trim().trim_start_matches('@');
    if username.is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "username must not be empty",
        ));
    }
    let limit = normalize_results_limit(body.results_limit, state.default_results_limit);

    let output = {
        let mut pipeline = state.pipeline.lock().await;
        match pipeline.handle_username(username, limit).await {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!(username, error = %e, "recommendation request produced no plan");
                None
            }
        }
    };

    Ok(Json(ApiResponse {
        data: RecommendationOutput { output },
        meta: ResponseMeta::new(req_id.0),
    }))
}
