use axum::{
    Router,
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::lead::{Lead, LeadStage, PipelineStageSummary, summarize_pipeline};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::{ApiError, rows_or_error},
};

#[derive(Debug, Default, Deserialize)]
pub struct PipelineParams {
    pub stage: Option<LeadStage>,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct LeadPipeline {
    pub leads: Vec<Lead>,
    pub stages: Vec<PipelineStageSummary>,
}

/// GET /api/leads/pipeline?stage=
/// Leads by estimated value, with per-stage totals
pub async fn get_pipeline(
    State(state): State<AppState>,
    Query(params): Query<PipelineParams>,
) -> Result<ResponseJson<ApiResponse<LeadPipeline>>, ApiError> {
    let query = Lead::pipeline_query(params.stage);
    let leads: Vec<Lead> = rows_or_error(state.collections().fetch(&query).await.decode()?)?;
    let stages = summarize_pipeline(&leads);

    Ok(ResponseJson(ApiResponse::success(LeadPipeline { leads, stages })))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/leads/pipeline", get(get_pipeline))
}
