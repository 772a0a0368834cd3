use actix_web::{web, HttpResponse};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::AppState;
use kyotei::error::AnalysisError;
use kyotei::models::AnalyzeRequest;

/// Analyze one race and record the decision in the history
pub async fn analyze_race(
    state: web::Data<Arc<AppState>>,
    req: web::Json<AnalyzeRequest>,
) -> Result<HttpResponse, AnalysisError> {
    let request = req.into_inner();
    let decision = state.pipeline.analyze(&request).await?;

    let response = state.history().record(&request, decision, Utc::now());
    info!(
        "Analysis complete: {} ({})",
        response.prediction_id,
        response.decision.status()
    );

    Ok(HttpResponse::Ok().json(response))
}
