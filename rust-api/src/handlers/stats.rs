use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

use crate::AppState;

/// Aggregates over the retained request history
pub async fn get_stats(state: web::Data<Arc<AppState>>) -> impl Responder {
    let stats = state.history().stats();
    HttpResponse::Ok().json(stats)
}
