use actix_web::{web, HttpResponse, Result};
use serde_json::json;
use uuid::Uuid;

use crate::models::matches::{AdjustScoreRequest, ScoreEventRequest};
use crate::services::AppMatchService;

#[tracing::instrument(
    name = "Register score event",
    skip(request, service),
    fields(
        match_id = %match_id,
        team_id = %request.team_id,
        points = request.points
    )
)]
pub async fn add_score_event(
    match_id: Uuid,
    request: web::Json<ScoreEventRequest>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    let detail = service.add_score_event(match_id, request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": detail
    })))
}

#[tracing::instrument(
    name = "Adjust score",
    skip(request, service),
    fields(
        match_id = %match_id,
        team_id = %request.team_id,
        delta = request.delta
    )
)]
pub async fn adjust_score(
    match_id: Uuid,
    request: web::Json<AdjustScoreRequest>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    let detail = service.adjust_score(match_id, request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": detail
    })))
}
