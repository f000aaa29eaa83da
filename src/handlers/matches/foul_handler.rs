use actix_web::{web, HttpResponse, Result};
use serde_json::json;
use uuid::Uuid;

use crate::models::matches::{AdjustFoulsRequest, FoulRequest};
use crate::services::AppMatchService;

#[tracing::instrument(
    name = "Register foul",
    skip(request, service),
    fields(match_id = %match_id, team_id = %request.team_id)
)]
pub async fn add_foul(
    match_id: Uuid,
    request: web::Json<FoulRequest>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    let detail = service.add_foul(match_id, request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": detail
    })))
}

#[tracing::instrument(
    name = "Adjust fouls",
    skip(request, service),
    fields(
        match_id = %match_id,
        team_id = %request.team_id,
        delta = request.delta
    )
)]
pub async fn adjust_fouls(
    match_id: Uuid,
    request: web::Json<AdjustFoulsRequest>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    let detail = service.adjust_fouls(match_id, request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": detail
    })))
}
