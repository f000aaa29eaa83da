use actix_web::{web, HttpResponse, Result};
use serde_json::json;
use uuid::Uuid;

use crate::models::matches::StartTimerRequest;
use crate::services::AppMatchService;

#[tracing::instrument(
    name = "Start match timer",
    skip(request, service),
    fields(match_id = %match_id)
)]
pub async fn start_timer(
    match_id: Uuid,
    request: web::Json<StartTimerRequest>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    let timer = service.start_timer(match_id, request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": timer
    })))
}

#[tracing::instrument(name = "Pause match timer", skip(service), fields(match_id = %match_id))]
pub async fn pause_timer(
    match_id: Uuid,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    let timer = service.pause_timer(match_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": timer
    })))
}

#[tracing::instrument(name = "Resume match timer", skip(service), fields(match_id = %match_id))]
pub async fn resume_timer(
    match_id: Uuid,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    let timer = service.resume_timer(match_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": timer
    })))
}

#[tracing::instrument(name = "Reset match timer", skip(service), fields(match_id = %match_id))]
pub async fn reset_timer(
    match_id: Uuid,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    let timer = service.reset_timer(match_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": timer
    })))
}
