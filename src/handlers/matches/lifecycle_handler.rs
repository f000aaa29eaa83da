use actix_web::{web, HttpResponse, Result};
use serde_json::json;
use uuid::Uuid;

use crate::models::matches::{FinishMatchRequest, SetQuarterRequest};
use crate::services::AppMatchService;

#[tracing::instrument(name = "Advance quarter", skip(service), fields(match_id = %match_id))]
pub async fn advance_quarter(
    match_id: Uuid,
    auto: bool,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    let detail = service.advance_quarter(match_id, auto).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": detail
    })))
}

#[tracing::instrument(
    name = "Set quarter",
    skip(request, service),
    fields(match_id = %match_id, quarter = request.quarter)
)]
pub async fn set_quarter(
    match_id: Uuid,
    request: web::Json<SetQuarterRequest>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    let detail = service.set_quarter(match_id, request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": detail
    })))
}

#[tracing::instrument(
    name = "Finish match",
    skip(request, service),
    fields(match_id = %match_id)
)]
pub async fn finish_match(
    match_id: Uuid,
    request: web::Json<FinishMatchRequest>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    let detail = service.finish(match_id, request.into_inner()).await?;

    tracing::info!(
        "Finished match {}: {} - {}",
        match_id,
        detail.home_score,
        detail.away_score
    );
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": detail
    })))
}

#[tracing::instrument(name = "Cancel match", skip(service), fields(match_id = %match_id))]
pub async fn cancel_match(
    match_id: Uuid,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    let detail = service.cancel(match_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": detail
    })))
}

#[tracing::instrument(name = "Suspend match", skip(service), fields(match_id = %match_id))]
pub async fn suspend_match(
    match_id: Uuid,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    let detail = service.suspend(match_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": detail
    })))
}
