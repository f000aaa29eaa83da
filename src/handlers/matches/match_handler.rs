use actix_web::{web, HttpResponse, Result};
use serde_json::json;
use uuid::Uuid;

use crate::models::matches::{
    MatchFilter, MatchListQuery, ProgramMatchRequest, ReprogramMatchRequest,
};
use crate::services::AppMatchService;

#[tracing::instrument(
    name = "Program match",
    skip(request, service),
    fields(
        home_team_id = %request.home_team_id,
        away_team_id = %request.away_team_id
    )
)]
pub async fn program_match(
    request: web::Json<ProgramMatchRequest>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    let detail = service.program(request.into_inner()).await?;

    tracing::info!("Programmed match {}", detail.id);
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "data": detail
    })))
}

#[tracing::instrument(
    name = "Reprogram match",
    skip(request, service),
    fields(match_id = %match_id)
)]
pub async fn reprogram_match(
    match_id: Uuid,
    request: web::Json<ReprogramMatchRequest>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    let detail = service.reprogram(match_id, request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": detail
    })))
}

#[tracing::instrument(name = "List matches", skip(query, service))]
pub async fn list_matches(
    query: web::Query<MatchListQuery>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    let filter = MatchFilter::from_query(&query);
    let page = service.list(&filter).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": page
    })))
}

#[tracing::instrument(name = "List upcoming matches", skip(service))]
pub async fn upcoming_matches(service: web::Data<AppMatchService>) -> Result<HttpResponse> {
    let matches = service.upcoming().await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": matches
    })))
}

#[tracing::instrument(name = "Get match", skip(service), fields(match_id = %match_id))]
pub async fn get_match(
    match_id: Uuid,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    let detail = service.get_match_detail(match_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": detail
    })))
}
