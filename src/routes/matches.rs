use actix_web::{get, post, put, web, HttpResponse, Result};
use uuid::Uuid;

use crate::handlers::matches::{
    foul_handler, lifecycle_handler, match_handler, score_handler, timer_handler,
};
use crate::models::matches::{
    AdjustFoulsRequest, AdjustScoreRequest, FinishMatchRequest, FoulRequest, MatchListQuery,
    ProgramMatchRequest, ReprogramMatchRequest, ScoreEventRequest, SetQuarterRequest,
    StartTimerRequest,
};
use crate::services::AppMatchService;

/// Program a new match between two resolved teams
#[post("")]
async fn program_match(
    request: web::Json<ProgramMatchRequest>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    match_handler::program_match(request, service).await
}

/// List matches with filters and pagination
#[get("")]
async fn list_matches(
    query: web::Query<MatchListQuery>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    match_handler::list_matches(query, service).await
}

/// Scheduled matches that have not started yet
#[get("/upcoming")]
async fn upcoming_matches(service: web::Data<AppMatchService>) -> Result<HttpResponse> {
    match_handler::upcoming_matches(service).await
}

/// Full match detail including the live timer snapshot
#[get("/{match_id}")]
async fn get_match(
    path: web::Path<Uuid>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    match_handler::get_match(path.into_inner(), service).await
}

/// Move a scheduled match to a new date
#[put("/{match_id}/reprogram")]
async fn reprogram_match(
    path: web::Path<Uuid>,
    request: web::Json<ReprogramMatchRequest>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    match_handler::reprogram_match(path.into_inner(), request, service).await
}

/// Register a scoring play
#[post("/{match_id}/score/events")]
async fn add_score_event(
    path: web::Path<Uuid>,
    request: web::Json<ScoreEventRequest>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    score_handler::add_score_event(path.into_inner(), request, service).await
}

/// Apply a signed score correction
#[post("/{match_id}/score/adjust")]
async fn adjust_score(
    path: web::Path<Uuid>,
    request: web::Json<AdjustScoreRequest>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    score_handler::adjust_score(path.into_inner(), request, service).await
}

/// Register a foul
#[post("/{match_id}/fouls")]
async fn add_foul(
    path: web::Path<Uuid>,
    request: web::Json<FoulRequest>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    foul_handler::add_foul(path.into_inner(), request, service).await
}

/// Apply a signed foul correction
#[post("/{match_id}/fouls/adjust")]
async fn adjust_fouls(
    path: web::Path<Uuid>,
    request: web::Json<AdjustFoulsRequest>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    foul_handler::adjust_fouls(path.into_inner(), request, service).await
}

/// Start (or restart) the quarter countdown
#[post("/{match_id}/timer/start")]
async fn start_timer(
    path: web::Path<Uuid>,
    request: web::Json<StartTimerRequest>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    timer_handler::start_timer(path.into_inner(), request, service).await
}

/// Freeze the countdown
#[post("/{match_id}/timer/pause")]
async fn pause_timer(
    path: web::Path<Uuid>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    timer_handler::pause_timer(path.into_inner(), service).await
}

/// Resume a paused countdown
#[post("/{match_id}/timer/resume")]
async fn resume_timer(
    path: web::Path<Uuid>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    timer_handler::resume_timer(path.into_inner(), service).await
}

/// Clear the countdown back to idle
#[post("/{match_id}/timer/reset")]
async fn reset_timer(
    path: web::Path<Uuid>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    timer_handler::reset_timer(path.into_inner(), service).await
}

/// Move to the next quarter (finishes the match after the fourth)
#[post("/{match_id}/quarter/advance")]
async fn advance_quarter(
    path: web::Path<Uuid>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    lifecycle_handler::advance_quarter(path.into_inner(), false, service).await
}

/// Quarter advance triggered by scoreboard automation on clock expiry
#[post("/{match_id}/quarter/auto-advance")]
async fn auto_advance_quarter(
    path: web::Path<Uuid>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    lifecycle_handler::advance_quarter(path.into_inner(), true, service).await
}

/// Administrative quarter override
#[put("/{match_id}/quarter")]
async fn set_quarter(
    path: web::Path<Uuid>,
    request: web::Json<SetQuarterRequest>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    lifecycle_handler::set_quarter(path.into_inner(), request, service).await
}

/// Finish the match with its final counters and optional bulk ledgers
#[post("/{match_id}/finish")]
async fn finish_match(
    path: web::Path<Uuid>,
    request: web::Json<FinishMatchRequest>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    lifecycle_handler::finish_match(path.into_inner(), request, service).await
}

/// Cancel the match
#[post("/{match_id}/cancel")]
async fn cancel_match(
    path: web::Path<Uuid>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    lifecycle_handler::cancel_match(path.into_inner(), service).await
}

/// Suspend the match, keeping the timer state for a later resume
#[post("/{match_id}/suspend")]
async fn suspend_match(
    path: web::Path<Uuid>,
    service: web::Data<AppMatchService>,
) -> Result<HttpResponse> {
    lifecycle_handler::suspend_match(path.into_inner(), service).await
}
