mod connection;

use std::sync::Arc;

use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;
use uuid::Uuid;

use crate::broadcast::MatchBroadcaster;

pub use connection::MatchSocket;

#[derive(Debug, Deserialize)]
pub struct MatchRoomQuery {
    #[serde(rename = "matchId")]
    pub match_id: Uuid,
}

/// Match room WebSocket handler. Clients announce the match they want to
/// watch via the `matchId` query parameter and receive that room's events
/// until they disconnect. Viewing is anonymous.
pub async fn match_ws_route(
    req: HttpRequest,
    stream: web::Payload,
    query: web::Query<MatchRoomQuery>,
    broadcaster: web::Data<Arc<MatchBroadcaster>>,
) -> Result<HttpResponse, Error> {
    let match_id = query.match_id;
    tracing::info!("New WebSocket connection request for match room {}", match_id);

    ws::start(
        MatchSocket::new(match_id, broadcaster.get_ref().clone()),
        &req,
        stream,
    )
}
