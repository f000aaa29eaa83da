use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::{Actor, ActorContext, AsyncContext, Handler, StreamHandler};
use actix_web_actors::ws;
use chrono::Utc;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::broadcast::MatchBroadcaster;

// How often heartbeat pings are sent
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
// How long before lack of client response causes a timeout
const CLIENT_TIMEOUT: Duration = Duration::from_secs(120);

/// One connected viewer of one match room.
///
/// Subscribes to the broadcaster on start and forwards every room event as a
/// JSON text frame. Unsubscribing is implicit: dropping the receiver when
/// the connection closes removes the viewer from the room.
pub struct MatchSocket {
    match_id: Uuid,
    broadcaster: Arc<MatchBroadcaster>,
    heartbeat: Instant,
    session_id: Uuid,
}

impl MatchSocket {
    pub fn new(match_id: Uuid, broadcaster: Arc<MatchBroadcaster>) -> Self {
        Self {
            match_id,
            broadcaster,
            heartbeat: Instant::now(),
            session_id: Uuid::new_v4(),
        }
    }

    fn heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.heartbeat) > CLIENT_TIMEOUT {
                tracing::warn!(
                    "Match viewer heartbeat missed, disconnecting session {} from room {}",
                    act.session_id,
                    act.match_id
                );
                ctx.stop();
                return;
            }
            ctx.ping(b"ping");
        });
    }

    fn join_room(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let mut receiver = self.broadcaster.subscribe(self.match_id);
        let addr = ctx.address();
        let match_id = self.match_id;
        let session_id = self.session_id;

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => match serde_json::to_string(&event) {
                        Ok(payload) => {
                            if !addr.connected() {
                                break;
                            }
                            addr.do_send(RoomEventMessage(payload));
                        }
                        Err(e) => {
                            tracing::error!(
                                "Failed to serialize match event for room {}: {}",
                                match_id,
                                e
                            );
                        }
                    },
                    // A lagged viewer lost events for good; it reconciles by
                    // refetching match detail, so just keep listening.
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(
                            "Session {} lagged {} events behind in room {}",
                            session_id,
                            missed,
                            match_id
                        );
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }
}

impl Actor for MatchSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(
            "Viewer joined match room {} (session {})",
            self.match_id,
            self.session_id
        );
        self.heartbeat(ctx);
        self.join_room(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            "Viewer left match room {} (session {})",
            self.match_id,
            self.session_id
        );
    }
}

/// Event forwarded from the broadcast room to this connection.
#[derive(actix::Message)]
#[rtype(result = "()")]
pub struct RoomEventMessage(pub String);

impl Handler<RoomEventMessage> for MatchSocket {
    type Result = ();

    fn handle(&mut self, msg: RoomEventMessage, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for MatchSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.heartbeat = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.heartbeat = Instant::now();
                self.handle_client_message(&text, ctx);
            }
            Ok(ws::Message::Binary(_)) => {
                tracing::warn!(
                    "Unexpected binary frame from session {} in room {}",
                    self.session_id,
                    self.match_id
                );
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            _ => ctx.stop(),
        }
    }
}

impl MatchSocket {
    fn handle_client_message(&self, message: &str, ctx: &mut ws::WebsocketContext<Self>) {
        if let Ok(command) = serde_json::from_str::<serde_json::Value>(message) {
            match command.get("type").and_then(|t| t.as_str()) {
                Some("ping") => {
                    let pong = serde_json::json!({
                        "type": "pong",
                        "timestamp": Utc::now().to_rfc3339(),
                        "session_id": self.session_id
                    });
                    ctx.text(serde_json::to_string(&pong).unwrap_or_default());
                }
                _ => {
                    tracing::debug!(
                        "Unknown client command in room {}: {}",
                        self.match_id,
                        message
                    );
                }
            }
        }
    }
}
