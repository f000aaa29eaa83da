use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which side won a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WinnerSide {
    Home,
    Away,
    Draw,
}

/// Realtime events pushed to the subscribers of one match room.
///
/// Exactly one event (or the documented pair) is emitted per successful
/// orchestration call, never on failure. Delivery is at-most-once: a client
/// that was disconnected reconciles by refetching the match detail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event_type")]
pub enum MatchEvent {
    #[serde(rename = "scoreUpdated")]
    #[serde(rename_all = "camelCase")]
    ScoreUpdated {
        match_id: Uuid,
        home_score: i32,
        away_score: i32,
    },

    #[serde(rename = "foulsUpdated")]
    #[serde(rename_all = "camelCase")]
    FoulsUpdated {
        match_id: Uuid,
        home_fouls: i32,
        away_fouls: i32,
    },

    #[serde(rename = "timerStarted")]
    #[serde(rename_all = "camelCase")]
    TimerStarted {
        match_id: Uuid,
        remaining_seconds: i64,
        quarter_ends_at_utc: Option<DateTime<Utc>>,
    },

    #[serde(rename = "timerPaused")]
    #[serde(rename_all = "camelCase")]
    TimerPaused {
        match_id: Uuid,
        remaining_seconds: i64,
    },

    #[serde(rename = "timerResumed")]
    #[serde(rename_all = "camelCase")]
    TimerResumed {
        match_id: Uuid,
        remaining_seconds: i64,
        quarter_ends_at_utc: Option<DateTime<Utc>>,
    },

    #[serde(rename = "timerReset")]
    #[serde(rename_all = "camelCase")]
    TimerReset {
        match_id: Uuid,
        remaining_seconds: i64,
    },

    #[serde(rename = "quarterChanged")]
    #[serde(rename_all = "camelCase")]
    QuarterChanged { match_id: Uuid, quarter: i32 },

    #[serde(rename = "gameEnded")]
    #[serde(rename_all = "camelCase")]
    GameEnded {
        match_id: Uuid,
        home: i32,
        away: i32,
        winner: WinnerSide,
    },

    #[serde(rename = "gameCanceled")]
    #[serde(rename_all = "camelCase")]
    GameCanceled { match_id: Uuid },

    #[serde(rename = "gameSuspended")]
    #[serde(rename_all = "camelCase")]
    GameSuspended { match_id: Uuid },
}
