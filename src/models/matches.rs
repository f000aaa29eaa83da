use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::runtime::TimerSnapshot;

/// Lifecycle of a match. Finished is terminal except for the explicit
/// set-quarter override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
    Canceled,
    Suspended,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Live => "live",
            MatchStatus::Finished => "finished",
            MatchStatus::Canceled => "canceled",
            MatchStatus::Suspended => "suspended",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "scheduled" => Some(MatchStatus::Scheduled),
            "live" => Some(MatchStatus::Live),
            "finished" => Some(MatchStatus::Finished),
            "canceled" => Some(MatchStatus::Canceled),
            "suspended" => Some(MatchStatus::Suspended),
            _ => None,
        }
    }
}

/// Persisted match aggregate. Scores and foul counters are denormalized
/// running totals; the append-only ledgers live in their own tables.
#[derive(Debug, Clone, Serialize)]
pub struct Match {
    pub id: Uuid,
    pub home_team_id: Uuid,
    pub home_team_name: String,
    pub away_team_id: Uuid,
    pub away_team_name: String,
    pub status: MatchStatus,
    pub quarter: i32,
    pub quarter_duration_seconds: i32,
    pub home_score: i32,
    pub away_score: i32,
    pub home_fouls: i32,
    pub away_fouls: i32,
    pub date_match_utc: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped on every successful update.
    pub version: i32,
}

impl Match {
    pub fn is_participant(&self, team_id: Uuid) -> bool {
        team_id == self.home_team_id || team_id == self.away_team_id
    }

    pub fn score_mut(&mut self, team_id: Uuid) -> Option<&mut i32> {
        if team_id == self.home_team_id {
            Some(&mut self.home_score)
        } else if team_id == self.away_team_id {
            Some(&mut self.away_score)
        } else {
            None
        }
    }

    pub fn fouls_mut(&mut self, team_id: Uuid) -> Option<&mut i32> {
        if team_id == self.home_team_id {
            Some(&mut self.home_fouls)
        } else if team_id == self.away_team_id {
            Some(&mut self.away_fouls)
        } else {
            None
        }
    }
}

/// Append-only score ledger entry. Signed points record both scoring plays
/// and corrections.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreEvent {
    pub id: i64,
    pub match_id: Uuid,
    pub team_id: Uuid,
    pub player_id: Option<Uuid>,
    pub points: i32,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewScoreEvent {
    pub team_id: Uuid,
    pub player_id: Option<Uuid>,
    pub points: i32,
    pub registered_at: DateTime<Utc>,
}

/// Append-only foul ledger entry. Per-team row count always equals the
/// corresponding counter on the match row.
#[derive(Debug, Clone, Serialize)]
pub struct Foul {
    pub id: i64,
    pub match_id: Uuid,
    pub team_id: Uuid,
    pub player_id: Option<Uuid>,
    pub foul_type: Option<String>,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFoul {
    pub team_id: Uuid,
    pub player_id: Option<Uuid>,
    pub foul_type: Option<String>,
    pub registered_at: DateTime<Utc>,
}

/// Single row crediting the winner of a finished match; absent on a draw.
#[derive(Debug, Clone, Serialize)]
pub struct TeamWin {
    pub id: i64,
    pub match_id: Uuid,
    pub team_id: Uuid,
    pub registered_at: DateTime<Utc>,
}

// ---- Request payloads ----

#[derive(Debug, Deserialize)]
pub struct ProgramMatchRequest {
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub date_match_utc: DateTime<Utc>,
    pub quarter_duration_seconds: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ReprogramMatchRequest {
    pub new_date_match_utc: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct StartTimerRequest {
    pub quarter_duration_seconds: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustScoreRequest {
    pub team_id: Uuid,
    pub delta: i32,
}

#[derive(Debug, Deserialize)]
pub struct ScoreEventRequest {
    pub team_id: Uuid,
    pub player_id: Option<Uuid>,
    pub points: i32,
    pub registered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct FoulRequest {
    pub team_id: Uuid,
    pub player_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub foul_type: Option<String>,
    pub registered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustFoulsRequest {
    pub team_id: Uuid,
    pub delta: i32,
}

#[derive(Debug, Deserialize)]
pub struct SetQuarterRequest {
    pub quarter: i32,
}

/// The only mutation accepting a bulk "replace with final state" payload.
#[derive(Debug, Deserialize)]
pub struct FinishMatchRequest {
    pub home_score: i32,
    pub away_score: i32,
    pub home_fouls: i32,
    pub away_fouls: i32,
    #[serde(default)]
    pub score_events: Vec<ScoreEventRequest>,
    #[serde(default)]
    pub fouls: Vec<FoulRequest>,
}

#[derive(Debug, Deserialize)]
pub struct MatchListQuery {
    pub status: Option<String>,
    pub team_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Sanitized list filter handed to the repository.
#[derive(Debug, Clone)]
pub struct MatchFilter {
    pub status: Option<MatchStatus>,
    pub team_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: i64,
    pub page_size: i64,
}

impl MatchFilter {
    pub fn from_query(query: &MatchListQuery) -> Self {
        let page = query.page.unwrap_or(1).max(1);
        let page_size = match query.page_size {
            Some(size) if size > 0 && size <= 200 => size,
            _ => 20,
        };

        Self {
            status: query.status.as_deref().and_then(MatchStatus::parse),
            team_id: query.team_id,
            from: query.from,
            to: query.to,
            page,
            page_size,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

// ---- Response shapes ----

#[derive(Debug, Clone, Serialize)]
pub struct TeamSummary {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchTimerDto {
    pub running: bool,
    pub remaining_seconds: i64,
    pub quarter_ends_at_utc: Option<DateTime<Utc>>,
}

impl From<TimerSnapshot> for MatchTimerDto {
    fn from(snapshot: TimerSnapshot) -> Self {
        Self {
            running: snapshot.is_running,
            remaining_seconds: snapshot.remaining_seconds,
            quarter_ends_at_utc: snapshot.ends_at_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MatchDetail {
    pub id: Uuid,
    pub home: TeamSummary,
    pub away: TeamSummary,
    pub status: MatchStatus,
    pub quarter: i32,
    pub quarter_duration_seconds: i32,
    pub timer: MatchTimerDto,
    pub home_score: i32,
    pub away_score: i32,
    pub home_fouls: i32,
    pub away_fouls: i32,
    pub date_match_utc: DateTime<Utc>,
}

impl MatchDetail {
    pub fn from_match(m: &Match, timer: TimerSnapshot) -> Self {
        Self {
            id: m.id,
            home: TeamSummary {
                id: m.home_team_id,
                name: m.home_team_name.clone(),
            },
            away: TeamSummary {
                id: m.away_team_id,
                name: m.away_team_name.clone(),
            },
            status: m.status,
            quarter: m.quarter,
            quarter_duration_seconds: m.quarter_duration_seconds,
            timer: timer.into(),
            home_score: m.home_score,
            away_score: m.away_score,
            home_fouls: m.home_fouls,
            away_fouls: m.away_fouls,
            date_match_utc: m.date_match_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MatchListItem {
    pub id: Uuid,
    pub home: TeamSummary,
    pub away: TeamSummary,
    pub status: MatchStatus,
    pub quarter: i32,
    pub home_score: i32,
    pub away_score: i32,
    pub home_fouls: i32,
    pub away_fouls: i32,
    pub date_match_utc: DateTime<Utc>,
}

impl MatchListItem {
    pub fn from_match(m: &Match) -> Self {
        Self {
            id: m.id,
            home: TeamSummary {
                id: m.home_team_id,
                name: m.home_team_name.clone(),
            },
            away: TeamSummary {
                id: m.away_team_id,
                name: m.away_team_name.clone(),
            },
            status: m.status,
            quarter: m.quarter,
            home_score: m.home_score,
            away_score: m.away_score,
            home_fouls: m.home_fouls,
            away_fouls: m.away_fouls,
            date_match_utc: m.date_match_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MatchListResponse {
    pub items: Vec<MatchListItem>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}
