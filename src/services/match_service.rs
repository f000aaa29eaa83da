use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::broadcast::MatchBroadcaster;
use crate::db::MatchRepository;
use crate::errors::MatchError;
use crate::models::events::{MatchEvent, WinnerSide};
use crate::models::matches::{
    AdjustFoulsRequest, AdjustScoreRequest, FinishMatchRequest, FoulRequest, Match, MatchDetail,
    MatchFilter, MatchListItem, MatchListResponse, MatchStatus, MatchTimerDto, NewFoul,
    NewScoreEvent, ProgramMatchRequest, ReprogramMatchRequest, ScoreEventRequest,
    SetQuarterRequest, StartTimerRequest,
};
use crate::runtime::MatchTimerRuntime;
use crate::services::teams_client::TeamResolver;

const DEFAULT_QUARTER_DURATION_SECONDS: i32 = 600;
const FINAL_QUARTER: i32 = 4;

/// The only component that mutates persisted match rows.
///
/// Every operation is one atomic step: validate, mutate the aggregate and/or
/// the timer runtime, commit, then push exactly one event to the match room.
/// Failures are rejected before any broadcast. Where the runtime is mutated
/// ahead of a persistence commit, a failed commit compensates the runtime
/// back to its prior snapshot so the clock and the row never split-brain.
pub struct MatchOrchestrationService<R, T> {
    repo: R,
    resolver: T,
    runtime: Arc<MatchTimerRuntime>,
    broadcaster: Arc<MatchBroadcaster>,
}

impl<R: MatchRepository, T: TeamResolver> MatchOrchestrationService<R, T> {
    pub fn new(
        repo: R,
        resolver: T,
        runtime: Arc<MatchTimerRuntime>,
        broadcaster: Arc<MatchBroadcaster>,
    ) -> Self {
        Self {
            repo,
            resolver,
            runtime,
            broadcaster,
        }
    }

    // ---- Reads ----

    pub async fn list(&self, filter: &MatchFilter) -> Result<MatchListResponse, MatchError> {
        let (matches, total) = self.repo.list_matches(filter).await?;
        Ok(MatchListResponse {
            items: matches.iter().map(MatchListItem::from_match).collect(),
            total,
            page: filter.page,
            page_size: filter.page_size,
        })
    }

    pub async fn upcoming(&self) -> Result<Vec<MatchListItem>, MatchError> {
        let matches = self.repo.list_upcoming().await?;
        Ok(matches.iter().map(MatchListItem::from_match).collect())
    }

    pub async fn get_match_detail(&self, id: Uuid) -> Result<MatchDetail, MatchError> {
        let m = self.load(id).await?;
        Ok(self.detail(&m))
    }

    // ---- Programming ----

    pub async fn program(&self, request: ProgramMatchRequest) -> Result<MatchDetail, MatchError> {
        if request.home_team_id == request.away_team_id {
            return Err(MatchError::validation(
                "Home and away teams must be distinct",
            ));
        }

        let home = self.resolve_team(request.home_team_id).await?;
        let away = self.resolve_team(request.away_team_id).await?;

        let duration = match request.quarter_duration_seconds {
            Some(seconds) if seconds > 0 => seconds,
            _ => DEFAULT_QUARTER_DURATION_SECONDS,
        };

        let now = Utc::now();
        let m = Match {
            id: Uuid::new_v4(),
            home_team_id: home.id,
            home_team_name: home.name,
            away_team_id: away.id,
            away_team_name: away.name,
            status: MatchStatus::Scheduled,
            quarter: 1,
            quarter_duration_seconds: duration,
            home_score: 0,
            away_score: 0,
            home_fouls: 0,
            away_fouls: 0,
            date_match_utc: request.date_match_utc,
            created_at: now,
            updated_at: now,
            version: 0,
        };

        let created = self.repo.insert_match(&m).await?;
        tracing::info!(
            "Programmed match {}: {} vs {}",
            created.id,
            created.home_team_name,
            created.away_team_name
        );

        Ok(self.detail(&created))
    }

    pub async fn reprogram(
        &self,
        id: Uuid,
        request: ReprogramMatchRequest,
    ) -> Result<MatchDetail, MatchError> {
        let mut m = self.load(id).await?;

        if matches!(m.status, MatchStatus::Live | MatchStatus::Finished) {
            return Err(MatchError::conflict(
                "Cannot reprogram a live or finished match",
            ));
        }

        // One minute of grace for clock skew between caller and server
        if request.new_date_match_utc < Utc::now() - Duration::minutes(1) {
            return Err(MatchError::conflict("The new date must be in the future"));
        }

        m.date_match_utc = request.new_date_match_utc;
        m.status = MatchStatus::Scheduled;
        m.updated_at = Utc::now();
        let updated = self.repo.update_match(&m).await?;

        self.runtime.reset(id);
        Ok(self.detail(&updated))
    }

    // ---- Timer ----

    pub async fn start_timer(
        &self,
        id: Uuid,
        request: StartTimerRequest,
    ) -> Result<MatchTimerDto, MatchError> {
        let mut m = self.load(id).await?;

        if matches!(m.status, MatchStatus::Finished | MatchStatus::Canceled) {
            return Err(MatchError::conflict(
                "Cannot start the timer of a finished or canceled match",
            ));
        }

        if let Some(seconds) = request.quarter_duration_seconds {
            if seconds > 0 {
                m.quarter_duration_seconds = seconds;
            }
        }
        m.status = MatchStatus::Live;
        m.updated_at = Utc::now();
        let updated = self.repo.update_match(&m).await?;

        let snapshot = self
            .runtime
            .start(id, updated.quarter_duration_seconds as i64);
        self.broadcaster.publish(
            id,
            MatchEvent::TimerStarted {
                match_id: id,
                remaining_seconds: snapshot.remaining_seconds,
                quarter_ends_at_utc: snapshot.ends_at_utc,
            },
        );

        Ok(snapshot.into())
    }

    pub async fn pause_timer(&self, id: Uuid) -> Result<MatchTimerDto, MatchError> {
        self.load(id).await?;

        let remaining = self.runtime.pause(id);
        self.broadcaster.publish(
            id,
            MatchEvent::TimerPaused {
                match_id: id,
                remaining_seconds: remaining,
            },
        );

        Ok(self.runtime.read(id).into())
    }

    pub async fn resume_timer(&self, id: Uuid) -> Result<MatchTimerDto, MatchError> {
        self.load(id).await?;

        let snapshot = self.runtime.resume(id);
        self.broadcaster.publish(
            id,
            MatchEvent::TimerResumed {
                match_id: id,
                remaining_seconds: snapshot.remaining_seconds,
                quarter_ends_at_utc: snapshot.ends_at_utc,
            },
        );

        Ok(snapshot.into())
    }

    pub async fn reset_timer(&self, id: Uuid) -> Result<MatchTimerDto, MatchError> {
        let mut m = self.load(id).await?;

        // Runtime mutates first; the persistence failure path compensates.
        let before = self.runtime.read(id);
        self.runtime.reset(id);

        m.updated_at = Utc::now();
        if let Err(e) = self.repo.update_match(&m).await {
            self.runtime.restore(id, &before);
            return Err(e);
        }

        let snapshot = self.runtime.read(id);
        self.broadcaster.publish(
            id,
            MatchEvent::TimerReset {
                match_id: id,
                remaining_seconds: snapshot.remaining_seconds,
            },
        );

        Ok(snapshot.into())
    }

    // ---- Scoring ----

    pub async fn adjust_score(
        &self,
        id: Uuid,
        request: AdjustScoreRequest,
    ) -> Result<MatchDetail, MatchError> {
        if request.delta == 0 {
            return self.get_match_detail(id).await;
        }
        if !(-3..=3).contains(&request.delta) {
            return Err(MatchError::validation(
                "Score adjustment must be between -3 and 3",
            ));
        }

        let mut m = self.load(id).await?;
        if m.status == MatchStatus::Finished {
            return Err(MatchError::conflict(
                "Cannot adjust the score of a finished match",
            ));
        }

        let score = m
            .score_mut(request.team_id)
            .ok_or_else(|| MatchError::validation("Team does not participate in this match"))?;
        let next = *score + request.delta;
        if next < 0 {
            return Err(MatchError::validation("Score cannot go negative"));
        }
        *score = next;
        m.updated_at = Utc::now();

        let event = NewScoreEvent {
            team_id: request.team_id,
            player_id: None,
            points: request.delta,
            registered_at: Utc::now(),
        };
        let updated = self.repo.update_match_with_score_event(&m, &event).await?;

        self.broadcaster.publish(
            id,
            MatchEvent::ScoreUpdated {
                match_id: id,
                home_score: updated.home_score,
                away_score: updated.away_score,
            },
        );

        Ok(self.detail(&updated))
    }

    pub async fn add_score_event(
        &self,
        id: Uuid,
        request: ScoreEventRequest,
    ) -> Result<MatchDetail, MatchError> {
        if !matches!(request.points, 1 | 2 | 3) {
            return Err(MatchError::validation("Points must be 1, 2 or 3"));
        }

        let mut m = self.load(id).await?;
        if m.status != MatchStatus::Live {
            return Err(MatchError::conflict("Match must be live to add a score"));
        }

        let score = m
            .score_mut(request.team_id)
            .ok_or_else(|| MatchError::validation("Team does not participate in this match"))?;
        *score += request.points;
        m.updated_at = Utc::now();

        let event = NewScoreEvent {
            team_id: request.team_id,
            player_id: request.player_id,
            points: request.points,
            registered_at: request.registered_at.unwrap_or_else(Utc::now),
        };
        let updated = self.repo.update_match_with_score_event(&m, &event).await?;

        self.broadcaster.publish(
            id,
            MatchEvent::ScoreUpdated {
                match_id: id,
                home_score: updated.home_score,
                away_score: updated.away_score,
            },
        );

        Ok(self.detail(&updated))
    }

    // ---- Fouls ----

    pub async fn add_foul(&self, id: Uuid, request: FoulRequest) -> Result<MatchDetail, MatchError> {
        let mut m = self.load(id).await?;
        if m.status == MatchStatus::Finished {
            return Err(MatchError::conflict(
                "Cannot add a foul to a finished match",
            ));
        }

        let fouls = m
            .fouls_mut(request.team_id)
            .ok_or_else(|| MatchError::validation("Team does not participate in this match"))?;
        *fouls += 1;
        m.updated_at = Utc::now();

        let foul = NewFoul {
            team_id: request.team_id,
            player_id: request.player_id,
            foul_type: request.foul_type,
            registered_at: request.registered_at.unwrap_or_else(Utc::now),
        };
        let updated = self.repo.update_match_with_foul(&m, &foul).await?;

        self.broadcaster.publish(
            id,
            MatchEvent::FoulsUpdated {
                match_id: id,
                home_fouls: updated.home_fouls,
                away_fouls: updated.away_fouls,
            },
        );

        Ok(self.detail(&updated))
    }

    pub async fn adjust_fouls(
        &self,
        id: Uuid,
        request: AdjustFoulsRequest,
    ) -> Result<MatchDetail, MatchError> {
        if request.delta == 0 {
            return self.get_match_detail(id).await;
        }

        let mut m = self.load(id).await?;
        if m.status == MatchStatus::Finished {
            return Err(MatchError::conflict(
                "Cannot adjust the fouls of a finished match",
            ));
        }
        if !m.is_participant(request.team_id) {
            return Err(MatchError::validation(
                "Team does not participate in this match",
            ));
        }

        let recorded = self.repo.count_fouls(id, request.team_id).await?;
        if request.delta < 0 && recorded < i64::from(-request.delta) {
            return Err(MatchError::conflict(
                "Cannot remove more fouls than are recorded",
            ));
        }

        let target = recorded + i64::from(request.delta);
        if let Some(fouls) = m.fouls_mut(request.team_id) {
            *fouls = target as i32;
        }
        m.updated_at = Utc::now();

        let updated = self.repo.reconcile_fouls(&m, request.team_id, target).await?;

        self.broadcaster.publish(
            id,
            MatchEvent::FoulsUpdated {
                match_id: id,
                home_fouls: updated.home_fouls,
                away_fouls: updated.away_fouls,
            },
        );

        Ok(self.detail(&updated))
    }

    // ---- Quarters ----

    pub async fn advance_quarter(&self, id: Uuid, auto: bool) -> Result<MatchDetail, MatchError> {
        let mut m = self.load(id).await?;

        // Idempotent once finished: repeated calls change nothing
        if m.status == MatchStatus::Finished {
            return Ok(self.detail(&m));
        }

        tracing::info!("Advancing quarter for match {} (auto: {})", id, auto);

        if m.quarter < FINAL_QUARTER {
            m.quarter += 1;
            m.updated_at = Utc::now();
            let updated = self.repo.update_match(&m).await?;

            // The next quarter's clock starts via an explicit start call
            self.runtime.reset(id);
            self.broadcaster.publish(
                id,
                MatchEvent::QuarterChanged {
                    match_id: id,
                    quarter: updated.quarter,
                },
            );

            Ok(self.detail(&updated))
        } else {
            m.status = MatchStatus::Finished;
            m.updated_at = Utc::now();
            let updated = self.repo.update_match(&m).await?;

            self.record_win(&updated).await?;
            self.runtime.reset(id);
            self.publish_game_ended(&updated);

            Ok(self.detail(&updated))
        }
    }

    /// Administrative override. Reopens a finished match to live; a win
    /// already recorded for it is kept.
    pub async fn set_quarter(
        &self,
        id: Uuid,
        request: SetQuarterRequest,
    ) -> Result<MatchDetail, MatchError> {
        let mut m = self.load(id).await?;

        m.quarter = request.quarter.max(1);
        if m.status == MatchStatus::Finished {
            m.status = MatchStatus::Live;
        }
        m.updated_at = Utc::now();
        let updated = self.repo.update_match(&m).await?;

        self.broadcaster.publish(
            id,
            MatchEvent::QuarterChanged {
                match_id: id,
                quarter: updated.quarter,
            },
        );

        Ok(self.detail(&updated))
    }

    // ---- Lifecycle ----

    pub async fn finish(
        &self,
        id: Uuid,
        request: FinishMatchRequest,
    ) -> Result<MatchDetail, MatchError> {
        let mut m = self.load(id).await?;
        if m.status == MatchStatus::Finished {
            return Err(MatchError::conflict("Match is already finished"));
        }

        if request.home_score < 0
            || request.away_score < 0
            || request.home_fouls < 0
            || request.away_fouls < 0
        {
            return Err(MatchError::validation("Final counters cannot be negative"));
        }

        let score_events = request
            .score_events
            .into_iter()
            .map(|event| self.bulk_score_event(&m, event))
            .collect::<Result<Vec<_>, _>>()?;
        let fouls = request
            .fouls
            .into_iter()
            .map(|foul| self.bulk_foul(&m, foul))
            .collect::<Result<Vec<_>, _>>()?;

        m.home_score = request.home_score;
        m.away_score = request.away_score;
        m.home_fouls = request.home_fouls;
        m.away_fouls = request.away_fouls;
        m.status = MatchStatus::Finished;
        m.updated_at = Utc::now();

        let updated = self
            .repo
            .finish_match(
                &m,
                &score_events,
                &fouls,
                i64::from(request.home_fouls),
                i64::from(request.away_fouls),
            )
            .await?;

        self.record_win(&updated).await?;
        self.runtime.reset(id);
        self.publish_game_ended(&updated);

        Ok(self.detail(&updated))
    }

    pub async fn cancel(&self, id: Uuid) -> Result<MatchDetail, MatchError> {
        let updated = self.force_status(id, MatchStatus::Canceled).await?;
        self.runtime.reset(id);
        self.broadcaster
            .publish(id, MatchEvent::GameCanceled { match_id: id });
        Ok(self.detail(&updated))
    }

    pub async fn suspend(&self, id: Uuid) -> Result<MatchDetail, MatchError> {
        let updated = self.force_status(id, MatchStatus::Suspended).await?;
        self.broadcaster
            .publish(id, MatchEvent::GameSuspended { match_id: id });
        Ok(self.detail(&updated))
    }

    // ---- Internals ----

    async fn load(&self, id: Uuid) -> Result<Match, MatchError> {
        self.repo
            .find_match(id)
            .await?
            .ok_or_else(|| MatchError::match_not_found(id))
    }

    fn detail(&self, m: &Match) -> MatchDetail {
        let timer = self
            .runtime
            .get_or_create(m.id, m.quarter_duration_seconds as i64);
        MatchDetail::from_match(m, timer)
    }

    async fn resolve_team(
        &self,
        team_id: Uuid,
    ) -> Result<crate::services::teams_client::TeamInfo, MatchError> {
        match self.resolver.resolve(team_id).await {
            Ok(Some(team)) => Ok(team),
            Ok(None) => Err(MatchError::validation(format!("Unknown team {}", team_id))),
            Err(e) => {
                tracing::error!("Team resolver failed for {}: {}", team_id, e);
                Err(MatchError::ExternalDependency(
                    "Teams service is unavailable".to_string(),
                ))
            }
        }
    }

    async fn force_status(&self, id: Uuid, status: MatchStatus) -> Result<Match, MatchError> {
        let mut m = self.load(id).await?;
        if m.status == MatchStatus::Finished {
            return Err(MatchError::conflict(
                "Cannot change the status of a finished match",
            ));
        }

        m.status = status;
        m.updated_at = Utc::now();
        self.repo.update_match(&m).await
    }

    /// Record the winner on any transition into finished. A tie records
    /// nothing; the insert is guarded by the unique constraint plus an
    /// existence check.
    async fn record_win(&self, m: &Match) -> Result<(), MatchError> {
        if m.status != MatchStatus::Finished || m.home_score == m.away_score {
            return Ok(());
        }

        let winner = if m.home_score > m.away_score {
            m.home_team_id
        } else {
            m.away_team_id
        };

        if self.repo.find_team_win(m.id).await?.is_none() {
            self.repo.record_team_win(m.id, winner).await?;
            tracing::info!("Recorded win for team {} in match {}", winner, m.id);
        }

        Ok(())
    }

    fn publish_game_ended(&self, m: &Match) {
        let winner = if m.home_score > m.away_score {
            WinnerSide::Home
        } else if m.away_score > m.home_score {
            WinnerSide::Away
        } else {
            WinnerSide::Draw
        };

        self.broadcaster.publish(
            m.id,
            MatchEvent::GameEnded {
                match_id: m.id,
                home: m.home_score,
                away: m.away_score,
                winner,
            },
        );
    }

    fn bulk_score_event(
        &self,
        m: &Match,
        request: ScoreEventRequest,
    ) -> Result<NewScoreEvent, MatchError> {
        if !m.is_participant(request.team_id) {
            return Err(MatchError::validation(
                "Score event team does not participate in this match",
            ));
        }
        if !(-3..=3).contains(&request.points) {
            return Err(MatchError::validation(
                "Score event points must be between -3 and 3",
            ));
        }

        Ok(NewScoreEvent {
            team_id: request.team_id,
            player_id: request.player_id,
            points: request.points,
            registered_at: request.registered_at.unwrap_or_else(Utc::now),
        })
    }

    fn bulk_foul(&self, m: &Match, request: FoulRequest) -> Result<NewFoul, MatchError> {
        if !m.is_participant(request.team_id) {
            return Err(MatchError::validation(
                "Foul team does not participate in this match",
            ));
        }

        Ok(NewFoul {
            team_id: request.team_id,
            player_id: request.player_id,
            foul_type: request.foul_type,
            registered_at: request.registered_at.unwrap_or_else(Utc::now),
        })
    }
}
