use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use uuid::Uuid;

use courtside_backend::broadcast::MatchBroadcaster;
use courtside_backend::db::MatchRepository;
use courtside_backend::errors::MatchError;
use courtside_backend::models::matches::{
    Match, MatchFilter, MatchStatus, NewFoul, NewScoreEvent, ProgramMatchRequest, TeamWin,
};
use courtside_backend::runtime::{Clock, MatchTimerRuntime};
use courtside_backend::services::teams_client::{ResolverError, TeamInfo, TeamResolver};
use courtside_backend::services::MatchOrchestrationService;
use courtside_backend::telemetry::{get_subscriber, init_subscriber};

// Ensure that the `tracing` stack is only initialised once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

#[derive(Debug, Clone)]
struct StoredFoul {
    id: i64,
    team_id: Uuid,
}

#[derive(Default)]
struct RepoState {
    matches: HashMap<Uuid, Match>,
    score_events: HashMap<Uuid, Vec<NewScoreEvent>>,
    fouls: HashMap<Uuid, Vec<StoredFoul>>,
    wins: HashMap<Uuid, TeamWin>,
    next_foul_id: i64,
    next_win_id: i64,
}

impl RepoState {
    fn push_foul(&mut self, match_id: Uuid, team_id: Uuid) {
        self.next_foul_id += 1;
        self.fouls.entry(match_id).or_default().push(StoredFoul {
            id: self.next_foul_id,
            team_id,
        });
    }

    fn team_foul_count(&self, match_id: Uuid, team_id: Uuid) -> i64 {
        self.fouls
            .get(&match_id)
            .map(|rows| rows.iter().filter(|f| f.team_id == team_id).count() as i64)
            .unwrap_or(0)
    }

    // Same reconciliation the SQL does: synthetic inserts to grow,
    // newest rows removed first to shrink.
    fn reconcile_team_fouls(&mut self, match_id: Uuid, team_id: Uuid, target: i64) {
        let mut current = self.team_foul_count(match_id, team_id);
        while current < target {
            self.push_foul(match_id, team_id);
            current += 1;
        }
        while current > target {
            let rows = self.fouls.entry(match_id).or_default();
            if let Some(pos) = rows
                .iter()
                .enumerate()
                .filter(|(_, f)| f.team_id == team_id)
                .max_by_key(|(_, f)| f.id)
                .map(|(pos, _)| pos)
            {
                rows.remove(pos);
            }
            current -= 1;
        }
    }

    fn save_guarded(&mut self, m: &Match) -> Result<Match, MatchError> {
        let stored = self
            .matches
            .get(&m.id)
            .ok_or_else(|| MatchError::NotFound(format!("Match {} not found", m.id)))?;
        if stored.version != m.version {
            return Err(MatchError::Conflict(
                "Match was modified concurrently; refetch and retry".to_string(),
            ));
        }
        let mut updated = m.clone();
        updated.version += 1;
        self.matches.insert(m.id, updated.clone());
        Ok(updated)
    }
}

/// In-memory stand-in honoring the same version-token contract as the
/// Postgres implementation.
#[derive(Clone, Default)]
pub struct InMemoryMatchRepository {
    state: Arc<Mutex<RepoState>>,
    fail_next_update: Arc<AtomicBool>,
}

impl InMemoryMatchRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next guarded update fail, for compensation-path tests.
    pub fn fail_next_update(&self) {
        self.fail_next_update.store(true, Ordering::SeqCst);
    }

    pub fn stored_match(&self, id: Uuid) -> Option<Match> {
        self.state.lock().unwrap().matches.get(&id).cloned()
    }

    pub fn score_event_count(&self, match_id: Uuid) -> usize {
        self.state
            .lock()
            .unwrap()
            .score_events
            .get(&match_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn foul_count(&self, match_id: Uuid, team_id: Uuid) -> i64 {
        self.state.lock().unwrap().team_foul_count(match_id, team_id)
    }

    pub fn recorded_win(&self, match_id: Uuid) -> Option<Uuid> {
        self.state
            .lock()
            .unwrap()
            .wins
            .get(&match_id)
            .map(|w| w.team_id)
    }

    fn check_injected_failure(&self) -> Result<(), MatchError> {
        if self.fail_next_update.swap(false, Ordering::SeqCst) {
            return Err(MatchError::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

impl MatchRepository for InMemoryMatchRepository {
    async fn insert_match(&self, m: &Match) -> Result<Match, MatchError> {
        let mut state = self.state.lock().unwrap();
        state.matches.insert(m.id, m.clone());
        Ok(m.clone())
    }

    async fn find_match(&self, id: Uuid) -> Result<Option<Match>, MatchError> {
        Ok(self.state.lock().unwrap().matches.get(&id).cloned())
    }

    async fn list_matches(&self, filter: &MatchFilter) -> Result<(Vec<Match>, i64), MatchError> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<Match> = state
            .matches
            .values()
            .filter(|m| filter.status.map_or(true, |s| m.status == s))
            .filter(|m| filter.team_id.map_or(true, |t| m.is_participant(t)))
            .filter(|m| filter.from.map_or(true, |from| m.date_match_utc >= from))
            .filter(|m| filter.to.map_or(true, |to| m.date_match_utc <= to))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date_match_utc.cmp(&a.date_match_utc));

        let total = rows.len() as i64;
        let offset = filter.offset() as usize;
        let page: Vec<Match> = rows
            .into_iter()
            .skip(offset)
            .take(filter.page_size as usize)
            .collect();
        Ok((page, total))
    }

    async fn list_upcoming(&self) -> Result<Vec<Match>, MatchError> {
        let state = self.state.lock().unwrap();
        let now = Utc::now();
        let mut rows: Vec<Match> = state
            .matches
            .values()
            .filter(|m| m.status == MatchStatus::Scheduled && m.date_match_utc >= now)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.date_match_utc.cmp(&b.date_match_utc));
        Ok(rows)
    }

    async fn update_match(&self, m: &Match) -> Result<Match, MatchError> {
        self.check_injected_failure()?;
        self.state.lock().unwrap().save_guarded(m)
    }

    async fn update_match_with_score_event(
        &self,
        m: &Match,
        event: &NewScoreEvent,
    ) -> Result<Match, MatchError> {
        self.check_injected_failure()?;
        let mut state = self.state.lock().unwrap();
        let updated = state.save_guarded(m)?;
        state
            .score_events
            .entry(m.id)
            .or_default()
            .push(event.clone());
        Ok(updated)
    }

    async fn update_match_with_foul(
        &self,
        m: &Match,
        foul: &NewFoul,
    ) -> Result<Match, MatchError> {
        self.check_injected_failure()?;
        let mut state = self.state.lock().unwrap();
        let updated = state.save_guarded(m)?;
        state.push_foul(m.id, foul.team_id);
        Ok(updated)
    }

    async fn count_fouls(&self, match_id: Uuid, team_id: Uuid) -> Result<i64, MatchError> {
        Ok(self.state.lock().unwrap().team_foul_count(match_id, team_id))
    }

    async fn reconcile_fouls(
        &self,
        m: &Match,
        team_id: Uuid,
        target: i64,
    ) -> Result<Match, MatchError> {
        self.check_injected_failure()?;
        let mut state = self.state.lock().unwrap();
        let updated = state.save_guarded(m)?;
        state.reconcile_team_fouls(m.id, team_id, target);
        Ok(updated)
    }

    async fn finish_match(
        &self,
        m: &Match,
        score_events: &[NewScoreEvent],
        fouls: &[NewFoul],
        home_foul_target: i64,
        away_foul_target: i64,
    ) -> Result<Match, MatchError> {
        self.check_injected_failure()?;
        let mut state = self.state.lock().unwrap();
        let updated = state.save_guarded(m)?;
        state.reconcile_team_fouls(m.id, m.home_team_id, home_foul_target);
        state.reconcile_team_fouls(m.id, m.away_team_id, away_foul_target);
        state
            .score_events
            .entry(m.id)
            .or_default()
            .extend(score_events.iter().cloned());
        for foul in fouls {
            state.push_foul(m.id, foul.team_id);
        }
        Ok(updated)
    }

    async fn find_team_win(&self, match_id: Uuid) -> Result<Option<TeamWin>, MatchError> {
        Ok(self.state.lock().unwrap().wins.get(&match_id).cloned())
    }

    async fn record_team_win(&self, match_id: Uuid, team_id: Uuid) -> Result<(), MatchError> {
        let mut state = self.state.lock().unwrap();
        if !state.wins.contains_key(&match_id) {
            state.next_win_id += 1;
            let win = TeamWin {
                id: state.next_win_id,
                match_id,
                team_id,
                registered_at: Utc::now(),
            };
            state.wins.insert(match_id, win);
        }
        Ok(())
    }
}

/// Resolver fake backed by a fixed roster.
#[derive(Clone, Default)]
pub struct StaticTeamResolver {
    teams: Arc<Mutex<HashMap<Uuid, TeamInfo>>>,
    unavailable: Arc<AtomicBool>,
}

impl StaticTeamResolver {
    pub fn with_team(self, id: Uuid, name: &str) -> Self {
        self.teams.lock().unwrap().insert(
            id,
            TeamInfo {
                id,
                name: name.to_string(),
            },
        );
        self
    }

    pub fn set_unavailable(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }
}

impl TeamResolver for StaticTeamResolver {
    async fn resolve(&self, team_id: Uuid) -> Result<Option<TeamInfo>, ResolverError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ResolverError::Status(
                reqwest::StatusCode::SERVICE_UNAVAILABLE,
            ));
        }
        Ok(self.teams.lock().unwrap().get(&team_id).cloned())
    }
}

pub type TestService = MatchOrchestrationService<InMemoryMatchRepository, StaticTeamResolver>;

pub struct TestHarness {
    pub service: TestService,
    pub repo: InMemoryMatchRepository,
    pub broadcaster: Arc<MatchBroadcaster>,
    pub now: Arc<Mutex<DateTime<Utc>>>,
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
}

impl TestHarness {
    /// Move the simulated wall clock forward.
    pub fn elapse(&self, seconds: i64) {
        let mut now = self.now.lock().unwrap();
        *now += Duration::seconds(seconds);
    }

    pub async fn program_match(&self) -> Uuid {
        let detail = self
            .service
            .program(ProgramMatchRequest {
                home_team_id: self.home_team_id,
                away_team_id: self.away_team_id,
                date_match_utc: Utc::now() + Duration::hours(2),
                quarter_duration_seconds: None,
            })
            .await
            .expect("Failed to program match");
        detail.id
    }
}

pub fn spawn_service() -> TestHarness {
    Lazy::force(&TRACING);

    let home_team_id = Uuid::new_v4();
    let away_team_id = Uuid::new_v4();

    let repo = InMemoryMatchRepository::new();
    let resolver = StaticTeamResolver::default()
        .with_team(home_team_id, "Harbor Hawks")
        .with_team(away_team_id, "Granite Bears");

    let now = Arc::new(Mutex::new(Utc::now()));
    let clock_handle = now.clone();
    let clock: Clock = Arc::new(move || *clock_handle.lock().unwrap());

    let runtime = Arc::new(MatchTimerRuntime::with_clock(clock));
    let broadcaster = Arc::new(MatchBroadcaster::new());

    let service = MatchOrchestrationService::new(
        repo.clone(),
        resolver,
        runtime,
        broadcaster.clone(),
    );

    TestHarness {
        service,
        repo,
        broadcaster,
        now,
        home_team_id,
        away_team_id,
    }
}
