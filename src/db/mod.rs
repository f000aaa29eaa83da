pub mod postgres;

use uuid::Uuid;

use crate::errors::MatchError;
use crate::models::matches::{Match, MatchFilter, NewFoul, NewScoreEvent, TeamWin};

/// Persistence seam for the match aggregate and its append-only ledgers.
///
/// Every mutating method is one atomic unit (a single statement or a
/// transaction) and enforces the optimistic `version` token: an update whose
/// expected version no longer matches fails with `Conflict` so concurrent
/// writers never silently clobber each other. The orchestration service is
/// generic over this trait; tests substitute an in-memory implementation.
#[allow(async_fn_in_trait)]
pub trait MatchRepository: Send + Sync + 'static {
    async fn insert_match(&self, m: &Match) -> Result<Match, MatchError>;

    async fn find_match(&self, id: Uuid) -> Result<Option<Match>, MatchError>;

    /// Filtered page of matches plus the total row count for the filter,
    /// newest first.
    async fn list_matches(&self, filter: &MatchFilter) -> Result<(Vec<Match>, i64), MatchError>;

    /// Scheduled matches that have not started yet, soonest first.
    async fn list_upcoming(&self) -> Result<Vec<Match>, MatchError>;

    /// Persist an already-mutated aggregate, bumping its version.
    async fn update_match(&self, m: &Match) -> Result<Match, MatchError>;

    /// Row update plus one score ledger append, atomically.
    async fn update_match_with_score_event(
        &self,
        m: &Match,
        event: &NewScoreEvent,
    ) -> Result<Match, MatchError>;

    /// Row update plus one foul ledger append, atomically.
    async fn update_match_with_foul(&self, m: &Match, foul: &NewFoul)
        -> Result<Match, MatchError>;

    async fn count_fouls(&self, match_id: Uuid, team_id: Uuid) -> Result<i64, MatchError>;

    /// Drive one team's foul ledger to exactly `target` rows (synthetic
    /// inserts, or removal of the most recently inserted rows) together with
    /// the row update, atomically.
    async fn reconcile_fouls(
        &self,
        m: &Match,
        team_id: Uuid,
        target: i64,
    ) -> Result<Match, MatchError>;

    /// The bulk "replace with final state" commit: reconcile both foul
    /// ledgers, append the supplied events, and persist the finished row in
    /// one transaction.
    async fn finish_match(
        &self,
        m: &Match,
        score_events: &[NewScoreEvent],
        fouls: &[NewFoul],
        home_foul_target: i64,
        away_foul_target: i64,
    ) -> Result<Match, MatchError>;

    async fn find_team_win(&self, match_id: Uuid) -> Result<Option<TeamWin>, MatchError>;

    /// Record the winner of a finished match. Idempotent: guarded by the
    /// unique constraint on match id plus an existence check.
    async fn record_team_win(&self, match_id: Uuid, team_id: Uuid) -> Result<(), MatchError>;
}
