use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgConnection, PgPool, Postgres, Row};
use uuid::Uuid;

use crate::db::MatchRepository;
use crate::errors::MatchError;
use crate::models::matches::{
    Match, MatchFilter, MatchStatus, NewFoul, NewScoreEvent, TeamWin,
};

#[derive(Debug, Clone)]
pub struct PgMatchRepository {
    pool: PgPool,
}

impl PgMatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const MATCH_COLUMNS: &str = "\
    id, home_team_id, home_team_name, away_team_id, away_team_name, \
    status, quarter, quarter_duration_seconds, \
    home_score, away_score, home_fouls, away_fouls, \
    date_match_utc, created_at, updated_at, version";

fn row_to_match(row: &PgRow) -> Result<Match, MatchError> {
    let status_raw: String = row.try_get("status")?;
    let status = MatchStatus::parse(&status_raw).ok_or_else(|| {
        MatchError::Unexpected(format!("unknown match status in database: {}", status_raw))
    })?;

    Ok(Match {
        id: row.try_get("id")?,
        home_team_id: row.try_get("home_team_id")?,
        home_team_name: row.try_get("home_team_name")?,
        away_team_id: row.try_get("away_team_id")?,
        away_team_name: row.try_get("away_team_name")?,
        status,
        quarter: row.try_get("quarter")?,
        quarter_duration_seconds: row.try_get("quarter_duration_seconds")?,
        home_score: row.try_get("home_score")?,
        away_score: row.try_get("away_score")?,
        home_fouls: row.try_get("home_fouls")?,
        away_fouls: row.try_get("away_fouls")?,
        date_match_utc: row.try_get("date_match_utc")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        version: row.try_get("version")?,
    })
}

fn bind_filter<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    filter: &'q MatchFilter,
) -> Query<'q, Postgres, PgArguments> {
    if let Some(status) = filter.status {
        query = query.bind(status.as_str());
    }
    if let Some(team_id) = filter.team_id {
        query = query.bind(team_id);
    }
    if let Some(from) = filter.from {
        query = query.bind(from);
    }
    if let Some(to) = filter.to {
        query = query.bind(to);
    }
    query
}

fn filter_conditions(filter: &MatchFilter) -> String {
    let mut clause = String::from("WHERE 1=1");
    let mut idx = 0;

    if filter.status.is_some() {
        idx += 1;
        clause.push_str(&format!(" AND status = ${}", idx));
    }
    if filter.team_id.is_some() {
        idx += 1;
        clause.push_str(&format!(
            " AND (home_team_id = ${} OR away_team_id = ${})",
            idx, idx
        ));
    }
    if filter.from.is_some() {
        idx += 1;
        clause.push_str(&format!(" AND date_match_utc >= ${}", idx));
    }
    if filter.to.is_some() {
        idx += 1;
        clause.push_str(&format!(" AND date_match_utc <= ${}", idx));
    }

    clause
}

/// Conditional update on the optimistic version token. Zero rows hit means
/// either the row is gone or a concurrent writer won the race.
async fn update_match_guarded(
    conn: &mut PgConnection,
    m: &Match,
) -> Result<Match, MatchError> {
    let result = sqlx::query(
        "UPDATE matches SET \
            home_team_name = $1, away_team_name = $2, status = $3, quarter = $4, \
            quarter_duration_seconds = $5, home_score = $6, away_score = $7, \
            home_fouls = $8, away_fouls = $9, date_match_utc = $10, updated_at = $11, \
            version = version + 1 \
         WHERE id = $12 AND version = $13",
    )
    .bind(&m.home_team_name)
    .bind(&m.away_team_name)
    .bind(m.status.as_str())
    .bind(m.quarter)
    .bind(m.quarter_duration_seconds)
    .bind(m.home_score)
    .bind(m.away_score)
    .bind(m.home_fouls)
    .bind(m.away_fouls)
    .bind(m.date_match_utc)
    .bind(m.updated_at)
    .bind(m.id)
    .bind(m.version)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let exists = sqlx::query("SELECT 1 FROM matches WHERE id = $1")
            .bind(m.id)
            .fetch_optional(&mut *conn)
            .await?;
        return Err(match exists {
            Some(_) => MatchError::conflict(
                "Match was modified concurrently; refetch and retry",
            ),
            None => MatchError::match_not_found(m.id),
        });
    }

    let mut updated = m.clone();
    updated.version += 1;
    Ok(updated)
}

async fn insert_score_event(
    conn: &mut PgConnection,
    match_id: Uuid,
    event: &NewScoreEvent,
) -> Result<(), MatchError> {
    sqlx::query(
        "INSERT INTO score_events (match_id, team_id, player_id, points, registered_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(match_id)
    .bind(event.team_id)
    .bind(event.player_id)
    .bind(event.points)
    .bind(event.registered_at)
    .execute(conn)
    .await?;
    Ok(())
}

async fn insert_foul(
    conn: &mut PgConnection,
    match_id: Uuid,
    foul: &NewFoul,
) -> Result<(), MatchError> {
    sqlx::query(
        "INSERT INTO fouls (match_id, team_id, player_id, foul_type, registered_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(match_id)
    .bind(foul.team_id)
    .bind(foul.player_id)
    .bind(&foul.foul_type)
    .bind(foul.registered_at)
    .execute(conn)
    .await?;
    Ok(())
}

async fn count_team_fouls(
    conn: &mut PgConnection,
    match_id: Uuid,
    team_id: Uuid,
) -> Result<i64, MatchError> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM fouls WHERE match_id = $1 AND team_id = $2")
        .bind(match_id)
        .bind(team_id)
        .fetch_one(conn)
        .await?;
    Ok(row.try_get("count")?)
}

/// Insert synthetic rows or delete the most recently inserted ones until the
/// ledger holds exactly `target` rows for the team.
async fn reconcile_team_fouls(
    conn: &mut PgConnection,
    match_id: Uuid,
    team_id: Uuid,
    target: i64,
) -> Result<(), MatchError> {
    let current = count_team_fouls(&mut *conn, match_id, team_id).await?;

    if target > current {
        let synthetic = NewFoul {
            team_id,
            player_id: None,
            foul_type: None,
            registered_at: chrono::Utc::now(),
        };
        for _ in 0..(target - current) {
            insert_foul(&mut *conn, match_id, &synthetic).await?;
        }
    } else if target < current {
        sqlx::query(
            "DELETE FROM fouls WHERE id IN (\
                SELECT id FROM fouls WHERE match_id = $1 AND team_id = $2 \
                ORDER BY id DESC LIMIT $3)",
        )
        .bind(match_id)
        .bind(team_id)
        .bind(current - target)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

impl MatchRepository for PgMatchRepository {
    async fn insert_match(&self, m: &Match) -> Result<Match, MatchError> {
        sqlx::query(
            "INSERT INTO matches (\
                id, home_team_id, home_team_name, away_team_id, away_team_name, \
                status, quarter, quarter_duration_seconds, \
                home_score, away_score, home_fouls, away_fouls, \
                date_match_utc, created_at, updated_at, version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(m.id)
        .bind(m.home_team_id)
        .bind(&m.home_team_name)
        .bind(m.away_team_id)
        .bind(&m.away_team_name)
        .bind(m.status.as_str())
        .bind(m.quarter)
        .bind(m.quarter_duration_seconds)
        .bind(m.home_score)
        .bind(m.away_score)
        .bind(m.home_fouls)
        .bind(m.away_fouls)
        .bind(m.date_match_utc)
        .bind(m.created_at)
        .bind(m.updated_at)
        .bind(m.version)
        .execute(&self.pool)
        .await?;

        Ok(m.clone())
    }

    async fn find_match(&self, id: Uuid) -> Result<Option<Match>, MatchError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM matches WHERE id = $1",
            MATCH_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_match).transpose()
    }

    async fn list_matches(&self, filter: &MatchFilter) -> Result<(Vec<Match>, i64), MatchError> {
        let conditions = filter_conditions(filter);

        let count_sql = format!("SELECT COUNT(*) AS count FROM matches {}", conditions);
        let count_row = bind_filter(sqlx::query(&count_sql), filter)
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = count_row.try_get("count")?;

        let page_sql = format!(
            "SELECT {} FROM matches {} ORDER BY date_match_utc DESC LIMIT {} OFFSET {}",
            MATCH_COLUMNS,
            conditions,
            filter.page_size,
            filter.offset()
        );
        let rows = bind_filter(sqlx::query(&page_sql), filter)
            .fetch_all(&self.pool)
            .await?;

        let matches = rows
            .iter()
            .map(row_to_match)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((matches, total))
    }

    async fn list_upcoming(&self) -> Result<Vec<Match>, MatchError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM matches \
             WHERE status = 'scheduled' AND date_match_utc >= NOW() \
             ORDER BY date_match_utc ASC",
            MATCH_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_match).collect()
    }

    async fn update_match(&self, m: &Match) -> Result<Match, MatchError> {
        let mut conn = self.pool.acquire().await?;
        update_match_guarded(&mut *conn, m).await
    }

    async fn update_match_with_score_event(
        &self,
        m: &Match,
        event: &NewScoreEvent,
    ) -> Result<Match, MatchError> {
        let mut tx = self.pool.begin().await?;
        let updated = update_match_guarded(&mut *tx, m).await?;
        insert_score_event(&mut *tx, m.id, event).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn update_match_with_foul(
        &self,
        m: &Match,
        foul: &NewFoul,
    ) -> Result<Match, MatchError> {
        let mut tx = self.pool.begin().await?;
        let updated = update_match_guarded(&mut *tx, m).await?;
        insert_foul(&mut *tx, m.id, foul).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn count_fouls(&self, match_id: Uuid, team_id: Uuid) -> Result<i64, MatchError> {
        let mut conn = self.pool.acquire().await?;
        count_team_fouls(&mut *conn, match_id, team_id).await
    }

    async fn reconcile_fouls(
        &self,
        m: &Match,
        team_id: Uuid,
        target: i64,
    ) -> Result<Match, MatchError> {
        let mut tx = self.pool.begin().await?;
        let updated = update_match_guarded(&mut *tx, m).await?;
        reconcile_team_fouls(&mut *tx, m.id, team_id, target).await?;
        tx.commit().await?;
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
        let mut tx = self.pool.begin().await?;
        let updated = update_match_guarded(&mut *tx, m).await?;

        reconcile_team_fouls(&mut *tx, m.id, m.home_team_id, home_foul_target).await?;
        reconcile_team_fouls(&mut *tx, m.id, m.away_team_id, away_foul_target).await?;

        for event in score_events {
            insert_score_event(&mut *tx, m.id, event).await?;
        }
        for foul in fouls {
            insert_foul(&mut *tx, m.id, foul).await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    async fn find_team_win(&self, match_id: Uuid) -> Result<Option<TeamWin>, MatchError> {
        let row = sqlx::query(
            "SELECT id, match_id, team_id, registered_at FROM team_wins WHERE match_id = $1",
        )
        .bind(match_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(TeamWin {
                id: row.try_get("id")?,
                match_id: row.try_get("match_id")?,
                team_id: row.try_get("team_id")?,
                registered_at: row.try_get("registered_at")?,
            })
        })
        .transpose()
    }

    async fn record_team_win(&self, match_id: Uuid, team_id: Uuid) -> Result<(), MatchError> {
        sqlx::query(
            "INSERT INTO team_wins (match_id, team_id, registered_at) \
             VALUES ($1, $2, NOW()) \
             ON CONFLICT (match_id) DO NOTHING",
        )
        .bind(match_id)
        .bind(team_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
