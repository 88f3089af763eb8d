//! PostgreSQL team repository implementation

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::team::{Team, TeamId, TeamRepository};
use crate::domain::traits::Repository;
use crate::domain::DomainError;
use crate::infrastructure::db::map_sqlx_error;

const TEAM_COLUMNS: &str = "id, name, created_at, updated_at";

/// PostgreSQL implementation of TeamRepository
#[derive(Debug, Clone)]
pub struct PostgresTeamRepository {
    pool: PgPool,
}

impl PostgresTeamRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, team: Team) -> Result<Team, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO teams (name, created_at, updated_at)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(team.name())
        .bind(team.created_at())
        .bind(team.updated_at())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert team", e))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| map_sqlx_error("read generated team id", e))?;

        Ok(team.with_id(TeamId::new(id)))
    }

    async fn update(&self, team: Team, id: TeamId) -> Result<Team, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE teams
            SET name = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id.value())
        .bind(team.name())
        .bind(team.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update team", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("Team '{}' not found", id)));
        }

        Ok(team)
    }
}

#[async_trait]
impl Repository<Team, TeamId> for PostgresTeamRepository {
    async fn save(&self, team: Team) -> Result<Team, DomainError> {
        match team.id() {
            None => self.insert(team).await,
            Some(id) => self.update(team, id).await,
        }
    }

    async fn find_by_id(&self, id: &TeamId) -> Result<Option<Team>, DomainError> {
        let sql = format!("SELECT {} FROM teams WHERE id = $1", TEAM_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get team", e))?;

        row.as_ref().map(row_to_team).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Team>, DomainError> {
        let sql = format!("SELECT {} FROM teams ORDER BY id", TEAM_COLUMNS);

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list teams", e))?;

        rows.iter().map(row_to_team).collect()
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teams")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count teams", e))?;

        Ok(count as u64)
    }

    /// Deleting a team that members still reference trips the FK's ON DELETE
    /// RESTRICT and surfaces as `DomainError::Conflict`
    async fn delete(&self, team: &Team) -> Result<(), DomainError> {
        let id = team
            .id()
            .ok_or_else(|| DomainError::not_found("Team has not been persisted"))?;

        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete team", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("Team '{}' not found", id)));
        }

        Ok(())
    }
}

#[async_trait]
impl TeamRepository for PostgresTeamRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Team>, DomainError> {
        let sql = format!("SELECT {} FROM teams WHERE name = $1", TEAM_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get team by name", e))?;

        row.as_ref().map(row_to_team).transpose()
    }
}

fn row_to_team(row: &PgRow) -> Result<Team, DomainError> {
    let read = |e| map_sqlx_error("read team row", e);

    let id: i64 = row.try_get("id").map_err(read)?;
    let name: String = row.try_get("name").map_err(read)?;
    let created_at: chrono::DateTime<chrono::Utc> = row.try_get("created_at").map_err(read)?;
    let updated_at: chrono::DateTime<chrono::Utc> = row.try_get("updated_at").map_err(read)?;

    Ok(Team::restore(TeamId::new(id), name, created_at, updated_at))
}
