//! PostgreSQL member repository implementation

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::domain::member::{
    Member, MemberField, MemberFilter, MemberId, MemberRepository, MemberSummary, MemberWithTeam,
};
use crate::domain::page::{Page, PageRequest, Slice, SortDirection};
use crate::domain::query::{CompareOp, FetchStrategy, FilterValue, LockMode};
use crate::domain::team::{Team, TeamId};
use crate::domain::traits::Repository;
use crate::domain::DomainError;
use crate::infrastructure::db::map_sqlx_error;

const MEMBER_COLUMNS: &str = "id, name, age, team_id, version, created_at, updated_at";

/// PostgreSQL implementation of MemberRepository
#[derive(Debug, Clone)]
pub struct PostgresMemberRepository {
    pool: PgPool,
}

impl PostgresMemberRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Finder that acquires a pessimistic lock on the matching rows.
    ///
    /// The lock is held by `tx` until the caller commits or rolls back, so
    /// concurrent lock-acquisition on the same rows blocks until then. If
    /// the store's lock-wait policy gives up first, the error surfaces as
    /// `DomainError::LockTimeout`.
    pub async fn find_by_name_locked(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
        mode: LockMode,
    ) -> Result<Vec<Member>, DomainError> {
        let sql = format!(
            "SELECT {} FROM members WHERE name = $1 ORDER BY id {}",
            MEMBER_COLUMNS,
            lock_clause(mode)
        );

        let rows = sqlx::query(&sql)
            .bind(name)
            .fetch_all(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("find members locked", e))?;

        rows.iter().map(row_to_member).collect()
    }

    /// Execute a store-specific query string directly, bypassing predicate
    /// translation. The query must project the member column set
    /// (`id, name, age, team_id, version, created_at, updated_at`).
    pub async fn find_by_native_query(&self, sql: &str) -> Result<Vec<Member>, DomainError> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("native query", e))?;

        rows.iter().map(row_to_member).collect()
    }

    async fn row_exists(&self, id: MemberId) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM members WHERE id = $1)")
            .bind(id.value())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("check member exists", e))
    }

    async fn insert(&self, member: Member) -> Result<Member, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO members (name, age, team_id, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(member.name())
        .bind(member.age())
        .bind(member.team_id().map(|t| t.value()))
        .bind(member.version())
        .bind(member.created_at())
        .bind(member.updated_at())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert member", e))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| map_sqlx_error("read generated member id", e))?;

        Ok(member.with_id(MemberId::new(id)))
    }

    async fn update(&self, member: Member, id: MemberId) -> Result<Member, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE members
            SET name = $2, age = $3, team_id = $4, version = version + 1, updated_at = $5
            WHERE id = $1 AND version = $6
            "#,
        )
        .bind(id.value())
        .bind(member.name())
        .bind(member.age())
        .bind(member.team_id().map(|t| t.value()))
        .bind(member.updated_at())
        .bind(member.version())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update member", e))?;

        if result.rows_affected() == 0 {
            if self.row_exists(id).await? {
                return Err(DomainError::stale_data(format!(
                    "Member '{}' was modified since it was read; reload before saving",
                    id
                )));
            }

            return Err(DomainError::not_found(format!("Member '{}' not found", id)));
        }

        let version = member.version();
        Ok(member.with_version(version + 1))
    }
}

#[async_trait]
impl Repository<Member, MemberId> for PostgresMemberRepository {
    async fn save(&self, member: Member) -> Result<Member, DomainError> {
        match member.id() {
            None => self.insert(member).await,
            Some(id) => self.update(member, id).await,
        }
    }

    async fn find_by_id(&self, id: &MemberId) -> Result<Option<Member>, DomainError> {
        let sql = format!("SELECT {} FROM members WHERE id = $1", MEMBER_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get member", e))?;

        row.as_ref().map(row_to_member).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Member>, DomainError> {
        let sql = format!("SELECT {} FROM members ORDER BY id", MEMBER_COLUMNS);

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list members", e))?;

        rows.iter().map(row_to_member).collect()
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count members", e))?;

        Ok(count as u64)
    }

    async fn delete(&self, member: &Member) -> Result<(), DomainError> {
        let id = member
            .id()
            .ok_or_else(|| DomainError::not_found("Member has not been persisted"))?;

        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete member", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("Member '{}' not found", id)));
        }

        Ok(())
    }
}

#[async_trait]
impl MemberRepository for PostgresMemberRepository {
    async fn find_matching(&self, filters: &[MemberFilter]) -> Result<Vec<Member>, DomainError> {
        for filter in filters {
            filter.check()?;
        }

        let sql = format!(
            "SELECT {} FROM members{} ORDER BY id",
            MEMBER_COLUMNS,
            where_clause(filters)
        );

        let mut query = sqlx::query(&sql);

        for filter in filters {
            query = match &filter.value {
                FilterValue::Text(value) => query.bind(value.clone()),
                FilterValue::Int(value) => query.bind(*value),
                FilterValue::TextList(values) => query.bind(values.clone()),
            };
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find members", e))?;

        rows.iter().map(row_to_member).collect()
    }

    async fn list_names(&self) -> Result<Vec<String>, DomainError> {
        sqlx::query_scalar("SELECT name FROM members ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list member names", e))
    }

    async fn find_summaries(&self) -> Result<Vec<MemberSummary>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT m.id, m.name, t.name AS team_name
            FROM members m
            LEFT JOIN teams t ON m.team_id = t.id
            ORDER BY m.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find member summaries", e))?;

        rows.iter()
            .map(|row| {
                let id: i64 = row
                    .try_get("id")
                    .map_err(|e| map_sqlx_error("read summary id", e))?;
                let name: String = row
                    .try_get("name")
                    .map_err(|e| map_sqlx_error("read summary name", e))?;
                let team_name: Option<String> = row
                    .try_get("team_name")
                    .map_err(|e| map_sqlx_error("read summary team name", e))?;

                Ok(MemberSummary::new(MemberId::new(id), name, team_name))
            })
            .collect()
    }

    async fn find_by_name_with(
        &self,
        name: &str,
        fetch: FetchStrategy,
    ) -> Result<Vec<MemberWithTeam>, DomainError> {
        match fetch {
            FetchStrategy::EagerParent => {
                let rows = sqlx::query(
                    r#"
                    SELECT m.id, m.name, m.age, m.team_id, m.version,
                           m.created_at, m.updated_at,
                           t.id AS team_row_id, t.name AS team_name,
                           t.created_at AS team_created_at, t.updated_at AS team_updated_at
                    FROM members m
                    LEFT JOIN teams t ON m.team_id = t.id
                    WHERE m.name = $1
                    ORDER BY m.id
                    "#,
                )
                .bind(name)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("find members with team", e))?;

                rows.iter()
                    .map(|row| {
                        Ok(MemberWithTeam {
                            member: row_to_member(row)?,
                            team: row_to_joined_team(row)?,
                        })
                    })
                    .collect()
            }
            // ReadOnly is a pure hint; neither strategy fetches the parent
            FetchStrategy::Default | FetchStrategy::ReadOnly => {
                let members = self.find_by_name(name).await?;

                Ok(members
                    .into_iter()
                    .map(|member| MemberWithTeam { member, team: None })
                    .collect())
            }
        }
    }

    async fn find_by_age_paged(
        &self,
        age: i32,
        request: &PageRequest<MemberField>,
    ) -> Result<Page<Member>, DomainError> {
        let sql = format!(
            "SELECT {} FROM members WHERE age = $1 {} LIMIT $2 OFFSET $3",
            MEMBER_COLUMNS,
            order_by_clause(request)
        );

        let rows = sqlx::query(&sql)
            .bind(age)
            .bind(i64::from(request.size()))
            .bind(request.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("page members", e))?;

        let content: Vec<Member> = rows.iter().map(row_to_member).collect::<Result<_, _>>()?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE age = $1")
            .bind(age)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count page members", e))?;

        Ok(Page::new(
            content,
            request.page(),
            request.size(),
            total as u64,
        ))
    }

    async fn find_by_age_sliced(
        &self,
        age: i32,
        request: &PageRequest<MemberField>,
    ) -> Result<Slice<Member>, DomainError> {
        // One row past the page size stands in for the count query
        let sql = format!(
            "SELECT {} FROM members WHERE age = $1 {} LIMIT $2 OFFSET $3",
            MEMBER_COLUMNS,
            order_by_clause(request)
        );

        let rows = sqlx::query(&sql)
            .bind(age)
            .bind(i64::from(request.size()) + 1)
            .bind(request.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("slice members", e))?;

        let content: Vec<Member> = rows.iter().map(row_to_member).collect::<Result<_, _>>()?;

        Ok(Slice::from_fetched(content, request.page(), request.size()))
    }

    async fn increment_age_above(&self, threshold: i32, delta: i32) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE members
            SET age = age + $2, version = version + 1, updated_at = NOW()
            WHERE age > $1
            "#,
        )
        .bind(threshold)
        .bind(delta)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("bulk update member ages", e))?;

        Ok(result.rows_affected())
    }
}

fn row_to_member(row: &PgRow) -> Result<Member, DomainError> {
    let read = |e| map_sqlx_error("read member row", e);

    let id: i64 = row.try_get("id").map_err(read)?;
    let name: String = row.try_get("name").map_err(read)?;
    let age: i32 = row.try_get("age").map_err(read)?;
    let team_id: Option<i64> = row.try_get("team_id").map_err(read)?;
    let version: i64 = row.try_get("version").map_err(read)?;
    let created_at: chrono::DateTime<chrono::Utc> = row.try_get("created_at").map_err(read)?;
    let updated_at: chrono::DateTime<chrono::Utc> = row.try_get("updated_at").map_err(read)?;

    Ok(Member::restore(
        MemberId::new(id),
        name,
        age,
        team_id.map(TeamId::new),
        version,
        created_at,
        updated_at,
    ))
}

fn row_to_joined_team(row: &PgRow) -> Result<Option<Team>, DomainError> {
    let read = |e| map_sqlx_error("read joined team row", e);

    let team_id: Option<i64> = row.try_get("team_row_id").map_err(read)?;

    let Some(team_id) = team_id else {
        return Ok(None);
    };

    let name: String = row.try_get("team_name").map_err(read)?;
    let created_at: chrono::DateTime<chrono::Utc> = row.try_get("team_created_at").map_err(read)?;
    let updated_at: chrono::DateTime<chrono::Utc> = row.try_get("team_updated_at").map_err(read)?;

    Ok(Some(Team::restore(
        TeamId::new(team_id),
        name,
        created_at,
        updated_at,
    )))
}

fn column_for(field: MemberField) -> &'static str {
    match field {
        MemberField::Id => "id",
        MemberField::Name => "name",
        MemberField::Age => "age",
        MemberField::CreatedAt => "created_at",
    }
}

/// Render AND-combined predicates with one positional bind each
fn where_clause(filters: &[MemberFilter]) -> String {
    if filters.is_empty() {
        return String::new();
    }

    let predicates: Vec<String> = filters
        .iter()
        .enumerate()
        .map(|(index, filter)| {
            let column = column_for(filter.field);
            let placeholder = index + 1;

            match filter.op {
                CompareOp::Eq => format!("{} = ${}", column, placeholder),
                CompareOp::Gt => format!("{} > ${}", column, placeholder),
                CompareOp::In => format!("{} = ANY(${})", column, placeholder),
            }
        })
        .collect();

    format!(" WHERE {}", predicates.join(" AND "))
}

fn order_by_clause(request: &PageRequest<MemberField>) -> String {
    match request.sort() {
        Some(sort) => {
            let direction = match sort.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };

            format!("ORDER BY {} {}, id ASC", column_for(sort.field), direction)
        }
        None => "ORDER BY id ASC".to_string(),
    }
}

fn lock_clause(mode: LockMode) -> &'static str {
    match mode {
        LockMode::Shared => "FOR SHARE",
        LockMode::Exclusive => "FOR UPDATE",
    }
}
