//! In-memory member repository implementation.
//!
//! Mirrors the Postgres semantics closely enough to back the test suite:
//! identities are assigned on first save, updates check the version counter,
//! members may only reference existing teams, and bulk updates bump the
//! version of every affected row.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::member::{
    Member, MemberField, MemberFilter, MemberId, MemberRepository, MemberSummary, MemberWithTeam,
};
use crate::domain::page::{Page, PageRequest, Slice, SortDirection};
use crate::domain::query::{CompareOp, FetchStrategy, FilterValue};
use crate::domain::traits::Repository;
use crate::domain::DomainError;
use crate::infrastructure::store::InMemoryStore;

/// In-memory implementation of MemberRepository
#[derive(Debug, Default)]
pub struct InMemoryMemberRepository {
    store: Arc<InMemoryStore>,
}

impl InMemoryMemberRepository {
    /// Create a repository over its own private store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository sharing a store with other repositories
    pub fn with_store(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }

    fn members_in_id_order(members: impl Iterator<Item = Member>) -> Vec<Member> {
        let mut result: Vec<Member> = members.collect();
        result.sort_by_key(|m| m.id().map(|id| id.value()));
        result
    }
}

#[async_trait]
impl Repository<Member, MemberId> for InMemoryMemberRepository {
    async fn save(&self, member: Member) -> Result<Member, DomainError> {
        let mut state = self.store.inner.write().await;

        if let Some(team_id) = member.team_id() {
            if !state.teams.contains_key(&team_id.value()) {
                return Err(DomainError::conflict(format!(
                    "Member references unknown team '{}'",
                    team_id
                )));
            }
        }

        match member.id() {
            None => {
                let id = state.next_member_id();
                let persisted = member.with_id(MemberId::new(id));
                state.members.insert(id, persisted.clone());
                Ok(persisted)
            }
            Some(id) => {
                let Some(current) = state.members.get(&id.value()) else {
                    return Err(DomainError::not_found(format!(
                        "Member '{}' not found",
                        id
                    )));
                };

                if current.version() != member.version() {
                    return Err(DomainError::stale_data(format!(
                        "Member '{}' was modified since it was read; reload before saving",
                        id
                    )));
                }

                let persisted = member.with_version(current.version() + 1);
                state.members.insert(id.value(), persisted.clone());
                Ok(persisted)
            }
        }
    }

    async fn find_by_id(&self, id: &MemberId) -> Result<Option<Member>, DomainError> {
        let state = self.store.inner.read().await;
        Ok(state.members.get(&id.value()).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Member>, DomainError> {
        let state = self.store.inner.read().await;
        Ok(Self::members_in_id_order(state.members.values().cloned()))
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let state = self.store.inner.read().await;
        Ok(state.members.len() as u64)
    }

    async fn delete(&self, member: &Member) -> Result<(), DomainError> {
        let id = member
            .id()
            .ok_or_else(|| DomainError::not_found("Member has not been persisted"))?;

        let mut state = self.store.inner.write().await;

        if state.members.remove(&id.value()).is_none() {
            return Err(DomainError::not_found(format!("Member '{}' not found", id)));
        }

        Ok(())
    }
}

#[async_trait]
impl MemberRepository for InMemoryMemberRepository {
    async fn find_matching(&self, filters: &[MemberFilter]) -> Result<Vec<Member>, DomainError> {
        for filter in filters {
            filter.check()?;
        }

        let state = self.store.inner.read().await;

        Ok(Self::members_in_id_order(
            state
                .members
                .values()
                .filter(|member| filters.iter().all(|filter| matches(member, filter)))
                .cloned(),
        ))
    }

    async fn list_names(&self) -> Result<Vec<String>, DomainError> {
        Ok(self
            .find_all()
            .await?
            .into_iter()
            .map(|member| member.name().to_string())
            .collect())
    }

    async fn find_summaries(&self) -> Result<Vec<MemberSummary>, DomainError> {
        let state = self.store.inner.read().await;

        let mut summaries: Vec<MemberSummary> =
            Self::members_in_id_order(state.members.values().cloned())
                .into_iter()
                .filter_map(|member| {
                    let id = member.id()?;
                    let team_name = member
                        .team_id()
                        .and_then(|team_id| state.teams.get(&team_id.value()))
                        .map(|team| team.name().to_string());

                    Some(MemberSummary::new(id, member.name(), team_name))
                })
                .collect();

        summaries.sort_by_key(|summary| summary.id.value());
        Ok(summaries)
    }

    async fn find_by_name_with(
        &self,
        name: &str,
        fetch: FetchStrategy,
    ) -> Result<Vec<MemberWithTeam>, DomainError> {
        let state = self.store.inner.read().await;

        let members = Self::members_in_id_order(
            state
                .members
                .values()
                .filter(|member| member.name() == name)
                .cloned(),
        );

        Ok(members
            .into_iter()
            .map(|member| {
                let team = match fetch {
                    FetchStrategy::EagerParent => member
                        .team_id()
                        .and_then(|team_id| state.teams.get(&team_id.value()))
                        .cloned(),
                    FetchStrategy::Default | FetchStrategy::ReadOnly => None,
                };

                MemberWithTeam { member, team }
            })
            .collect())
    }

    async fn find_by_age_paged(
        &self,
        age: i32,
        request: &PageRequest<MemberField>,
    ) -> Result<Page<Member>, DomainError> {
        let state = self.store.inner.read().await;

        let mut matching: Vec<Member> = state
            .members
            .values()
            .filter(|member| member.age() == age)
            .cloned()
            .collect();
        sort_members(&mut matching, request);

        let total = matching.len() as u64;
        let content: Vec<Member> = matching
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.size() as usize)
            .collect();

        Ok(Page::new(content, request.page(), request.size(), total))
    }

    async fn find_by_age_sliced(
        &self,
        age: i32,
        request: &PageRequest<MemberField>,
    ) -> Result<Slice<Member>, DomainError> {
        let state = self.store.inner.read().await;

        let mut matching: Vec<Member> = state
            .members
            .values()
            .filter(|member| member.age() == age)
            .cloned()
            .collect();
        sort_members(&mut matching, request);

        // Same probe as the SQL path: fetch one row past the page size
        let fetched: Vec<Member> = matching
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.size() as usize + 1)
            .collect();

        Ok(Slice::from_fetched(fetched, request.page(), request.size()))
    }

    async fn increment_age_above(&self, threshold: i32, delta: i32) -> Result<u64, DomainError> {
        let mut state = self.store.inner.write().await;
        let mut affected = 0u64;

        let ids: Vec<i64> = state
            .members
            .iter()
            .filter(|(_, member)| member.age() > threshold)
            .map(|(id, _)| *id)
            .collect();

        for id in ids {
            if let Some(member) = state.members.get(&id) {
                let version = member.version();
                let mut updated = member.clone();
                updated
                    .set_age(member.age() + delta)
                    .map_err(|e| DomainError::validation(e.to_string()))?;
                state.members.insert(id, updated.with_version(version + 1));
                affected += 1;
            }
        }

        Ok(affected)
    }
}

fn matches(member: &Member, filter: &MemberFilter) -> bool {
    match (&filter.op, &filter.value) {
        (CompareOp::Eq, FilterValue::Text(value)) => field_text(member, filter.field) == Some(value.as_str()),
        (CompareOp::Eq, FilterValue::Int(value)) => field_int(member, filter.field) == Some(i64::from(*value)),
        (CompareOp::Gt, FilterValue::Int(value)) => {
            field_int(member, filter.field).is_some_and(|n| n > i64::from(*value))
        }
        (CompareOp::In, FilterValue::TextList(values)) => field_text(member, filter.field)
            .is_some_and(|text| values.iter().any(|v| v == text)),
        _ => false,
    }
}

fn field_text(member: &Member, field: MemberField) -> Option<&str> {
    match field {
        MemberField::Name => Some(member.name()),
        _ => None,
    }
}

fn field_int(member: &Member, field: MemberField) -> Option<i64> {
    match field {
        MemberField::Id => member.id().map(|id| id.value()),
        MemberField::Age => Some(i64::from(member.age())),
        _ => None,
    }
}

fn sort_members(members: &mut [Member], request: &PageRequest<MemberField>) {
    members.sort_by(|a, b| {
        let ordering = match request.sort() {
            Some(sort) => {
                let by_field = match sort.field {
                    MemberField::Id => a.id().map(|i| i.value()).cmp(&b.id().map(|i| i.value())),
                    MemberField::Name => a.name().cmp(b.name()),
                    MemberField::Age => a.age().cmp(&b.age()),
                    MemberField::CreatedAt => a.created_at().cmp(&b.created_at()),
                };

                match sort.direction {
                    SortDirection::Asc => by_field,
                    SortDirection::Desc => by_field.reverse(),
                }
            }
            None => Ordering::Equal,
        };

        // Identity order as tie-breaker, matching the SQL implementations
        ordering.then_with(|| a.id().map(|i| i.value()).cmp(&b.id().map(|i| i.value())))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::page::Sort;
    use crate::domain::team::Team;
    use crate::infrastructure::team::InMemoryTeamRepository;
    use tokio_test::{assert_err, assert_ok};

    fn member(name: &str, age: i32) -> Member {
        Member::new(name, age).unwrap()
    }

    fn shared_repos() -> (InMemoryMemberRepository, InMemoryTeamRepository) {
        let store = Arc::new(InMemoryStore::new());
        (
            InMemoryMemberRepository::with_store(Arc::clone(&store)),
            InMemoryTeamRepository::with_store(store),
        )
    }

    #[tokio::test]
    async fn test_save_and_find_roundtrip() {
        let repo = InMemoryMemberRepository::new();

        let saved = repo.save(member("memberA", 10)).await.unwrap();
        let found = repo.find_by_id(&saved.id().unwrap()).await.unwrap().unwrap();

        assert_eq!(found, saved);
        assert_eq!(found.name(), "memberA");
        assert_eq!(found.age(), 10);
    }

    #[tokio::test]
    async fn test_basic_crud() {
        let repo = InMemoryMemberRepository::new();

        let member1 = repo.save(member("member1", 10)).await.unwrap();
        let member2 = repo.save(member("member2", 20)).await.unwrap();

        let found1 = repo.find_by_id(&member1.id().unwrap()).await.unwrap();
        let found2 = repo.find_by_id(&member2.id().unwrap()).await.unwrap();
        assert_eq!(found1, Some(member1.clone()));
        assert_eq!(found2, Some(member2.clone()));

        assert_eq!(repo.find_all().await.unwrap().len(), 2);
        assert_eq!(repo.count().await.unwrap(), 2);

        assert_ok!(repo.delete(&member1).await);
        assert_ok!(repo.delete(&member2).await);
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_count_tracks_saves_and_deletes() {
        let repo = InMemoryMemberRepository::new();
        let mut saved = Vec::new();

        for i in 0..5 {
            saved.push(repo.save(member(&format!("member{}", i), 10)).await.unwrap());
        }
        for m in saved.iter().take(2) {
            repo.delete(m).await.unwrap();
        }

        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_save_is_idempotent_for_unchanged_entity() {
        let repo = InMemoryMemberRepository::new();

        let first = repo.save(member("memberA", 10)).await.unwrap();
        let second = repo.save(first.clone()).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(second.id(), first.id());
        assert_eq!(second.name(), first.name());
        assert_eq!(second.age(), first.age());
    }

    #[tokio::test]
    async fn test_delete_unsaved_member_is_not_found() {
        let repo = InMemoryMemberRepository::new();

        let result = repo.delete(&member("ghost", 10)).await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let repo = InMemoryMemberRepository::new();
        let saved = repo.save(member("memberA", 10)).await.unwrap();

        assert_ok!(repo.delete(&saved).await);
        let result = repo.delete(&saved).await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_find_by_name_and_age_greater_than() {
        let repo = InMemoryMemberRepository::new();
        repo.save(member("AAA", 10)).await.unwrap();
        repo.save(member("AAA", 20)).await.unwrap();

        let result = repo
            .find_by_name_and_age_greater_than("AAA", 15)
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name(), "AAA");
        assert_eq!(result[0].age(), 20);
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let repo = InMemoryMemberRepository::new();
        let m1 = repo.save(member("AAA", 10)).await.unwrap();
        repo.save(member("BBB", 20)).await.unwrap();

        let result = repo.find_by_name("AAA").await.unwrap();

        assert_eq!(result, vec![m1]);
    }

    #[tokio::test]
    async fn test_find_by_name_and_age() {
        let repo = InMemoryMemberRepository::new();
        let m1 = repo.save(member("AAA", 10)).await.unwrap();
        repo.save(member("AAA", 20)).await.unwrap();

        let result = repo.find_by_name_and_age("AAA", 10).await.unwrap();

        assert_eq!(result, vec![m1]);
    }

    #[tokio::test]
    async fn test_find_by_names() {
        let repo = InMemoryMemberRepository::new();
        repo.save(member("AAA", 10)).await.unwrap();
        repo.save(member("BBB", 20)).await.unwrap();
        repo.save(member("CCC", 30)).await.unwrap();

        let result = repo.find_by_names(&["AAA", "BBB"]).await.unwrap();

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|m| m.name() != "CCC"));
    }

    #[tokio::test]
    async fn test_find_by_names_empty_input() {
        let repo = InMemoryMemberRepository::new();
        repo.save(member("AAA", 10)).await.unwrap();

        let result = repo.find_by_names(&[]).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_find_matching_combines_filters_with_and() {
        let repo = InMemoryMemberRepository::new();
        repo.save(member("AAA", 10)).await.unwrap();
        repo.save(member("AAA", 20)).await.unwrap();
        repo.save(member("BBB", 30)).await.unwrap();

        let result = repo
            .find_matching(&[MemberFilter::name_eq("AAA"), MemberFilter::age_gt(5)])
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_find_matching_rejects_mismatched_filter() {
        let repo = InMemoryMemberRepository::new();
        repo.save(member("AAA", 10)).await.unwrap();

        let gt_text = MemberFilter {
            field: MemberField::Name,
            op: CompareOp::Gt,
            value: FilterValue::Text("AAA".to_string()),
        };
        let result = repo.find_matching(&[gt_text]).await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_list_names_in_identity_order() {
        let repo = InMemoryMemberRepository::new();
        repo.save(member("AAA", 10)).await.unwrap();
        repo.save(member("BBB", 20)).await.unwrap();

        let names = repo.list_names().await.unwrap();

        assert_eq!(names, vec!["AAA".to_string(), "BBB".to_string()]);
    }

    #[tokio::test]
    async fn test_find_summaries_joins_team_name() {
        let (members, teams) = shared_repos();

        let team = teams.save(Team::new("teamA").unwrap()).await.unwrap();
        members
            .save(member("AAA", 10).in_team(team.id().unwrap()))
            .await
            .unwrap();
        members.save(member("BBB", 20)).await.unwrap();

        let summaries = members.find_summaries().await.unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "AAA");
        assert_eq!(summaries[0].team_name.as_deref(), Some("teamA"));
        assert!(summaries[1].team_name.is_none());
    }

    #[tokio::test]
    async fn test_eager_fetch_loads_team() {
        let (members, teams) = shared_repos();

        let team = teams.save(Team::new("teamA").unwrap()).await.unwrap();
        members
            .save(member("AAA", 10).in_team(team.id().unwrap()))
            .await
            .unwrap();

        let eager = members
            .find_by_name_with("AAA", FetchStrategy::EagerParent)
            .await
            .unwrap();
        assert_eq!(eager.len(), 1);
        assert_eq!(eager[0].team.as_ref().unwrap().name(), "teamA");

        let lazy = members
            .find_by_name_with("AAA", FetchStrategy::Default)
            .await
            .unwrap();
        assert!(lazy[0].team.is_none());
    }

    #[tokio::test]
    async fn test_read_only_fetch_discards_unsaved_mutation() {
        let repo = InMemoryMemberRepository::new();
        repo.save(member("AAA", 10)).await.unwrap();

        let mut fetched = repo
            .find_by_name_with("AAA", FetchStrategy::ReadOnly)
            .await
            .unwrap();

        // Mutating the returned copy must not throw and must not persist
        fetched[0].member.set_age(99).unwrap();

        let reloaded = repo.find_by_name("AAA").await.unwrap();
        assert_eq!(reloaded[0].age(), 10);
    }

    #[tokio::test]
    async fn test_save_with_unknown_team_conflicts() {
        let repo = InMemoryMemberRepository::new();

        let result = repo
            .save(member("AAA", 10).in_team(crate::domain::team::TeamId::new(999)))
            .await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_delete_team_with_members_conflicts() {
        let (members, teams) = shared_repos();

        let team = teams.save(Team::new("teamA").unwrap()).await.unwrap();
        members
            .save(member("AAA", 10).in_team(team.id().unwrap()))
            .await
            .unwrap();

        let result = teams.delete(&team).await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_paging() {
        let repo = InMemoryMemberRepository::new();
        for i in 1..=7 {
            repo.save(member(&format!("member{}", i), 10)).await.unwrap();
        }

        let request = PageRequest::of(0, 3)
            .unwrap()
            .sorted_by(Sort::desc(MemberField::Name));
        let page = repo.find_by_age_paged(10, &request).await.unwrap();

        assert_eq!(page.content().len(), 3);
        assert_eq!(page.total_elements(), 7);
        assert_eq!(page.number(), 0);
        assert_eq!(page.total_pages(), 3);
        assert!(page.is_first());
        assert!(page.has_next());

        let names: Vec<&str> = page.content().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["member7", "member6", "member5"]);
    }

    #[tokio::test]
    async fn test_paging_last_page() {
        let repo = InMemoryMemberRepository::new();
        for i in 1..=7 {
            repo.save(member(&format!("member{}", i), 10)).await.unwrap();
        }

        let request = PageRequest::of(2, 3)
            .unwrap()
            .sorted_by(Sort::desc(MemberField::Name));
        let page = repo.find_by_age_paged(10, &request).await.unwrap();

        assert_eq!(page.content().len(), 1);
        assert!(!page.is_first());
        assert!(!page.has_next());
        assert!(page.is_last());
    }

    #[tokio::test]
    async fn test_paging_ignores_non_matching_rows() {
        let repo = InMemoryMemberRepository::new();
        repo.save(member("member1", 10)).await.unwrap();
        repo.save(member("member2", 99)).await.unwrap();

        let request = PageRequest::of(0, 3).unwrap();
        let page = repo.find_by_age_paged(10, &request).await.unwrap();

        assert_eq!(page.total_elements(), 1);
        assert_eq!(page.content().len(), 1);
    }

    #[tokio::test]
    async fn test_slice_reports_has_next_with_one_extra_row() {
        let repo = InMemoryMemberRepository::new();
        // Exactly page size + 1 matching rows
        for i in 1..=4 {
            repo.save(member(&format!("member{}", i), 10)).await.unwrap();
        }

        let request = PageRequest::of(0, 3)
            .unwrap()
            .sorted_by(Sort::desc(MemberField::Name));
        let slice = repo.find_by_age_sliced(10, &request).await.unwrap();

        assert_eq!(slice.content().len(), 3);
        assert_eq!(slice.number(), 0);
        assert!(slice.is_first());
        assert!(slice.has_next());
    }

    #[tokio::test]
    async fn test_slice_without_next_page() {
        let repo = InMemoryMemberRepository::new();
        // Exactly page size matching rows
        for i in 1..=3 {
            repo.save(member(&format!("member{}", i), 10)).await.unwrap();
        }

        let request = PageRequest::of(0, 3).unwrap();
        let slice = repo.find_by_age_sliced(10, &request).await.unwrap();

        assert_eq!(slice.content().len(), 3);
        assert!(!slice.has_next());
    }

    #[tokio::test]
    async fn test_bulk_update_strict_greater_than_boundary() {
        let repo = InMemoryMemberRepository::new();
        for (i, age) in [10, 19, 20, 21, 40].into_iter().enumerate() {
            repo.save(member(&format!("member{}", i), age)).await.unwrap();
        }

        let affected = repo.increment_age_above(20, 1).await.unwrap();

        // Age exactly at the threshold is excluded
        assert_eq!(affected, 2);

        let mut ages: Vec<i32> = repo
            .find_all()
            .await
            .unwrap()
            .iter()
            .map(|m| m.age())
            .collect();
        ages.sort_unstable();
        assert_eq!(ages, vec![10, 19, 20, 22, 41]);
    }

    #[tokio::test]
    async fn test_bulk_update_invalidates_loaded_entities() {
        let repo = InMemoryMemberRepository::new();
        let loaded = repo.save(member("AAA", 30)).await.unwrap();

        repo.increment_age_above(20, 1).await.unwrap();

        // The copy read before the bulk update is stale now
        let mut stale = loaded.clone();
        stale.set_age(50).unwrap();
        let result = repo.save(stale).await;
        assert!(matches!(result, Err(DomainError::StaleData { .. })));

        // Reloading picks up the bulk change and the save goes through
        let mut fresh = repo
            .find_by_id(&loaded.id().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fresh.age(), 31);
        fresh.set_age(50).unwrap();
        assert_ok!(repo.save(fresh).await);
    }

    #[tokio::test]
    async fn test_concurrent_style_stale_save_is_rejected() {
        let repo = InMemoryMemberRepository::new();
        let saved = repo.save(member("AAA", 10)).await.unwrap();

        let mut copy_a = saved.clone();
        let mut copy_b = saved;

        copy_a.set_age(11).unwrap();
        repo.save(copy_a).await.unwrap();

        copy_b.set_age(12).unwrap();
        assert_err!(repo.save(copy_b).await);
    }
}
