//! Member repository trait

use async_trait::async_trait;

use super::dto::{MemberSummary, MemberWithTeam};
use super::entity::{Member, MemberField, MemberId};
use crate::domain::page::{Page, PageRequest, Slice};
use crate::domain::query::{FetchStrategy, Filter};
use crate::domain::traits::Repository;
use crate::domain::DomainError;

/// Structured predicate over member fields
pub type MemberFilter = Filter<MemberField>;

impl MemberFilter {
    pub fn name_eq(name: impl Into<String>) -> Self {
        Filter::eq(MemberField::Name, name.into())
    }

    pub fn name_in(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Filter::any_of(MemberField::Name, names)
    }

    pub fn age_eq(age: i32) -> Self {
        Filter::eq(MemberField::Age, age)
    }

    pub fn age_gt(age: i32) -> Self {
        Filter::gt(MemberField::Age, age)
    }
}

/// Repository trait for member storage.
///
/// Every finder is a fixed, named operation with a fixed parameter and
/// return shape. The named finders are thin wrappers over
/// [`find_matching`](MemberRepository::find_matching); implementations only
/// need to translate the structured predicates once.
#[async_trait]
pub trait MemberRepository: Repository<Member, MemberId> {
    /// Filtered scan; predicates combine with logical AND
    async fn find_matching(&self, filters: &[MemberFilter]) -> Result<Vec<Member>, DomainError>;

    async fn find_by_name(&self, name: &str) -> Result<Vec<Member>, DomainError> {
        self.find_matching(&[MemberFilter::name_eq(name)]).await
    }

    /// Members with the given name whose age is strictly greater than the
    /// threshold
    async fn find_by_name_and_age_greater_than(
        &self,
        name: &str,
        age: i32,
    ) -> Result<Vec<Member>, DomainError> {
        self.find_matching(&[MemberFilter::name_eq(name), MemberFilter::age_gt(age)])
            .await
    }

    async fn find_by_name_and_age(
        &self,
        name: &str,
        age: i32,
    ) -> Result<Vec<Member>, DomainError> {
        self.find_matching(&[MemberFilter::name_eq(name), MemberFilter::age_eq(age)])
            .await
    }

    async fn find_by_names(&self, names: &[&str]) -> Result<Vec<Member>, DomainError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        self.find_matching(&[MemberFilter::name_in(names.iter().copied())])
            .await
    }

    /// Scalar projection: all member names, in identity order
    async fn list_names(&self) -> Result<Vec<String>, DomainError>;

    /// DTO projection joining each member with its team name
    async fn find_summaries(&self) -> Result<Vec<MemberSummary>, DomainError>;

    /// Finder with a fetch hint. `FetchStrategy::EagerParent` loads the team
    /// in the same round trip; the other strategies leave `team` as `None`.
    async fn find_by_name_with(
        &self,
        name: &str,
        fetch: FetchStrategy,
    ) -> Result<Vec<MemberWithTeam>, DomainError>;

    /// Page of members with the given age, plus the total match count
    async fn find_by_age_paged(
        &self,
        age: i32,
        request: &PageRequest<MemberField>,
    ) -> Result<Page<Member>, DomainError>;

    /// Slice of members with the given age; cheaper than paging because no
    /// count query runs
    async fn find_by_age_sliced(
        &self,
        age: i32,
        request: &PageRequest<MemberField>,
    ) -> Result<Slice<Member>, DomainError>;

    /// Add `delta` to the age of every member strictly older than
    /// `threshold`, in one set-based pass, and return the affected row
    /// count.
    ///
    /// Bulk updates bypass per-entity loading: members read before the bulk
    /// update hold a stale version afterwards and must be reloaded before
    /// their next save.
    async fn increment_age_above(&self, threshold: i32, delta: i32) -> Result<u64, DomainError>;
}
