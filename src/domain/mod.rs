//! Domain layer - entities, repository traits and query primitives

pub mod error;
pub mod member;
pub mod page;
pub mod query;
pub mod team;
pub mod traits;

pub use error::DomainError;
pub use member::{
    Member, MemberField, MemberFilter, MemberId, MemberRepository, MemberSummary,
    MemberValidationError, MemberWithTeam,
};
pub use page::{Page, PageRequest, Slice, Sort, SortDirection};
pub use query::{CompareOp, FetchStrategy, Filter, FilterValue, LockMode};
pub use team::{Team, TeamId, TeamRepository, TeamValidationError};
pub use traits::Repository;
