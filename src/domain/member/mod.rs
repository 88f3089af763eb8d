//! Member domain types

pub mod dto;
pub mod entity;
pub mod repository;
pub mod validation;

pub use dto::{MemberSummary, MemberWithTeam};
pub use entity::{Member, MemberField, MemberId};
pub use repository::{MemberFilter, MemberRepository};
pub use validation::MemberValidationError;
