use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::DomainError;

/// Generic repository trait for CRUD operations over one entity kind
#[async_trait]
pub trait Repository<T, ID>: Send + Sync + Debug
where
    T: Send + Sync,
    ID: Send + Sync,
{
    /// Insert the entity when it has no identity yet, otherwise update the
    /// existing row. Returns the persisted state, including any assigned
    /// identity.
    async fn save(&self, entity: T) -> Result<T, DomainError>;

    async fn find_by_id(&self, id: &ID) -> Result<Option<T>, DomainError>;

    async fn find_all(&self) -> Result<Vec<T>, DomainError>;

    async fn count(&self) -> Result<u64, DomainError>;

    /// Remove the row matching the entity's identity. Deleting an unsaved or
    /// already-deleted entity fails with `DomainError::NotFound`.
    async fn delete(&self, entity: &T) -> Result<(), DomainError>;

    async fn exists(&self, id: &ID) -> Result<bool, DomainError> {
        Ok(self.find_by_id(id).await?.is_some())
    }
}
