use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Advertisement, AdvertisementFilter, Page, User};
use crate::error::RepoError;
use crate::policy::Visibility;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Store a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity. Fails with `RepoError::NotFound` if it is gone.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository. Deleting a user also deletes every advertisement they created.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Fetch several users at once; unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError>;
}

/// Advertisement repository.
#[async_trait]
pub trait AdvertisementRepository: BaseRepository<Advertisement, Uuid> {
    /// Records admitted by `visibility` and matching `filter`, newest first.
    async fn list(
        &self,
        visibility: Visibility,
        filter: &AdvertisementFilter,
        page: Page,
    ) -> Result<Vec<Advertisement>, RepoError>;

    /// Total number of records `list` would page over.
    async fn count(
        &self,
        visibility: Visibility,
        filter: &AdvertisementFilter,
    ) -> Result<u64, RepoError>;

    /// Number of OPEN advertisements owned by `creator_id`.
    async fn count_open_by_creator(&self, creator_id: Uuid) -> Result<u64, RepoError>;
}
