//! In-memory repositories - used when no database is configured, and in tests.
//!
//! Data is lost on process restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use adboard_core::domain::{Advertisement, AdvertisementFilter, Page, User};
use adboard_core::error::RepoError;
use adboard_core::policy::Visibility;
use adboard_core::ports::{AdvertisementRepository, BaseRepository, UserRepository};

/// Tables shared by the in-memory repositories.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    advertisements: RwLock<HashMap<Uuid, Advertisement>>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

/// In-memory user repository.
#[derive(Clone)]
pub struct InMemoryUserRepository {
    store: Arc<InMemoryStore>,
}

impl InMemoryUserRepository {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.store.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.store.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.store.users.write().await;
        let slot = users.get_mut(&user.id).ok_or(RepoError::NotFound)?;
        *slot = user.clone();
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        // Lock order: users, then advertisements.
        let mut users = self.store.users.write().await;
        if users.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }

        let mut advertisements = self.store.advertisements.write().await;
        let before = advertisements.len();
        advertisements.retain(|_, ad| ad.creator_id != id);
        tracing::debug!(
            user_id = %id,
            removed = before - advertisements.len(),
            "Cascaded user deletion to advertisements"
        );
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let users = self.store.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        let users = self.store.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }
}

/// In-memory advertisement repository.
#[derive(Clone)]
pub struct InMemoryAdvertisementRepository {
    store: Arc<InMemoryStore>,
}

impl InMemoryAdvertisementRepository {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }

    async fn matching(
        &self,
        visibility: Visibility,
        filter: &AdvertisementFilter,
    ) -> Vec<Advertisement> {
        let advertisements = self.store.advertisements.read().await;
        let mut matching: Vec<Advertisement> = advertisements
            .values()
            .filter(|ad| visibility.admits(ad) && filter.matches(ad))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        matching
    }
}

#[async_trait]
impl BaseRepository<Advertisement, Uuid> for InMemoryAdvertisementRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Advertisement>, RepoError> {
        Ok(self.store.advertisements.read().await.get(&id).cloned())
    }

    async fn insert(&self, ad: Advertisement) -> Result<Advertisement, RepoError> {
        // Foreign key: the creator must exist.
        if !self.store.users.read().await.contains_key(&ad.creator_id) {
            return Err(RepoError::MissingReference(format!(
                "creator {}",
                ad.creator_id
            )));
        }

        let mut advertisements = self.store.advertisements.write().await;
        if advertisements.contains_key(&ad.id) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        advertisements.insert(ad.id, ad.clone());
        Ok(ad)
    }

    async fn update(&self, ad: Advertisement) -> Result<Advertisement, RepoError> {
        let mut advertisements = self.store.advertisements.write().await;
        let slot = advertisements.get_mut(&ad.id).ok_or(RepoError::NotFound)?;
        *slot = ad.clone();
        Ok(ad)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.store
            .advertisements
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl AdvertisementRepository for InMemoryAdvertisementRepository {
    async fn list(
        &self,
        visibility: Visibility,
        filter: &AdvertisementFilter,
        page: Page,
    ) -> Result<Vec<Advertisement>, RepoError> {
        let offset = usize::try_from(page.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);

        Ok(self
            .matching(visibility, filter)
            .await
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn count(
        &self,
        visibility: Visibility,
        filter: &AdvertisementFilter,
    ) -> Result<u64, RepoError> {
        Ok(self.matching(visibility, filter).await.len() as u64)
    }

    async fn count_open_by_creator(&self, creator_id: Uuid) -> Result<u64, RepoError> {
        let advertisements = self.store.advertisements.read().await;
        Ok(advertisements
            .values()
            .filter(|ad| ad.status.is_open() && ad.is_owned_by(creator_id))
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adboard_core::domain::{AdStatus, NewAdvertisement};

    fn draft(status: AdStatus) -> NewAdvertisement {
        NewAdvertisement {
            title: "Table".to_string(),
            status: Some(status),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_constraint_violation() {
        let users = InMemoryUserRepository::new(InMemoryStore::new());
        users
            .insert(User::new("a@example.com".into(), "hash".into()))
            .await
            .unwrap();

        let result = users
            .insert(User::new("a@example.com".into(), "hash".into()))
            .await;

        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_insert_requires_existing_creator() {
        let ads = InMemoryAdvertisementRepository::new(InMemoryStore::new());

        let result = ads
            .insert(Advertisement::new(Uuid::new_v4(), draft(AdStatus::Open)))
            .await;

        assert!(matches!(result, Err(RepoError::MissingReference(_))));
    }

    #[tokio::test]
    async fn test_deleting_user_cascades_to_advertisements() {
        let store = InMemoryStore::new();
        let users = InMemoryUserRepository::new(store.clone());
        let ads = InMemoryAdvertisementRepository::new(store);

        let owner = users
            .insert(User::new("owner@example.com".into(), "hash".into()))
            .await
            .unwrap();
        let other = users
            .insert(User::new("other@example.com".into(), "hash".into()))
            .await
            .unwrap();
        ads.insert(Advertisement::new(owner.id, draft(AdStatus::Open)))
            .await
            .unwrap();
        ads.insert(Advertisement::new(owner.id, draft(AdStatus::Draft)))
            .await
            .unwrap();
        let kept = ads
            .insert(Advertisement::new(other.id, draft(AdStatus::Open)))
            .await
            .unwrap();

        BaseRepository::<User, Uuid>::delete(&users, owner.id)
            .await
            .unwrap();

        let remaining = ads
            .list(
                Visibility::OpenOnly,
                &AdvertisementFilter::default(),
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(remaining, vec![kept]);
        assert_eq!(ads.count_open_by_creator(owner.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_pages_over_matching_records() {
        let store = InMemoryStore::new();
        let users = InMemoryUserRepository::new(store.clone());
        let ads = InMemoryAdvertisementRepository::new(store);
        let owner = users
            .insert(User::new("p@example.com".into(), "hash".into()))
            .await
            .unwrap();
        for _ in 0..5 {
            ads.insert(Advertisement::new(owner.id, draft(AdStatus::Open)))
                .await
                .unwrap();
        }

        let filter = AdvertisementFilter::default();
        let page = ads
            .list(Visibility::OpenOnly, &filter, Page::new(Some(2), Some(4)))
            .await
            .unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(ads.count(Visibility::OpenOnly, &filter).await.unwrap(), 5);
    }
}
