//! Advertisement use cases: visibility-scoped reads and quota-gated writes.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    AdStatus, Advertisement, AdvertisementChanges, AdvertisementFilter, NewAdvertisement, Page,
    Requester,
};
use crate::error::{DomainError, RepoError};
use crate::policy::{OpenQuota, Visibility};
use crate::ports::AdvertisementRepository;

const ENTITY: &str = "Advertisement";

/// Orchestrates the advertisement repository with the quota and visibility rules.
///
/// The open count and the following write are two separate repository calls,
/// so concurrent OPEN writes by the same user may overshoot the quota.
#[derive(Clone)]
pub struct AdvertisementService {
    advertisements: Arc<dyn AdvertisementRepository>,
    quota: OpenQuota,
}

impl AdvertisementService {
    pub fn new(advertisements: Arc<dyn AdvertisementRepository>, max_open: u64) -> Self {
        Self {
            advertisements,
            quota: OpenQuota::new(max_open),
        }
    }

    /// One page of the records `requester` may see, plus the total match count.
    pub async fn list(
        &self,
        requester: Requester,
        filter: &AdvertisementFilter,
        page: Page,
    ) -> Result<(Vec<Advertisement>, u64), DomainError> {
        let visibility = Visibility::for_requester(requester);
        let total = self.advertisements.count(visibility, filter).await?;
        let items = self.advertisements.list(visibility, filter, page).await?;
        Ok((items, total))
    }

    /// A single record, reported as not found when `requester` may not see it.
    pub async fn retrieve(
        &self,
        requester: Requester,
        id: Uuid,
    ) -> Result<Advertisement, DomainError> {
        let visibility = Visibility::for_requester(requester);
        self.advertisements
            .find_by_id(id)
            .await?
            .filter(|ad| visibility.admits(ad))
            .ok_or(DomainError::NotFound {
                entity_type: ENTITY,
                id,
            })
    }

    pub async fn create(
        &self,
        creator_id: Uuid,
        draft: NewAdvertisement,
    ) -> Result<Advertisement, DomainError> {
        let draft = draft.validate()?;
        self.authorize_open(creator_id, Some(draft.target_status()))
            .await?;

        let saved = self
            .advertisements
            .insert(Advertisement::new(creator_id, draft))
            .await?;

        tracing::info!(
            advertisement_id = %saved.id,
            creator_id = %creator_id,
            status = %saved.status,
            "Advertisement created"
        );
        Ok(saved)
    }

    /// Apply `changes` on behalf of the owner. The creator is never reassigned.
    pub async fn update(
        &self,
        requester: Uuid,
        id: Uuid,
        changes: AdvertisementChanges,
    ) -> Result<Advertisement, DomainError> {
        let mut ad = self.find_owned(requester, id).await?;
        let changes = changes.validate()?;
        self.authorize_open(requester, changes.status).await?;

        ad.apply(changes);
        let saved = self
            .advertisements
            .update(ad)
            .await
            .map_err(|e| not_found_or(e, id))?;

        tracing::info!(
            advertisement_id = %saved.id,
            status = %saved.status,
            "Advertisement updated"
        );
        Ok(saved)
    }

    pub async fn delete(&self, requester: Uuid, id: Uuid) -> Result<(), DomainError> {
        self.find_owned(requester, id).await?;
        self.advertisements
            .delete(id)
            .await
            .map_err(|e| not_found_or(e, id))?;

        tracing::info!(advertisement_id = %id, "Advertisement deleted");
        Ok(())
    }

    /// Gate a write whose resulting status is `target` against the requester's
    /// current number of open advertisements.
    pub async fn authorize_open(
        &self,
        requester: Uuid,
        target: Option<AdStatus>,
    ) -> Result<(), DomainError> {
        if !OpenQuota::applies_to(target) {
            return Ok(());
        }

        let open_count = self.advertisements.count_open_by_creator(requester).await?;
        self.quota.check(open_count).inspect_err(|_| {
            tracing::info!(
                creator_id = %requester,
                open_count,
                limit = self.quota.limit(),
                "Open advertisement quota exceeded"
            );
        })
    }

    async fn find_owned(&self, requester: Uuid, id: Uuid) -> Result<Advertisement, DomainError> {
        let ad = self.retrieve(Requester::User(requester), id).await?;
        if !ad.is_owned_by(requester) {
            return Err(DomainError::NotOwner);
        }
        Ok(ad)
    }
}

fn not_found_or(err: RepoError, id: Uuid) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::NotFound {
            entity_type: ENTITY,
            id,
        },
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::ports::BaseRepository;

    /// Reports a fixed open count and remembers how often it was asked.
    struct OpenCountStub {
        open: u64,
        counted: AtomicUsize,
    }

    #[async_trait]
    impl BaseRepository<Advertisement, Uuid> for OpenCountStub {
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<Advertisement>, RepoError> {
            Ok(None)
        }

        async fn insert(&self, ad: Advertisement) -> Result<Advertisement, RepoError> {
            Ok(ad)
        }

        async fn update(&self, ad: Advertisement) -> Result<Advertisement, RepoError> {
            Ok(ad)
        }

        async fn delete(&self, _id: Uuid) -> Result<(), RepoError> {
            Err(RepoError::NotFound)
        }
    }

    #[async_trait]
    impl AdvertisementRepository for OpenCountStub {
        async fn list(
            &self,
            _visibility: Visibility,
            _filter: &AdvertisementFilter,
            _page: Page,
        ) -> Result<Vec<Advertisement>, RepoError> {
            Ok(Vec::new())
        }

        async fn count(
            &self,
            _visibility: Visibility,
            _filter: &AdvertisementFilter,
        ) -> Result<u64, RepoError> {
            Ok(0)
        }

        async fn count_open_by_creator(&self, _creator_id: Uuid) -> Result<u64, RepoError> {
            self.counted.fetch_add(1, Ordering::SeqCst);
            Ok(self.open)
        }
    }

    fn service(open: u64, limit: u64) -> (AdvertisementService, Arc<OpenCountStub>) {
        let stub = Arc::new(OpenCountStub {
            open,
            counted: AtomicUsize::new(0),
        });
        (AdvertisementService::new(stub.clone(), limit), stub)
    }

    #[tokio::test]
    async fn test_non_open_targets_are_not_counted() {
        let (service, stub) = service(99, 1);
        let user = Uuid::new_v4();

        for target in [None, Some(AdStatus::Draft), Some(AdStatus::Closed)] {
            service.authorize_open(user, target).await.unwrap();
        }

        assert_eq!(stub.counted.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_open_target_is_counted_against_limit() {
        let (service, stub) = service(3, 3);

        let result = service
            .authorize_open(Uuid::new_v4(), Some(AdStatus::Open))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::OpenQuotaExceeded { limit: 3 })
        ));
        assert_eq!(stub.counted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_create_sets_creator_and_default_status() {
        let (service, _) = service(0, 1);
        let creator = Uuid::new_v4();

        let ad = service
            .create(
                creator,
                NewAdvertisement {
                    title: " Kettle ".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(ad.creator_id, creator);
        assert_eq!(ad.status, AdStatus::Open);
        assert_eq!(ad.title, "Kettle");
    }

    #[tokio::test]
    async fn test_blank_title_fails_before_quota() {
        let (service, stub) = service(0, 1);

        let result = service
            .create(Uuid::new_v4(), NewAdvertisement::default())
            .await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(stub.counted.load(Ordering::SeqCst), 0);
    }
}
