//! Advertisement use cases against the in-memory repositories.

use std::sync::Arc;

use uuid::Uuid;

use adboard_core::AdvertisementService;
use adboard_core::domain::{
    AdStatus, AdvertisementChanges, AdvertisementFilter, NewAdvertisement, Page, Requester, User,
};
use adboard_core::error::DomainError;
use adboard_core::ports::BaseRepository;
use adboard_infra::{InMemoryAdvertisementRepository, InMemoryStore, InMemoryUserRepository};

struct Fixture {
    users: InMemoryUserRepository,
    service: AdvertisementService,
}

impl Fixture {
    fn new(max_open: u64) -> Self {
        let store = InMemoryStore::new();
        Self {
            users: InMemoryUserRepository::new(store.clone()),
            service: AdvertisementService::new(
                Arc::new(InMemoryAdvertisementRepository::new(store)),
                max_open,
            ),
        }
    }

    async fn user(&self, email: &str) -> Uuid {
        self.users
            .insert(User::new(email.to_string(), "hash".to_string()))
            .await
            .unwrap()
            .id
    }
}

fn draft(title: &str, status: Option<AdStatus>) -> NewAdvertisement {
    NewAdvertisement {
        title: title.to_string(),
        description: String::new(),
        status,
    }
}

fn status_change(status: AdStatus) -> AdvertisementChanges {
    AdvertisementChanges {
        status: Some(status),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_quota_blocks_only_open_targets() {
    let fx = Fixture::new(2);
    let owner = fx.user("owner@example.com").await;

    fx.service.create(owner, draft("a", None)).await.unwrap();
    fx.service
        .create(owner, draft("b", Some(AdStatus::Open)))
        .await
        .unwrap();

    let denied = fx.service.create(owner, draft("c", None)).await;
    assert!(matches!(
        denied,
        Err(DomainError::OpenQuotaExceeded { limit: 2 })
    ));

    for status in [AdStatus::Draft, AdStatus::Closed] {
        let ad = fx
            .service
            .create(owner, draft("parked", Some(status)))
            .await
            .unwrap();
        assert_eq!(ad.status, status);
    }
}

#[tokio::test]
async fn test_quota_is_per_user() {
    let fx = Fixture::new(1);
    let alice = fx.user("alice@example.com").await;
    let bob = fx.user("bob@example.com").await;

    fx.service.create(alice, draft("a", None)).await.unwrap();

    assert!(fx.service.create(bob, draft("b", None)).await.is_ok());
    assert!(fx.service.create(alice, draft("c", None)).await.is_err());
}

#[tokio::test]
async fn test_rejected_create_writes_nothing() {
    let fx = Fixture::new(0);
    let owner = fx.user("owner@example.com").await;

    assert!(fx.service.create(owner, draft("a", None)).await.is_err());

    let (items, total) = fx
        .service
        .list(
            Requester::User(owner),
            &AdvertisementFilter::default(),
            Page::default(),
        )
        .await
        .unwrap();
    assert!(items.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_reopening_is_gated_and_closing_is_not() {
    let fx = Fixture::new(1);
    let owner = fx.user("owner@example.com").await;
    let first = fx.service.create(owner, draft("first", None)).await.unwrap();
    let parked = fx
        .service
        .create(owner, draft("parked", Some(AdStatus::Draft)))
        .await
        .unwrap();

    let denied = fx
        .service
        .update(owner, parked.id, status_change(AdStatus::Open))
        .await;
    assert!(matches!(denied, Err(DomainError::OpenQuotaExceeded { .. })));

    fx.service
        .update(owner, first.id, status_change(AdStatus::Closed))
        .await
        .unwrap();
    let reopened = fx
        .service
        .update(owner, parked.id, status_change(AdStatus::Open))
        .await
        .unwrap();

    assert_eq!(reopened.status, AdStatus::Open);
    assert_eq!(reopened.creator_id, owner);
    assert!(reopened.updated_at >= reopened.created_at);
}

#[tokio::test]
async fn test_update_without_status_skips_quota() {
    let fx = Fixture::new(1);
    let owner = fx.user("owner@example.com").await;
    let ad = fx.service.create(owner, draft("old", None)).await.unwrap();

    let updated = fx
        .service
        .update(
            owner,
            ad.id,
            AdvertisementChanges {
                description: Some("more detail".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.description, "more detail");
    assert_eq!(updated.title, "old");
}

#[tokio::test]
async fn test_ownership_is_checked_before_quota() {
    let fx = Fixture::new(0);
    let alice = fx.user("alice@example.com").await;
    let bob = fx.user("bob@example.com").await;
    let ad = fx
        .service
        .create(alice, draft("closed", Some(AdStatus::Closed)))
        .await
        .unwrap();

    // Bob cannot see a closed record of Alice's.
    let hidden = fx
        .service
        .update(bob, ad.id, status_change(AdStatus::Open))
        .await;
    assert!(matches!(hidden, Err(DomainError::NotFound { .. })));

    fx.service
        .update(alice, ad.id, AdvertisementChanges::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_non_owner_gets_not_owner_for_visible_records() {
    let fx = Fixture::new(5);
    let alice = fx.user("alice@example.com").await;
    let bob = fx.user("bob@example.com").await;
    let ad = fx.service.create(alice, draft("open", None)).await.unwrap();

    assert!(matches!(
        fx.service
            .update(bob, ad.id, status_change(AdStatus::Closed))
            .await,
        Err(DomainError::NotOwner)
    ));
    assert!(matches!(
        fx.service.delete(bob, ad.id).await,
        Err(DomainError::NotOwner)
    ));

    fx.service.delete(alice, ad.id).await.unwrap();
    assert!(matches!(
        fx.service.retrieve(Requester::Anonymous, ad.id).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_listing_combines_visibility_with_filters() {
    let fx = Fixture::new(5);
    let alice = fx.user("alice@example.com").await;
    let bob = fx.user("bob@example.com").await;
    fx.service
        .create(alice, draft("alice draft", Some(AdStatus::Draft)))
        .await
        .unwrap();
    fx.service.create(bob, draft("bob open", None)).await.unwrap();

    let drafts = AdvertisementFilter {
        status: Some(AdStatus::Draft),
        ..Default::default()
    };

    let (_, anonymous) = fx
        .service
        .list(Requester::Anonymous, &drafts, Page::default())
        .await
        .unwrap();
    let (mine, total) = fx
        .service
        .list(Requester::User(alice), &drafts, Page::default())
        .await
        .unwrap();

    assert_eq!(anonymous, 0);
    assert_eq!(total, 1);
    assert_eq!(mine[0].title, "alice draft");
}
