//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Select,
};
use uuid::Uuid;

use adboard_core::domain::{Advertisement, AdvertisementFilter, Page, User};
use adboard_core::error::RepoError;
use adboard_core::policy::Visibility;
use adboard_core::ports::{AdvertisementRepository, UserRepository};

use super::entity::advertisement::{self, Entity as AdvertisementEntity, Status};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, repo_err};

/// PostgreSQL user repository. Advertisements go with their creator through
/// the `ON DELETE CASCADE` foreign key.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL advertisement repository.
pub type PostgresAdvertisementRepository = PostgresBaseRepository<AdvertisementEntity>;

/// Keep the first character of the local part so logs carry no full address.
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{first}***@{domain}")
        }
        None => "***".to_string(),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = UserEntity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(&*self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

fn visibility_condition(visibility: Visibility) -> Condition {
    let open = advertisement::Column::Status.eq(Status::Open);
    match visibility {
        Visibility::OpenOnly => Condition::all().add(open),
        Visibility::OpenOrOwnedBy(user_id) => Condition::any()
            .add(open)
            .add(advertisement::Column::CreatorId.eq(user_id)),
    }
}

fn filter_condition(filter: &AdvertisementFilter) -> Condition {
    Condition::all()
        .add_option(
            filter
                .status
                .map(|status| advertisement::Column::Status.eq(Status::from(status))),
        )
        .add_option(
            filter
                .creator
                .map(|creator| advertisement::Column::CreatorId.eq(creator)),
        )
        .add_option(
            filter
                .created_at_after
                .map(|after| advertisement::Column::CreatedAt.gte(after)),
        )
        .add_option(
            filter
                .created_at_before
                .map(|before| advertisement::Column::CreatedAt.lte(before)),
        )
}

fn scoped(visibility: Visibility, filter: &AdvertisementFilter) -> Select<AdvertisementEntity> {
    AdvertisementEntity::find()
        .filter(visibility_condition(visibility))
        .filter(filter_condition(filter))
}

#[async_trait]
impl AdvertisementRepository for PostgresAdvertisementRepository {
    async fn list(
        &self,
        visibility: Visibility,
        filter: &AdvertisementFilter,
        page: Page,
    ) -> Result<Vec<Advertisement>, RepoError> {
        let result = scoped(visibility, filter)
            .order_by_desc(advertisement::Column::CreatedAt)
            .order_by_desc(advertisement::Column::Id)
            .offset(page.offset)
            .limit(page.limit)
            .all(&*self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn count(
        &self,
        visibility: Visibility,
        filter: &AdvertisementFilter,
    ) -> Result<u64, RepoError> {
        scoped(visibility, filter)
            .count(&*self.db)
            .await
            .map_err(repo_err)
    }

    async fn count_open_by_creator(&self, creator_id: Uuid) -> Result<u64, RepoError> {
        AdvertisementEntity::find()
            .filter(advertisement::Column::Status.eq(Status::Open))
            .filter(advertisement::Column::CreatorId.eq(creator_id))
            .count(&*self.db)
            .await
            .map_err(repo_err)
    }
}
