//! Advertisement entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use adboard_core::domain::{AdStatus, Advertisement};

/// Stored form of [`AdStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Status {
    #[sea_orm(string_value = "OPEN")]
    Open,
    #[sea_orm(string_value = "CLOSED")]
    Closed,
    #[sea_orm(string_value = "DRAFT")]
    Draft,
}

impl From<AdStatus> for Status {
    fn from(status: AdStatus) -> Self {
        match status {
            AdStatus::Open => Status::Open,
            AdStatus::Closed => Status::Closed,
            AdStatus::Draft => Status::Draft,
        }
    }
}

impl From<Status> for AdStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Open => AdStatus::Open,
            Status::Closed => AdStatus::Closed,
            Status::Draft => AdStatus::Draft,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "advertisements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub status: Status,
    pub creator_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Creator,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Advertisement {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            status: model.status.into(),
            creator_id: model.creator_id,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<Advertisement> for ActiveModel {
    fn from(ad: Advertisement) -> Self {
        Self {
            id: Set(ad.id),
            title: Set(ad.title),
            description: Set(ad.description),
            status: Set(ad.status.into()),
            creator_id: Set(ad.creator_id),
            created_at: Set(ad.created_at.into()),
            updated_at: Set(ad.updated_at.into()),
        }
    }
}
