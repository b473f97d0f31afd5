use sea_orm_migration::prelude::*;

use crate::m20250101_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Advertisements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Advertisements::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Advertisements::Title).text().not_null())
                    .col(
                        ColumnDef::new(Advertisements::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Advertisements::Status)
                            .string_len(16)
                            .not_null()
                            .default("OPEN"),
                    )
                    .col(ColumnDef::new(Advertisements::CreatorId).uuid().not_null())
                    .col(
                        ColumnDef::new(Advertisements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Advertisements::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_advertisements_creator")
                            .from(Advertisements::Table, Advertisements::CreatorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Quota count: open advertisements per creator.
        manager
            .create_index(
                Index::create()
                    .name("idx_advertisements_creator_status")
                    .table(Advertisements::Table)
                    .col(Advertisements::CreatorId)
                    .col(Advertisements::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_advertisements_created_at")
                    .table(Advertisements::Table)
                    .col(Advertisements::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Advertisements::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Advertisements {
    Table,
    Id,
    Title,
    Description,
    Status,
    CreatorId,
    CreatedAt,
    UpdatedAt,
}
