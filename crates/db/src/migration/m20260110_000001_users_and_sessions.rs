//! Users and KT sessions.

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_len_uniq(Users::Email, 255))
                    .col(string_len(Users::Name, 255))
                    .col(
                        timestamp_with_time_zone(Users::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(KtSessions::Table)
                    .if_not_exists()
                    .col(pk_auto(KtSessions::Id))
                    .col(string_len(KtSessions::Title, 255))
                    .col(text(KtSessions::Description))
                    .col(integer(KtSessions::CreatedBy))
                    .col(string_len_null(KtSessions::ShareToken, 64).unique_key())
                    .col(
                        timestamp_with_time_zone(KtSessions::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_kt_sessions_created_by")
                            .from(KtSessions::Table, KtSessions::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Owner listing, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_kt_sessions_owner")
                    .table(KtSessions::Table)
                    .col(KtSessions::CreatedBy)
                    .col(KtSessions::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(KtSessions::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(super) enum Users {
    Table,
    Id,
    Email,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(super) enum KtSessions {
    Table,
    Id,
    Title,
    Description,
    CreatedBy,
    ShareToken,
    CreatedAt,
}
