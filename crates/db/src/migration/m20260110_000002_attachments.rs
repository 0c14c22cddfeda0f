//! Attachments and their processing status.

use sea_orm_migration::{prelude::*, schema::*};

use super::m20260110_000001_users_and_sessions::KtSessions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Attachments::Table)
                    .if_not_exists()
                    .col(pk_auto(Attachments::Id))
                    .col(integer(Attachments::SessionId))
                    .col(string_len(Attachments::FileType, 10))
                    .col(string_len(Attachments::FileUrl, 200))
                    .col(string_len(Attachments::Status, 10).default("pending"))
                    .col(text_null(Attachments::Transcript))
                    .col(text_null(Attachments::Summary))
                    .col(
                        timestamp_with_time_zone(Attachments::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attachments_session")
                            .from(Attachments::Table, Attachments::SessionId)
                            .to(KtSessions::Table, KtSessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_attachments_session")
                    .table(Attachments::Table)
                    .col(Attachments::SessionId)
                    .col(Attachments::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Attachments::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Attachments {
    Table,
    Id,
    SessionId,
    FileType,
    FileUrl,
    Status,
    Transcript,
    Summary,
    CreatedAt,
}
