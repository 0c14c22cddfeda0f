//! `SeaORM` Entity for attachments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{AttachmentStatus, FileType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "attachments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub session_id: i32,
    pub file_type: FileType,
    pub file_url: String,
    pub status: AttachmentStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub transcript: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::kt_sessions::Entity",
        from = "Column::SessionId",
        to = "super::kt_sessions::Column::Id",
        on_delete = "Cascade"
    )]
    KtSessions,
}

impl Related<super::kt_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::KtSessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
