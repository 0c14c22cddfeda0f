//! String-backed enums stored in `VARCHAR(10)` columns.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attachment artifact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum FileType {
    /// Audio recording.
    #[sea_orm(string_value = "audio")]
    Audio,
    /// Video recording.
    #[sea_orm(string_value = "video")]
    Video,
    /// PDF document.
    #[sea_orm(string_value = "pdf")]
    Pdf,
    /// Plain text.
    #[sea_orm(string_value = "text")]
    Text,
}

/// Attachment processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum AttachmentStatus {
    /// Waiting for a worker.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Being processed.
    #[sea_orm(string_value = "processing")]
    Processing,
    /// Processed successfully.
    #[sea_orm(string_value = "done")]
    Done,
    /// Processing failed.
    #[sea_orm(string_value = "failed")]
    Failed,
}
