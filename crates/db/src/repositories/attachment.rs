//! Attachment repository for database operations.
//!
//! Implements attachment CRUD and guarded status transitions using SeaORM.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};

use crate::entities::{
    attachments, kt_sessions, sea_orm_active_enums::AttachmentStatus as DbAttachmentStatus,
    sea_orm_active_enums::FileType as DbFileType,
};
use crate::repositories::kt_session::to_session_ref;
use crate::repositories::unless_vanished;
use ktrack_core::attachment::{
    Attachment, AttachmentChanges, AttachmentError, AttachmentFilter,
    AttachmentRepository as AttachmentRepoTrait, AttachmentStatus, AttachmentWithSession,
    FileKind, NewAttachment, ProcessingOutput,
};
use ktrack_core::kt_session::SessionRef;
use ktrack_shared::types::{AttachmentId, KtSessionId, PageRequest, UserId};

/// Attachment repository implementation.
#[derive(Debug, Clone)]
pub struct AttachmentRepository {
    db: DatabaseConnection,
}

impl AttachmentRepository {
    /// Create a new attachment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Attachments whose session belongs to `owner`, joined with that session.
    fn owned_query(owner: UserId) -> Select<attachments::Entity> {
        attachments::Entity::find()
            .inner_join(kt_sessions::Entity)
            .filter(kt_sessions::Column::CreatedBy.eq(owner.into_inner()))
    }

    async fn with_session(
        &self,
        model: attachments::Model,
    ) -> Result<Option<AttachmentWithSession>, AttachmentError> {
        let session = kt_sessions::Entity::find_by_id(model.session_id)
            .one(&self.db)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?;

        Ok(session.map(|s| AttachmentWithSession {
            session: to_session_ref(&s),
            attachment: to_domain(model),
        }))
    }
}

impl AttachmentRepoTrait for AttachmentRepository {
    async fn create(&self, input: NewAttachment) -> Result<Attachment, AttachmentError> {
        let active_model = attachments::ActiveModel {
            session_id: Set(input.session_id.into_inner()),
            file_type: Set(to_db_file_type(input.file_kind)),
            file_url: Set(input.file_url),
            status: Set(DbAttachmentStatus::Pending),
            transcript: Set(None),
            summary: Set(None),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?;

        Ok(to_domain(model))
    }

    async fn find_by_id(&self, id: AttachmentId) -> Result<Option<Attachment>, AttachmentError> {
        let model = attachments::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?;

        Ok(model.map(to_domain))
    }

    async fn find_owned(
        &self,
        id: AttachmentId,
        owner: UserId,
    ) -> Result<Option<AttachmentWithSession>, AttachmentError> {
        let row = attachments::Entity::find_by_id(id.into_inner())
            .find_also_related(kt_sessions::Entity)
            .filter(kt_sessions::Column::CreatedBy.eq(owner.into_inner()))
            .one(&self.db)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?;

        Ok(row.and_then(|(attachment, session)| {
            session.map(|s| AttachmentWithSession {
                session: to_session_ref(&s),
                attachment: to_domain(attachment),
            })
        }))
    }

    async fn list_owned(
        &self,
        owner: UserId,
        filter: &AttachmentFilter,
        page: PageRequest,
    ) -> Result<(Vec<AttachmentWithSession>, u64), AttachmentError> {
        let mut count_query = Self::owned_query(owner);
        let mut page_query = attachments::Entity::find()
            .find_also_related(kt_sessions::Entity)
            .filter(kt_sessions::Column::CreatedBy.eq(owner.into_inner()));

        if let Some(session_id) = filter.session_id {
            count_query =
                count_query.filter(attachments::Column::SessionId.eq(session_id.into_inner()));
            page_query =
                page_query.filter(attachments::Column::SessionId.eq(session_id.into_inner()));
        }
        if let Some(kind) = filter.file_kind {
            count_query = count_query.filter(attachments::Column::FileType.eq(kind.as_str()));
            page_query = page_query.filter(attachments::Column::FileType.eq(kind.as_str()));
        }

        let total = count_query
            .count(&self.db)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?;

        let rows = page_query
            .order_by_desc(attachments::Column::CreatedAt)
            .order_by_desc(attachments::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?;

        let items = rows
            .into_iter()
            .filter_map(|(attachment, session)| {
                session.map(|s| AttachmentWithSession {
                    session: to_session_ref(&s),
                    attachment: to_domain(attachment),
                })
            })
            .collect();

        Ok((items, total))
    }

    async fn update(
        &self,
        id: AttachmentId,
        changes: &AttachmentChanges,
    ) -> Result<Option<AttachmentWithSession>, AttachmentError> {
        let Some(model) = attachments::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?
        else {
            return Ok(None);
        };

        // Only the columns set here are written; status stays untouched.
        let mut active_model = model.into_active_model();
        if let Some(session_id) = changes.session_id {
            active_model.session_id = Set(session_id.into_inner());
        }
        if let Some(kind) = changes.file_kind {
            active_model.file_type = Set(to_db_file_type(kind));
        }
        if let Some(url) = &changes.file_url {
            active_model.file_url = Set(url.clone());
        }
        if let Some(transcript) = &changes.transcript {
            active_model.transcript = Set(Some(transcript.clone()));
        }
        if let Some(summary) = &changes.summary {
            active_model.summary = Set(Some(summary.clone()));
        }

        let Some(model) = unless_vanished(active_model.update(&self.db).await)
            .map_err(|e| AttachmentError::repository(e.to_string()))?
        else {
            return Ok(None);
        };

        self.with_session(model).await
    }

    async fn transition(
        &self,
        id: AttachmentId,
        from: AttachmentStatus,
        to: AttachmentStatus,
        output: Option<ProcessingOutput>,
    ) -> Result<bool, AttachmentError> {
        if !from.can_transition_to(to) {
            return Err(AttachmentError::InvalidTransition { from, to });
        }

        let mut update = attachments::Entity::update_many()
            .col_expr(attachments::Column::Status, Expr::value(to.as_str()));
        if let Some(output) = output {
            update = update
                .col_expr(attachments::Column::Transcript, Expr::value(output.transcript))
                .col_expr(attachments::Column::Summary, Expr::value(output.summary));
        }

        let result = update
            .filter(attachments::Column::Id.eq(id.into_inner()))
            .filter(attachments::Column::Status.eq(from.as_str()))
            .exec(&self.db)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    async fn delete(&self, id: AttachmentId) -> Result<bool, AttachmentError> {
        let result = attachments::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    async fn owned_session(
        &self,
        session_id: KtSessionId,
        owner: UserId,
    ) -> Result<Option<SessionRef>, AttachmentError> {
        let model = kt_sessions::Entity::find_by_id(session_id.into_inner())
            .filter(kt_sessions::Column::CreatedBy.eq(owner.into_inner()))
            .one(&self.db)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?;

        Ok(model.as_ref().map(to_session_ref))
    }
}

/// Convert domain file kind to database enum.
fn to_db_file_type(kind: FileKind) -> DbFileType {
    match kind {
        FileKind::Audio => DbFileType::Audio,
        FileKind::Video => DbFileType::Video,
        FileKind::Pdf => DbFileType::Pdf,
        FileKind::Text => DbFileType::Text,
    }
}

/// Convert database file type to domain enum.
fn from_db_file_type(file_type: DbFileType) -> FileKind {
    match file_type {
        DbFileType::Audio => FileKind::Audio,
        DbFileType::Video => FileKind::Video,
        DbFileType::Pdf => FileKind::Pdf,
        DbFileType::Text => FileKind::Text,
    }
}

/// Convert database status to domain enum.
fn from_db_status(status: DbAttachmentStatus) -> AttachmentStatus {
    match status {
        DbAttachmentStatus::Pending => AttachmentStatus::Pending,
        DbAttachmentStatus::Processing => AttachmentStatus::Processing,
        DbAttachmentStatus::Done => AttachmentStatus::Done,
        DbAttachmentStatus::Failed => AttachmentStatus::Failed,
    }
}

/// Convert database model to domain model.
pub(crate) fn to_domain(model: attachments::Model) -> Attachment {
    Attachment {
        id: AttachmentId::from_raw(model.id),
        session_id: KtSessionId::from_raw(model.session_id),
        file_kind: from_db_file_type(model.file_type),
        file_url: model.file_url,
        status: from_db_status(model.status),
        transcript: model.transcript,
        summary: model.summary,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
