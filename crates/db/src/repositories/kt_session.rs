//! KT session repository for database operations.
//!
//! Implements session CRUD and share-token bookkeeping using SeaORM.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set, SqlErr,
};

use crate::entities::{attachments, kt_sessions};
use crate::repositories::attachment::to_domain as attachment_to_domain;
use crate::repositories::unless_vanished;
use ktrack_core::attachment::Attachment;
use ktrack_core::kt_session::{
    KtSession, KtSessionChanges, KtSessionError, KtSessionRepository as KtSessionRepoTrait,
    NewKtSession,
};
use ktrack_shared::types::{KtSessionId, UserId};

/// KT session repository implementation.
#[derive(Debug, Clone)]
pub struct KtSessionRepository {
    db: DatabaseConnection,
}

impl KtSessionRepository {
    /// Create a new session repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_owned_model(
        &self,
        id: KtSessionId,
        owner: UserId,
    ) -> Result<Option<kt_sessions::Model>, KtSessionError> {
        kt_sessions::Entity::find_by_id(id.into_inner())
            .filter(kt_sessions::Column::CreatedBy.eq(owner.into_inner()))
            .one(&self.db)
            .await
            .map_err(|e| KtSessionError::repository(e.to_string()))
    }
}

impl KtSessionRepoTrait for KtSessionRepository {
    async fn create(&self, input: NewKtSession) -> Result<KtSession, KtSessionError> {
        let active_model = kt_sessions::ActiveModel {
            title: Set(input.title),
            description: Set(input.description),
            created_by: Set(input.created_by.into_inner()),
            share_token: Set(None),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let model = active_model.insert(&self.db).await.map_err(map_write_err)?;

        Ok(to_domain(model))
    }

    async fn find_by_id(&self, id: KtSessionId) -> Result<Option<KtSession>, KtSessionError> {
        let model = kt_sessions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| KtSessionError::repository(e.to_string()))?;

        Ok(model.map(to_domain))
    }

    async fn find_owned(
        &self,
        id: KtSessionId,
        owner: UserId,
    ) -> Result<Option<KtSession>, KtSessionError> {
        Ok(self.find_owned_model(id, owner).await?.map(to_domain))
    }

    async fn list_owned(&self, owner: UserId) -> Result<Vec<KtSession>, KtSessionError> {
        let models = kt_sessions::Entity::find()
            .filter(kt_sessions::Column::CreatedBy.eq(owner.into_inner()))
            .order_by_desc(kt_sessions::Column::CreatedAt)
            .order_by_desc(kt_sessions::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| KtSessionError::repository(e.to_string()))?;

        Ok(models.into_iter().map(to_domain).collect())
    }

    async fn update(
        &self,
        id: KtSessionId,
        owner: UserId,
        changes: KtSessionChanges,
    ) -> Result<Option<KtSession>, KtSessionError> {
        let Some(model) = self.find_owned_model(id, owner).await? else {
            return Ok(None);
        };

        let mut active_model = model.into_active_model();
        if let Some(title) = changes.title {
            active_model.title = Set(title);
        }
        if let Some(description) = changes.description {
            active_model.description = Set(description);
        }

        let model = unless_vanished(active_model.update(&self.db).await).map_err(map_write_err)?;

        Ok(model.map(to_domain))
    }

    async fn delete(&self, id: KtSessionId, owner: UserId) -> Result<bool, KtSessionError> {
        // Attachments go with it through ON DELETE CASCADE.
        let result = kt_sessions::Entity::delete_many()
            .filter(kt_sessions::Column::Id.eq(id.into_inner()))
            .filter(kt_sessions::Column::CreatedBy.eq(owner.into_inner()))
            .exec(&self.db)
            .await
            .map_err(|e| KtSessionError::repository(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    async fn list_attachments(&self, id: KtSessionId) -> Result<Vec<Attachment>, KtSessionError> {
        let models = attachments::Entity::find()
            .filter(attachments::Column::SessionId.eq(id.into_inner()))
            .order_by_desc(attachments::Column::CreatedAt)
            .order_by_desc(attachments::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| KtSessionError::repository(e.to_string()))?;

        Ok(models.into_iter().map(attachment_to_domain).collect())
    }

    async fn set_share_token(&self, id: KtSessionId, token: &str) -> Result<(), KtSessionError> {
        let result = kt_sessions::Entity::update_many()
            .col_expr(kt_sessions::Column::ShareToken, Expr::value(token))
            .filter(kt_sessions::Column::Id.eq(id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(map_write_err)?;

        if result.rows_affected == 0 {
            return Err(KtSessionError::NotFound(id));
        }
        Ok(())
    }
}

/// Translate constraint violations into domain errors.
fn map_write_err(err: DbErr) -> KtSessionError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => KtSessionError::Conflict(msg),
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            KtSessionError::Validation("session owner does not exist".to_string())
        }
        _ => KtSessionError::repository(err.to_string()),
    }
}

/// Convert database model to domain model.
fn to_domain(model: kt_sessions::Model) -> KtSession {
    KtSession {
        id: KtSessionId::from_raw(model.id),
        title: model.title,
        description: model.description,
        created_by: UserId::from_raw(model.created_by),
        share_token: model.share_token,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

/// Convert database model to the id/title reference.
pub(crate) fn to_session_ref(model: &kt_sessions::Model) -> ktrack_core::kt_session::SessionRef {
    ktrack_core::kt_session::SessionRef {
        id: KtSessionId::from_raw(model.id),
        title: model.title.clone(),
    }
}
