//! In-memory repositories for unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use ktrack_shared::types::{AttachmentId, KtSessionId, PageRequest, UserId};

use crate::attachment::{
    Attachment, AttachmentChanges, AttachmentError, AttachmentFilter, AttachmentRepository,
    AttachmentStatus, AttachmentWithSession, FileKind, NewAttachment, ProcessingOutput,
};
use crate::kt_session::{
    KtSession, KtSessionChanges, KtSessionError, KtSessionRepository, NewKtSession, SessionRef,
};

#[derive(Default)]
struct Tables {
    next_id: i32,
    sessions: BTreeMap<KtSessionId, KtSession>,
    attachments: BTreeMap<AttachmentId, Attachment>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn with_session(&self, attachment: &Attachment) -> AttachmentWithSession {
        let session = self.sessions.get(&attachment.session_id).map_or_else(
            || SessionRef {
                id: attachment.session_id,
                title: String::new(),
            },
            KtSession::to_ref,
        );
        AttachmentWithSession {
            attachment: attachment.clone(),
            session,
        }
    }

    fn owns(&self, session_id: KtSessionId, owner: UserId) -> bool {
        self.sessions
            .get(&session_id)
            .is_some_and(|s| s.created_by == owner)
    }
}

/// Mutex-guarded maps implementing both repository traits.
///
/// Ids come from one counter, so higher ids are newer.
#[derive(Default)]
pub(crate) struct InMemoryStore {
    tables: Mutex<Tables>,
    transitions: AtomicUsize,
    share_token_writes: AtomicUsize,
}

impl InMemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn seed_session(&self, owner: UserId, title: &str) -> KtSessionId {
        let mut tables = self.tables.lock().unwrap();
        let id = KtSessionId::from_raw(tables.next_id());
        tables.sessions.insert(
            id,
            KtSession {
                id,
                title: title.to_string(),
                description: format!("{title} walkthrough"),
                created_by: owner,
                share_token: None,
                created_at: Utc::now(),
            },
        );
        id
    }

    pub(crate) fn seed_attachment(&self, session_id: KtSessionId) -> AttachmentId {
        let mut tables = self.tables.lock().unwrap();
        let id = AttachmentId::from_raw(tables.next_id());
        tables.attachments.insert(
            id,
            Attachment {
                id,
                session_id,
                file_kind: FileKind::Audio,
                file_url: format!("https://cdn.example.com/{id}.mp3"),
                status: AttachmentStatus::Pending,
                transcript: None,
                summary: None,
                created_at: Utc::now(),
            },
        );
        id
    }

    pub(crate) fn session(&self, id: KtSessionId) -> Option<KtSession> {
        self.tables.lock().unwrap().sessions.get(&id).cloned()
    }

    pub(crate) fn attachment(&self, id: AttachmentId) -> Option<Attachment> {
        self.tables.lock().unwrap().attachments.get(&id).cloned()
    }

    pub(crate) fn remove_session(&self, id: KtSessionId) {
        let mut tables = self.tables.lock().unwrap();
        tables.sessions.remove(&id);
        tables.attachments.retain(|_, a| a.session_id != id);
    }

    pub(crate) fn remove_attachment(&self, id: AttachmentId) {
        self.tables.lock().unwrap().attachments.remove(&id);
    }

    pub(crate) fn force_status(&self, id: AttachmentId, status: AttachmentStatus) {
        if let Some(a) = self.tables.lock().unwrap().attachments.get_mut(&id) {
            a.status = status;
        }
    }

    pub(crate) fn session_count(&self) -> usize {
        self.tables.lock().unwrap().sessions.len()
    }

    pub(crate) fn attachment_count(&self) -> usize {
        self.tables.lock().unwrap().attachments.len()
    }

    /// Number of status transitions that matched a row.
    pub(crate) fn write_count(&self) -> usize {
        self.transitions.load(Ordering::SeqCst)
    }

    pub(crate) fn share_token_writes(&self) -> usize {
        self.share_token_writes.load(Ordering::SeqCst)
    }
}

impl KtSessionRepository for InMemoryStore {
    async fn create(&self, input: NewKtSession) -> Result<KtSession, KtSessionError> {
        let mut tables = self.tables.lock().unwrap();
        let id = KtSessionId::from_raw(tables.next_id());
        let session = KtSession {
            id,
            title: input.title,
            description: input.description,
            created_by: input.created_by,
            share_token: None,
            created_at: Utc::now(),
        };
        tables.sessions.insert(id, session.clone());
        Ok(session)
    }

    async fn find_by_id(&self, id: KtSessionId) -> Result<Option<KtSession>, KtSessionError> {
        Ok(self.session(id))
    }

    async fn find_owned(
        &self,
        id: KtSessionId,
        owner: UserId,
    ) -> Result<Option<KtSession>, KtSessionError> {
        Ok(self.session(id).filter(|s| s.created_by == owner))
    }

    async fn list_owned(&self, owner: UserId) -> Result<Vec<KtSession>, KtSessionError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .sessions
            .values()
            .rev()
            .filter(|s| s.created_by == owner)
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: KtSessionId,
        owner: UserId,
        changes: KtSessionChanges,
    ) -> Result<Option<KtSession>, KtSessionError> {
        let mut tables = self.tables.lock().unwrap();
        let Some(session) = tables
            .sessions
            .get_mut(&id)
            .filter(|s| s.created_by == owner)
        else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            session.title = title;
        }
        if let Some(description) = changes.description {
            session.description = description;
        }
        Ok(Some(session.clone()))
    }

    async fn delete(&self, id: KtSessionId, owner: UserId) -> Result<bool, KtSessionError> {
        if !self.tables.lock().unwrap().owns(id, owner) {
            return Ok(false);
        }
        self.remove_session(id);
        Ok(true)
    }

    async fn list_attachments(&self, id: KtSessionId) -> Result<Vec<Attachment>, KtSessionError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .attachments
            .values()
            .rev()
            .filter(|a| a.session_id == id)
            .cloned()
            .collect())
    }

    async fn set_share_token(&self, id: KtSessionId, token: &str) -> Result<(), KtSessionError> {
        let mut tables = self.tables.lock().unwrap();
        let session = tables
            .sessions
            .get_mut(&id)
            .ok_or(KtSessionError::NotFound(id))?;
        session.share_token = Some(token.to_string());
        self.share_token_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl AttachmentRepository for InMemoryStore {
    async fn create(&self, input: NewAttachment) -> Result<Attachment, AttachmentError> {
        let mut tables = self.tables.lock().unwrap();
        let id = AttachmentId::from_raw(tables.next_id());
        let attachment = Attachment {
            id,
            session_id: input.session_id,
            file_kind: input.file_kind,
            file_url: input.file_url,
            status: AttachmentStatus::Pending,
            transcript: None,
            summary: None,
            created_at: Utc::now(),
        };
        tables.attachments.insert(id, attachment.clone());
        Ok(attachment)
    }

    async fn find_by_id(&self, id: AttachmentId) -> Result<Option<Attachment>, AttachmentError> {
        Ok(self.attachment(id))
    }

    async fn find_owned(
        &self,
        id: AttachmentId,
        owner: UserId,
    ) -> Result<Option<AttachmentWithSession>, AttachmentError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .attachments
            .get(&id)
            .filter(|a| tables.owns(a.session_id, owner))
            .map(|a| tables.with_session(a)))
    }

    async fn list_owned(
        &self,
        owner: UserId,
        filter: &AttachmentFilter,
        page: PageRequest,
    ) -> Result<(Vec<AttachmentWithSession>, u64), AttachmentError> {
        let tables = self.tables.lock().unwrap();
        let matching: Vec<_> = tables
            .attachments
            .values()
            .rev()
            .filter(|a| tables.owns(a.session_id, owner))
            .filter(|a| filter.session_id.is_none_or(|id| a.session_id == id))
            .filter(|a| filter.file_kind.is_none_or(|kind| a.file_kind == kind))
            .collect();

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap())
            .take(usize::try_from(page.limit()).unwrap())
            .map(|a| tables.with_session(a))
            .collect();
        Ok((items, total))
    }

    async fn update(
        &self,
        id: AttachmentId,
        changes: &AttachmentChanges,
    ) -> Result<Option<AttachmentWithSession>, AttachmentError> {
        let mut tables = self.tables.lock().unwrap();
        let Some(attachment) = tables.attachments.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(session_id) = changes.session_id {
            attachment.session_id = session_id;
        }
        if let Some(kind) = changes.file_kind {
            attachment.file_kind = kind;
        }
        if let Some(url) = &changes.file_url {
            attachment.file_url.clone_from(url);
        }
        if let Some(transcript) = &changes.transcript {
            attachment.transcript = Some(transcript.clone());
        }
        if let Some(summary) = &changes.summary {
            attachment.summary = Some(summary.clone());
        }
        let updated = attachment.clone();
        Ok(Some(tables.with_session(&updated)))
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

        let mut tables = self.tables.lock().unwrap();
        let Some(attachment) = tables
            .attachments
            .get_mut(&id)
            .filter(|a| a.status == from)
        else {
            return Ok(false);
        };
        attachment.status = to;
        if let Some(output) = output {
            attachment.transcript = Some(output.transcript);
            attachment.summary = Some(output.summary);
        }
        self.transitions.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn delete(&self, id: AttachmentId) -> Result<bool, AttachmentError> {
        Ok(self.tables.lock().unwrap().attachments.remove(&id).is_some())
    }

    async fn owned_session(
        &self,
        session_id: KtSessionId,
        owner: UserId,
    ) -> Result<Option<SessionRef>, AttachmentError> {
        Ok(self
            .session(session_id)
            .filter(|s| s.created_by == owner)
            .map(|s| s.to_ref()))
    }
}
