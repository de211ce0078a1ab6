//! Registered documents and their status history
//!
//! A ProcessDoc ties an external document to the quota slot it consumes.
//! The document itself lives in the external store; the runtime keeps the
//! relation, the last synced status, and an append-only status history.

use crate::{DocumentTypeId, ExternalDocId, SlotId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Identifier ───────────────────────────────────────────────────────

/// Unique identifier for a registered document row
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessDocId(pub String);

impl ProcessDocId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for ProcessDocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Document Status ──────────────────────────────────────────────────

/// System status of a registered document, mirroring the external
/// document's workflow state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Draft,
    Created,
    Added,
    Finish,
    Cancel,
    Approved,
}

impl DocumentStatus {
    /// The legacy small-int encoding of this status
    pub fn code(&self) -> u8 {
        match self {
            Self::Draft => 0,
            Self::Created => 1,
            Self::Added => 2,
            Self::Finish => 3,
            Self::Cancel => 4,
            Self::Approved => 5,
        }
    }

    /// Whether this status counts toward a slot's approved amount
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Finish | Self::Approved)
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Created => write!(f, "created"),
            Self::Added => write!(f, "added"),
            Self::Finish => write!(f, "finish"),
            Self::Cancel => write!(f, "cancel"),
            Self::Approved => write!(f, "approved"),
        }
    }
}

/// One entry in a document's append-only status history
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: DocumentStatus,
    pub at: DateTime<Utc>,
}

// ── Process Doc ──────────────────────────────────────────────────────

/// One external document registered against a quota slot
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessDoc {
    /// Unique identifier
    pub id: ProcessDocId,
    /// The slot whose quota this document consumes
    pub application: SlotId,
    /// The document type, kept for status-sync matching
    pub document_type: DocumentTypeId,
    /// The external document this row represents (non-owning)
    pub document: ExternalDocId,
    /// Last synced status
    pub system_status: DocumentStatus,
    /// Append-only ordered status history
    pub date_status: Vec<StatusEntry>,
}

impl ProcessDoc {
    pub fn new(
        application: SlotId,
        document_type: DocumentTypeId,
        document: ExternalDocId,
        status: DocumentStatus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ProcessDocId::generate(),
            application,
            document_type,
            document,
            system_status: status,
            date_status: vec![StatusEntry { status, at: now }],
        }
    }

    /// Append a status transition and make it current
    pub fn push_status(&mut self, status: DocumentStatus, now: DateTime<Utc>) {
        self.system_status = status;
        self.date_status.push(StatusEntry { status, at: now });
    }

    /// Whether the document currently counts as approved
    pub fn is_approved(&self) -> bool {
        self.system_status.is_approved()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_doc() -> ProcessDoc {
        ProcessDoc::new(
            SlotId::generate(),
            DocumentTypeId::new("invoice"),
            ExternalDocId::new("doc-1"),
            DocumentStatus::Created,
            Utc::now(),
        )
    }

    #[test]
    fn test_new_doc_has_initial_history() {
        let doc = make_doc();
        assert_eq!(doc.system_status, DocumentStatus::Created);
        assert_eq!(doc.date_status.len(), 1);
        assert!(!doc.is_approved());
    }

    #[test]
    fn test_push_status_appends() {
        let mut doc = make_doc();
        doc.push_status(DocumentStatus::Added, Utc::now());
        doc.push_status(DocumentStatus::Finish, Utc::now());

        assert_eq!(doc.system_status, DocumentStatus::Finish);
        assert_eq!(doc.date_status.len(), 3);
        assert!(doc.is_approved());
        // History keeps the earlier entries in order
        assert_eq!(doc.date_status[0].status, DocumentStatus::Created);
        assert_eq!(doc.date_status[1].status, DocumentStatus::Added);
    }

    #[test]
    fn test_approved_set() {
        assert!(DocumentStatus::Finish.is_approved());
        assert!(DocumentStatus::Approved.is_approved());
        assert!(!DocumentStatus::Draft.is_approved());
        assert!(!DocumentStatus::Created.is_approved());
        assert!(!DocumentStatus::Added.is_approved());
        assert!(!DocumentStatus::Cancel.is_approved());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(DocumentStatus::Draft.code(), 0);
        assert_eq!(DocumentStatus::Created.code(), 1);
        assert_eq!(DocumentStatus::Added.code(), 2);
        assert_eq!(DocumentStatus::Finish.code(), 3);
        assert_eq!(DocumentStatus::Cancel.code(), 4);
        assert_eq!(DocumentStatus::Approved.code(), 5);
    }
}
