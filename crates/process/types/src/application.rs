//! Application slots: a (stage, document type) pairing with a quota
//!
//! A slot counts the documents of one type registered against a stage.
//! `amount` and `amount_approved` are derived counts maintained by the
//! engine; `was_done` is the authoritative completion flag, while
//! `created_full` is an advisory cache of "the upper bound is reached".
//! A slot with no stage is a global slot spanning the whole process.

use crate::{DocumentTypeId, Quota, StageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Identifier ───────────────────────────────────────────────────────

/// Unique identifier for an application slot
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId(pub String);

impl SlotId {
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

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Application Slot ─────────────────────────────────────────────────

/// A quota slot: one document type's requirement within a process
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessStageApplication {
    /// Unique identifier
    pub id: SlotId,
    /// The stage this slot gates; `None` means a global slot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageId>,
    /// The document type this slot accepts
    pub document_type: DocumentTypeId,
    /// Human-readable title
    pub title: String,
    /// Free-form remark
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remark: String,
    /// The required document-count range
    pub quota: Quota,
    /// Count of registered documents (derived)
    pub amount: u32,
    /// Count of registered documents in an approved status (derived)
    pub amount_approved: u32,
    /// Advisory cache: the upper bound is reached
    pub created_full: bool,
    /// Authoritative completion flag
    pub was_done: bool,
    /// When the slot completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_done: Option<DateTime<Utc>>,
    /// Position among the slots of its stage, 1-based
    pub order_number: u32,
}

impl ProcessStageApplication {
    pub fn new(
        stage: Option<StageId>,
        document_type: DocumentTypeId,
        title: impl Into<String>,
        quota: Quota,
        order_number: u32,
    ) -> Self {
        Self {
            id: SlotId::generate(),
            stage,
            document_type,
            title: title.into(),
            remark: String::new(),
            quota,
            amount: 0,
            amount_approved: 0,
            created_full: false,
            was_done: false,
            date_done: None,
            order_number,
        }
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    /// Whether this slot spans the whole process rather than one stage
    pub fn is_global(&self) -> bool {
        self.stage.is_none()
    }

    /// Whether the approved count has auto-completed this slot.
    /// Unbounded slots report their current flag unchanged — they only
    /// finish through the explicit completion path.
    pub fn auto_completes(&self) -> bool {
        if self.quota.is_unbounded() {
            return self.was_done;
        }
        self.quota.satisfied_by(self.amount_approved)
    }

    /// Whether an explicit "mark complete" action may finish this slot
    pub fn manually_completable(&self) -> bool {
        !self.was_done && self.quota.meets_minimum(self.amount_approved)
    }

    /// Update the derived counts and the advisory fullness cache
    pub fn set_counts(&mut self, amount: u32, approved: u32) {
        self.amount = amount;
        self.amount_approved = approved;
        self.created_full = !self.quota.has_headroom(amount);
    }

    /// Mark the slot done with a completion timestamp
    pub fn mark_done(&mut self, now: DateTime<Utc>) {
        self.was_done = true;
        self.date_done = Some(now);
    }
}
