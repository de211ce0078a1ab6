//! Running processes: one instance of a stage-based template
//!
//! A Process is created empty from a template snapshot, materialized into
//! stage and slot rows when played, then mutated stage-by-stage by the
//! engine until its end stage finishes it. The process exclusively owns
//! its stages, slots, registered documents, members and nothing else —
//! the documents themselves live in the external store.
//!
//! Invariant: `stage_current` is `None` iff the process is terminal or
//! has not been played yet.

use crate::{
    ActorId, ApplicationTemplate, DocumentTypeId, ExternalDocId, LinkedObjectId, ProcessDoc,
    ProcessStage, ProcessStageApplication, ProcessTemplate, SlotId, StageId, StageTemplate,
    TemplateId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ── Identifier ───────────────────────────────────────────────────────

/// Unique identifier for a running process
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessId(pub String);

impl ProcessId {
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

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Snapshot ─────────────────────────────────────────────────────────

/// The frozen copy of the template's definitions a process was expanded
/// from. Later template edits never affect a running process.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub stages: Vec<StageTemplate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_applications: Vec<ApplicationTemplate>,
}

// ── Process ──────────────────────────────────────────────────────────

/// One running workflow instance
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Process {
    /// Unique identifier
    pub id: ProcessId,
    /// Human-readable title
    pub title: String,
    /// Free-form remark
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remark: String,
    /// The template this process was expanded from
    pub template_id: TemplateId,
    /// Frozen stage/application definitions copied at expansion time
    pub snapshot: ProcessSnapshot,
    /// The business object this process is tied to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_object: Option<LinkedObjectId>,
    /// Who created the process; always a member
    pub creator: ActorId,
    /// Denormalized member set for fast permission checks
    pub members: HashSet<ActorId>,
    /// Materialized stage rows (empty until played)
    pub stages: Vec<ProcessStage>,
    /// Materialized quota slots, stage-bound and global
    pub applications: Vec<ProcessStageApplication>,
    /// Documents registered against the slots
    pub documents: Vec<ProcessDoc>,
    /// Whether the process has been played
    pub is_ready: bool,
    /// The stage currently gating advancement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_current: Option<StageId>,
    /// Whether the process reached its end stage
    pub was_done: bool,
    /// When the process finished
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_done: Option<DateTime<Utc>>,
    /// When the process was created
    pub created_at: DateTime<Utc>,
    /// When the process was last mutated
    pub updated_at: DateTime<Utc>,
}

impl Process {
    /// Create an un-played process from a template snapshot
    pub fn new(
        title: impl Into<String>,
        remark: impl Into<String>,
        template: &ProcessTemplate,
        creator: ActorId,
        linked_object: Option<LinkedObjectId>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ProcessId::generate(),
            title: title.into(),
            remark: remark.into(),
            template_id: template.id.clone(),
            snapshot: ProcessSnapshot {
                stages: template.stages.clone(),
                global_applications: template.global_applications.clone(),
            },
            linked_object,
            creator,
            members: HashSet::new(),
            stages: Vec::new(),
            applications: Vec::new(),
            documents: Vec::new(),
            is_ready: false,
            stage_current: None,
            was_done: false,
            date_done: None,
            created_at: now,
            updated_at: now,
        }
    }

    // ── Stage queries ────────────────────────────────────────────────

    /// The stage currently gating advancement
    pub fn current_stage(&self) -> Option<&ProcessStage> {
        self.stage_current.as_ref().and_then(|id| self.stage(id))
    }

    pub fn stage(&self, id: &StageId) -> Option<&ProcessStage> {
        self.stages.iter().find(|s| &s.id == id)
    }

    pub fn stage_mut(&mut self, id: &StageId) -> Option<&mut ProcessStage> {
        self.stages.iter_mut().find(|s| &s.id == id)
    }

    pub fn stage_by_order(&self, order: u32) -> Option<&ProcessStage> {
        self.stages.iter().find(|s| s.order_number == order)
    }

    /// Whether the process reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.was_done
    }

    // ── Slot queries ─────────────────────────────────────────────────

    pub fn application(&self, id: &SlotId) -> Option<&ProcessStageApplication> {
        self.applications.iter().find(|a| &a.id == id)
    }

    pub fn application_mut(&mut self, id: &SlotId) -> Option<&mut ProcessStageApplication> {
        self.applications.iter_mut().find(|a| &a.id == id)
    }

    /// All slots bound to one stage
    pub fn applications_of_stage(&self, stage: &StageId) -> Vec<&ProcessStageApplication> {
        self.applications
            .iter()
            .filter(|a| a.stage.as_ref() == Some(stage))
            .collect()
    }

    /// The stage-less slots spanning the whole process
    pub fn global_applications(&self) -> Vec<&ProcessStageApplication> {
        self.applications.iter().filter(|a| a.is_global()).collect()
    }

    /// Count of a stage's slots that are not yet done
    pub fn pending_application_count(&self, stage: &StageId) -> usize {
        self.applications
            .iter()
            .filter(|a| a.stage.as_ref() == Some(stage) && !a.was_done)
            .count()
    }

    /// The current stage's slot accepting a document type, if any
    pub fn current_application_for(
        &self,
        document_type: &DocumentTypeId,
    ) -> Option<&ProcessStageApplication> {
        let current = self.stage_current.as_ref()?;
        self.applications.iter().find(|a| {
            a.stage.as_ref() == Some(current) && &a.document_type == document_type
        })
    }

    /// Whether one more document may be registered against a slot:
    /// slots of future stages reject pre-population, then the quota's
    /// headroom decides
    pub fn can_add_new(&self, slot: &ProcessStageApplication) -> bool {
        if let Some(stage_id) = &slot.stage {
            let slot_order = self.stage(stage_id).map(|s| s.order_number);
            let current_order = self.current_stage().map(|s| s.order_number);
            if let (Some(slot_order), Some(current_order)) = (slot_order, current_order) {
                if slot_order > current_order {
                    return false;
                }
            }
        }
        slot.quota.has_headroom(slot.amount)
    }

    // ── Document queries ─────────────────────────────────────────────

    /// All documents registered against one slot
    pub fn documents_of(&self, slot: &SlotId) -> Vec<&ProcessDoc> {
        self.documents
            .iter()
            .filter(|d| &d.application == slot)
            .collect()
    }

    /// The registered row for an external document of a given type
    pub fn document_row(
        &self,
        document_type: &DocumentTypeId,
        document: &ExternalDocId,
    ) -> Option<&ProcessDoc> {
        self.documents
            .iter()
            .find(|d| &d.document_type == document_type && &d.document == document)
    }

    pub fn document_row_mut(
        &mut self,
        document_type: &DocumentTypeId,
        document: &ExternalDocId,
    ) -> Option<&mut ProcessDoc> {
        self.documents
            .iter_mut()
            .find(|d| &d.document_type == document_type && &d.document == document)
    }

    /// Recompute a slot's derived counts from its registered documents
    pub fn recount_application(&mut self, slot: &SlotId) {
        let amount = self
            .documents
            .iter()
            .filter(|d| &d.application == slot)
            .count() as u32;
        let approved = self
            .documents
            .iter()
            .filter(|d| &d.application == slot && d.is_approved())
            .count() as u32;
        if let Some(application) = self.application_mut(slot) {
            application.set_counts(amount, approved);
        }
        self.updated_at = Utc::now();
    }

    // ── Membership ───────────────────────────────────────────────────

    pub fn is_member(&self, actor: &ActorId) -> bool {
        self.members.contains(actor)
    }

    /// Add a member; returns false if already present
    pub fn add_member(&mut self, actor: ActorId) -> bool {
        let added = self.members.insert(actor);
        if added {
            self.updated_at = Utc::now();
        }
        added
    }

    /// Remove a member; the creator is never removed
    pub fn remove_member(&mut self, actor: &ActorId) -> bool {
        if actor == &self.creator {
            return false;
        }
        let removed = self.members.remove(actor);
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    // ── Mutators used by the engine ──────────────────────────────────

    pub fn set_current_stage(&mut self, stage: StageId) {
        self.stage_current = Some(stage);
        self.updated_at = Utc::now();
    }

    /// Finish the process: clear the current stage and stamp completion
    pub fn mark_done(&mut self, now: DateTime<Utc>) {
        self.stage_current = None;
        self.was_done = true;
        self.date_done = Some(now);
        self.updated_at = now;
    }
}
