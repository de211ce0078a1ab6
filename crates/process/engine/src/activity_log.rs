//! Activity log: records every transition the engine performs
//!
//! The log is append-only and indexed by process. Recording never fails
//! and never aborts the transition it documents; it happens in the same
//! mutation path, so a rolled-back operation leaves no orphaned entries.

use process_types::{ActivityCode, ActorId, ProcessActivity, ProcessDocId, ProcessId, SlotId, StageId};
use std::collections::HashMap;

/// Append-only audit trail for all processes the runtime owns
#[derive(Clone, Debug, Default)]
pub struct ActivityLog {
    /// Entries indexed by process ID
    entries: HashMap<ProcessId, Vec<ProcessActivity>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Append an entry
    pub fn record(&mut self, process: &ProcessId, activity: ProcessActivity) {
        tracing::trace!(
            process = %process,
            code = %activity.code,
            "Activity recorded"
        );
        self.entries.entry(process.clone()).or_default().push(activity);
    }

    /// Record a process being played
    pub fn record_init(&mut self, process: &ProcessId, stage: &StageId, actor: &ActorId) {
        self.record(
            process,
            ProcessActivity::new(ActivityCode::InitProcess, "Process played")
                .with_stage(stage.clone())
                .with_actor(actor.clone()),
        );
    }

    /// Record a document registration
    pub fn record_document_registered(
        &mut self,
        process: &ProcessId,
        application: &SlotId,
        document: &ProcessDocId,
        title: &str,
        actor: &ActorId,
    ) {
        self.record(
            process,
            ProcessActivity::new(ActivityCode::RegisterDocument, title)
                .with_application(application.clone())
                .with_document(document.clone())
                .with_actor(actor.clone()),
        );
    }

    /// Record a document finishing without a further approval round
    pub fn record_auto_approved(
        &mut self,
        process: &ProcessId,
        application: &SlotId,
        document: &ProcessDocId,
    ) {
        self.record(
            process,
            ProcessActivity::new(ActivityCode::AutoApproved, "Document auto-approved")
                .with_application(application.clone())
                .with_document(document.clone()),
        );
    }

    /// Record a slot explicitly marked complete
    pub fn record_application_completed(
        &mut self,
        process: &ProcessId,
        application: &SlotId,
        actor: &ActorId,
    ) {
        self.record(
            process,
            ProcessActivity::new(ActivityCode::ApplicationCompleted, "Application completed")
                .with_application(application.clone())
                .with_actor(actor.clone()),
        );
    }

    /// Record the current stage moving forward
    pub fn record_next_stage(&mut self, process: &ProcessId, stage: &StageId) {
        self.record(
            process,
            ProcessActivity::new(ActivityCode::NextStages, "Stage advanced")
                .with_stage(stage.clone()),
        );
    }

    /// Record the process reaching its end stage
    pub fn record_finish(&mut self, process: &ProcessId, stage: &StageId) {
        self.record(
            process,
            ProcessActivity::new(ActivityCode::FinishStages, "Process finished")
                .with_stage(stage.clone()),
        );
    }

    /// Record a member mirrored in from the linked business object
    pub fn record_member_added(&mut self, process: &ProcessId, actor: &ActorId) {
        self.record(
            process,
            ProcessActivity::new(ActivityCode::MemberAdded, "Member added")
                .with_actor(actor.clone()),
        );
    }

    /// Record a member mirrored out
    pub fn record_member_removed(&mut self, process: &ProcessId, actor: &ActorId) {
        self.record(
            process,
            ProcessActivity::new(ActivityCode::MemberRemoved, "Member removed")
                .with_actor(actor.clone()),
        );
    }

    // ── Query methods ────────────────────────────────────────────────

    /// All entries for a process, oldest first
    pub fn entries_for(&self, process: &ProcessId) -> Vec<&ProcessActivity> {
        self.entries
            .get(process)
            .map(|v| v.iter().collect())
            .unwrap_or_default()
    }

    /// Entry count for a process
    pub fn count_for(&self, process: &ProcessId) -> usize {
        self.entries.get(process).map(|v| v.len()).unwrap_or(0)
    }

    /// Entries for a process carrying a given code
    pub fn entries_with_code(
        &self,
        process: &ProcessId,
        code: ActivityCode,
    ) -> Vec<&ProcessActivity> {
        self.entries_for(process)
            .into_iter()
            .filter(|a| a.code == code)
            .collect()
    }

    /// Drop a process's entries (for cleanup)
    pub fn clear(&mut self, process: &ProcessId) {
        self.entries.remove(process);
    }

    /// Total entries across all processes
    pub fn total_entries(&self) -> usize {
        self.entries.values().map(|v| v.len()).sum()
    }
}
