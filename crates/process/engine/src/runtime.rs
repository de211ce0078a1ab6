//! Process runtime: the single entry point for all process mutations
//!
//! The runtime owns the template registry, the running processes and the
//! activity log, and talks to the external world through the collaborator
//! traits. Every mutating operation validates fully before touching any
//! state, then applies its writes, records activity, and returns the
//! outbound events it produced; the caller decides when and where to
//! dispatch them.

use crate::{
    ActivityLog, DocumentTypeRegistry, DocumentStore, MembershipGuard, StageControl,
    TemplateRegistry,
};
use chrono::{DateTime, Utc};
use process_types::{
    ActorId, DocumentStatus, DocumentTypeId, ExternalDocId, LinkedObjectId, OutboundEvent,
    Process, ProcessDoc, ProcessDocId, ProcessError, ProcessId, ProcessResult, ProcessStage,
    ProcessStageApplication, ProcessTemplate, SlotId, StageId, TemplateId,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

// ── Outcomes ─────────────────────────────────────────────────────────

/// Result of playing a process
#[derive(Clone, Debug, Serialize)]
pub struct PlayOutcome {
    pub process: ProcessId,
    /// Where the cascade settled; `None` means the process finished
    /// immediately
    pub current_stage: Option<StageId>,
    pub events: Vec<OutboundEvent>,
}

/// Result of a document registration
#[derive(Clone, Debug, Serialize)]
pub struct RegistrationOutcome {
    /// The registered row; `None` means the registration was silently
    /// ignored (non-member actor)
    pub document: Option<ProcessDocId>,
    /// Whether the document finished without an approval round
    pub auto_approved: bool,
    pub events: Vec<OutboundEvent>,
}

impl RegistrationOutcome {
    fn denied() -> Self {
        Self {
            document: None,
            auto_approved: false,
            events: Vec::new(),
        }
    }

    pub fn registered(&self) -> bool {
        self.document.is_some()
    }
}

/// Result of a status sync
#[derive(Clone, Debug, Serialize)]
pub struct SyncOutcome {
    /// Whether the document was registered in this process at all
    pub matched: bool,
    pub events: Vec<OutboundEvent>,
}

impl SyncOutcome {
    fn unmatched() -> Self {
        Self {
            matched: false,
            events: Vec::new(),
        }
    }
}

/// Result of an explicit slot completion
#[derive(Clone, Debug, Serialize)]
pub struct CompletionOutcome {
    pub events: Vec<OutboundEvent>,
}

/// Result of mirroring the linked object's member list
#[derive(Clone, Debug, Default, Serialize)]
pub struct MemberSync {
    pub added: Vec<ActorId>,
    pub removed: Vec<ActorId>,
}

// ── Runtime ──────────────────────────────────────────────────────────

/// The process runtime
pub struct ProcessRuntime<R: DocumentTypeRegistry, S: DocumentStore> {
    templates: TemplateRegistry,
    processes: HashMap<ProcessId, Process>,
    activity: ActivityLog,
    stage_control: StageControl,
    membership: MembershipGuard,
    document_types: R,
    document_store: S,
}

impl<R: DocumentTypeRegistry, S: DocumentStore> ProcessRuntime<R, S> {
    pub fn new(document_types: R, document_store: S) -> Self {
        Self {
            templates: TemplateRegistry::new(),
            processes: HashMap::new(),
            activity: ActivityLog::new(),
            stage_control: StageControl::new(),
            membership: MembershipGuard::new(),
            document_types,
            document_store,
        }
    }

    // ── Templates ────────────────────────────────────────────────────

    /// Validate and register a template. Beyond structural validation,
    /// every referenced document type that the registry knows about must
    /// allow process use.
    pub fn register_template(&mut self, template: ProcessTemplate) -> ProcessResult<TemplateId> {
        let applications = template
            .stages
            .iter()
            .flat_map(|s| s.applications.iter())
            .chain(template.global_applications.iter());
        for application in applications {
            if let Some(info) = self.document_types.get(&application.document_type) {
                if !info.allows_process {
                    return Err(ProcessError::InvalidTemplate(format!(
                        "document type '{}' does not allow process use",
                        application.document_type
                    )));
                }
            }
        }
        self.templates.register(template)
    }

    pub fn template(&self, id: &TemplateId) -> ProcessResult<&ProcessTemplate> {
        self.templates.get(id)
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    pub fn templates_mut(&mut self) -> &mut TemplateRegistry {
        &mut self.templates
    }

    // ── Expansion and play ───────────────────────────────────────────

    /// Expand a template into a new, un-played process. The template's
    /// activation window is checked against the clock here; structure
    /// was already checked at registration.
    pub fn expand_template(
        &mut self,
        template_id: &TemplateId,
        title: impl Into<String>,
        remark: impl Into<String>,
        creator: ActorId,
        linked_object: Option<LinkedObjectId>,
    ) -> ProcessResult<ProcessId> {
        let template = self.templates.get(template_id)?;
        template.usable_at(Utc::now())?;

        let process = Process::new(title, remark, template, creator, linked_object);
        let id = process.id.clone();
        tracing::info!(
            process = %id.short(),
            template = %template_id.short(),
            "Process expanded"
        );
        self.processes.insert(id.clone(), process);
        Ok(id)
    }

    /// Materialize the snapshot into stage and slot rows and start the
    /// cascade. The start stage carries no slots, so playing always
    /// advances at least one order.
    pub fn play(&mut self, process_id: &ProcessId) -> ProcessResult<PlayOutcome> {
        let process = self
            .processes
            .get_mut(process_id)
            .ok_or_else(|| ProcessError::ProcessNotFound(process_id.clone()))?;
        if process.is_ready {
            return Err(ProcessError::AlreadyPlayed(process_id.clone()));
        }

        let snapshot = process.snapshot.clone();
        for (i, stage_def) in snapshot.stages.iter().enumerate() {
            let order = (i + 1) as u32;
            let stage = match stage_def.system_code {
                Some(code) => ProcessStage::system(code, stage_def.title.clone(), order),
                None => ProcessStage::new(stage_def.title.clone(), order),
            }
            .with_remark(stage_def.remark.clone());
            for (j, app_def) in stage_def.applications.iter().enumerate() {
                process.applications.push(
                    ProcessStageApplication::new(
                        Some(stage.id.clone()),
                        app_def.document_type.clone(),
                        app_def.title.clone(),
                        app_def.quota.clone(),
                        (j + 1) as u32,
                    )
                    .with_remark(app_def.remark.clone()),
                );
            }
            process.stages.push(stage);
        }
        for (j, app_def) in snapshot.global_applications.iter().enumerate() {
            process.applications.push(
                ProcessStageApplication::new(
                    None,
                    app_def.document_type.clone(),
                    app_def.title.clone(),
                    app_def.quota.clone(),
                    (j + 1) as u32,
                )
                .with_remark(app_def.remark.clone()),
            );
        }

        let first = process
            .stages
            .first()
            .map(|s| s.id.clone())
            .ok_or_else(|| {
                ProcessError::InvalidTemplate("snapshot has no stages".into())
            })?;
        let creator = process.creator.clone();
        process.add_member(creator.clone());
        process.is_ready = true;
        process.set_current_stage(first.clone());
        tracing::info!(process = %process_id.short(), "Process played");

        self.activity.record_init(process_id, &first, &creator);
        let mut events = vec![OutboundEvent::ProcessPlayed {
            process: process_id.clone(),
        }];
        self.cascade(process_id, None, &mut events)?;

        let current_stage = self
            .processes
            .get(process_id)
            .and_then(|p| p.stage_current.clone());
        Ok(PlayOutcome {
            process: process_id.clone(),
            current_stage,
            events,
        })
    }

    // ── Registration ─────────────────────────────────────────────────

    /// The current stage's slot accepting a document type
    pub fn resolve_application(
        &self,
        process_id: &ProcessId,
        document_type: &DocumentTypeId,
    ) -> ProcessResult<&ProcessStageApplication> {
        let process = self.get(process_id)?;
        if !process.is_ready {
            return Err(ProcessError::ProcessNotReady(process_id.clone()));
        }
        process
            .current_application_for(document_type)
            .ok_or_else(|| ProcessError::ApplicationNotSupported(document_type.clone()))
    }

    /// Full pre-registration check, surfacing each failure as an error.
    /// `linked_object` is the business object the candidate document is
    /// tied to, which must match the process's.
    ///
    /// Slots live inside their process, so a slot the process does not
    /// own surfaces as `ApplicationNotFound`; `ApplicationNotSupported`
    /// is reserved for document-type mismatches against a known slot.
    pub fn validate_registration(
        &self,
        process_id: &ProcessId,
        slot_id: &SlotId,
        actor: &ActorId,
        linked_object: Option<&LinkedObjectId>,
    ) -> ProcessResult<()> {
        let process = self.get(process_id)?;
        if !process.is_ready {
            return Err(ProcessError::ProcessNotReady(process_id.clone()));
        }
        if process.is_terminal() {
            return Err(ProcessError::AlreadyFinished);
        }
        self.membership.require_member(process, actor)?;
        let slot = process
            .application(slot_id)
            .ok_or_else(|| ProcessError::ApplicationNotFound(slot_id.clone()))?;
        if process.linked_object.as_ref() != linked_object {
            return Err(ProcessError::LinkedObjectMismatch);
        }
        if !process.can_add_new(slot) {
            return Err(ProcessError::QuotaFull(slot_id.clone()));
        }
        Ok(())
    }

    /// Register an external document against a slot.
    ///
    /// A non-member actor is a silent no-op: the outcome carries no
    /// document, no events, and nothing was written. All other failures
    /// error before any state changes. Documents of a non-workflowed
    /// type finish immediately and may cascade the stage forward in the
    /// same call.
    #[allow(clippy::too_many_arguments)]
    pub fn register_document(
        &mut self,
        process_id: &ProcessId,
        slot_id: &SlotId,
        document_type: &DocumentTypeId,
        document: &ExternalDocId,
        title: &str,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> ProcessResult<RegistrationOutcome> {
        {
            let process = self.get(process_id)?;
            if !process.is_ready {
                return Err(ProcessError::ProcessNotReady(process_id.clone()));
            }
            if process.is_terminal() {
                return Err(ProcessError::AlreadyFinished);
            }
            if !self.membership.is_member(process, actor) {
                tracing::info!(
                    process = %process_id.short(),
                    actor = %actor,
                    "Registration ignored for non-member"
                );
                return Ok(RegistrationOutcome::denied());
            }
            let slot = process
                .application(slot_id)
                .ok_or_else(|| ProcessError::ApplicationNotFound(slot_id.clone()))?;
            if &slot.document_type != document_type {
                return Err(ProcessError::ApplicationNotSupported(document_type.clone()));
            }
            if !process.can_add_new(slot) {
                return Err(ProcessError::QuotaFull(slot_id.clone()));
            }
        }

        // Unknown types default to workflowed: they must earn approval
        let workflowed = self
            .document_types
            .get(document_type)
            .map(|info| info.is_workflowed)
            .unwrap_or(true);
        let status = if workflowed {
            DocumentStatus::Created
        } else {
            DocumentStatus::Finish
        };

        let process = self
            .processes
            .get_mut(process_id)
            .ok_or_else(|| ProcessError::ProcessNotFound(process_id.clone()))?;
        let doc = ProcessDoc::new(
            slot_id.clone(),
            document_type.clone(),
            document.clone(),
            status,
            now,
        );
        let doc_id = doc.id.clone();
        process.documents.push(doc);
        process.recount_application(slot_id);

        self.activity
            .record_document_registered(process_id, slot_id, &doc_id, title, actor);
        let mut events = vec![OutboundEvent::DocumentRegistered {
            process: process_id.clone(),
            application: slot_id.clone(),
            document: document.clone(),
        }];
        let auto_approved = !workflowed;
        if auto_approved {
            self.activity.record_auto_approved(process_id, slot_id, &doc_id);
            events.push(OutboundEvent::DocumentAutoApproved {
                process: process_id.clone(),
                document: document.clone(),
            });
        }
        tracing::info!(
            process = %process_id.short(),
            slot = %slot_id.short(),
            document = %document,
            auto_approved,
            "Document registered"
        );
        self.cascade(process_id, Some(slot_id), &mut events)?;

        Ok(RegistrationOutcome {
            document: Some(doc_id),
            auto_approved,
            events,
        })
    }

    // ── Status sync ──────────────────────────────────────────────────

    /// Mirror an external document's status change into the process.
    ///
    /// With `status` absent the document store is consulted. A document
    /// not registered in this process yields an unmatched outcome, not
    /// an error; the external flows fire blindly. A registered document
    /// whose status cannot be resolved is still a match, just one with
    /// nothing to apply. `skip_cascade` defers the stage check, for
    /// bulk flows that run it once at the end.
    pub fn sync_document_status(
        &mut self,
        process_id: &ProcessId,
        document_type: &DocumentTypeId,
        document: &ExternalDocId,
        status: Option<DocumentStatus>,
        now: DateTime<Utc>,
        skip_cascade: bool,
    ) -> ProcessResult<SyncOutcome> {
        let process = self.get(process_id)?;
        let slot_id = match process.document_row(document_type, document) {
            Some(row) => row.application.clone(),
            None => return Ok(SyncOutcome::unmatched()),
        };
        let status = match status {
            Some(status) => status,
            None => match self.document_store.fetch_status(document_type, document) {
                Some(status) => status,
                // Registered here, but the store has nothing newer
                None => {
                    return Ok(SyncOutcome {
                        matched: true,
                        events: Vec::new(),
                    })
                }
            },
        };

        let process = self
            .processes
            .get_mut(process_id)
            .ok_or_else(|| ProcessError::ProcessNotFound(process_id.clone()))?;
        if let Some(row) = process.document_row_mut(document_type, document) {
            row.push_status(status, now);
        }
        process.recount_application(&slot_id);
        tracing::trace!(
            process = %process_id.short(),
            document = %document,
            status = %status,
            "Document status synced"
        );

        let mut events = Vec::new();
        if !skip_cascade {
            self.cascade(process_id, Some(&slot_id), &mut events)?;
        }
        Ok(SyncOutcome {
            matched: true,
            events,
        })
    }

    /// Run the stage check without any other mutation, completing any
    /// deferred cascade from earlier `skip_cascade` syncs
    pub fn check_stages(&mut self, process_id: &ProcessId) -> ProcessResult<Vec<OutboundEvent>> {
        let process = self.get(process_id)?;
        let slots: Vec<SlotId> = process
            .current_stage()
            .map(|stage| {
                process
                    .applications_of_stage(&stage.id)
                    .iter()
                    .map(|s| s.id.clone())
                    .collect()
            })
            .unwrap_or_default();

        let mut events = Vec::new();
        for slot_id in &slots {
            self.cascade(process_id, Some(slot_id), &mut events)?;
        }
        if slots.is_empty() {
            self.cascade(process_id, None, &mut events)?;
        }
        Ok(events)
    }

    // ── Explicit completion ──────────────────────────────────────────

    /// Explicitly finish a slot whose upper bound cannot decide for it.
    /// Requires the quota minimum to be met by approved documents.
    pub fn complete_application(
        &mut self,
        process_id: &ProcessId,
        slot_id: &SlotId,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> ProcessResult<CompletionOutcome> {
        {
            let process = self.get(process_id)?;
            if !process.is_ready {
                return Err(ProcessError::ProcessNotReady(process_id.clone()));
            }
            if process.is_terminal() {
                return Err(ProcessError::AlreadyFinished);
            }
            self.membership.require_member(process, actor)?;
            let slot = process
                .application(slot_id)
                .ok_or_else(|| ProcessError::ApplicationNotFound(slot_id.clone()))?;
            if slot.was_done {
                return Err(ProcessError::SlotAlreadyCompleted(slot_id.clone()));
            }
            if !slot.manually_completable() {
                return Err(ProcessError::QuotaNotMet(slot_id.clone()));
            }
        }

        let process = self
            .processes
            .get_mut(process_id)
            .ok_or_else(|| ProcessError::ProcessNotFound(process_id.clone()))?;
        if let Some(slot) = process.application_mut(slot_id) {
            slot.mark_done(now);
        }
        self.activity
            .record_application_completed(process_id, slot_id, actor);
        tracing::info!(
            process = %process_id.short(),
            slot = %slot_id.short(),
            "Application completed"
        );
        let mut events = vec![OutboundEvent::ApplicationCompleted {
            process: process_id.clone(),
            application: slot_id.clone(),
        }];
        self.cascade(process_id, None, &mut events)?;
        Ok(CompletionOutcome { events })
    }

    // ── Membership ───────────────────────────────────────────────────

    /// Mirror the linked object's member list into the process. The
    /// creator is always retained regardless of the incoming list.
    pub fn sync_members(
        &mut self,
        process_id: &ProcessId,
        members: &[ActorId],
    ) -> ProcessResult<MemberSync> {
        let process = self
            .processes
            .get_mut(process_id)
            .ok_or_else(|| ProcessError::ProcessNotFound(process_id.clone()))?;

        let target: HashSet<ActorId> = members
            .iter()
            .cloned()
            .chain(std::iter::once(process.creator.clone()))
            .collect();
        let current: Vec<ActorId> = process.members.iter().cloned().collect();

        let mut added = Vec::new();
        let mut removed = Vec::new();
        for actor in &target {
            if process.add_member(actor.clone()) {
                added.push(actor.clone());
            }
        }
        for actor in current {
            if !target.contains(&actor) && process.remove_member(&actor) {
                removed.push(actor);
            }
        }
        added.sort_by(|a, b| a.0.cmp(&b.0));
        removed.sort_by(|a, b| a.0.cmp(&b.0));

        for actor in &added {
            self.activity.record_member_added(process_id, actor);
        }
        for actor in &removed {
            self.activity.record_member_removed(process_id, actor);
        }
        if !added.is_empty() || !removed.is_empty() {
            tracing::info!(
                process = %process_id.short(),
                added = added.len(),
                removed = removed.len(),
                "Members synced"
            );
        }
        Ok(MemberSync { added, removed })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn get_process(&self, id: &ProcessId) -> ProcessResult<&Process> {
        self.get(id)
    }

    /// Processes that were played and have not finished
    pub fn active_processes(&self) -> Vec<&Process> {
        self.processes
            .values()
            .filter(|p| p.is_ready && !p.was_done)
            .collect()
    }

    /// Processes tied to one business object
    pub fn processes_for_object(&self, linked_object: &LinkedObjectId) -> Vec<&Process> {
        self.processes
            .values()
            .filter(|p| p.linked_object.as_ref() == Some(linked_object))
            .collect()
    }

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// Audit trail for one process, oldest first
    pub fn activity_for(&self, id: &ProcessId) -> Vec<&process_types::ProcessActivity> {
        self.activity.entries_for(id)
    }

    // ── Internals ────────────────────────────────────────────────────

    fn get(&self, id: &ProcessId) -> ProcessResult<&Process> {
        self.processes
            .get(id)
            .ok_or_else(|| ProcessError::ProcessNotFound(id.clone()))
    }

    fn cascade(
        &mut self,
        process_id: &ProcessId,
        from_slot: Option<&SlotId>,
        events: &mut Vec<OutboundEvent>,
    ) -> ProcessResult<bool> {
        let Self {
            processes,
            activity,
            stage_control,
            ..
        } = self;
        let process = processes
            .get_mut(process_id)
            .ok_or_else(|| ProcessError::ProcessNotFound(process_id.clone()))?;
        stage_control.check_current_stage(process, from_slot, activity, events)
    }
}
