//! Collaborator seams: the external systems the runtime talks to
//!
//! The runtime never owns documents, document-type configuration or the
//! notification channel. Each of those is a trait here, with an in-memory
//! implementation used in tests and single-node deployments.

use process_types::{DocumentStatus, DocumentTypeId, ExternalDocId, OutboundEvent};
use std::collections::HashMap;

// ── Document Types ───────────────────────────────────────────────────

/// Per-tenant configuration of one document type
#[derive(Clone, Debug)]
pub struct DocumentTypeInfo {
    pub id: DocumentTypeId,
    /// Whether documents of this type run their own approval workflow.
    /// Non-workflowed documents finish the moment they are registered.
    pub is_workflowed: bool,
    /// Whether this type may appear in process templates at all
    pub allows_process: bool,
}

/// Lookup of document-type configuration
pub trait DocumentTypeRegistry {
    fn get(&self, id: &DocumentTypeId) -> Option<DocumentTypeInfo>;
}

/// In-memory document-type registry
#[derive(Clone, Debug, Default)]
pub struct InMemoryDocumentTypeRegistry {
    types: HashMap<DocumentTypeId, DocumentTypeInfo>,
}

impl InMemoryDocumentTypeRegistry {
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    pub fn insert(&mut self, info: DocumentTypeInfo) {
        self.types.insert(info.id.clone(), info);
    }

    /// Convenience for the common case
    pub fn with_type(mut self, id: impl Into<String>, is_workflowed: bool) -> Self {
        let id = DocumentTypeId::new(id);
        self.insert(DocumentTypeInfo {
            id: id.clone(),
            is_workflowed,
            allows_process: true,
        });
        self
    }
}

impl DocumentTypeRegistry for InMemoryDocumentTypeRegistry {
    fn get(&self, id: &DocumentTypeId) -> Option<DocumentTypeInfo> {
        self.types.get(id).cloned()
    }
}

// ── Document Store ───────────────────────────────────────────────────

/// Read access to the external documents a process references
pub trait DocumentStore {
    /// Current workflow status of an external document, if it exists
    fn fetch_status(
        &self,
        document_type: &DocumentTypeId,
        document: &ExternalDocId,
    ) -> Option<DocumentStatus>;
}

/// In-memory document store
#[derive(Clone, Debug, Default)]
pub struct InMemoryDocumentStore {
    statuses: HashMap<(DocumentTypeId, ExternalDocId), DocumentStatus>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            statuses: HashMap::new(),
        }
    }

    pub fn set_status(
        &mut self,
        document_type: DocumentTypeId,
        document: ExternalDocId,
        status: DocumentStatus,
    ) {
        self.statuses.insert((document_type, document), status);
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn fetch_status(
        &self,
        document_type: &DocumentTypeId,
        document: &ExternalDocId,
    ) -> Option<DocumentStatus> {
        self.statuses
            .get(&(document_type.clone(), document.clone()))
            .copied()
    }
}

// ── Task Queue ───────────────────────────────────────────────────────

/// Identifier of an enqueued job
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobId(pub String);

impl JobId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fire-and-forget job dispatch, at-least-once
pub trait TaskQueue {
    fn enqueue(&mut self, job: &str, kwargs: HashMap<String, String>) -> JobId;
}

/// Hand a batch of outbound events to the queue, one job per event
pub fn dispatch_events(queue: &mut dyn TaskQueue, events: &[OutboundEvent]) -> Vec<JobId> {
    events
        .iter()
        .map(|event| {
            let id = queue.enqueue(event.job_name(), event.kwargs());
            tracing::trace!(job = %id, name = event.job_name(), "Event dispatched");
            id
        })
        .collect()
}

/// Task queue that records every enqueued job, for tests and dry runs
#[derive(Clone, Debug, Default)]
pub struct RecordingTaskQueue {
    pub jobs: Vec<(String, HashMap<String, String>)>,
}

impl RecordingTaskQueue {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    pub fn job_names(&self) -> Vec<&str> {
        self.jobs.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl TaskQueue for RecordingTaskQueue {
    fn enqueue(&mut self, job: &str, kwargs: HashMap<String, String>) -> JobId {
        self.jobs.push((job.to_string(), kwargs));
        JobId::generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use process_types::{ProcessId, SlotId};

    #[test]
    fn test_document_type_registry() {
        let registry = InMemoryDocumentTypeRegistry::new()
            .with_type("invoice", true)
            .with_type("receipt", false);

        let invoice = registry.get(&DocumentTypeId::new("invoice")).unwrap();
        assert!(invoice.is_workflowed);
        let receipt = registry.get(&DocumentTypeId::new("receipt")).unwrap();
        assert!(!receipt.is_workflowed);
        assert!(registry.get(&DocumentTypeId::new("unknown")).is_none());
    }

    #[test]
    fn test_document_store() {
        let mut store = InMemoryDocumentStore::new();
        store.set_status(
            DocumentTypeId::new("invoice"),
            ExternalDocId::new("doc-1"),
            DocumentStatus::Finish,
        );

        assert_eq!(
            store.fetch_status(&DocumentTypeId::new("invoice"), &ExternalDocId::new("doc-1")),
            Some(DocumentStatus::Finish)
        );
        assert!(store
            .fetch_status(&DocumentTypeId::new("invoice"), &ExternalDocId::new("doc-2"))
            .is_none());
    }

    #[test]
    fn test_dispatch_events() {
        let mut queue = RecordingTaskQueue::new();
        let events = vec![
            OutboundEvent::ProcessPlayed {
                process: ProcessId::new("p-1"),
            },
            OutboundEvent::ApplicationCompleted {
                process: ProcessId::new("p-1"),
                application: SlotId::new("slot-1"),
            },
        ];

        let ids = dispatch_events(&mut queue, &events);
        assert_eq!(ids.len(), 2);
        assert_eq!(
            queue.job_names(),
            vec!["process_played", "process_application_completed"]
        );
        assert_eq!(queue.jobs[1].1.get("application").unwrap(), "slot-1");
    }
}
