//! Process Engine for Procesio
//!
//! The runtime that drives quota-gated stage sequences: templates are
//! registered and validated, expanded into processes, played, and then
//! moved forward document by document. Advancement is one-directional —
//! a stage holds while any of its quota slots is open, and closing the
//! last one cascades the process as far as the remaining stages allow,
//! possibly all the way to the end.
//!
//! # Architecture
//!
//! - [`ProcessRuntime`]: The single entry point; owns templates,
//!   processes and the activity log.
//! - [`StageControl`]: The bounded cascade that re-evaluates the current
//!   stage after every relevant mutation.
//! - [`MembershipGuard`]: Gates actor-initiated mutations on the
//!   process's member set.
//! - [`ActivityLog`]: Append-only audit trail of every transition.
//! - Collaborator traits ([`DocumentTypeRegistry`], [`DocumentStore`],
//!   [`TaskQueue`]): the seams to the surrounding system, with in-memory
//!   implementations for tests and single-node use.
//!
//! Mutating operations return the [`OutboundEvent`]s they produced
//! instead of dispatching anything themselves; hand them to a
//! [`TaskQueue`] via [`dispatch_events`] when the surrounding
//! transaction has committed.
//!
//! [`OutboundEvent`]: process_types::OutboundEvent

#![deny(unsafe_code)]

mod activity_log;
mod collaborators;
mod membership;
mod runtime;
mod stage_control;
mod template_registry;

pub use activity_log::ActivityLog;
pub use collaborators::{
    dispatch_events, DocumentStore, DocumentTypeInfo, DocumentTypeRegistry,
    InMemoryDocumentStore, InMemoryDocumentTypeRegistry, JobId, RecordingTaskQueue, TaskQueue,
};
pub use membership::MembershipGuard;
pub use runtime::{
    CompletionOutcome, MemberSync, PlayOutcome, ProcessRuntime, RegistrationOutcome, SyncOutcome,
};
pub use stage_control::StageControl;
pub use template_registry::TemplateRegistry;
