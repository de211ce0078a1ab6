//! Outbound events: the side effects an engine call produced
//!
//! The engine never dispatches notifications itself. Each mutating
//! operation returns the outbound events it produced; the caller hands
//! them to a task queue (fire-and-forget, at-least-once). Each event maps
//! to a named job with string kwargs, the contract the queue understands.

use crate::{ExternalDocId, ProcessId, SlotId, StageId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A side effect produced by an engine operation, to be enqueued by the
/// caller
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundEvent {
    /// A process was played and its stage rows materialized
    ProcessPlayed { process: ProcessId },
    /// The current stage moved forward
    StageAdvanced {
        process: ProcessId,
        stage: StageId,
        order: u32,
    },
    /// The process reached its end stage
    ProcessFinished { process: ProcessId },
    /// A document was registered against a slot
    DocumentRegistered {
        process: ProcessId,
        application: SlotId,
        document: ExternalDocId,
    },
    /// A registered document finished without a further approval round
    DocumentAutoApproved {
        process: ProcessId,
        document: ExternalDocId,
    },
    /// A slot was explicitly marked complete
    ApplicationCompleted {
        process: ProcessId,
        application: SlotId,
    },
}

impl OutboundEvent {
    /// The job name the task queue dispatches this event under
    pub fn job_name(&self) -> &'static str {
        match self {
            Self::ProcessPlayed { .. } => "process_played",
            Self::StageAdvanced { .. } => "process_stage_advanced",
            Self::ProcessFinished { .. } => "process_finished",
            Self::DocumentRegistered { .. } => "process_document_registered",
            Self::DocumentAutoApproved { .. } => "process_document_auto_approved",
            Self::ApplicationCompleted { .. } => "process_application_completed",
        }
    }

    /// The keyword arguments the job is enqueued with
    pub fn kwargs(&self) -> HashMap<String, String> {
        let mut kwargs = HashMap::new();
        match self {
            Self::ProcessPlayed { process } | Self::ProcessFinished { process } => {
                kwargs.insert("process".into(), process.to_string());
            }
            Self::StageAdvanced {
                process,
                stage,
                order,
            } => {
                kwargs.insert("process".into(), process.to_string());
                kwargs.insert("stage".into(), stage.to_string());
                kwargs.insert("order".into(), order.to_string());
            }
            Self::DocumentRegistered {
                process,
                application,
                document,
            } => {
                kwargs.insert("process".into(), process.to_string());
                kwargs.insert("application".into(), application.to_string());
                kwargs.insert("document".into(), document.to_string());
            }
            Self::DocumentAutoApproved { process, document } => {
                kwargs.insert("process".into(), process.to_string());
                kwargs.insert("document".into(), document.to_string());
            }
            Self::ApplicationCompleted {
                process,
                application,
            } => {
                kwargs.insert("process".into(), process.to_string());
                kwargs.insert("application".into(), application.to_string());
            }
        }
        kwargs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_names() {
        let event = OutboundEvent::ProcessFinished {
            process: ProcessId::new("p-1"),
        };
        assert_eq!(event.job_name(), "process_finished");
        assert_eq!(event.kwargs().get("process").unwrap(), "p-1");
    }

    #[test]
    fn test_stage_advanced_kwargs() {
        let event = OutboundEvent::StageAdvanced {
            process: ProcessId::new("p-1"),
            stage: StageId::new("s-2"),
            order: 2,
        };
        let kwargs = event.kwargs();
        assert_eq!(kwargs.get("stage").unwrap(), "s-2");
        assert_eq!(kwargs.get("order").unwrap(), "2");
    }

    #[test]
    fn test_document_registered_kwargs() {
        let event = OutboundEvent::DocumentRegistered {
            process: ProcessId::new("p-1"),
            application: SlotId::new("slot-1"),
            document: ExternalDocId::new("doc-9"),
        };
        let kwargs = event.kwargs();
        assert_eq!(kwargs.len(), 3);
        assert_eq!(kwargs.get("document").unwrap(), "doc-9");
    }
}
