//! Error types for the process layer

use crate::{ActorId, DocumentTypeId, ProcessId, SlotId, StageId, TemplateId};

/// Errors that can occur in process operations
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Process template not found: {0}")]
    TemplateNotFound(TemplateId),

    #[error("Process template is deactivated: {0}")]
    TemplateDeactivated(TemplateId),

    #[error("Process template is outside its active window: {0}")]
    TemplateNotInWindow(TemplateId),

    #[error("Invalid process template: {0}")]
    InvalidTemplate(String),

    #[error("Process not found: {0}")]
    ProcessNotFound(ProcessId),

    #[error("Process has not been played yet: {0}")]
    ProcessNotReady(ProcessId),

    #[error("Process has already been played: {0}")]
    AlreadyPlayed(ProcessId),

    #[error("Process already finished")]
    AlreadyFinished,

    #[error("Stage not found: {0}")]
    StageNotFound(StageId),

    #[error("Broken stage sequence: no stage follows order {after}")]
    BrokenStageSequence { after: u32 },

    #[error("Application not supported here: {0}")]
    ApplicationNotSupported(DocumentTypeId),

    #[error("Application slot not found: {0}")]
    ApplicationNotFound(SlotId),

    #[error("Document is linked to a different business object")]
    LinkedObjectMismatch,

    #[error("Quota full for application slot: {0}")]
    QuotaFull(SlotId),

    #[error("Quota minimum not met for application slot: {0}")]
    QuotaNotMet(SlotId),

    #[error("Application slot already completed: {0}")]
    SlotAlreadyCompleted(SlotId),

    #[error("Actor is not a member of the process: {0}")]
    PermissionDenied(ActorId),
}

/// Result type alias for process operations
pub type ProcessResult<T> = Result<T, ProcessError>;
