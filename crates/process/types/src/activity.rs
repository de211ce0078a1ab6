//! Process activity: the append-only audit trail
//!
//! Every transition the engine performs leaves an activity record. Records
//! are never mutated after creation; the codes keep their legacy
//! SCREAMING_SNAKE spellings on the wire.

use crate::{ActorId, ProcessDocId, SlotId, StageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of transition an activity record documents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityCode {
    #[serde(rename = "INIT_PROCESS")]
    InitProcess,
    #[serde(rename = "REGISTER_DOCUMENT")]
    RegisterDocument,
    #[serde(rename = "AUTO_APPROVED")]
    AutoApproved,
    #[serde(rename = "NEXT_STAGES")]
    NextStages,
    #[serde(rename = "FINISH_STAGES")]
    FinishStages,
    #[serde(rename = "APPLICATION_COMPLETED")]
    ApplicationCompleted,
    #[serde(rename = "MEMBER_ADDED")]
    MemberAdded,
    #[serde(rename = "MEMBER_REMOVED")]
    MemberRemoved,
}

impl std::fmt::Display for ActivityCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::InitProcess => "INIT_PROCESS",
            Self::RegisterDocument => "REGISTER_DOCUMENT",
            Self::AutoApproved => "AUTO_APPROVED",
            Self::NextStages => "NEXT_STAGES",
            Self::FinishStages => "FINISH_STAGES",
            Self::ApplicationCompleted => "APPLICATION_COMPLETED",
            Self::MemberAdded => "MEMBER_ADDED",
            Self::MemberRemoved => "MEMBER_REMOVED",
        };
        write!(f, "{}", text)
    }
}

/// One immutable entry in a process's audit trail
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessActivity {
    /// Human-readable description
    pub title: String,
    /// The transition kind
    pub code: ActivityCode,
    /// The stage involved, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageId>,
    /// The application slot involved, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<SlotId>,
    /// The registered document involved, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<ProcessDocId>,
    /// Who caused the transition; `None` for engine-driven transitions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<ActorId>,
    /// When the transition happened
    pub timestamp: DateTime<Utc>,
}

impl ProcessActivity {
    pub fn new(code: ActivityCode, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            code,
            stage: None,
            application: None,
            document: None,
            actor: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_stage(mut self, stage: StageId) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_application(mut self, application: SlotId) -> Self {
        self.application = Some(application);
        self
    }

    pub fn with_document(mut self, document: ProcessDocId) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_actor(mut self, actor: ActorId) -> Self {
        self.actor = Some(actor);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_refs() {
        let activity = ProcessActivity::new(ActivityCode::RegisterDocument, "Invoice registered")
            .with_application(SlotId::new("slot-1"))
            .with_document(ProcessDocId::new("pd-1"))
            .with_actor(ActorId::new("alice"));

        assert_eq!(activity.code, ActivityCode::RegisterDocument);
        assert!(activity.application.is_some());
        assert!(activity.document.is_some());
        assert!(activity.actor.is_some());
        assert!(activity.stage.is_none());
    }

    #[test]
    fn test_legacy_wire_spelling() {
        let json = serde_json::to_string(&ActivityCode::InitProcess).unwrap();
        assert_eq!(json, "\"INIT_PROCESS\"");
        let code: ActivityCode = serde_json::from_str("\"NEXT_STAGES\"").unwrap();
        assert_eq!(code, ActivityCode::NextStages);
    }

    #[test]
    fn test_display_matches_wire() {
        assert_eq!(ActivityCode::FinishStages.to_string(), "FINISH_STAGES");
        assert_eq!(ActivityCode::AutoApproved.to_string(), "AUTO_APPROVED");
    }
}
