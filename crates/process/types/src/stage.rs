//! Process stages: one step in the ordered sequence
//!
//! Stages move in one direction only: pending, then current, then done.
//! Two reserved system stages bound the sequence — `start` is skipped
//! past as soon as the process is played, `end` finishes the process
//! when reached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Identifier ───────────────────────────────────────────────────────

/// Unique identifier for a process stage
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageId(pub String);

impl StageId {
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

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── System Stage Code ────────────────────────────────────────────────

/// Reserved system roles a stage may carry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemStageCode {
    /// Bootstrap stage: completes the moment the process is played
    Start,
    /// Terminal stage: reaching it finishes the process
    End,
}

impl std::fmt::Display for SystemStageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::End => write!(f, "end"),
        }
    }
}

// ── Process Stage ────────────────────────────────────────────────────

/// One step in a process's ordered stage sequence
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessStage {
    /// Unique identifier
    pub id: StageId,
    /// Human-readable title
    pub title: String,
    /// Free-form remark
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remark: String,
    /// Reserved system role, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_code: Option<SystemStageCode>,
    /// Whether this is a reserved system stage
    pub is_system: bool,
    /// Position in the sequence, 1-based and contiguous per process
    pub order_number: u32,
    /// Whether the stage has completed
    pub was_done: bool,
    /// When the stage completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_done: Option<DateTime<Utc>>,
}

impl ProcessStage {
    /// Create a plain stage at the given position
    pub fn new(title: impl Into<String>, order_number: u32) -> Self {
        Self {
            id: StageId::generate(),
            title: title.into(),
            remark: String::new(),
            system_code: None,
            is_system: false,
            order_number,
            was_done: false,
            date_done: None,
        }
    }

    /// Create a system stage at the given position
    pub fn system(code: SystemStageCode, title: impl Into<String>, order_number: u32) -> Self {
        Self {
            id: StageId::generate(),
            title: title.into(),
            remark: String::new(),
            system_code: Some(code),
            is_system: true,
            order_number,
            was_done: false,
            date_done: None,
        }
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    pub fn is_start(&self) -> bool {
        self.system_code == Some(SystemStageCode::Start)
    }

    pub fn is_end(&self) -> bool {
        self.system_code == Some(SystemStageCode::End)
    }

    /// Mark the stage done with a completion timestamp
    pub fn mark_done(&mut self, now: DateTime<Utc>) {
        self.was_done = true;
        self.date_done = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_stage() {
        let stage = ProcessStage::new("Review", 2).with_remark("invoice review");
        assert_eq!(stage.order_number, 2);
        assert!(!stage.is_system);
        assert!(!stage.is_start());
        assert!(!stage.is_end());
        assert!(!stage.was_done);
        assert_eq!(stage.remark, "invoice review");
    }

    #[test]
    fn test_system_stage() {
        let start = ProcessStage::system(SystemStageCode::Start, "Start", 1);
        assert!(start.is_system);
        assert!(start.is_start());

        let end = ProcessStage::system(SystemStageCode::End, "End", 3);
        assert!(end.is_end());
    }

    #[test]
    fn test_mark_done() {
        let mut stage = ProcessStage::new("Review", 2);
        stage.mark_done(Utc::now());
        assert!(stage.was_done);
        assert!(stage.date_done.is_some());
    }

    #[test]
    fn test_system_code_serde_spelling() {
        let json = serde_json::to_string(&SystemStageCode::Start).unwrap();
        assert_eq!(json, "\"start\"");
        let code: SystemStageCode = serde_json::from_str("\"end\"").unwrap();
        assert_eq!(code, SystemStageCode::End);
    }
}
