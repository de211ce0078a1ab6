//! Process templates: the authored blueprint for a stage sequence
//!
//! A ProcessTemplate is the per-tenant configuration a running process is
//! expanded from: an ordered list of stages, each gated by application
//! quotas, plus process-wide "global" applications bound to no stage.
//! Templates are typed and validated before expansion — a process never
//! sees an untyped stage definition.

use crate::{DocumentTypeId, ProcessError, ProcessResult, Quota, SystemStageCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Identifier ───────────────────────────────────────────────────────

/// Unique identifier for a process template
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub String);

impl TemplateId {
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

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Process Template ─────────────────────────────────────────────────

/// A process template — the blueprint a running process is expanded from
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessTemplate {
    /// Unique identifier
    pub id: TemplateId,
    /// Human-readable name
    pub name: String,
    /// Free-form remark
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remark: String,
    /// Ordered stage definitions; position decides `order_number`
    pub stages: Vec<StageTemplate>,
    /// Applications spanning the whole process, bound to no stage
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_applications: Vec<ApplicationTemplate>,
    /// Whether this template may currently be expanded
    pub is_active: bool,
    /// Expansion allowed from this instant (inclusive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_from: Option<DateTime<Utc>>,
    /// Expansion allowed until this instant (inclusive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_until: Option<DateTime<Utc>>,
    /// When this template was created
    pub created_at: DateTime<Utc>,
    /// Metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl ProcessTemplate {
    /// Create a new, empty template
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TemplateId::generate(),
            name: name.into(),
            remark: String::new(),
            stages: Vec::new(),
            global_applications: Vec::new(),
            is_active: true,
            active_from: None,
            active_until: None,
            created_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    pub fn with_stage(mut self, stage: StageTemplate) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn with_global_application(mut self, application: ApplicationTemplate) -> Self {
        self.global_applications.push(application);
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn with_active_window(
        mut self,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Self {
        self.active_from = from;
        self.active_until = until;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Check the template may be expanded at `now`
    pub fn usable_at(&self, now: DateTime<Utc>) -> ProcessResult<()> {
        if !self.is_active {
            return Err(ProcessError::TemplateDeactivated(self.id.clone()));
        }
        let in_window = self.active_from.map_or(true, |from| now >= from)
            && self.active_until.map_or(true, |until| now <= until);
        if !in_window {
            return Err(ProcessError::TemplateNotInWindow(self.id.clone()));
        }
        Ok(())
    }

    /// Validate the template for structural correctness.
    ///
    /// The stage sequence must open with the one `start` system stage and
    /// close with the one `end` system stage; system stages carry no
    /// applications; every quota must be internally consistent.
    pub fn validate(&self) -> ProcessResult<()> {
        if self.stages.is_empty() {
            return Err(ProcessError::InvalidTemplate(
                "template must have at least one stage".into(),
            ));
        }

        let starts = self
            .stages
            .iter()
            .filter(|s| s.system_code == Some(SystemStageCode::Start))
            .count();
        let ends = self
            .stages
            .iter()
            .filter(|s| s.system_code == Some(SystemStageCode::End))
            .count();
        if starts != 1 {
            return Err(ProcessError::InvalidTemplate(
                "template must have exactly one start stage".into(),
            ));
        }
        if ends != 1 {
            return Err(ProcessError::InvalidTemplate(
                "template must have exactly one end stage".into(),
            ));
        }
        if self.stages[0].system_code != Some(SystemStageCode::Start) {
            return Err(ProcessError::InvalidTemplate(
                "the start stage must be authored first".into(),
            ));
        }
        if self.stages[self.stages.len() - 1].system_code != Some(SystemStageCode::End) {
            return Err(ProcessError::InvalidTemplate(
                "the end stage must be authored last".into(),
            ));
        }

        for stage in &self.stages {
            if stage.system_code.is_some() && !stage.applications.is_empty() {
                return Err(ProcessError::InvalidTemplate(format!(
                    "system stage '{}' must not declare applications",
                    stage.title
                )));
            }
            for application in &stage.applications {
                application.validate()?;
            }
        }
        for application in &self.global_applications {
            application.validate()?;
        }

        Ok(())
    }

    /// Number of authored stages
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

// ── Stage Template ───────────────────────────────────────────────────

/// One authored stage definition
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StageTemplate {
    /// Human-readable title
    pub title: String,
    /// Free-form remark
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remark: String,
    /// Reserved system role, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_code: Option<SystemStageCode>,
    /// Application quotas gating this stage
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applications: Vec<ApplicationTemplate>,
}

impl StageTemplate {
    /// Create a plain (non-system) stage
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            remark: String::new(),
            system_code: None,
            applications: Vec::new(),
        }
    }

    /// The reserved bootstrap stage
    pub fn start() -> Self {
        Self {
            title: "Start".into(),
            remark: String::new(),
            system_code: Some(SystemStageCode::Start),
            applications: Vec::new(),
        }
    }

    /// The reserved terminal stage
    pub fn end() -> Self {
        Self {
            title: "End".into(),
            remark: String::new(),
            system_code: Some(SystemStageCode::End),
            applications: Vec::new(),
        }
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    pub fn with_application(mut self, application: ApplicationTemplate) -> Self {
        self.applications.push(application);
        self
    }
}

// ── Application Template ─────────────────────────────────────────────

/// One authored application quota: a document type and its min/max count
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApplicationTemplate {
    /// The document type registered documents must carry
    pub document_type: DocumentTypeId,
    /// Human-readable title
    pub title: String,
    /// Free-form remark
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remark: String,
    /// The required document-count range
    pub quota: Quota,
}

impl ApplicationTemplate {
    pub fn new(document_type: DocumentTypeId, title: impl Into<String>, quota: Quota) -> Self {
        Self {
            document_type,
            title: title.into(),
            remark: String::new(),
            quota,
        }
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    fn validate(&self) -> ProcessResult<()> {
        self.quota.validate().map_err(ProcessError::InvalidTemplate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_template() -> ProcessTemplate {
        ProcessTemplate::new("Sales Process")
            .with_stage(StageTemplate::start())
            .with_stage(StageTemplate::new("Review").with_application(ApplicationTemplate::new(
                DocumentTypeId::new("invoice"),
                "Invoices",
                Quota::bounded(1, 2),
            )))
            .with_stage(StageTemplate::end())
    }

    #[test]
    fn test_valid_template() {
        let template = make_template();
        assert!(template.validate().is_ok());
        assert_eq!(template.stage_count(), 3);
    }

    #[test]
    fn test_missing_start_stage() {
        let template = ProcessTemplate::new("Bad")
            .with_stage(StageTemplate::new("Review"))
            .with_stage(StageTemplate::end());
        assert!(matches!(
            template.validate(),
            Err(ProcessError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_start_stage_must_be_first() {
        let template = ProcessTemplate::new("Bad")
            .with_stage(StageTemplate::new("Review"))
            .with_stage(StageTemplate::start())
            .with_stage(StageTemplate::end());
        assert!(template.validate().is_err());
    }

    #[test]
    fn test_end_stage_must_be_last() {
        let template = ProcessTemplate::new("Bad")
            .with_stage(StageTemplate::start())
            .with_stage(StageTemplate::end())
            .with_stage(StageTemplate::new("Review"));
        assert!(template.validate().is_err());
    }

    #[test]
    fn test_system_stage_with_applications() {
        let mut start = StageTemplate::start();
        start.applications.push(ApplicationTemplate::new(
            DocumentTypeId::new("invoice"),
            "Invoices",
            Quota::bounded(1, 1),
        ));
        let template = ProcessTemplate::new("Bad")
            .with_stage(start)
            .with_stage(StageTemplate::end());
        assert!(template.validate().is_err());
    }

    #[test]
    fn test_invalid_quota_rejected() {
        let template = ProcessTemplate::new("Bad")
            .with_stage(StageTemplate::start())
            .with_stage(StageTemplate::new("Review").with_application(
                ApplicationTemplate::new(
                    DocumentTypeId::new("invoice"),
                    "Invoices",
                    Quota::bounded(3, 1),
                ),
            ))
            .with_stage(StageTemplate::end());
        assert!(template.validate().is_err());
    }

    #[test]
    fn test_usable_window() {
        let now = Utc::now();
        let template = make_template();
        assert!(template.usable_at(now).is_ok());

        let deactivated = make_template().deactivated();
        assert!(matches!(
            deactivated.usable_at(now),
            Err(ProcessError::TemplateDeactivated(_))
        ));

        let expired = make_template().with_active_window(None, Some(now - Duration::days(1)));
        assert!(matches!(
            expired.usable_at(now),
            Err(ProcessError::TemplateNotInWindow(_))
        ));

        let not_yet = make_template().with_active_window(Some(now + Duration::days(1)), None);
        assert!(not_yet.usable_at(now).is_err());
    }

    #[test]
    fn test_template_id() {
        let id = TemplateId::generate();
        assert!(!id.0.is_empty());
        assert!(id.short().len() <= 8);

        let named = TemplateId::new("sales-v2");
        assert_eq!(format!("{}", named), "sales-v2");
    }
}
