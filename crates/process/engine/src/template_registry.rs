//! Template registry: the validated blueprints processes expand from
//!
//! Registration is the validation boundary. A template that passes
//! `validate()` here can always be expanded without structural checks;
//! activation windows are still re-checked at expansion time because
//! they depend on the clock, not the structure.

use process_types::{ProcessError, ProcessResult, ProcessTemplate, TemplateId};
use std::collections::HashMap;

/// In-memory store of validated process templates
#[derive(Clone, Debug, Default)]
pub struct TemplateRegistry {
    templates: HashMap<TemplateId, ProcessTemplate>,
    by_name: HashMap<String, TemplateId>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Validate and register a template; replaces any previous version
    /// under the same ID
    pub fn register(&mut self, template: ProcessTemplate) -> ProcessResult<TemplateId> {
        template.validate()?;
        let id = template.id.clone();
        tracing::info!(
            template = %id.short(),
            name = %template.name,
            stages = template.stage_count(),
            "Template registered"
        );
        self.by_name.insert(template.name.clone(), id.clone());
        self.templates.insert(id.clone(), template);
        Ok(id)
    }

    pub fn get(&self, id: &TemplateId) -> ProcessResult<&ProcessTemplate> {
        self.templates
            .get(id)
            .ok_or_else(|| ProcessError::TemplateNotFound(id.clone()))
    }

    pub fn get_by_name(&self, name: &str) -> Option<&ProcessTemplate> {
        self.by_name.get(name).and_then(|id| self.templates.get(id))
    }

    /// Deactivate a template; running processes keep their snapshots
    pub fn deactivate(&mut self, id: &TemplateId) -> ProcessResult<()> {
        let template = self
            .templates
            .get_mut(id)
            .ok_or_else(|| ProcessError::TemplateNotFound(id.clone()))?;
        template.is_active = false;
        tracing::info!(template = %id.short(), "Template deactivated");
        Ok(())
    }

    pub fn remove(&mut self, id: &TemplateId) -> Option<ProcessTemplate> {
        let template = self.templates.remove(id)?;
        self.by_name.remove(&template.name);
        Some(template)
    }

    pub fn list(&self) -> Vec<&ProcessTemplate> {
        self.templates.values().collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use process_types::{ApplicationTemplate, DocumentTypeId, Quota, StageTemplate};

    fn make_template(name: &str) -> ProcessTemplate {
        ProcessTemplate::new(name)
            .with_stage(StageTemplate::start())
            .with_stage(StageTemplate::new("Review").with_application(ApplicationTemplate::new(
                DocumentTypeId::new("invoice"),
                "Invoices",
                Quota::bounded(1, 2),
            )))
            .with_stage(StageTemplate::end())
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = TemplateRegistry::new();
        let id = registry.register(make_template("Sales")).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&id).unwrap().name, "Sales");
        assert!(registry.get_by_name("Sales").is_some());
        assert!(registry.get_by_name("Purchasing").is_none());
    }

    #[test]
    fn test_invalid_template_rejected() {
        let mut registry = TemplateRegistry::new();
        let invalid = ProcessTemplate::new("Bad").with_stage(StageTemplate::new("Review"));
        assert!(matches!(
            registry.register(invalid),
            Err(ProcessError::InvalidTemplate(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_deactivate() {
        let mut registry = TemplateRegistry::new();
        let id = registry.register(make_template("Sales")).unwrap();

        registry.deactivate(&id).unwrap();
        assert!(!registry.get(&id).unwrap().is_active);

        assert!(matches!(
            registry.deactivate(&TemplateId::new("missing")),
            Err(ProcessError::TemplateNotFound(_))
        ));
    }

    #[test]
    fn test_remove() {
        let mut registry = TemplateRegistry::new();
        let id = registry.register(make_template("Sales")).unwrap();

        assert!(registry.remove(&id).is_some());
        assert!(registry.get(&id).is_err());
        assert!(registry.get_by_name("Sales").is_none());
    }
}
