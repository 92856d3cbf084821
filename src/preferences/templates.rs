//! Alarm templates
//!
//! A template is a named, reusable set of time-points with an optional auto
//! alarm. Two built-in templates are always available; user templates are
//! persisted as a JSON list.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::alarm::{validate_ring_count, AlarmEngine, AutoAlarmSettings, TimePoint};
use crate::error::{AlarmError, AlarmResult};
use crate::storage::{load_json, save_json, KeyValueStore};

/// Storage key of the user templates
pub const TEMPLATE_STORAGE_KEY: &str = "event-timer-presets";

/// Id prefix of user templates
pub const TEMPLATE_ID_PREFIX: &str = "template";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmTemplate {
    pub id: String,
    /// Display name; a message key for built-in templates
    pub name: String,
    /// Planned length of the event in seconds
    pub total_time: u64,
    pub time_points: Vec<TimePoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_alarm: Option<AutoAlarmSettings>,
}

impl AlarmTemplate {
    /// Capture the engine's current configuration as a new template
    pub fn from_engine(name: &str, engine: &AlarmEngine) -> AlarmResult<Self> {
        let time_points: Vec<TimePoint> = engine
            .time_points()
            .iter()
            .cloned()
            .map(|mut point| {
                point.triggered = false;
                point
            })
            .collect();

        let auto_alarm = engine.auto_alarm();
        let auto_alarm = auto_alarm.enabled.then(|| {
            let mut settings = auto_alarm.clone();
            settings.reset_counters();
            settings
        });

        let template = Self {
            id: crate::id::prefixed_id(TEMPLATE_ID_PREFIX),
            name: name.trim().to_string(),
            total_time: time_points
                .iter()
                .map(|p| p.time_in_seconds)
                .max()
                .unwrap_or(0),
            time_points,
            auto_alarm,
        };
        template.validate()?;
        Ok(template)
    }

    pub fn validate(&self) -> AlarmResult<()> {
        if self.name.trim().is_empty() {
            return Err(AlarmError::EmptyTemplateName);
        }
        if self.time_points.is_empty() {
            return Err(AlarmError::NoTimePoints);
        }
        for point in &self.time_points {
            validate_ring_count(point.ring_count)?;
        }
        if let Some(settings) = &self.auto_alarm {
            settings.validate()?;
        }
        Ok(())
    }

    pub fn is_builtin(&self) -> bool {
        is_builtin_id(&self.id)
    }
}

fn builtin_point(id: &str, time_in_seconds: u64, ring_count: u32) -> TimePoint {
    TimePoint {
        id: id.to_string(),
        time_in_seconds,
        ring_count,
        triggered: false,
    }
}

/// Templates that ship with the application
pub fn builtin_templates() -> Vec<AlarmTemplate> {
    vec![
        AlarmTemplate {
            id: "speech-15".to_string(),
            name: "preset.speech15".to_string(),
            total_time: 900,
            time_points: vec![
                builtin_point("speech-15-warning", 600, 1),
                builtin_point("speech-15-wrap-up", 780, 2),
                builtin_point("speech-15-end", 900, 3),
            ],
            auto_alarm: None,
        },
        AlarmTemplate {
            id: "presentation-10".to_string(),
            name: "preset.presentation10".to_string(),
            total_time: 600,
            time_points: vec![
                builtin_point("presentation-10-warning", 420, 1),
                builtin_point("presentation-10-wrap-up", 540, 2),
                builtin_point("presentation-10-end", 600, 3),
            ],
            auto_alarm: None,
        },
    ]
}

fn is_builtin_id(id: &str) -> bool {
    matches!(id, "speech-15" | "presentation-10")
}

/// Built-in templates plus the persisted user templates
pub struct TemplateStore {
    store: Arc<dyn KeyValueStore>,
    custom: Vec<AlarmTemplate>,
}

impl TemplateStore {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let custom = load_json(store.as_ref(), TEMPLATE_STORAGE_KEY).unwrap_or_default();
        Self { store, custom }
    }

    pub fn custom(&self) -> &[AlarmTemplate] {
        &self.custom
    }

    /// Built-ins first, then user templates in insertion order
    pub fn all(&self) -> Vec<AlarmTemplate> {
        builtin_templates()
            .into_iter()
            .chain(self.custom.iter().cloned())
            .collect()
    }

    pub fn find(&self, id: &str) -> AlarmResult<AlarmTemplate> {
        self.all()
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| AlarmError::UnknownTemplate(id.to_string()))
    }

    pub fn add(&mut self, template: AlarmTemplate) -> AlarmResult<()> {
        template.validate()?;
        if template.is_builtin() || self.custom.iter().any(|t| t.id == template.id) {
            return Err(AlarmError::DuplicateTemplate(template.id));
        }
        info!(id = %template.id, name = %template.name, "Added alarm template");
        self.custom.push(template);
        self.save();
        Ok(())
    }

    /// Replace the user template with the same id
    pub fn update(&mut self, template: AlarmTemplate) -> AlarmResult<()> {
        if template.is_builtin() {
            return Err(AlarmError::BuiltinTemplate(template.id));
        }
        template.validate()?;
        let slot = self
            .custom
            .iter_mut()
            .find(|t| t.id == template.id)
            .ok_or_else(|| AlarmError::UnknownTemplate(template.id.clone()))?;
        *slot = template;
        self.save();
        Ok(())
    }

    /// Remove a user template; built-ins and unknown ids are left alone
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.custom.len();
        self.custom.retain(|t| t.id != id);
        if self.custom.len() == before {
            return false;
        }
        info!(id, "Removed alarm template");
        self.save();
        true
    }

    fn save(&self) {
        save_json(self.store.as_ref(), TEMPLATE_STORAGE_KEY, &self.custom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::SilentHandler;
    use crate::storage::MemoryStore;

    fn engine() -> AlarmEngine {
        AlarmEngine::new(Arc::new(SilentHandler))
    }

    #[test]
    fn test_builtin_templates() {
        let templates = builtin_templates();
        assert_eq!(templates.len(), 2);
        for template in &templates {
            template.validate().unwrap();
            assert!(template.is_builtin());
            let last = template.time_points.last().unwrap();
            assert_eq!(last.time_in_seconds, template.total_time);
        }
    }

    #[test]
    fn test_from_engine_clears_trigger_state() {
        let mut engine = engine();
        engine.add_time_point(30, 1).unwrap();
        engine.add_time_point(90, 2).unwrap();
        engine.on_tick(45);

        let template = AlarmTemplate::from_engine(" Standup ", &engine).unwrap();
        assert_eq!(template.name, "Standup");
        assert_eq!(template.total_time, 90);
        assert!(template.time_points.iter().all(|p| !p.triggered));
        assert!(template.auto_alarm.is_none());
        assert!(template.id.starts_with("template-"));
    }

    #[test]
    fn test_from_engine_requires_name() {
        let err = AlarmTemplate::from_engine("   ", &engine()).unwrap_err();
        assert_eq!(err, AlarmError::EmptyTemplateName);
    }

    #[test]
    fn test_from_engine_requires_time_points() {
        let err = AlarmTemplate::from_engine("Empty", &engine()).unwrap_err();
        assert_eq!(err.key(), "addTimePointFirst");
    }

    #[test]
    fn test_add_update_remove_persist() {
        let store = Arc::new(MemoryStore::new());
        let mut templates = TemplateStore::load(store.clone());

        let mut engine = engine();
        engine.add_time_point(60, 2).unwrap();
        let mut template = AlarmTemplate::from_engine("Lightning talk", &engine).unwrap();
        templates.add(template.clone()).unwrap();
        assert_eq!(
            templates.add(template.clone()),
            Err(AlarmError::DuplicateTemplate(template.id.clone()))
        );

        template.name = "Lightning".to_string();
        templates.update(template.clone()).unwrap();

        let reloaded = TemplateStore::load(store.clone());
        assert_eq!(reloaded.find(&template.id).unwrap().name, "Lightning");
        assert_eq!(reloaded.all().len(), 3);

        assert!(templates.remove(&template.id));
        assert!(!templates.remove("speech-15"));
        assert!(TemplateStore::load(store).custom().is_empty());
    }

    #[test]
    fn test_builtins_are_read_only() {
        let mut templates = TemplateStore::load(Arc::new(MemoryStore::new()));
        let builtin = templates.find("speech-15").unwrap();
        assert!(matches!(
            templates.update(builtin.clone()),
            Err(AlarmError::BuiltinTemplate(_))
        ));
        assert!(matches!(
            templates.add(builtin),
            Err(AlarmError::DuplicateTemplate(_))
        ));
    }

    #[test]
    fn test_invalid_ring_count_rejected() {
        let mut templates = TemplateStore::load(Arc::new(MemoryStore::new()));
        let mut template = builtin_templates().remove(0);
        template.id = "custom-one".to_string();
        template.time_points[0].ring_count = 9;
        assert_eq!(templates.add(template), Err(AlarmError::InvalidRingCount(9)));
    }

    #[test]
    fn test_unknown_template() {
        let templates = TemplateStore::load(Arc::new(MemoryStore::new()));
        assert_eq!(
            templates.find("nope").unwrap_err().key(),
            "templateNotFound"
        );
    }
}
