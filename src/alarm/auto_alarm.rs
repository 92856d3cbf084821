//! Recurring alarm policy engaged once every time-point has fired

use serde::{Deserialize, Serialize};

use super::time_point::validate_ring_count;
use crate::error::{AlarmError, AlarmResult};

/// Recurring alarm settings and trigger counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoAlarmSettings {
    /// Whether recurring alarms are enabled
    pub enabled: bool,

    /// Seconds between recurring triggers
    pub interval_seconds: u64,

    /// Rings per recurring trigger (1-5)
    pub ring_count: u32,

    /// Upper bound on recurring triggers
    pub max_triggers: u32,

    /// Recurring triggers fired so far
    #[serde(default)]
    pub triggered_count: u32,

    /// Elapsed seconds of the last recurring trigger
    #[serde(default)]
    pub last_triggered_at: u64,
}

impl Default for AutoAlarmSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: 60,
            ring_count: 3,
            max_triggers: 3,
            triggered_count: 0,
            last_triggered_at: 0,
        }
    }
}

impl AutoAlarmSettings {
    /// Validate the configurable fields
    pub fn validate(&self) -> AlarmResult<()> {
        if self.interval_seconds == 0 {
            return Err(AlarmError::InvalidInterval);
        }
        validate_ring_count(self.ring_count)
    }

    /// Zero the trigger counters
    pub fn reset_counters(&mut self) {
        self.triggered_count = 0;
        self.last_triggered_at = 0;
    }

    /// Whether another recurring trigger is still allowed
    pub fn has_remaining_triggers(&self) -> bool {
        self.triggered_count < self.max_triggers
    }

    /// Number of recurring triggers due `elapsed` seconds past the last time-point
    pub fn expected_triggers(&self, elapsed: u64) -> u64 {
        elapsed / self.interval_seconds.max(1)
    }
}

/// Partial update of [`AutoAlarmSettings`]; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoAlarmUpdate {
    pub enabled: Option<bool>,
    pub interval_seconds: Option<u64>,
    pub ring_count: Option<u32>,
    pub max_triggers: Option<u32>,
}

impl AutoAlarmUpdate {
    /// Merge into `settings`, leaving the trigger counters alone
    pub(crate) fn apply_to(&self, settings: &AutoAlarmSettings) -> AutoAlarmSettings {
        AutoAlarmSettings {
            enabled: self.enabled.unwrap_or(settings.enabled),
            interval_seconds: self.interval_seconds.unwrap_or(settings.interval_seconds),
            ring_count: self.ring_count.unwrap_or(settings.ring_count),
            max_triggers: self.max_triggers.unwrap_or(settings.max_triggers),
            ..settings.clone()
        }
    }
}
