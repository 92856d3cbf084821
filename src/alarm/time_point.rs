//! Scheduled alarm thresholds

use serde::{Deserialize, Serialize};

use super::{MAX_RING_COUNT, MIN_RING_COUNT};
use crate::error::{AlarmError, AlarmResult};

/// A single alarm threshold on the elapsed-time axis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimePoint {
    /// Unique identifier assigned at creation
    pub id: String,

    /// Elapsed seconds at which the alarm fires
    pub time_in_seconds: u64,

    /// Number of rings to play (1-5)
    pub ring_count: u32,

    /// Set once the threshold has been crossed and the alarm fired
    #[serde(default)]
    pub triggered: bool,
}

impl TimePoint {
    /// Create a pending time-point with a fresh id
    pub fn new(time_in_seconds: u64, ring_count: u32) -> AlarmResult<Self> {
        validate_ring_count(ring_count)?;
        Ok(Self {
            id: crate::id::random_id(),
            time_in_seconds,
            ring_count,
            triggered: false,
        })
    }

    /// Whether `seconds` has reached this point while it is still pending
    pub fn is_due(&self, seconds: u64) -> bool {
        !self.triggered && seconds >= self.time_in_seconds
    }

    /// Format the threshold as `MM:SS`
    pub fn label(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.time_in_seconds / 60,
            self.time_in_seconds % 60
        )
    }
}

/// Check that a ring count lies in the supported range
pub fn validate_ring_count(ring_count: u32) -> AlarmResult<()> {
    if (MIN_RING_COUNT..=MAX_RING_COUNT).contains(&ring_count) {
        Ok(())
    } else {
        Err(AlarmError::InvalidRingCount(ring_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_time_point_is_pending() {
        let point = TimePoint::new(90, 2).unwrap();
        assert!(!point.triggered);
        assert_eq!(point.label(), "01:30");
        assert!(!point.is_due(89));
        assert!(point.is_due(90));
        assert!(point.is_due(500));
    }

    #[test]
    fn test_ring_count_bounds() {
        assert!(TimePoint::new(10, 0).is_err());
        assert!(TimePoint::new(10, 6).is_err());
        assert!(TimePoint::new(10, 1).is_ok());
        assert!(TimePoint::new(10, 5).is_ok());
    }

    #[test]
    fn test_serialized_field_names() {
        let point = TimePoint {
            id: "a".to_string(),
            time_in_seconds: 5,
            ring_count: 2,
            triggered: true,
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["timeInSeconds"], 5);
        assert_eq!(json["ringCount"], 2);
        assert_eq!(json["triggered"], true);
    }
}
