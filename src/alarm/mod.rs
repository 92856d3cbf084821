//! Alarm engine
//!
//! The engine watches an elapsed-seconds signal and decides, exactly once per
//! threshold crossing, whether an alarm should fire. Discrete time-points fire
//! first; once all of them have fired an optional recurring "auto alarm" takes
//! over, bounded by a maximum trigger count.
//!
//! Firing is delegated to an [`AlarmHandler`]. The engine finishes all of its
//! bookkeeping for an update before the handler is invoked, so a slow or failed
//! playback never affects trigger state.

mod auto_alarm;
mod time_point;

pub use auto_alarm::{AutoAlarmSettings, AutoAlarmUpdate};
pub use time_point::{validate_ring_count, TimePoint};

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, trace};

use crate::error::AlarmResult;
use crate::preferences::AlarmTemplate;

/// Fewest rings a single alarm may play
pub const MIN_RING_COUNT: u32 = 1;

/// Most rings a single alarm may play
pub const MAX_RING_COUNT: u32 = 5;

/// What caused an alarm to fire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerSource {
    /// A configured time-point crossed its threshold
    TimePoint { id: String },
    /// A recurring auto alarm (1-based sequence number)
    AutoAlarm { sequence: u32 },
}

/// A single alarm firing produced by [`AlarmEngine::on_tick`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub source: TriggerSource,
    pub ring_count: u32,
    pub at_seconds: u64,
}

/// Receives alarm firings
///
/// Implementations must return promptly: long-running work such as audio
/// playback belongs on a spawned task.
pub trait AlarmHandler: Send + Sync {
    fn fire(&self, trigger: &Trigger);
}

/// Handler that ignores every firing
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentHandler;

impl AlarmHandler for SilentHandler {
    fn fire(&self, _trigger: &Trigger) {}
}

/// Time-point and auto-alarm state driven by the elapsed-time signal
pub struct AlarmEngine {
    time_points: Vec<TimePoint>,
    auto_alarm: AutoAlarmSettings,
    handler: Arc<dyn AlarmHandler>,
}

impl AlarmEngine {
    /// Create an engine with no time-points and auto alarm disabled
    pub fn new(handler: Arc<dyn AlarmHandler>) -> Self {
        Self {
            time_points: Vec::new(),
            auto_alarm: AutoAlarmSettings::default(),
            handler,
        }
    }

    /// Time-points, sorted ascending by threshold
    pub fn time_points(&self) -> &[TimePoint] {
        &self.time_points
    }

    /// Current auto alarm settings and counters
    pub fn auto_alarm(&self) -> &AutoAlarmSettings {
        &self.auto_alarm
    }

    /// Add a pending time-point and return its id
    pub fn add_time_point(&mut self, time_in_seconds: u64, ring_count: u32) -> AlarmResult<String> {
        let point = TimePoint::new(time_in_seconds, ring_count)?;
        let id = point.id.clone();
        debug!(id = %id, time_in_seconds, ring_count, "Adding time point");

        self.time_points.push(point);
        self.sort_time_points();
        Ok(id)
    }

    /// Remove a time-point by id; unknown ids are ignored
    pub fn remove_time_point(&mut self, id: &str) -> bool {
        match self.time_points.iter().position(|p| p.id == id) {
            Some(index) => {
                self.time_points.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every time-point
    pub fn clear_time_points(&mut self) {
        self.time_points.clear();
    }

    /// Make every time-point pending again and zero the auto alarm counters
    ///
    /// Thresholds and ring counts are unchanged.
    pub fn reset_triggers(&mut self) {
        for point in &mut self.time_points {
            point.triggered = false;
        }
        self.auto_alarm.reset_counters();
        debug!("Alarm triggers reset");
    }

    /// Replace all time-points, discarding any stored trigger state
    pub fn set_time_points(&mut self, points: Vec<TimePoint>) -> AlarmResult<()> {
        for point in &points {
            validate_ring_count(point.ring_count)?;
        }

        self.time_points = points
            .into_iter()
            .map(|point| TimePoint {
                triggered: false,
                ..point
            })
            .collect();
        self.sort_time_points();
        Ok(())
    }

    /// Replace the auto alarm settings wholesale, zeroing the counters
    pub fn set_auto_alarm(&mut self, settings: AutoAlarmSettings) -> AlarmResult<()> {
        settings.validate()?;
        self.auto_alarm = settings;
        self.auto_alarm.reset_counters();
        Ok(())
    }

    /// Merge a partial update into the auto alarm settings
    ///
    /// Counters are kept, but clamped when `max_triggers` shrinks below them.
    pub fn update_auto_alarm(&mut self, update: AutoAlarmUpdate) -> AlarmResult<()> {
        let mut merged = update.apply_to(&self.auto_alarm);
        merged.validate()?;
        merged.triggered_count = merged.triggered_count.min(merged.max_triggers);
        self.auto_alarm = merged;
        Ok(())
    }

    /// Restore the default (disabled) auto alarm
    pub fn reset_auto_alarm(&mut self) {
        self.auto_alarm = AutoAlarmSettings::default();
    }

    /// Load a template's time-points and auto alarm
    pub fn apply_template(&mut self, template: &AlarmTemplate) -> AlarmResult<()> {
        self.set_time_points(template.time_points.clone())?;
        match &template.auto_alarm {
            Some(settings) => self.set_auto_alarm(settings.clone())?,
            None => self.reset_auto_alarm(),
        }
        info!(
            template = %template.id,
            points = self.time_points.len(),
            "Applied alarm template"
        );
        Ok(())
    }

    /// Whether every time-point has fired (false when there are none)
    pub fn all_triggered(&self) -> bool {
        !self.time_points.is_empty() && self.time_points.iter().all(|p| p.triggered)
    }

    /// Whether the engine has nothing left to fire
    pub fn is_exhausted(&self) -> bool {
        self.all_triggered()
            && (!self.auto_alarm.enabled || !self.auto_alarm.has_remaining_triggers())
    }

    /// Process a new value of the elapsed-time signal
    ///
    /// The value may jump by more than one second between calls. Every pending
    /// time-point at or below `seconds` fires independently. At most one auto
    /// alarm fires per call, even if several intervals have elapsed.
    pub fn on_tick(&mut self, seconds: u64) -> Vec<Trigger> {
        trace!(seconds, "Alarm engine tick");
        let mut triggers = Vec::new();

        for point in self.time_points.iter_mut().filter(|p| p.is_due(seconds)) {
            point.triggered = true;
            triggers.push(Trigger {
                source: TriggerSource::TimePoint {
                    id: point.id.clone(),
                },
                ring_count: point.ring_count,
                at_seconds: seconds,
            });
        }

        if let Some(trigger) = self.evaluate_auto_alarm(seconds) {
            triggers.push(trigger);
        }

        for trigger in &triggers {
            info!(
                source = ?trigger.source,
                ring_count = trigger.ring_count,
                seconds = trigger.at_seconds,
                "Alarm fired"
            );
            self.handler.fire(trigger);
        }

        triggers
    }

    fn evaluate_auto_alarm(&mut self, seconds: u64) -> Option<Trigger> {
        if !self.auto_alarm.enabled || !self.all_triggered() {
            return None;
        }

        let max_time = self.time_points.iter().map(|p| p.time_in_seconds).max()?;
        if seconds <= max_time {
            return None;
        }

        let expected = self.auto_alarm.expected_triggers(seconds - max_time);
        if expected <= u64::from(self.auto_alarm.triggered_count)
            || !self.auto_alarm.has_remaining_triggers()
        {
            return None;
        }

        self.auto_alarm.triggered_count += 1;
        self.auto_alarm.last_triggered_at = seconds;

        Some(Trigger {
            source: TriggerSource::AutoAlarm {
                sequence: self.auto_alarm.triggered_count,
            },
            ring_count: self.auto_alarm.ring_count,
            at_seconds: seconds,
        })
    }

    fn sort_time_points(&mut self) {
        self.time_points.sort_by_key(|p| p.time_in_seconds);
    }
}

/// Feed every change of the elapsed-seconds signal into `engine`
///
/// Runs until the sending side of the channel is dropped. Intermediate values
/// may be skipped when the engine falls behind, which the engine tolerates.
pub async fn follow_time_signal(engine: Arc<Mutex<AlarmEngine>>, mut seconds: watch::Receiver<u64>) {
    let initial = *seconds.borrow_and_update();
    engine.lock().on_tick(initial);

    while seconds.changed().await.is_ok() {
        let value = *seconds.borrow_and_update();
        engine.lock().on_tick(value);
    }

    debug!("Time signal closed, alarm engine detached");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingHandler {
        fired: Mutex<Vec<Trigger>>,
    }

    impl AlarmHandler for CountingHandler {
        fn fire(&self, trigger: &Trigger) {
            self.fired.lock().push(trigger.clone());
        }
    }

    fn engine() -> (AlarmEngine, Arc<CountingHandler>) {
        let handler = Arc::new(CountingHandler::default());
        (AlarmEngine::new(handler.clone()), handler)
    }

    fn enabled_auto(interval: u64, max: u32) -> AutoAlarmSettings {
        AutoAlarmSettings {
            enabled: true,
            interval_seconds: interval,
            ring_count: 2,
            max_triggers: max,
            ..AutoAlarmSettings::default()
        }
    }

    #[test]
    fn test_time_points_stay_sorted() {
        let (mut engine, _) = engine();
        engine.add_time_point(30, 1).unwrap();
        let middle = engine.add_time_point(10, 2).unwrap();
        engine.add_time_point(20, 3).unwrap();
        engine.add_time_point(5, 1).unwrap();

        let times: Vec<u64> = engine.time_points().iter().map(|p| p.time_in_seconds).collect();
        assert_eq!(times, vec![5, 10, 20, 30]);

        assert!(engine.remove_time_point(&middle));
        let times: Vec<u64> = engine.time_points().iter().map(|p| p.time_in_seconds).collect();
        assert_eq!(times, vec![5, 20, 30]);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let (mut engine, _) = engine();
        engine.add_time_point(30, 1).unwrap();
        assert!(!engine.remove_time_point("missing"));
        assert_eq!(engine.time_points().len(), 1);
    }

    #[test]
    fn test_add_rejects_bad_ring_count() {
        let (mut engine, _) = engine();
        assert!(engine.add_time_point(30, 0).is_err());
        assert!(engine.add_time_point(30, 6).is_err());
        assert!(engine.time_points().is_empty());
    }

    #[test]
    fn test_points_fire_once_at_threshold() {
        let (mut engine, handler) = engine();
        let first = engine.add_time_point(5, 2).unwrap();
        let second = engine.add_time_point(10, 1).unwrap();

        assert!(engine.on_tick(0).is_empty());
        assert!(engine.on_tick(3).is_empty());

        let fired = engine.on_tick(5);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].source, TriggerSource::TimePoint { id: first });
        assert_eq!(fired[0].ring_count, 2);

        assert!(engine.on_tick(8).is_empty());

        let fired = engine.on_tick(10);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].source, TriggerSource::TimePoint { id: second });

        assert!(engine.on_tick(11).is_empty());
        assert_eq!(handler.fired.lock().len(), 2);
    }

    #[test]
    fn test_jump_fires_every_crossed_point() {
        let (mut engine, handler) = engine();
        engine.add_time_point(5, 1).unwrap();
        engine.add_time_point(10, 2).unwrap();
        engine.add_time_point(15, 3).unwrap();

        let fired = engine.on_tick(12);
        let rings: Vec<u32> = fired.iter().map(|t| t.ring_count).collect();
        assert_eq!(rings, vec![1, 2]);
        assert_eq!(handler.fired.lock().len(), 2);
        assert!(!engine.time_points()[2].triggered);
    }

    #[test]
    fn test_reset_triggers_is_idempotent() {
        let (mut engine, _) = engine();
        engine.add_time_point(5, 1).unwrap();
        engine.set_auto_alarm(enabled_auto(10, 3)).unwrap();
        engine.on_tick(5);
        engine.on_tick(20);
        assert_eq!(engine.auto_alarm().triggered_count, 1);

        engine.reset_triggers();
        let once: Vec<TimePoint> = engine.time_points().to_vec();
        let auto_once = engine.auto_alarm().clone();

        engine.reset_triggers();
        assert_eq!(engine.time_points(), once.as_slice());
        assert_eq!(engine.auto_alarm(), &auto_once);
        assert!(engine.time_points().iter().all(|p| !p.triggered));
        assert_eq!(auto_once.triggered_count, 0);
        assert_eq!(auto_once.last_triggered_at, 0);
    }

    #[test]
    fn test_reset_allows_refire() {
        let (mut engine, handler) = engine();
        engine.add_time_point(5, 1).unwrap();
        engine.on_tick(5);
        engine.reset_triggers();
        engine.on_tick(6);
        assert_eq!(handler.fired.lock().len(), 2);
    }

    #[test]
    fn test_set_time_points_clears_trigger_state() {
        let (mut engine, _) = engine();
        let loaded = vec![
            TimePoint {
                id: "b".into(),
                time_in_seconds: 20,
                ring_count: 3,
                triggered: true,
            },
            TimePoint {
                id: "a".into(),
                time_in_seconds: 10,
                ring_count: 1,
                triggered: true,
            },
        ];
        engine.set_time_points(loaded).unwrap();

        let points = engine.time_points();
        assert_eq!(points[0].time_in_seconds, 10);
        assert_eq!(points[0].ring_count, 1);
        assert_eq!(points[1].time_in_seconds, 20);
        assert_eq!(points[1].ring_count, 3);
        assert!(points.iter().all(|p| !p.triggered));
    }

    #[test]
    fn test_set_time_points_validates() {
        let (mut engine, _) = engine();
        engine.add_time_point(5, 1).unwrap();
        let bad = vec![TimePoint {
            id: "x".into(),
            time_in_seconds: 10,
            ring_count: 9,
            triggered: false,
        }];
        assert!(engine.set_time_points(bad).is_err());
        assert_eq!(engine.time_points().len(), 1);
    }

    #[test]
    fn test_auto_alarm_fires_one_per_update() {
        let (mut engine, handler) = engine();
        engine.add_time_point(10, 1).unwrap();
        engine.set_auto_alarm(enabled_auto(60, 3)).unwrap();
        engine.on_tick(10);

        let fired = engine.on_tick(70);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].source, TriggerSource::AutoAlarm { sequence: 1 });
        assert_eq!(fired[0].ring_count, 2);
        assert_eq!(engine.auto_alarm().triggered_count, 1);
        assert_eq!(engine.auto_alarm().last_triggered_at, 70);

        let fired = engine.on_tick(500);
        assert_eq!(fired.len(), 1);
        assert_eq!(engine.auto_alarm().triggered_count, 2);

        engine.on_tick(501);
        assert_eq!(engine.auto_alarm().triggered_count, 3);

        // Capped at max_triggers
        assert!(engine.on_tick(10_000).is_empty());
        assert_eq!(engine.auto_alarm().triggered_count, 3);
        assert_eq!(handler.fired.lock().len(), 4);
        assert!(engine.is_exhausted());
    }

    #[test]
    fn test_auto_alarm_waits_for_all_points() {
        let (mut engine, _) = engine();
        engine.add_time_point(10, 1).unwrap();
        engine.add_time_point(100, 1).unwrap();
        engine.set_auto_alarm(enabled_auto(5, 3)).unwrap();

        assert_eq!(engine.on_tick(50).len(), 1);
        assert_eq!(engine.auto_alarm().triggered_count, 0);
    }

    #[test]
    fn test_auto_alarm_not_at_max_time() {
        let (mut engine, _) = engine();
        engine.add_time_point(10, 1).unwrap();
        engine.set_auto_alarm(enabled_auto(1, 3)).unwrap();

        // Same update that fires the last point cannot fire the auto alarm
        let fired = engine.on_tick(10);
        assert_eq!(fired.len(), 1);
        assert_eq!(engine.auto_alarm().triggered_count, 0);
    }

    #[test]
    fn test_auto_alarm_in_same_jump_as_last_point() {
        let (mut engine, _) = engine();
        engine.add_time_point(10, 1).unwrap();
        engine.set_auto_alarm(enabled_auto(60, 3)).unwrap();

        let fired = engine.on_tick(75);
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[1].source, TriggerSource::AutoAlarm { sequence: 1 });
    }

    #[test]
    fn test_auto_alarm_needs_time_points() {
        let (mut engine, _) = engine();
        engine.set_auto_alarm(enabled_auto(1, 3)).unwrap();
        assert!(engine.on_tick(100).is_empty());
    }

    #[test]
    fn test_auto_alarm_disabled() {
        let (mut engine, _) = engine();
        engine.add_time_point(10, 1).unwrap();
        engine.on_tick(10);
        assert!(engine.on_tick(1000).is_empty());
        assert!(engine.is_exhausted());
    }

    #[test]
    fn test_set_auto_alarm_zeroes_counters() {
        let (mut engine, _) = engine();
        let settings = AutoAlarmSettings {
            triggered_count: 2,
            last_triggered_at: 99,
            ..enabled_auto(30, 3)
        };
        engine.set_auto_alarm(settings).unwrap();
        assert_eq!(engine.auto_alarm().triggered_count, 0);
        assert_eq!(engine.auto_alarm().last_triggered_at, 0);
    }

    #[test]
    fn test_update_auto_alarm_clamps_counter() {
        let (mut engine, _) = engine();
        engine.add_time_point(1, 1).unwrap();
        engine.set_auto_alarm(enabled_auto(1, 5)).unwrap();
        engine.on_tick(2);
        engine.on_tick(3);
        engine.on_tick(4);
        assert_eq!(engine.auto_alarm().triggered_count, 3);

        engine
            .update_auto_alarm(AutoAlarmUpdate {
                max_triggers: Some(2),
                ..AutoAlarmUpdate::default()
            })
            .unwrap();
        assert_eq!(engine.auto_alarm().triggered_count, 2);
        assert_eq!(engine.auto_alarm().interval_seconds, 1);
    }

    #[test]
    fn test_update_auto_alarm_rejects_zero_interval() {
        let (mut engine, _) = engine();
        let result = engine.update_auto_alarm(AutoAlarmUpdate {
            interval_seconds: Some(0),
            ..AutoAlarmUpdate::default()
        });
        assert!(result.is_err());
        assert_eq!(engine.auto_alarm().interval_seconds, 60);
    }

    #[test]
    fn test_reset_auto_alarm() {
        let (mut engine, _) = engine();
        engine.set_auto_alarm(enabled_auto(10, 1)).unwrap();
        engine.reset_auto_alarm();
        assert_eq!(engine.auto_alarm(), &AutoAlarmSettings::default());
    }

    #[test]
    fn test_clear_time_points() {
        let (mut engine, _) = engine();
        engine.add_time_point(1, 1).unwrap();
        engine.add_time_point(2, 1).unwrap();
        engine.clear_time_points();
        assert!(engine.time_points().is_empty());
        assert!(!engine.all_triggered());
    }

    #[tokio::test]
    async fn test_follow_time_signal() {
        let handler = Arc::new(CountingHandler::default());
        let engine = Arc::new(Mutex::new(AlarmEngine::new(handler.clone())));
        engine.lock().add_time_point(2, 1).unwrap();

        let (tx, rx) = watch::channel(0u64);
        let task = tokio::spawn(follow_time_signal(engine.clone(), rx));

        tx.send(1).unwrap();
        tokio::task::yield_now().await;
        tx.send(5).unwrap();
        drop(tx);
        task.await.unwrap();

        assert_eq!(handler.fired.lock().len(), 1);
        assert!(engine.lock().all_triggered());
    }
}
