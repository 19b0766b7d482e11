//! Manual and interval-driven triggering of measurement cycles.
//!
//! The scheduler never sleeps or spawns anything itself. Callers pass the
//! current `Instant` in, which keeps every transition testable without a
//! wall clock.

use std::time::{Duration, Instant};

use log::{debug, info};

use crate::error::{ConfigurationError, EngineError};

const MIN_INTERVAL_SECS: f64 = 1.0;
const MAX_INTERVAL_SECS: f64 = 86_400.0;
const WARN_BELOW_INTERVAL_SECS: f64 = 10.0;

pub const SHORT_INTERVAL_WARNING: &str = "Warning: Short intervals may affect network performance.";

/// A validated auto-test interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    secs: f64,
}

impl Interval {
    pub fn new(secs: f64) -> Result<Self, ConfigurationError> {
        if secs.is_nan() || secs < MIN_INTERVAL_SECS {
            return Err(ConfigurationError::BelowMinimum(secs));
        }
        if secs > MAX_INTERVAL_SECS {
            return Err(ConfigurationError::AboveMaximum(secs));
        }
        Ok(Self { secs })
    }

    /// Parse user input such as `"60"` or `"2.5"`.
    pub fn parse(text: &str) -> Result<Self, ConfigurationError> {
        let secs: f64 = text
            .trim()
            .parse()
            .map_err(|_| ConfigurationError::NotANumber(text.trim().to_string()))?;
        if secs.is_infinite() {
            return Err(ConfigurationError::NotANumber(text.trim().to_string()));
        }
        Self::new(secs)
    }

    pub fn secs(self) -> f64 {
        self.secs
    }

    /// Instant one interval after `now`, or `None` if it cannot be represented.
    pub fn due_after(self, now: Instant) -> Option<Instant> {
        Duration::try_from_secs_f64(self.secs)
            .ok()
            .and_then(|d| now.checked_add(d))
    }

    /// Short intervals are allowed but warned about.
    pub fn is_short(self) -> bool {
        self.secs < WARN_BELOW_INTERVAL_SECS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    /// A cycle is in flight; `auto` decides where completion leads.
    Running { auto: bool },
    /// Auto mode, waiting for the next tick.
    AutoScheduled { due: Instant },
}

#[derive(Debug)]
pub struct Scheduler {
    state: SchedulerState,
    in_flight: bool,
    warning: Option<&'static str>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Idle,
            in_flight: false,
            warning: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// A cycle is running, possibly one started before a `stop`.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn is_auto(&self) -> bool {
        matches!(
            self.state,
            SchedulerState::Running { auto: true } | SchedulerState::AutoScheduled { .. }
        )
    }

    /// Persistent short-interval warning, if the last validated interval was short.
    pub fn warning(&self) -> Option<&'static str> {
        self.warning
    }

    /// Request a single on-demand cycle.
    pub fn trigger(&mut self) -> Result<(), EngineError> {
        if self.in_flight || self.state != SchedulerState::Idle {
            return Err(EngineError::CycleInFlight);
        }
        self.begin(false);
        Ok(())
    }

    /// Validate the interval and enter auto mode, starting a cycle immediately.
    pub fn start_auto(&mut self, interval_text: &str) -> Result<Interval, EngineError> {
        let interval = self.validate(interval_text)?;
        if self.in_flight || self.state != SchedulerState::Idle {
            return Err(EngineError::CycleInFlight);
        }
        info!("Auto test started with a {}s interval", interval.secs());
        self.begin(true);
        Ok(interval)
    }

    /// Cancel any pending tick. A cycle already in flight runs to completion.
    pub fn stop(&mut self) {
        if self.state != SchedulerState::Idle {
            info!("Auto test stopped");
        }
        self.state = SchedulerState::Idle;
    }

    /// Record the end of the in-flight cycle and re-arm when in auto mode.
    ///
    /// The interval is re-read so edits made during the cycle apply to the
    /// next one. An invalid interval stops auto mode and is returned.
    pub fn complete(&mut self, now: Instant, interval_text: &str) -> Result<(), EngineError> {
        self.in_flight = false;
        match self.state {
            SchedulerState::Running { auto: true } => match self.next_due(now, interval_text) {
                Ok(due) => {
                    self.state = SchedulerState::AutoScheduled { due };
                    Ok(())
                }
                Err(e) => {
                    self.state = SchedulerState::Idle;
                    Err(e.into())
                }
            },
            _ => {
                self.state = SchedulerState::Idle;
                Ok(())
            }
        }
    }

    /// Start the next auto cycle once its tick has elapsed.
    pub fn poll_due(&mut self, now: Instant) -> bool {
        match self.state {
            SchedulerState::AutoScheduled { due } if now >= due && !self.in_flight => {
                self.begin(true);
                true
            }
            _ => false,
        }
    }

    /// Time left until the next tick, if one is pending.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        match self.state {
            SchedulerState::AutoScheduled { due } => Some(due.saturating_duration_since(now)),
            _ => None,
        }
    }

    fn begin(&mut self, auto: bool) {
        self.state = SchedulerState::Running { auto };
        self.in_flight = true;
    }

    fn next_due(&mut self, now: Instant, interval_text: &str) -> Result<Instant, ConfigurationError> {
        let interval = self.validate(interval_text)?;
        let due = interval
            .due_after(now)
            .ok_or(ConfigurationError::AboveMaximum(interval.secs()))?;
        debug!("Next auto test in {}s", interval.secs());
        Ok(due)
    }

    fn validate(&mut self, interval_text: &str) -> Result<Interval, ConfigurationError> {
        let interval = Interval::parse(interval_text)?;
        self.warning = interval.is_short().then_some(SHORT_INTERVAL_WARNING);
        Ok(interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_validation() {
        assert!(Interval::parse("1").is_ok());
        assert!(Interval::parse(" 60 ").is_ok());
        assert_eq!(Interval::parse("0.5"), Err(ConfigurationError::BelowMinimum(0.5)));
        assert_eq!(Interval::parse("-3"), Err(ConfigurationError::BelowMinimum(-3.0)));
        assert_eq!(Interval::parse("abc"), Err(ConfigurationError::NotANumber("abc".into())));
        assert!(Interval::parse("NaN").is_err());
        assert!(Interval::parse("inf").is_err());
        assert!(Interval::parse("86400").is_ok());
        assert_eq!(Interval::parse("86400.5"), Err(ConfigurationError::AboveMaximum(86400.5)));
        assert_eq!(Interval::parse("1e19"), Err(ConfigurationError::AboveMaximum(1e19)));
        assert_eq!(Interval::parse("1e300"), Err(ConfigurationError::AboveMaximum(1e300)));
    }

    #[test]
    fn test_huge_interval_on_rearm_stops_auto_mode() {
        let mut scheduler = Scheduler::new();
        let start = Instant::now();
        scheduler.start_auto("60").unwrap();
        let err = scheduler.complete(start, "1e300").unwrap_err();
        assert!(matches!(err, EngineError::Configuration(ConfigurationError::AboveMaximum(_))));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(!scheduler.is_in_flight());
    }

    #[test]
    fn test_longest_interval_rearms() {
        let mut scheduler = Scheduler::new();
        let start = Instant::now();
        scheduler.start_auto("86400").unwrap();
        scheduler.complete(start, "86400").unwrap();
        assert_eq!(scheduler.time_until_due(start), Some(Duration::from_secs(86_400)));
    }

    #[test]
    fn test_invalid_interval_reported_before_busy_guard() {
        let mut scheduler = Scheduler::new();
        scheduler.trigger().unwrap();
        let err = scheduler.start_auto("abc").unwrap_err();
        assert!(matches!(err, EngineError::Configuration(ConfigurationError::NotANumber(_))));
        assert!(matches!(scheduler.start_auto("30"), Err(EngineError::CycleInFlight)));
        assert_eq!(scheduler.state(), SchedulerState::Running { auto: false });
    }

    #[test]
    fn test_warning_flag_tracks_short_intervals() {
        for text in ["1", "5", "9.99"] {
            let mut scheduler = Scheduler::new();
            scheduler.start_auto(text).unwrap();
            assert_eq!(scheduler.warning(), Some(SHORT_INTERVAL_WARNING), "interval {text}");
        }
        for text in ["10", "60", "3600"] {
            let mut scheduler = Scheduler::new();
            scheduler.start_auto(text).unwrap();
            assert_eq!(scheduler.warning(), None, "interval {text}");
        }
    }

    #[test]
    fn test_invalid_interval_leaves_scheduler_idle() {
        let mut scheduler = Scheduler::new();
        let err = scheduler.start_auto("0.9").unwrap_err();
        assert!(matches!(err, EngineError::Configuration(ConfigurationError::BelowMinimum(_))));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(!scheduler.is_in_flight());
    }

    #[test]
    fn test_manual_cycle_returns_to_idle() {
        let mut scheduler = Scheduler::new();
        let now = Instant::now();
        scheduler.trigger().unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Running { auto: false });
        assert!(matches!(scheduler.trigger(), Err(EngineError::CycleInFlight)));

        scheduler.complete(now, "not used").unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(scheduler.trigger().is_ok());
    }

    #[test]
    fn test_auto_cycle_rearms_after_completion() {
        let mut scheduler = Scheduler::new();
        let start = Instant::now();
        scheduler.start_auto("30").unwrap();
        assert!(!scheduler.poll_due(start + Duration::from_secs(100)));

        scheduler.complete(start, "30").unwrap();
        assert_eq!(
            scheduler.state(),
            SchedulerState::AutoScheduled { due: start + Duration::from_secs(30) }
        );
        assert_eq!(scheduler.time_until_due(start), Some(Duration::from_secs(30)));
        assert!(!scheduler.poll_due(start + Duration::from_secs(29)));
        assert!(scheduler.poll_due(start + Duration::from_secs(30)));
        assert_eq!(scheduler.state(), SchedulerState::Running { auto: true });
    }

    #[test]
    fn test_interval_change_applies_to_next_tick() {
        let mut scheduler = Scheduler::new();
        let start = Instant::now();
        scheduler.start_auto("60").unwrap();
        scheduler.complete(start, "5").unwrap();
        assert_eq!(scheduler.time_until_due(start), Some(Duration::from_secs(5)));
        assert_eq!(scheduler.warning(), Some(SHORT_INTERVAL_WARNING));
    }

    #[test]
    fn test_invalid_interval_on_rearm_stops_auto_mode() {
        let mut scheduler = Scheduler::new();
        let start = Instant::now();
        scheduler.start_auto("60").unwrap();
        let err = scheduler.complete(start, "zero").unwrap_err();
        assert!(matches!(err, EngineError::Configuration(ConfigurationError::NotANumber(_))));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(!scheduler.is_auto());
    }

    #[test]
    fn test_stop_cancels_pending_tick() {
        let mut scheduler = Scheduler::new();
        let start = Instant::now();
        scheduler.start_auto("10").unwrap();
        scheduler.complete(start, "10").unwrap();
        scheduler.stop();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(!scheduler.poll_due(start + Duration::from_secs(60)));
    }

    #[test]
    fn test_stop_during_cycle_keeps_guard_until_completion() {
        let mut scheduler = Scheduler::new();
        let start = Instant::now();
        scheduler.start_auto("10").unwrap();
        scheduler.stop();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(scheduler.is_in_flight());
        assert!(matches!(scheduler.trigger(), Err(EngineError::CycleInFlight)));

        scheduler.complete(start, "10").unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(scheduler.trigger().is_ok());
    }
}
