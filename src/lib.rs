//! Network health monitoring: latency, DNS resolution and throughput probes,
//! a session history of their results, and interval-driven scheduling.

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod history;
pub mod interpret;
pub mod notifier;
pub mod orchestrator;
pub mod ping_executor;
pub mod probe;
pub mod record;
pub mod report;
pub mod resolver;
pub mod scheduler;
pub mod speed_test;

pub use app::NetworkMonitorApp;
pub use config::{MonitorConfig, PingMethod};
pub use engine::{Engine, EngineUpdate};
pub use error::{ConfigurationError, EngineError, ExportError, SettingsError};
pub use history::History;
pub use orchestrator::{CycleSettings, Orchestrator, ProgressObserver};
pub use probe::{LatencyProbe, ResolutionProbe, SpeedTestServer, ThroughputProbe};
pub use record::{LatencyResult, MeasurementRecord, ResolutionResult, ThroughputResult};
pub use scheduler::{Interval, Scheduler, SchedulerState};
