use std::sync::Arc;

use log::info;

use crate::config::MonitorConfig;
use crate::probe::{LatencyProbe, ResolutionProbe, SpeedTestServer, ThroughputProbe};
use crate::record::{MeasurementRecord, now_local};

pub const PROGRESS_LATENCY_DONE: u8 = 20;
pub const PROGRESS_RESOLUTION_DONE: u8 = 40;
pub const PROGRESS_COMPLETE: u8 = 100;

/// Receives progress milestones (percent) while a cycle runs.
pub trait ProgressObserver {
    fn report(&self, percent: u8);
}

impl ProgressObserver for () {
    fn report(&self, _percent: u8) {}
}

impl<F: Fn(u8)> ProgressObserver for F {
    fn report(&self, percent: u8) {
        self(percent)
    }
}

/// Per-cycle copy of the settings the probes read.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSettings {
    pub ping_host: String,
    pub dns_domain: String,
    pub server: SpeedTestServer,
}

impl From<&MonitorConfig> for CycleSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            ping_host: config.ping_host.clone(),
            dns_domain: config.dns_domain.clone(),
            server: config.server,
        }
    }
}

/// Runs the three probes in sequence and assembles one record.
#[derive(Clone)]
pub struct Orchestrator {
    latency: Arc<dyn LatencyProbe>,
    resolution: Arc<dyn ResolutionProbe>,
    throughput: Arc<dyn ThroughputProbe>,
}

impl Orchestrator {
    pub fn new(
        latency: Arc<dyn LatencyProbe>,
        resolution: Arc<dyn ResolutionProbe>,
        throughput: Arc<dyn ThroughputProbe>,
    ) -> Self {
        Self {
            latency,
            resolution,
            throughput,
        }
    }

    pub async fn run_cycle(&self, settings: &CycleSettings, progress: &dyn ProgressObserver) -> MeasurementRecord {
        info!("Starting measurement cycle");

        let latency = self.latency.measure(&settings.ping_host).await;
        progress.report(PROGRESS_LATENCY_DONE);

        let resolution = self.resolution.resolve(&settings.dns_domain).await;
        progress.report(PROGRESS_RESOLUTION_DONE);

        let throughput = self.throughput.measure(settings.server).await;
        progress.report(PROGRESS_COMPLETE);

        let record = MeasurementRecord::new(now_local(), latency, resolution, throughput);
        info!("Measurement cycle finished at {}", record.timestamp_text());
        record
    }
}
