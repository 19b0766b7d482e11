//! Controller owning all mutable engine state.
//!
//! The engine lives on the control thread. Each cycle runs on its own worker
//! thread with a snapshot of the settings, and reports back over a channel
//! that [`Engine::poll`] drains, so history is only ever touched here.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use log::{error, info};

use crate::config::MonitorConfig;
use crate::error::{EngineError, ExportError, SettingsError};
use crate::export::{RecordWriter, export_to_path};
use crate::history::History;
use crate::notifier::{self, Alert, Notifier};
use crate::orchestrator::{CycleSettings, Orchestrator};
use crate::record::MeasurementRecord;
use crate::resolver::SystemResolver;
use crate::scheduler::{Interval, Scheduler};
use crate::speed_test::HttpSpeedTest;

/// Messages sent from a worker to the control thread.
#[derive(Debug)]
enum WorkerEvent {
    Progress(u8),
    Completed(MeasurementRecord),
    Failed(String),
}

/// What changed during a [`Engine::poll`].
#[derive(Debug)]
pub enum EngineUpdate {
    Progress(u8),
    Completed {
        record: MeasurementRecord,
        alerts: Vec<Alert>,
    },
    /// The worker failed or panicked before producing a record.
    CycleFailed(String),
    /// Auto mode could not re-arm and has stopped.
    AutoStopped(EngineError),
}

pub struct Engine {
    config: MonitorConfig,
    interval_input: String,
    history: History,
    scheduler: Scheduler,
    orchestrator: Orchestrator,
    notifier: Notifier,
    progress: u8,
    events_tx: Sender<WorkerEvent>,
    events_rx: Receiver<WorkerEvent>,
}

impl Engine {
    pub fn new(config: MonitorConfig, orchestrator: Orchestrator, notifier: Notifier) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            interval_input: config.interval_secs.to_string(),
            config,
            history: History::new(),
            scheduler: Scheduler::new(),
            orchestrator,
            notifier,
            progress: 0,
            events_tx,
            events_rx,
        }
    }

    /// Engine wired to the real probes and the platform notification sink.
    pub fn with_defaults(config: MonitorConfig) -> Self {
        let orchestrator = Orchestrator::new(
            Arc::new(config.ping_method),
            Arc::new(SystemResolver),
            Arc::new(HttpSpeedTest::default()),
        );
        Self::new(config, orchestrator, Notifier::new(notifier::default_sink()))
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Edits take effect from the next cycle.
    pub fn config_mut(&mut self) -> &mut MonitorConfig {
        &mut self.config
    }

    /// Raw interval text as typed by the user; validated when used.
    pub fn interval_input_mut(&mut self) -> &mut String {
        &mut self.interval_input
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn is_in_flight(&self) -> bool {
        self.scheduler.is_in_flight()
    }

    pub fn is_auto(&self) -> bool {
        self.scheduler.is_auto()
    }

    pub fn warning(&self) -> Option<&'static str> {
        self.scheduler.warning()
    }

    /// Time until the next auto cycle is due.
    pub fn next_due_in(&self, now: Instant) -> Option<Duration> {
        self.scheduler.time_until_due(now)
    }

    /// Start a single on-demand cycle.
    pub fn run_once(&mut self) -> Result<(), EngineError> {
        self.scheduler.trigger()?;
        self.dispatch()
    }

    /// Validate the interval, enter auto mode and start the first cycle.
    pub fn start_auto(&mut self) -> Result<(), EngineError> {
        self.scheduler.start_auto(&self.interval_input)?;
        self.dispatch()
    }

    pub fn stop_auto(&mut self) {
        self.scheduler.stop();
    }

    pub fn toggle_auto(&mut self) -> Result<(), EngineError> {
        if self.is_auto() {
            self.stop_auto();
            Ok(())
        } else {
            self.start_auto()
        }
    }

    /// Drain worker messages and start the next auto cycle if it is due.
    pub fn poll(&mut self, now: Instant) -> Vec<EngineUpdate> {
        let mut updates = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle(event, now, &mut updates);
        }
        self.dispatch_due(now, &mut updates);
        updates
    }

    /// Block up to `timeout` for a worker message, then behave like [`poll`](Self::poll).
    pub fn wait(&mut self, now: Instant, timeout: Duration) -> Vec<EngineUpdate> {
        let mut updates = Vec::new();
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => self.handle(event, now, &mut updates),
            // The engine holds a sender, so the channel never disconnects.
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {}
        }
        updates.extend(self.poll(now));
        updates
    }

    /// Persist the current settings, including the interval field.
    pub fn save_settings(&mut self) -> Result<(), SettingsError> {
        self.commit_interval()?;
        self.config.save()?;
        info!("Settings saved");
        Ok(())
    }

    /// Like [`save_settings`](Self::save_settings) with an explicit file.
    pub fn save_settings_to(&mut self, path: &Path) -> Result<(), SettingsError> {
        self.commit_interval()?;
        self.config.save_to(path)?;
        info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Store the interval field as whole seconds. Invalid input changes nothing.
    fn commit_interval(&mut self) -> Result<(), SettingsError> {
        let interval = Interval::parse(&self.interval_input)?;
        self.config.interval_secs = interval.secs().round().max(1.0) as u64;
        Ok(())
    }

    /// Write the current history with the given writer.
    pub fn export(&self, writer: &dyn RecordWriter, path: &Path) -> Result<(), ExportError> {
        export_to_path(writer, self.history.all(), path)
    }

    fn handle(&mut self, event: WorkerEvent, now: Instant, updates: &mut Vec<EngineUpdate>) {
        match event {
            WorkerEvent::Progress(percent) => {
                self.progress = percent;
                updates.push(EngineUpdate::Progress(percent));
            }
            WorkerEvent::Completed(record) => {
                self.history.append(record);
                if let Some(record) = self.history.latest().cloned() {
                    let alerts = self.notifier.inspect(&record);
                    updates.push(EngineUpdate::Completed { record, alerts });
                }
                self.finish_cycle(now, updates);
            }
            WorkerEvent::Failed(message) => {
                error!("Measurement cycle failed: {message}");
                updates.push(EngineUpdate::CycleFailed(message));
                self.finish_cycle(now, updates);
            }
        }
    }

    fn finish_cycle(&mut self, now: Instant, updates: &mut Vec<EngineUpdate>) {
        if let Err(e) = self.scheduler.complete(now, &self.interval_input) {
            error!("{e} Auto test stopped.");
            updates.push(EngineUpdate::AutoStopped(e));
        }
    }

    fn dispatch_due(&mut self, now: Instant, updates: &mut Vec<EngineUpdate>) {
        if self.scheduler.poll_due(now) {
            if let Err(e) = self.dispatch() {
                updates.push(EngineUpdate::AutoStopped(e));
            }
        }
    }

    /// Spawn a worker for the cycle the scheduler just admitted.
    fn dispatch(&mut self) -> Result<(), EngineError> {
        self.progress = 0;
        let orchestrator = self.orchestrator.clone();
        let settings = CycleSettings::from(&self.config);
        let tx = self.events_tx.clone();

        let spawned = thread::Builder::new()
            .name("measurement-cycle".to_string())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                    Ok(rt) => rt,
                    Err(e) => {
                        let _ = tx.send(WorkerEvent::Failed(format!("failed to start runtime: {e}")));
                        return;
                    }
                };
                let progress_tx = tx.clone();
                let progress = move |percent: u8| {
                    let _ = progress_tx.send(WorkerEvent::Progress(percent));
                };
                let cycle = panic::catch_unwind(AssertUnwindSafe(|| {
                    rt.block_on(orchestrator.run_cycle(&settings, &progress))
                }));
                let event = match cycle {
                    Ok(record) => WorkerEvent::Completed(record),
                    Err(payload) => WorkerEvent::Failed(format!("worker panicked: {}", panic_message(&*payload))),
                };
                let _ = tx.send(event);
            });

        if let Err(e) = spawned {
            // Release the in-flight guard so a fresh cycle can start later.
            self.scheduler.stop();
            let _ = self.scheduler.complete(Instant::now(), &self.interval_input);
            return Err(EngineError::WorkerSpawn(e));
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
