use thiserror::Error;

/// Invalid auto-test interval.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("Interval must be a number of seconds, got '{0}'.")]
    NotANumber(String),
    #[error("Interval must be at least 1 second.")]
    BelowMinimum(f64),
    #[error("Interval must be at most 86400 seconds (one day).")]
    AboveMaximum(f64),
}

/// Errors raised by scheduling actions on the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("A measurement cycle is already running")]
    CycleInFlight,
    #[error("Failed to start measurement worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode records: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Interval(#[from] ConfigurationError),
    #[error("Could not find config directory")]
    NoConfigDir,
    #[error("Settings I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Settings could not be encoded: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Failure of an external measurement facility.
///
/// Probes turn these into text inside their result; they never cross the
/// probe boundary as an `Err`.
#[derive(Debug, Error)]
pub enum ProbeFailure {
    #[error("invalid host '{0}'")]
    InvalidHost(String),
    #[error("failed to run ping: {0}")]
    Invocation(#[from] std::io::Error),
    #[error("no average round-trip time found in ping output")]
    NoSummary,
    #[error("no reply from {0}")]
    NoReply(String),
    #[error("ICMP socket unavailable: {0}")]
    Socket(String),
    #[error("{0}")]
    Resolve(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP request failed with status {0}")]
    Status(reqwest::StatusCode),
    #[error("speed test server {0} is not available")]
    ServerUnavailable(u32),
    #[error("no speed test servers available")]
    NoServers,
    #[error("transfer completed too fast to measure")]
    TooFast,
}
