use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Text form used for timestamps in displays and exports.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of the latency probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyResult {
    pub output: String,
    /// Average round-trip time in milliseconds, present only when parsed.
    pub avg_time: Option<f64>,
}

impl LatencyResult {
    /// Negative or non-finite averages are rejected so that `avg_time` never
    /// carries a placeholder.
    pub fn success(output: String, avg_time_ms: f64) -> Self {
        let avg_time = (avg_time_ms.is_finite() && avg_time_ms >= 0.0).then_some(avg_time_ms);
        Self { output, avg_time }
    }

    pub fn failure(error: impl std::fmt::Display) -> Self {
        Self {
            output: format!("Error during ping test: {error}"),
            avg_time: None,
        }
    }
}

/// Outcome of the name-resolution probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub output: String,
    pub success: bool,
}

impl ResolutionResult {
    pub fn success(domain: &str, address: std::net::IpAddr) -> Self {
        Self {
            output: format!("IP address of {domain}: {address}"),
            success: true,
        }
    }

    pub fn failure(error: impl std::fmt::Display) -> Self {
        Self {
            output: format!("Error during DNS lookup: {error}"),
            success: false,
        }
    }
}

/// Outcome of the throughput probe. Rates are in megabits per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputResult {
    pub download: f64,
    pub upload: f64,
    /// Latency reported by the throughput facility, in milliseconds.
    pub ping: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ThroughputResult {
    pub fn success(download_mbps: f64, upload_mbps: f64, ping_ms: f64) -> Self {
        Self {
            download: download_mbps,
            upload: upload_mbps,
            ping: ping_ms,
            error: None,
        }
    }

    pub fn failure(error: impl std::fmt::Display) -> Self {
        Self {
            download: 0.0,
            upload: 0.0,
            ping: 0.0,
            error: Some(error.to_string()),
        }
    }
}

/// One completed measurement cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    #[serde(with = "timestamp_text")]
    pub timestamp: NaiveDateTime,
    pub latency: LatencyResult,
    pub resolution: ResolutionResult,
    pub throughput: ThroughputResult,
}

impl MeasurementRecord {
    pub fn new(
        timestamp: NaiveDateTime,
        latency: LatencyResult,
        resolution: ResolutionResult,
        throughput: ThroughputResult,
    ) -> Self {
        Self {
            timestamp: truncate_to_second(timestamp),
            latency,
            resolution,
            throughput,
        }
    }

    pub fn timestamp_text(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Local wall-clock time at second precision.
pub fn now_local() -> NaiveDateTime {
    truncate_to_second(Local::now().naive_local())
}

fn truncate_to_second(time: NaiveDateTime) -> NaiveDateTime {
    time.with_nanosecond(0).unwrap_or(time)
}

mod timestamp_text {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
