//! Fixed-threshold verdicts for each probe result.

use std::fmt;

use crate::record::{LatencyResult, ResolutionResult, ThroughputResult};

const LATENCY_EXCELLENT_MS: f64 = 50.0;
const LATENCY_GOOD_MS: f64 = 100.0;

const DOWNLOAD_EXCELLENT_MBPS: f64 = 100.0;
const UPLOAD_EXCELLENT_MBPS: f64 = 50.0;
const DOWNLOAD_GOOD_MBPS: f64 = 25.0;
const UPLOAD_GOOD_MBPS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyVerdict {
    Excellent,
    Good,
    High,
    Unknown,
}

impl LatencyVerdict {
    pub fn from_avg_time(avg_time_ms: Option<f64>) -> Self {
        match avg_time_ms {
            Some(time) if time < LATENCY_EXCELLENT_MS => LatencyVerdict::Excellent,
            Some(time) if time < LATENCY_GOOD_MS => LatencyVerdict::Good,
            Some(_) => LatencyVerdict::High,
            None => LatencyVerdict::Unknown,
        }
    }
}

impl fmt::Display for LatencyVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LatencyVerdict::Excellent => "Excellent ping time.",
            LatencyVerdict::Good => "Good ping time for most applications.",
            LatencyVerdict::High => "High ping time might affect real-time applications.",
            LatencyVerdict::Unknown => "Unable to determine ping time.",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionVerdict {
    Working,
    Failed,
}

impl fmt::Display for ResolutionVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResolutionVerdict::Working => "DNS lookup successful. Your DNS is working correctly.",
            ResolutionVerdict::Failed => {
                "DNS lookup failed. There might be an issue with your DNS server or internet connection."
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThroughputVerdict {
    Failed(String),
    Excellent,
    Good,
    Insufficient,
}

impl ThroughputVerdict {
    pub fn from_rates(download_mbps: f64, upload_mbps: f64) -> Self {
        if download_mbps > DOWNLOAD_EXCELLENT_MBPS && upload_mbps > UPLOAD_EXCELLENT_MBPS {
            ThroughputVerdict::Excellent
        } else if download_mbps > DOWNLOAD_GOOD_MBPS && upload_mbps > UPLOAD_GOOD_MBPS {
            ThroughputVerdict::Good
        } else {
            ThroughputVerdict::Insufficient
        }
    }
}

impl fmt::Display for ThroughputVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThroughputVerdict::Failed(error) => write!(f, "Speed test failed. Error: {error}"),
            ThroughputVerdict::Excellent => f.write_str("Excellent internet speed."),
            ThroughputVerdict::Good => f.write_str("Good internet speed for most applications."),
            ThroughputVerdict::Insufficient => {
                f.write_str("Your internet speed might be insufficient for some applications.")
            }
        }
    }
}

pub fn interpret_latency(result: &LatencyResult) -> LatencyVerdict {
    LatencyVerdict::from_avg_time(result.avg_time)
}

pub fn interpret_resolution(result: &ResolutionResult) -> ResolutionVerdict {
    if result.success {
        ResolutionVerdict::Working
    } else {
        ResolutionVerdict::Failed
    }
}

pub fn interpret_throughput(result: &ThroughputResult) -> ThroughputVerdict {
    match &result.error {
        Some(error) => ThroughputVerdict::Failed(error.clone()),
        None => ThroughputVerdict::from_rates(result.download, result.upload),
    }
}
