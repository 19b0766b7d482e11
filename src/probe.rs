//! Provider contracts for the three network probes.
//!
//! Every probe captures its failures as data inside the returned result, so
//! none of these methods return `Result`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::record::{LatencyResult, ResolutionResult, ThroughputResult};

/// Number of echo requests sent per latency measurement.
pub const PING_COUNT: u32 = 4;

#[async_trait]
pub trait LatencyProbe: Send + Sync {
    async fn measure(&self, host: &str) -> LatencyResult;
}

#[async_trait]
pub trait ResolutionProbe: Send + Sync {
    async fn resolve(&self, domain: &str) -> ResolutionResult;
}

#[async_trait]
pub trait ThroughputProbe: Send + Sync {
    async fn measure(&self, server: SpeedTestServer) -> ThroughputResult;
}

/// Named throughput servers offered to the user.
///
/// Named servers are looked up in the catalogue, which only lists servers
/// near the client. From far away a named server is usually missing and the
/// measurement fails as unavailable; `Default` picks from what is listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpeedTestServer {
    #[default]
    Default,
    NewYork,
    London,
    Tokyo,
}

impl SpeedTestServer {
    pub const ALL: [SpeedTestServer; 4] = [
        SpeedTestServer::Default,
        SpeedTestServer::NewYork,
        SpeedTestServer::London,
        SpeedTestServer::Tokyo,
    ];

    /// Provider-specific server id; `None` means "best available".
    pub fn id(self) -> Option<u32> {
        match self {
            SpeedTestServer::Default => None,
            SpeedTestServer::NewYork => Some(10556),
            SpeedTestServer::London => Some(6032),
            SpeedTestServer::Tokyo => Some(6087),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpeedTestServer::Default => "Default",
            SpeedTestServer::NewYork => "New York",
            SpeedTestServer::London => "London",
            SpeedTestServer::Tokyo => "Tokyo",
        }
    }
}
