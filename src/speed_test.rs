//! Throughput probe using speedtest.net compatible HTTP servers.
//!
//! Servers come from the public catalogue; each one serves `latency.txt`,
//! a set of `randomNxN.jpg` images for download and an `upload.php`
//! endpoint that accepts a POST body.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;

use crate::error::ProbeFailure;
use crate::probe::{SpeedTestServer, ThroughputProbe};
use crate::record::ThroughputResult;

const CATALOGUE_URL: &str = "https://www.speedtest.net/api/js/servers?engine=js&https_functional=true&limit=20";

/// Nearest catalogue entries probed when picking the best server.
const BEST_SERVER_CANDIDATES: usize = 5;

const LATENCY_SAMPLES: u32 = 3;

const DOWNLOAD_IMAGES: &[&str] = &["random1000x1000.jpg", "random2000x2000.jpg", "random3000x3000.jpg"];

/// Upload payload size in bytes (4 MB).
const UPLOAD_SIZE: usize = 4_000_000;

/// HTTP client timeout
const REQUEST_TIMEOUT_SECS: u64 = 60;

const USER_AGENT: &str = concat!("net-health-monitor/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Deserialize)]
struct CatalogueEntry {
    id: String,
    url: String,
    #[serde(default)]
    sponsor: String,
    #[serde(default)]
    name: String,
}

impl CatalogueEntry {
    fn numeric_id(&self) -> Option<u32> {
        self.id.parse().ok()
    }

    /// Directory holding the server's test files.
    fn base_url(&self) -> &str {
        self.url.rsplit_once('/').map_or(self.url.as_str(), |(base, _)| base)
    }
}

/// Convert a transfer measurement into megabits per second.
pub fn to_mbps(bytes: u64, elapsed: Duration) -> Option<f64> {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return None;
    }
    let bits_per_second = bytes as f64 * 8.0 / secs;
    Some(bits_per_second / 1_000_000.0)
}

/// Throughput probe performing download and upload tests over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSpeedTest {
    catalogue_url: String,
}

impl Default for HttpSpeedTest {
    fn default() -> Self {
        Self::new(CATALOGUE_URL)
    }
}

impl HttpSpeedTest {
    pub fn new(catalogue_url: impl Into<String>) -> Self {
        Self {
            catalogue_url: catalogue_url.into(),
        }
    }

    async fn run(&self, server: SpeedTestServer) -> Result<ThroughputResult, ProbeFailure> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        let catalogue: Vec<CatalogueEntry> = client
            .get(&self.catalogue_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let (entry, ping) = match server.id() {
            Some(id) => {
                let entry = find_server(catalogue, id)?;
                let ping = measure_latency(&client, &entry).await?;
                (entry, ping)
            }
            None => select_best_server(&client, catalogue).await?,
        };
        info!("Speed test server: {} ({}), latency {ping:.2} ms", entry.sponsor, entry.name);

        let download = measure_download(&client, &entry).await?;
        debug!("Download: {download:.2} Mbps");
        let upload = measure_upload(&client, &entry).await?;
        debug!("Upload: {upload:.2} Mbps");

        Ok(ThroughputResult::success(download, upload, ping))
    }
}

/// A named server is only usable if the nearest-servers catalogue lists it.
fn find_server(catalogue: Vec<CatalogueEntry>, id: u32) -> Result<CatalogueEntry, ProbeFailure> {
    catalogue
        .into_iter()
        .find(|entry| entry.numeric_id() == Some(id))
        .ok_or(ProbeFailure::ServerUnavailable(id))
}

#[async_trait]
impl ThroughputProbe for HttpSpeedTest {
    async fn measure(&self, server: SpeedTestServer) -> ThroughputResult {
        info!("Starting speed test against {}", server.label());
        match self.run(server).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Speed test failed: {e}");
                ThroughputResult::failure(e)
            }
        }
    }
}

async fn select_best_server(
    client: &Client,
    catalogue: Vec<CatalogueEntry>,
) -> Result<(CatalogueEntry, f64), ProbeFailure> {
    let mut best: Option<(CatalogueEntry, f64)> = None;
    for entry in catalogue.into_iter().take(BEST_SERVER_CANDIDATES) {
        match measure_latency(client, &entry).await {
            Ok(ping) if best.as_ref().is_none_or(|(_, current)| ping < *current) => best = Some((entry, ping)),
            Ok(_) => {}
            Err(e) => debug!("Skipping server {}: {e}", entry.id),
        }
    }
    best.ok_or(ProbeFailure::NoServers)
}

/// Lowest round-trip time of a few small requests, in milliseconds.
async fn measure_latency(client: &Client, entry: &CatalogueEntry) -> Result<f64, ProbeFailure> {
    let url = format!("{}/latency.txt", entry.base_url());
    let mut best = f64::MAX;
    for _ in 0..LATENCY_SAMPLES {
        let start = Instant::now();
        let response = client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ProbeFailure::Status(response.status()));
        }
        response.bytes().await?;
        best = best.min(start.elapsed().as_secs_f64() * 1000.0);
    }
    Ok(best)
}

async fn measure_download(client: &Client, entry: &CatalogueEntry) -> Result<f64, ProbeFailure> {
    let mut total_bytes: u64 = 0;
    let start = Instant::now();
    for image in DOWNLOAD_IMAGES {
        let url = format!("{}/{image}", entry.base_url());
        let response = client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ProbeFailure::Status(response.status()));
        }
        total_bytes += response.bytes().await?.len() as u64;
    }
    to_mbps(total_bytes, start.elapsed()).ok_or(ProbeFailure::TooFast)
}

async fn measure_upload(client: &Client, entry: &CatalogueEntry) -> Result<f64, ProbeFailure> {
    let payload: Vec<u8> = (0..UPLOAD_SIZE).map(|i| b'a' + (i % 26) as u8).collect();
    let start = Instant::now();
    let response = client
        .post(&entry.url)
        .header("Content-Type", "application/octet-stream")
        .body(payload)
        .send()
        .await?;
    let elapsed = start.elapsed();
    if !response.status().is_success() {
        return Err(ProbeFailure::Status(response.status()));
    }
    to_mbps(UPLOAD_SIZE as u64, elapsed).ok_or(ProbeFailure::TooFast)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_mbps() {
        assert_eq!(to_mbps(1_250_000, Duration::from_secs(1)), Some(10.0));
        assert_eq!(to_mbps(12_500_000, Duration::from_secs(2)), Some(50.0));
        assert_eq!(to_mbps(100, Duration::ZERO), None);
    }

    #[test]
    fn test_catalogue_entry_base_url() {
        let entry: CatalogueEntry = serde_json::from_str(
            r#"{"id":"6032","url":"http://speedtest.example.net:8080/speedtest/upload.php","sponsor":"Example","name":"London"}"#,
        )
        .unwrap();
        assert_eq!(entry.numeric_id(), Some(6032));
        assert_eq!(entry.base_url(), "http://speedtest.example.net:8080/speedtest");
    }

    #[test]
    fn test_named_server_missing_from_catalogue() {
        let catalogue: Vec<CatalogueEntry> = serde_json::from_str(
            r#"[{"id":"6032","url":"http://a.example.net/speedtest/upload.php"},
                {"id":"1234","url":"http://b.example.net/speedtest/upload.php"}]"#,
        )
        .unwrap();
        assert_eq!(find_server(catalogue.clone(), 6032).unwrap().numeric_id(), Some(6032));

        let err = find_server(catalogue, SpeedTestServer::Tokyo.id().unwrap()).unwrap_err();
        assert!(matches!(err, ProbeFailure::ServerUnavailable(6087)));
        assert_eq!(err.to_string(), "speed test server 6087 is not available");
    }

    #[tokio::test]
    async fn test_unreachable_catalogue_is_captured() {
        let probe = HttpSpeedTest::new("http://127.0.0.1:9/servers");
        let result = probe.measure(SpeedTestServer::London).await;
        assert_eq!(result.download, 0.0);
        assert_eq!(result.upload, 0.0);
        assert_eq!(result.ping, 0.0);
        assert!(result.error.is_some());
    }
}
