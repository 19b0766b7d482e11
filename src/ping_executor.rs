use std::fmt::Write as _;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use surge_ping::{Client, Config, ICMP, IcmpPacket, PingIdentifier, PingSequence};

use crate::config::PingMethod;
use crate::error::ProbeFailure;
use crate::probe::{LatencyProbe, PING_COUNT};
use crate::record::LatencyResult;

const ICMP_TIMEOUT_SECS: u64 = 5;

/// Validate a host name, allowing only alphanumerics, dots and hyphens.
/// IP literals pass through unchanged and a trailing `:port` is dropped.
/// Anything else, including a leading hyphen that ping would read as a flag,
/// is rejected rather than rewritten into a different host.
pub fn sanitize_hostname(hostname: &str) -> Option<String> {
    let hostname = hostname.trim();
    if let Ok(ip) = hostname.parse::<IpAddr>() {
        return Some(ip.to_string());
    }

    // Also handle case where user included port like "example.com:8080"
    let hostname = hostname.split(':').next().unwrap_or(hostname);

    let valid = !hostname.is_empty()
        && !hostname.starts_with('-')
        && hostname.chars().all(|c| c.is_alphanumeric() || c == '.' || c == '-');
    valid.then(|| hostname.to_string())
}

/// Extract the average round-trip time from a ping summary line.
///
/// Understands `Average = 23ms` (Windows) and
/// `rtt|round-trip min/avg/max[/mdev] = a/b/c[/d] ms` (Linux, BSD, busybox).
pub fn parse_average(output: &str) -> Option<f64> {
    output
        .lines()
        .find_map(|line| parse_windows_summary(line).or_else(|| parse_unix_summary(line)))
        .filter(|avg| avg.is_finite() && *avg >= 0.0)
}

fn parse_windows_summary(line: &str) -> Option<f64> {
    let (_, rest) = line.split_once("Average = ")?;
    let (value, _) = rest.split_once("ms")?;
    value.trim().parse().ok()
}

fn parse_unix_summary(line: &str) -> Option<f64> {
    let (labels, values) = line.split_once('=')?;
    if !labels.contains("min/avg/max") {
        return None;
    }
    let values = values.trim().trim_end_matches("ms").trim();
    values.split('/').nth(1)?.trim().parse().ok()
}

/// Latency probe backed by the operating system's `ping` command.
#[derive(Debug, Default, Clone)]
pub struct SystemPing;

impl SystemPing {
    async fn run(host: &str) -> Result<(String, f64), ProbeFailure> {
        let target = sanitize_hostname(host).ok_or_else(|| ProbeFailure::InvalidHost(host.to_string()))?;
        let count_flag = if cfg!(target_os = "windows") { "-n" } else { "-c" };
        let count = PING_COUNT.to_string();

        let output = tokio::process::Command::new("ping")
            .args([count_flag, count.as_str(), target.as_str()])
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let avg = parse_average(&stdout).ok_or(ProbeFailure::NoSummary)?;
        Ok((stdout, avg))
    }
}

#[async_trait]
impl LatencyProbe for SystemPing {
    async fn measure(&self, host: &str) -> LatencyResult {
        debug!("Pinging {host} with the system ping command");
        match Self::run(host).await {
            Ok((output, avg)) => LatencyResult::success(output, avg),
            Err(e) => {
                warn!("Ping test against {host} failed: {e}");
                LatencyResult::failure(e)
            }
        }
    }
}

/// Latency probe sending ICMP echo requests directly.
#[derive(Debug, Default, Clone)]
pub struct IcmpPing;

impl IcmpPing {
    /// Resolve hostname to IP address
    async fn resolve_target(target: &str) -> Result<IpAddr, ProbeFailure> {
        let sanitized = sanitize_hostname(target).ok_or_else(|| ProbeFailure::InvalidHost(target.to_string()))?;
        if let Ok(ip) = sanitized.parse::<IpAddr>() {
            return Ok(ip);
        }

        let mut addrs = tokio::net::lookup_host(format!("{sanitized}:80"))
            .await
            .map_err(|e| ProbeFailure::Resolve(e.to_string()))?;
        addrs
            .next()
            .map(|addr| addr.ip())
            .ok_or_else(|| ProbeFailure::Resolve(format!("no address for {sanitized}")))
    }

    async fn run(host: &str) -> Result<(String, f64), ProbeFailure> {
        let target_ip = Self::resolve_target(host).await?;
        let config = match target_ip {
            IpAddr::V4(_) => Config::default(),
            IpAddr::V6(_) => Config::builder().kind(ICMP::V6).build(),
        };
        let client = Client::new(&config).map_err(|e| ProbeFailure::Socket(e.to_string()))?;
        let mut pinger = client.pinger(target_ip, PingIdentifier(std::process::id() as u16)).await;
        pinger.timeout(Duration::from_secs(ICMP_TIMEOUT_SECS));

        let mut output = format!("Pinging {host} [{target_ip}]:\n");
        let mut times = Vec::with_capacity(PING_COUNT as usize);
        for seq in 0..PING_COUNT {
            match pinger.ping(PingSequence(seq as u16), &[0; 32]).await {
                Ok((IcmpPacket::V4(_), duration)) | Ok((IcmpPacket::V6(_), duration)) => {
                    let ms = duration.as_secs_f64() * 1000.0;
                    let _ = writeln!(output, "Reply from {target_ip}: time={ms:.1}ms");
                    times.push(ms);
                }
                Err(e) => {
                    let _ = writeln!(output, "Request {seq} failed: {e}");
                }
            }
        }

        if times.is_empty() {
            return Err(ProbeFailure::NoReply(target_ip.to_string()));
        }

        let avg = times.iter().sum::<f64>() / times.len() as f64;
        let _ = writeln!(
            output,
            "Packets: Sent = {PING_COUNT}, Received = {}, Lost = {}",
            times.len(),
            PING_COUNT as usize - times.len()
        );
        let _ = write!(output, "Average = {avg:.0}ms");
        Ok((output, avg))
    }
}

#[async_trait]
impl LatencyProbe for IcmpPing {
    async fn measure(&self, host: &str) -> LatencyResult {
        debug!("Pinging {host} over ICMP");
        match Self::run(host).await {
            Ok((output, avg)) => LatencyResult::success(output, avg),
            Err(e) => {
                warn!("ICMP ping against {host} failed: {e}");
                LatencyResult::failure(e)
            }
        }
    }
}

#[async_trait]
impl LatencyProbe for PingMethod {
    async fn measure(&self, host: &str) -> LatencyResult {
        match self {
            PingMethod::System => SystemPing.measure(host).await,
            PingMethod::Icmp => IcmpPing.measure(host).await,
        }
    }
}
