use std::net::IpAddr;

use async_trait::async_trait;
use log::{debug, warn};

use crate::error::ProbeFailure;
use crate::ping_executor::sanitize_hostname;
use crate::probe::ResolutionProbe;
use crate::record::ResolutionResult;

/// Name-resolution probe backed by the system resolver.
#[derive(Debug, Default, Clone)]
pub struct SystemResolver;

impl SystemResolver {
    /// Resolve a domain, preferring an IPv4 address when one exists.
    pub async fn lookup(domain: &str) -> Result<IpAddr, ProbeFailure> {
        let sanitized = sanitize_hostname(domain).ok_or_else(|| ProbeFailure::InvalidHost(domain.to_string()))?;
        if let Ok(ip) = sanitized.parse::<IpAddr>() {
            return Ok(ip);
        }

        let addrs: Vec<IpAddr> = tokio::net::lookup_host(format!("{sanitized}:80"))
            .await
            .map_err(|e| ProbeFailure::Resolve(e.to_string()))?
            .map(|addr| addr.ip())
            .collect();

        addrs
            .iter()
            .find(|ip| ip.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| ProbeFailure::Resolve(format!("no addresses found for {sanitized}")))
    }
}

#[async_trait]
impl ResolutionProbe for SystemResolver {
    async fn resolve(&self, domain: &str) -> ResolutionResult {
        debug!("Resolving {domain}");
        match Self::lookup(domain).await {
            Ok(ip) => {
                debug!("{domain} resolved to {ip}");
                ResolutionResult::success(domain, ip)
            }
            Err(e) => {
                warn!("DNS lookup of {domain} failed: {e}");
                ResolutionResult::failure(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ip_literal_resolves_to_itself() {
        let result = SystemResolver.resolve("127.0.0.1").await;
        assert!(result.success);
        assert_eq!(result.output, "IP address of 127.0.0.1: 127.0.0.1");
    }

    #[tokio::test]
    async fn test_invalid_domain_is_captured() {
        let result = SystemResolver.resolve("!!!").await;
        assert!(!result.success);
        assert!(result.output.starts_with("Error during DNS lookup:"));
    }
}
