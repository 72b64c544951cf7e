//! Hostname resolution seam

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// Resolves a hostname to every address it maps to
#[async_trait]
pub trait Resolve: Send + Sync {
    /// Look up all A/AAAA records for `host`
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the system DNS configuration.
///
/// The underlying resolver is created on first use so that construction
/// does not need a running tokio runtime.
#[derive(Default)]
pub struct SystemResolver {
    inner: OnceCell<TokioAsyncResolver>,
}

impl SystemResolver {
    /// Create a new system resolver
    pub fn new() -> Self {
        Self::default()
    }

    fn resolver(&self) -> &TokioAsyncResolver {
        self.inner.get_or_init(|| {
            TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|err| {
                tracing::warn!(error = %err, "system DNS config unavailable, using defaults");
                TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
            })
        })
    }
}

#[async_trait]
impl Resolve for SystemResolver {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let lookup = self
            .resolver()
            .lookup_ip(host)
            .await
            .map_err(|e| io::Error::other(e.to_string()))?;
        Ok(lookup.iter().collect())
    }
}

/// Fixed host table, for tests and air-gapped deployments
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    hosts: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `host` to `addrs`
    pub fn with_host(mut self, host: &str, addrs: &[IpAddr]) -> Self {
        self.hosts.insert(host.to_ascii_lowercase(), addrs.to_vec());
        self
    }
}

#[async_trait]
impl Resolve for StaticResolver {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        self.hosts
            .get(&host.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no such host: {}", host)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_resolver() {
        let resolver = StaticResolver::new().with_host("Example.com", &["93.184.215.14".parse().unwrap()]);
        let addrs = tokio_test::block_on(resolver.resolve("example.com")).unwrap();
        assert_eq!(addrs.len(), 1);

        let err = tokio_test::block_on(resolver.resolve("missing.test")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
