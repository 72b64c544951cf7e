//! URL safety validation

use crate::config::GuardConfig;
use crate::error::Result;
use crate::resolver::{Resolve, SystemResolver};
use crate::types::{AddressClass, Rejection, SafeTarget, SafetyVerdict};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, warn};
use url::{Host, Url};

/// Judges whether a URL is safe to fetch.
///
/// Cheap to clone; the config and resolver are shared.
#[derive(Clone)]
pub struct UrlGuard {
    config: Arc<GuardConfig>,
    resolver: Arc<dyn Resolve>,
}

impl Default for UrlGuard {
    fn default() -> Self {
        Self::new(GuardConfig::default())
    }
}

impl std::fmt::Debug for UrlGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlGuard")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl UrlGuard {
    /// Create a guard that resolves through the system DNS configuration
    pub fn new(config: GuardConfig) -> Self {
        Self::with_resolver(config, Arc::new(SystemResolver::new()))
    }

    /// Create a guard with a custom resolver
    pub fn with_resolver(config: GuardConfig, resolver: Arc<dyn Resolve>) -> Self {
        Self {
            config: Arc::new(config),
            resolver,
        }
    }

    /// The guard's configuration
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Judge a URL.
    ///
    /// Checks run in order: parse, scheme, hostname, denylist, resolution,
    /// then every resolved address. Nothing is cached; DNS is consulted
    /// again on every call.
    pub async fn validate(&self, raw_url: &str) -> SafetyVerdict {
        match self.judge(raw_url).await {
            Ok(target) => SafetyVerdict::Safe(target),
            Err(rejection) => {
                debug!(url = raw_url, reason = %rejection, "URL rejected");
                SafetyVerdict::Rejected(rejection)
            }
        }
    }

    /// Judge a URL, returning the vetted target or the rejection as an error
    pub async fn check(&self, raw_url: &str) -> Result<SafeTarget> {
        Ok(self.validate(raw_url).await.into_result()?)
    }

    async fn judge(&self, raw_url: &str) -> std::result::Result<SafeTarget, Rejection> {
        let url = Url::parse(raw_url).map_err(|err| match err {
            url::ParseError::EmptyHost => Rejection::EmptyHost,
            other => Rejection::InvalidUrl(other.to_string()),
        })?;

        let scheme = url.scheme().to_ascii_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(Rejection::UnsupportedScheme(scheme));
        }

        let (host, literal) = match url.host() {
            None => return Err(Rejection::EmptyHost),
            Some(Host::Domain(domain)) if domain.is_empty() => return Err(Rejection::EmptyHost),
            Some(Host::Domain(domain)) => (domain.to_string(), None),
            Some(Host::Ipv4(v4)) => (v4.to_string(), Some(IpAddr::V4(v4))),
            Some(Host::Ipv6(v6)) => (v6.to_string(), Some(IpAddr::V6(v6))),
        };

        if self.config.is_blocked_hostname(&host) {
            return Err(Rejection::BlockedHostname(host));
        }

        let addrs = match literal {
            Some(addr) => vec![addr],
            None => self.resolve(&host).await?,
        };

        for addr in &addrs {
            if let Some(class) = AddressClass::of(*addr).filter(|c| !self.config.permits(*c)) {
                return Err(Rejection::BlockedAddress {
                    host,
                    addr: *addr,
                    class,
                });
            }
        }

        Ok(SafeTarget {
            url,
            host,
            addrs,
            literal_ip: literal.is_some(),
        })
    }

    async fn resolve(&self, host: &str) -> std::result::Result<Vec<IpAddr>, Rejection> {
        let timeout = self.config.dns_timeout();
        let lookup = tokio::time::timeout(timeout, self.resolver.resolve(host)).await;

        let addrs = match lookup {
            Err(_) => {
                warn!(host, timeout_secs = timeout.as_secs(), "DNS resolution timed out");
                return Err(Rejection::DnsFailure {
                    host: host.to_string(),
                    message: format!("timed out after {}s", timeout.as_secs()),
                });
            }
            Ok(Err(err)) => {
                return Err(Rejection::DnsFailure {
                    host: host.to_string(),
                    message: err.to_string(),
                })
            }
            Ok(Ok(addrs)) => addrs,
        };

        if addrs.is_empty() {
            return Err(Rejection::DnsFailure {
                host: host.to_string(),
                message: "no addresses returned".to_string(),
            });
        }
        Ok(addrs)
    }
}
