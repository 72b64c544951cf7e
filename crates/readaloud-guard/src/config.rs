//! Configuration for the URL guard

use crate::error::{GuardError, Result};
use crate::types::AddressClass;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hostnames that are never fetched, whatever they resolve to
pub const DEFAULT_BLOCKED_HOSTNAMES: &[&str] = &["localhost", "metadata.google.internal"];

/// Default DNS resolution timeout in seconds
pub const DEFAULT_DNS_TIMEOUT_SECS: u64 = 5;

/// Guard configuration.
///
/// Built once at startup and shared read-only by every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Hostnames rejected before DNS (compared case-insensitively)
    pub blocked_hostnames: Vec<String>,

    /// DNS resolution timeout in seconds
    pub dns_timeout_secs: u64,

    /// Reserved address classes exempted from blocking. Empty in
    /// production; local test fixtures allow `Loopback`.
    pub allowed_address_classes: Vec<AddressClass>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            blocked_hostnames: DEFAULT_BLOCKED_HOSTNAMES
                .iter()
                .map(|h| h.to_string())
                .collect(),
            dns_timeout_secs: DEFAULT_DNS_TIMEOUT_SECS,
            allowed_address_classes: Vec::new(),
        }
    }
}

impl GuardConfig {
    /// Replace the hostname denylist
    pub fn with_blocked_hostnames<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocked_hostnames = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Set the DNS timeout
    pub fn with_dns_timeout(mut self, secs: u64) -> Self {
        self.dns_timeout_secs = secs;
        self
    }

    /// Exempt one reserved address class from blocking
    pub fn allow_address_class(mut self, class: AddressClass) -> Self {
        if !self.allowed_address_classes.contains(&class) {
            self.allowed_address_classes.push(class);
        }
        self
    }

    /// Whether addresses of `class` may be connected to. The cloud metadata
    /// address is never permitted.
    pub fn permits(&self, class: AddressClass) -> bool {
        class != AddressClass::CloudMetadata && self.allowed_address_classes.contains(&class)
    }

    /// DNS timeout as a [`Duration`]
    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }

    /// Check whether a hostname is on the denylist.
    ///
    /// A single trailing dot (fully-qualified form) is ignored.
    pub fn is_blocked_hostname(&self, host: &str) -> bool {
        let host = host.strip_suffix('.').unwrap_or(host);
        self.blocked_hostnames
            .iter()
            .any(|blocked| blocked.eq_ignore_ascii_case(host))
    }

    /// Reject configurations that would disable the timeout bound
    pub fn validate(&self) -> Result<()> {
        if self.dns_timeout_secs == 0 {
            return Err(GuardError::Config(
                "dns_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.allowed_address_classes.contains(&AddressClass::CloudMetadata) {
            return Err(GuardError::Config(
                "the cloud metadata address can never be allowed".to_string(),
            ));
        }
        Ok(())
    }
}
