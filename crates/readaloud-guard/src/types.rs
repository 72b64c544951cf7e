//! Core types for the URL guard

use crate::CLOUD_METADATA_V4;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use thiserror::Error;
use url::Url;

/// Outcome of judging a URL
#[derive(Debug, Clone)]
pub enum SafetyVerdict {
    /// Safe to fetch
    Safe(SafeTarget),

    /// Unsafe, with the reason
    Rejected(Rejection),
}

impl SafetyVerdict {
    /// Check if the URL may be fetched
    pub fn is_safe(&self) -> bool {
        matches!(self, SafetyVerdict::Safe(_))
    }

    /// The rejection reason, if rejected
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            SafetyVerdict::Safe(_) => None,
            SafetyVerdict::Rejected(rejection) => Some(rejection),
        }
    }

    /// Convert into a `Result`
    pub fn into_result(self) -> std::result::Result<SafeTarget, Rejection> {
        match self {
            SafetyVerdict::Safe(target) => Ok(target),
            SafetyVerdict::Rejected(rejection) => Err(rejection),
        }
    }
}

/// A URL that passed every check, together with the addresses that were
/// vetted for it
#[derive(Debug, Clone)]
pub struct SafeTarget {
    /// The parsed URL
    pub url: Url,

    /// Hostname as it appears in the URL (IPv6 literals without brackets)
    pub host: String,

    /// Every address the host resolved to, all of them public
    pub addrs: Vec<IpAddr>,

    /// Whether the host was an IP literal (no DNS lookup happened)
    pub literal_ip: bool,
}

/// Why a URL was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The URL could not be parsed
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Scheme other than http/https
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    /// URL without a hostname
    #[error("empty hostname")]
    EmptyHost,

    /// Hostname on the denylist
    #[error("blocked: hostname {0} is not allowed")]
    BlockedHostname(String),

    /// Host resolves to a private or reserved address
    #[error("blocked: {host} resolves to {class} address {addr}")]
    BlockedAddress {
        host: String,
        addr: IpAddr,
        class: AddressClass,
    },

    /// Resolution failed or timed out
    #[error("DNS resolution failed for {host}: {message}")]
    DnsFailure { host: String, message: String },
}

impl Rejection {
    /// True for denylisted hostnames and unsafe addresses
    pub fn is_blocked_target(&self) -> bool {
        matches!(
            self,
            Rejection::BlockedHostname(_) | Rejection::BlockedAddress { .. }
        )
    }

    /// True when the URL itself is malformed or uses a foreign scheme
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Rejection::InvalidUrl(_) | Rejection::UnsupportedScheme(_) | Rejection::EmptyHost
        )
    }
}

/// Reserved address ranges the guard refuses to connect to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressClass {
    /// 127.0.0.0/8, ::1
    Loopback,
    /// 10/8, 172.16/12, 192.168/16, fc00::/7
    Private,
    /// 169.254/16, fe80::/10
    LinkLocalUnicast,
    /// 224.0.0.0/24, ff02::/16
    LinkLocalMulticast,
    /// 0.0.0.0, ::
    Unspecified,
    /// 169.254.169.254
    CloudMetadata,
}

impl fmt::Display for AddressClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressClass::Loopback => write!(f, "loopback"),
            AddressClass::Private => write!(f, "private"),
            AddressClass::LinkLocalUnicast => write!(f, "link-local"),
            AddressClass::LinkLocalMulticast => write!(f, "link-local multicast"),
            AddressClass::Unspecified => write!(f, "unspecified"),
            AddressClass::CloudMetadata => write!(f, "cloud metadata"),
        }
    }
}

impl AddressClass {
    /// Classify an address. `None` means it is safe to connect to.
    ///
    /// IPv4-mapped IPv6 addresses are judged by their embedded IPv4 address.
    pub fn of(addr: IpAddr) -> Option<AddressClass> {
        match addr {
            IpAddr::V4(v4) => Self::of_v4(v4),
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => Self::of_v4(v4),
                None => Self::of_v6(v6),
            },
        }
    }

    fn of_v4(addr: Ipv4Addr) -> Option<AddressClass> {
        if addr == CLOUD_METADATA_V4 {
            Some(AddressClass::CloudMetadata)
        } else if addr.is_loopback() {
            Some(AddressClass::Loopback)
        } else if addr.is_private() {
            Some(AddressClass::Private)
        } else if addr.is_link_local() {
            Some(AddressClass::LinkLocalUnicast)
        } else if addr.octets()[..3] == [224, 0, 0] {
            Some(AddressClass::LinkLocalMulticast)
        } else if addr.is_unspecified() {
            Some(AddressClass::Unspecified)
        } else {
            None
        }
    }

    fn of_v6(addr: Ipv6Addr) -> Option<AddressClass> {
        let first = addr.segments()[0];
        if addr.is_loopback() {
            Some(AddressClass::Loopback)
        } else if first & 0xfe00 == 0xfc00 {
            Some(AddressClass::Private)
        } else if first & 0xffc0 == 0xfe80 {
            Some(AddressClass::LinkLocalUnicast)
        } else if first & 0xff0f == 0xff02 {
            Some(AddressClass::LinkLocalMulticast)
        } else if addr.is_unspecified() {
            Some(AddressClass::Unspecified)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(s: &str) -> Option<AddressClass> {
        AddressClass::of(s.parse().unwrap())
    }

    #[test]
    fn test_ipv4_reserved_ranges() {
        assert_eq!(class("127.0.0.1"), Some(AddressClass::Loopback));
        assert_eq!(class("127.255.0.9"), Some(AddressClass::Loopback));
        assert_eq!(class("10.1.2.3"), Some(AddressClass::Private));
        assert_eq!(class("172.16.0.1"), Some(AddressClass::Private));
        assert_eq!(class("172.31.255.255"), Some(AddressClass::Private));
        assert_eq!(class("192.168.1.1"), Some(AddressClass::Private));
        assert_eq!(class("169.254.1.1"), Some(AddressClass::LinkLocalUnicast));
        assert_eq!(class("224.0.0.251"), Some(AddressClass::LinkLocalMulticast));
        assert_eq!(class("0.0.0.0"), Some(AddressClass::Unspecified));
        assert_eq!(class("169.254.169.254"), Some(AddressClass::CloudMetadata));
    }

    #[test]
    fn test_ipv4_public() {
        assert_eq!(class("8.8.8.8"), None);
        assert_eq!(class("172.32.0.1"), None);
        assert_eq!(class("93.184.215.14"), None);
        assert_eq!(class("224.0.1.1"), None);
    }

    #[test]
    fn test_ipv6_reserved_ranges() {
        assert_eq!(class("::1"), Some(AddressClass::Loopback));
        assert_eq!(class("::"), Some(AddressClass::Unspecified));
        assert_eq!(class("fc00::1"), Some(AddressClass::Private));
        assert_eq!(class("fd12:3456::1"), Some(AddressClass::Private));
        assert_eq!(class("fe80::1"), Some(AddressClass::LinkLocalUnicast));
        assert_eq!(class("febf::1"), Some(AddressClass::LinkLocalUnicast));
        assert_eq!(class("ff02::1"), Some(AddressClass::LinkLocalMulticast));
        assert_eq!(class("2606:4700::1111"), None);
    }

    #[test]
    fn test_ipv4_mapped_ipv6() {
        assert_eq!(class("::ffff:127.0.0.1"), Some(AddressClass::Loopback));
        assert_eq!(class("::ffff:169.254.169.254"), Some(AddressClass::CloudMetadata));
        assert_eq!(class("::ffff:8.8.8.8"), None);
    }

    #[test]
    fn test_rejection_categories() {
        assert!(Rejection::BlockedHostname("localhost".into()).is_blocked_target());
        assert!(Rejection::EmptyHost.is_invalid_input());
        assert!(!Rejection::DnsFailure {
            host: "x".into(),
            message: "nxdomain".into()
        }
        .is_blocked_target());
    }
}
