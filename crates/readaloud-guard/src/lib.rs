//! # Read Aloud Guard
//!
//! SSRF defense for URLs that arrive from untrusted callers.
//!
//! Every outbound fetch triggered by user input is judged by [`UrlGuard`]
//! before a single byte goes over the wire:
//!
//! - **Scheme**: only `http` and `https`
//! - **Hostname**: non-empty and not on the denylist (`localhost`,
//!   `metadata.google.internal` by default)
//! - **Addresses**: every resolved address must be public. Loopback,
//!   private, link-local (unicast and multicast), unspecified and the cloud
//!   metadata address `169.254.169.254` are rejected. One bad address fails
//!   the whole lookup.
//!
//! Verdicts are computed fresh on every call and never cached.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use readaloud_guard::{GuardConfig, SafetyVerdict, UrlGuard};
//!
//! #[tokio::main]
//! async fn main() {
//!     let guard = UrlGuard::new(GuardConfig::default());
//!
//!     match guard.validate("http://169.254.169.254/latest/meta-data").await {
//!         SafetyVerdict::Safe(target) => println!("ok: {:?}", target.addrs),
//!         SafetyVerdict::Rejected(reason) => println!("rejected: {}", reason),
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────────────────┐     ┌─────────────┐
//! │  Raw URL    │ ──► │          UrlGuard            │ ──► │ SafeTarget  │
//! └─────────────┘     │ scheme ► host ► denylist ►   │     │ (url+addrs) │
//!                     │ resolve (5s) ► classify each │     └─────────────┘
//!                     └──────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod guard;
pub mod resolver;
pub mod types;

pub use config::GuardConfig;
pub use error::{GuardError, Result};
pub use guard::UrlGuard;
pub use resolver::{Resolve, StaticResolver, SystemResolver};
pub use types::{AddressClass, Rejection, SafeTarget, SafetyVerdict};

/// The well-known IPv4 cloud metadata address
pub const CLOUD_METADATA_V4: std::net::Ipv4Addr = std::net::Ipv4Addr::new(169, 254, 169, 254);
