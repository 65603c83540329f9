//! Access gate: local-network classification and the optional API key check.
//!
//! Both checks are pure. The HTTP layer runs [`authorize`] before it touches the
//! credential file or the upstream, so a rejected caller never causes any I/O.

use crate::error::{GatewayError, Result};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use subtle::ConstantTimeEq;

/// Immutable access settings, derived once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessConfig {
    /// Only callers from loopback, private or link-local ranges may connect.
    pub local_only: bool,
    /// Value the `X-API-Key` header must carry, when set.
    pub required_key: Option<String>,
}

impl AccessConfig {
    pub fn new(local_only: bool, required_key: Option<String>) -> Self {
        Self {
            local_only,
            required_key: required_key.filter(|k| !k.is_empty()),
        }
    }
}

/// Outcome of [`authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Forbidden,
    Unauthorized,
}

impl AccessDecision {
    #[must_use]
    pub fn is_allowed(self) -> bool {
        self == Self::Allowed
    }

    /// Convert a rejection into the matching [`GatewayError`].
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Allowed => Ok(()),
            Self::Forbidden => Err(GatewayError::Forbidden),
            Self::Unauthorized => Err(GatewayError::Unauthorized),
        }
    }
}

/// Returns whether the textual address is loopback, private or link-local.
///
/// # Errors
/// Returns `GatewayError::InvalidAddress` when `ip` is not an IP literal.
pub fn classify_address(ip: &str) -> Result<bool> {
    let addr: IpAddr = ip
        .parse()
        .map_err(|_| GatewayError::invalid_address(ip))?;
    Ok(is_local_ip(addr))
}

/// Typed counterpart of [`classify_address`]. IPv4-mapped IPv6 addresses are
/// classified as the IPv4 address they carry.
#[must_use]
pub fn is_local_ip(addr: IpAddr) -> bool {
    match addr.to_canonical() {
        IpAddr::V4(v4) => is_local_v4(v4),
        IpAddr::V6(v6) => is_local_v6(v6),
    }
}

fn is_local_v4(addr: Ipv4Addr) -> bool {
    let [a, b, _, _] = addr.octets();
    match a {
        127 | 10 => true,
        // 100.64.0.0/10 (carrier-grade NAT, also used by tailnets)
        100 => (b & 0xc0) == 64,
        172 => (b & 0xf0) == 16,
        192 => b == 168,
        169 => b == 254,
        _ => false,
    }
}

fn is_local_v6(addr: Ipv6Addr) -> bool {
    let first = addr.segments()[0];
    addr == Ipv6Addr::LOCALHOST
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link-local
        || (first & 0xffc0) == 0xfe80
}

/// Decide whether a request may proceed.
///
/// The local-network check runs before the key check, so a remote caller in
/// local-only mode is `Forbidden` even with the right key. An unparseable
/// `caller_ip` counts as not local.
#[must_use]
pub fn authorize(
    caller_ip: &str,
    supplied_key: Option<&str>,
    config: &AccessConfig,
) -> AccessDecision {
    if config.local_only && !classify_address(caller_ip).unwrap_or(false) {
        return AccessDecision::Forbidden;
    }

    if let Some(ref required) = config.required_key {
        let supplied = supplied_key.unwrap_or("");
        if !bool::from(supplied.as_bytes().ct_eq(required.as_bytes())) {
            return AccessDecision::Unauthorized;
        }
    }

    AccessDecision::Allowed
}
