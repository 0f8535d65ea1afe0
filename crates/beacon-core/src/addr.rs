//! Caller address resolution.
//!
//! The address a client is registered under is the one the service observes:
//! the first hop recorded in `X-Forwarded-For` when a proxy sits in front of
//! us, otherwise the transport peer. Ports are never part of it.

use std::fmt;

/// Header consulted before the transport peer address.
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Canonical caller address attached to every inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteAddr(pub String);

impl RemoteAddr {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the caller's address from the peer address and an optional
/// `X-Forwarded-For` value.
///
/// The first comma-separated entry of the header wins over the peer; the
/// nearest proxy writes the original client there and later hops append.
/// Everything from the last `:` on is dropped. Never fails: garbage in
/// yields a best-effort string out.
pub fn resolve_remote_addr(peer: &str, forwarded_for: Option<&str>) -> RemoteAddr {
    let candidate = match forwarded_for {
        Some(header) if !header.is_empty() => header.split(',').next().unwrap_or(header).trim(),
        _ => peer,
    };

    let host = match candidate.rfind(':') {
        Some(index) => &candidate[..index],
        None => candidate,
    };

    RemoteAddr(host.to_string())
}
