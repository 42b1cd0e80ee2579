//! Address classification from the textual form of a token.
//!
//! Classification never consults the geolocation database and never fails:
//! anything that does not parse as one of the excluded ranges falls through
//! to [`Classification::Routable`] and lets the resolver degrade gracefully
//! on malformed input.

/// How a candidate IP token relates to public routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Publicly routable (or unparseable; the resolver sorts those out).
    Routable,
    /// RFC 1918 private range (10/8, 172.16/12, 192.168/16).
    Private,
    /// Multicast and higher reserved ranges (first octet >= 224).
    Multicast,
    /// IPv6 link-local (fe80::/10 by textual prefix).
    LinkLocal,
}

impl Classification {
    /// Whether this class is excluded from lookup and output.
    pub fn is_excluded(self) -> bool {
        !matches!(self, Classification::Routable)
    }
}

/// Classify an IP token by its textual form.
pub fn classify(token: &str) -> Classification {
    if token.starts_with("fe80") {
        return Classification::LinkLocal;
    }

    let mut octets = token.split('.');
    let first: u32 = match octets.next().and_then(|o| o.parse().ok()) {
        Some(n) => n,
        None => return Classification::Routable,
    };
    if first >= 224 {
        return Classification::Multicast;
    }
    if first == 10 {
        return Classification::Private;
    }
    // 172.16/12 and 192.168/16 need the second octet.
    let second: u32 = match octets.next().and_then(|o| o.parse().ok()) {
        Some(n) => n,
        None => return Classification::Routable,
    };
    match (first, second) {
        (192, 168) => Classification::Private,
        (172, 16..=31) => Classification::Private,
        _ => Classification::Routable,
    }
}
