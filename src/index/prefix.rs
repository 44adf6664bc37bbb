//! Network prefix parsing.
//!
//! # Responsibilities
//! - Parse CIDR literals (`10.0.0.0/8`, `2001:db8::/32`)
//! - Normalise to canonical form (host bits cleared)
//! - Parse query addresses, folding IPv4-mapped IPv6 into IPv4

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use ipnet::IpNet;

/// A canonical network prefix.
///
/// The base address never has bits set beyond `len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prefix {
    V4 { base: Ipv4Addr, len: u8 },
    V6 { base: Ipv6Addr, len: u8 },
}

impl Prefix {
    /// Parse one line of a prefix list.
    ///
    /// Returns `None` for blank lines, comments and anything that is not a
    /// CIDR literal. Host bits are masked off, so `10.1.2.3/8` becomes
    /// `10.0.0.0/8`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        line.parse().ok()
    }

    /// Prefix length in bits.
    pub fn prefix_len(&self) -> u8 {
        match self {
            Prefix::V4 { len, .. } | Prefix::V6 { len, .. } => *len,
        }
    }

    /// Whether `addr` lies inside this prefix.
    ///
    /// Used as the brute-force oracle in index tests.
    pub fn contains(&self, addr: IpAddr) -> bool {
        match (self, canonical_addr(addr)) {
            (Prefix::V4 { base, len }, IpAddr::V4(a)) => {
                let mask = mask_u32(*len);
                u32::from(a) & mask == u32::from(*base)
            }
            (Prefix::V6 { base, len }, IpAddr::V6(a)) => {
                let mask = mask_u128(*len);
                u128::from(a) & mask == u128::from(*base)
            }
            _ => false,
        }
    }
}

impl From<IpNet> for Prefix {
    fn from(net: IpNet) -> Self {
        match net.trunc() {
            IpNet::V4(n) => Prefix::V4 {
                base: n.network(),
                len: n.prefix_len(),
            },
            IpNet::V6(n) => Prefix::V6 {
                base: n.network(),
                len: n.prefix_len(),
            },
        }
    }
}

impl FromStr for Prefix {
    type Err = ipnet::AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<IpNet>().map(Prefix::from)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::V4 { base, len } => write!(f, "{}/{}", base, len),
            Prefix::V6 { base, len } => write!(f, "{}/{}", base, len),
        }
    }
}

/// Parse a query address, returning `None` for anything unparsable.
pub fn parse_addr(text: &str) -> Option<IpAddr> {
    text.trim().parse::<IpAddr>().ok().map(canonical_addr)
}

/// Fold IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) into plain IPv4.
pub fn canonical_addr(addr: IpAddr) -> IpAddr {
    match addr {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        },
        v4 => v4,
    }
}

fn mask_u32(len: u8) -> u32 {
    if len == 0 { 0 } else { u32::MAX << (32 - u32::from(len)) }
}

fn mask_u128(len: u8) -> u128 {
    if len == 0 { 0 } else { u128::MAX << (128 - u32::from(len)) }
}
