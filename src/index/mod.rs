//! Prefix index subsystem.
//!
//! # Data Flow
//! ```text
//! prefix list text
//!     → prefix.rs (parse line, mask host bits, drop junk)
//!     → IpRange per address family (add, then simplify)
//!     → PrefixIndex (immutable, shared via Arc)
//!
//! Query:
//!     address text → prefix.rs (parse, fold v4-mapped v6)
//!     → IpRange::contains on the matching family
//! ```
//!
//! # Design Decisions
//! - Index is never mutated once built; reload builds a new one
//! - `iprange` keeps each family in a bit trie, so lookups cost at most
//!   32 / 128 steps regardless of prefix count
//! - Unparsable input is never an error: bad prefix lines are skipped,
//!   bad query addresses are simply not members

pub mod prefix;

use std::fmt;
use std::net::IpAddr;

use ipnet::{Ipv4Net, Ipv6Net};
use iprange::IpRange;

pub use prefix::{parse_addr, Prefix};

/// Counts gathered while parsing a prefix list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Lines that parsed as a CIDR literal.
    pub accepted: usize,
    /// Non-blank, non-comment lines that did not parse.
    pub skipped: usize,
}

/// Immutable set of IPv4 and IPv6 prefixes answering containment queries.
pub struct PrefixIndex {
    v4: IpRange<Ipv4Net>,
    v6: IpRange<Ipv6Net>,
    v4_len: usize,
    v6_len: usize,
}

impl PrefixIndex {
    /// Build an index from prefixes in any order.
    ///
    /// Duplicates and overlapping ranges are merged.
    pub fn build<I>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = Prefix>,
    {
        let mut v4 = IpRange::new();
        let mut v6 = IpRange::new();

        for prefix in prefixes {
            match prefix {
                Prefix::V4 { base, len } => match Ipv4Net::new(base, len) {
                    Ok(net) => {
                        v4.add(net);
                    }
                    Err(_) => tracing::debug!(%prefix, "Ignoring out-of-range prefix length"),
                },
                Prefix::V6 { base, len } => match Ipv6Net::new(base, len) {
                    Ok(net) => {
                        v6.add(net);
                    }
                    Err(_) => tracing::debug!(%prefix, "Ignoring out-of-range prefix length"),
                },
            }
        }

        v4.simplify();
        v6.simplify();
        let v4_len = v4.iter().count();
        let v6_len = v6.iter().count();

        Self { v4, v6, v4_len, v6_len }
    }

    /// An index with no prefixes. Every query answers false.
    pub fn empty() -> Self {
        Self::build(std::iter::empty())
    }

    /// Build an index from the text of a prefix list, one CIDR per line.
    pub fn parse_lines(text: &str) -> (Self, ParseStats) {
        let mut stats = ParseStats::default();

        let prefixes = text.lines().filter_map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return None;
            }
            match Prefix::parse_line(trimmed) {
                Some(prefix) => {
                    stats.accepted += 1;
                    Some(prefix)
                }
                None => {
                    stats.skipped += 1;
                    tracing::debug!(line = %trimmed, "Skipping malformed prefix line");
                    None
                }
            }
        });

        let index = Self::build(prefixes);
        (index, stats)
    }

    /// Whether the address text parses and falls within any stored prefix.
    pub fn contains(&self, addr: &str) -> bool {
        parse_addr(addr).is_some_and(|ip| self.contains_addr(ip))
    }

    /// Whether `addr` falls within any stored prefix.
    pub fn contains_addr(&self, addr: IpAddr) -> bool {
        match prefix::canonical_addr(addr) {
            IpAddr::V4(v4) => self.v4.contains(&v4),
            IpAddr::V6(v6) => self.v6.contains(&v6),
        }
    }

    /// Effective IPv4 prefixes after merging overlaps and adjacent halves.
    pub fn v4_len(&self) -> usize {
        self.v4_len
    }

    /// Effective IPv6 prefixes after merging overlaps and adjacent halves.
    pub fn v6_len(&self) -> usize {
        self.v6_len
    }

    pub fn len(&self) -> usize {
        self.v4_len + self.v6_len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for PrefixIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefixIndex")
            .field("v4_len", &self.v4_len)
            .field("v6_len", &self.v6_len)
            .finish()
    }
}

impl Default for PrefixIndex {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromIterator<Prefix> for PrefixIndex {
    fn from_iter<I: IntoIterator<Item = Prefix>>(iter: I) -> Self {
        Self::build(iter)
    }
}
