//! IPv4 address and CIDR notation utilities.
//!
//! Provides [`Ipv4`] struct for representing IPv4 CIDR blocks,
//! along with the mask arithmetic the address space is built on.

use crate::error::{AnalysisError, Result};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Maximum length for an IPv4 subnet mask (32 bits).
pub const MAX_LENGTH: u8 = 32;

/// Subnet mask of a prefix length, lengths above 32 are treated as 32.
fn mask_bits(len: u8) -> u32 {
    let right_len = MAX_LENGTH - len.min(MAX_LENGTH);
    let all_bits = u32::MAX as u64;
    ((all_bits >> right_len) << right_len) as u32
}

/// IPv4 CIDR block, `mask` is always within 0..=32.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ipv4 {
    /// The IPv4 address.
    pub addr: Ipv4Addr,
    /// The subnet mask length (0-32).
    pub mask: u8,
}

impl Serialize for Ipv4 {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Ipv4 {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Ipv4, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ipv4::new(&s).map_err(de::Error::custom)
    }
}

impl Ipv4 {
    /// Create a new [`Ipv4`] from a CIDR string (e.g., "10.0.0.0/24").
    ///
    /// Host bits are allowed, use [`Ipv4::network`] to require a network address.
    pub fn new(addr_cidr: &str) -> Result<Ipv4> {
        let addr_cidr = addr_cidr.trim();
        let (addr, mask) = addr_cidr
            .split_once('/')
            .ok_or_else(|| AnalysisError::invalid_cidr(addr_cidr, "expected address/prefix"))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| AnalysisError::invalid_cidr(addr_cidr, format!("invalid address {addr}")))?;
        let mask: u8 = mask
            .parse()
            .map_err(|_| AnalysisError::invalid_cidr(addr_cidr, format!("invalid prefix {mask}")))?;
        if mask > MAX_LENGTH {
            return Err(AnalysisError::invalid_cidr(addr_cidr, "prefix length above 32"));
        }
        Ok(Ipv4 { addr, mask })
    }

    /// Parse a CIDR string that must name a network address (no host bits set).
    pub fn network(addr_cidr: &str) -> Result<Ipv4> {
        let ipv4 = Ipv4::new(addr_cidr)?;
        if !ipv4.is_network() {
            return Err(AnalysisError::invalid_cidr(addr_cidr.trim(), "host bits set"));
        }
        Ok(ipv4)
    }

    /// True when `addr` is the lowest address of the block.
    pub fn is_network(&self) -> bool {
        self.addr == self.lo()
    }

    /// Get the lowest (network) address in the subnet.
    pub fn lo(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.addr) & mask_bits(self.mask))
    }

    /// Get the highest (broadcast) address in the subnet.
    pub fn hi(&self) -> Ipv4Addr {
        let mask = mask_bits(self.mask);
        Ipv4Addr::from((u32::from(self.addr) & mask) | !mask)
    }

    /// Number of addresses in the block, 2^(32 - mask).
    pub fn size(&self) -> u64 {
        1u64 << (MAX_LENGTH - self.mask.min(MAX_LENGTH))
    }

    /// True when `ip` falls inside the block.
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        self.lo() <= ip && ip <= self.hi()
    }
}

impl FromStr for Ipv4 {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        Ipv4::new(s)
    }
}

impl std::fmt::Display for Ipv4 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_bits() {
        assert_eq!(mask_bits(0), 0x00000000);
        assert_eq!(mask_bits(8), 0xFF000000);
        assert_eq!(mask_bits(24), 0xFFFFFF00);
        assert_eq!(mask_bits(32), 0xFFFFFFFF);
    }

    #[test]
    fn test_new_rejects_malformed() {
        assert!(Ipv4::new("10.0.1.0").is_err());
        assert!(Ipv4::new("10.0.1/24").is_err());
        assert!(Ipv4::new("10.0.1.0/abc").is_err());
        assert!(matches!(
            Ipv4::new("10.0.1.0/33"),
            Err(AnalysisError::InvalidCidr { .. })
        ));
        assert_eq!(
            Ipv4::new(" 10.0.1.0/28 ").unwrap(),
            Ipv4 {
                addr: Ipv4Addr::new(10, 0, 1, 0),
                mask: 28
            }
        );
    }

    #[test]
    fn test_network_requires_aligned_address() {
        assert!(Ipv4::network("10.0.1.16/28").is_ok());
        let err = Ipv4::network("10.0.1.5/28").unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InvalidCidr {
                cidr: "10.0.1.5/28".to_string(),
                reason: "host bits set".to_string()
            }
        );
    }

    #[test]
    fn test_size_lo_hi_contains() {
        let block = Ipv4::new("10.0.1.0/28").unwrap();
        assert_eq!(block.size(), 16);
        assert_eq!(block.lo(), Ipv4Addr::new(10, 0, 1, 0));
        assert_eq!(block.hi(), Ipv4Addr::new(10, 0, 1, 15));
        assert!(block.contains(Ipv4Addr::new(10, 0, 1, 9)));
        assert!(!block.contains(Ipv4Addr::new(10, 0, 1, 16)));
        assert_eq!(Ipv4::new("0.0.0.0/0").unwrap().size(), 1 << 32);
        assert_eq!(Ipv4::new("10.0.0.7/32").unwrap().size(), 1);
    }

    #[test]
    fn test_ip4_cmp() {
        let ip1 = Ipv4::new("10.0.0.1/24").unwrap();
        let ip2 = Ipv4::new("10.0.0.2/24").unwrap();
        let ip3 = Ipv4::new("10.0.0.1/24").unwrap();

        assert!(ip1 < ip2);
        assert!(ip1 == ip3);
        assert!(ip2 > ip1);
    }

    #[test]
    fn test_serde_round_trip_as_string() {
        let block = Ipv4::new("10.0.1.10/31").unwrap();
        let json = serde_json::to_string(&block).unwrap();
        assert_eq!(json, "\"10.0.1.10/31\"");
        assert!(serde_json::from_str::<Ipv4>("\"10.0.1.0/40\"").is_err());
    }
}
