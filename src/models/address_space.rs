//! A subnet's CIDR block as an ordered, indexable range of addresses.

use super::Ipv4;
use crate::error::{AnalysisError, Result};
use std::net::Ipv4Addr;

/// Address range of one subnet, index `i` maps to `network + i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressSpace {
    cidr: Ipv4,
    network: u32,
    size: u64,
}

impl AddressSpace {
    /// Parse a subnet CIDR, the address must be the network address.
    pub fn parse(cidr: &str) -> Result<AddressSpace> {
        Ok(AddressSpace::from_cidr(Ipv4::network(cidr)?))
    }

    pub fn from_cidr(cidr: Ipv4) -> AddressSpace {
        AddressSpace {
            cidr,
            network: u32::from(cidr.lo()),
            size: cidr.size(),
        }
    }

    /// Reject spaces above `limit` addresses before anything is allocated per address.
    pub fn ensure_within(&self, limit: u64) -> Result<()> {
        if self.size > limit {
            return Err(AnalysisError::SubnetTooLarge {
                cidr: self.cidr.to_string(),
                size: self.size,
                limit,
            });
        }
        Ok(())
    }

    pub fn cidr(&self) -> Ipv4 {
        self.cidr
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.network)
    }

    pub fn broadcast(&self) -> Ipv4Addr {
        self.cidr.hi()
    }

    pub fn address_at(&self, index: u64) -> Option<Ipv4Addr> {
        if index < self.size {
            Some(Ipv4Addr::from(self.network + index as u32))
        } else {
            None
        }
    }

    pub fn index_of(&self, ip: Ipv4Addr) -> Option<u64> {
        self.cidr
            .contains(ip)
            .then(|| (u32::from(ip) - self.network) as u64)
    }

    /// Index range of `block` clipped to this space, None when disjoint.
    pub fn clip(&self, block: Ipv4) -> Option<std::ops::Range<u64>> {
        let lo = u32::from(block.lo()).max(self.network) as u64;
        let hi = (u32::from(block.hi()) as u64).min(u32::from(self.broadcast()) as u64);
        if lo > hi {
            return None;
        }
        let base = self.network as u64;
        Some(lo - base..hi - base + 1)
    }

    /// Addresses in natural order from network to broadcast.
    pub fn iter(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        (0..self.size).map(move |i| Ipv4Addr::from(self.network + i as u32))
    }
}
