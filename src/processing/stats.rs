//! Subnet-level address counts.

use super::allocation::SourceKind;
use super::classifier::{AddressStatus, ClassifiedAddress};
use super::gap_finder::round2;

/// Counts by status and by interface source type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AddressCounts {
    pub total: usize,
    pub used: usize,
    pub reserved: usize,
    pub cidr_reservation: usize,
    pub available: usize,
    pub primary: usize,
    pub secondary: usize,
    pub prefix_delegation: usize,
}

impl AddressCounts {
    /// Used share of the subnet in percent, rounded to 2 decimals.
    pub fn utilization(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        round2(self.used as f64 / self.total as f64 * 100.0)
    }
}

/// Single pass over the classified sequence.
pub fn aggregate(addresses: &[ClassifiedAddress]) -> AddressCounts {
    let mut counts = AddressCounts {
        total: addresses.len(),
        ..Default::default()
    };
    for address in addresses {
        match address.status {
            AddressStatus::Used => counts.used += 1,
            AddressStatus::Reserved => counts.reserved += 1,
            AddressStatus::CidrReservation => counts.cidr_reservation += 1,
            AddressStatus::Free => {}
        }
        match address.details.as_ref().map(|d| d.kind()) {
            Some(SourceKind::PrimaryEni) => counts.primary += 1,
            Some(SourceKind::SecondaryEni) => counts.secondary += 1,
            Some(SourceKind::PrefixDelegation) => counts.prefix_delegation += 1,
            _ => {}
        }
    }
    counts.available = counts.total - counts.used - counts.reserved - counts.cidr_reservation;
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AddressSpace, CidrReservation, NetworkInterface};
    use crate::processing::{classify, AllocationIndex};

    #[test]
    fn test_counts_add_up() {
        let space = AddressSpace::parse("10.0.1.0/27").unwrap();
        let enis = vec![
            NetworkInterface::new("eni-1", "", "in-use", "10.0.1.4", &["10.0.1.5", "10.0.1.6"], &[])
                .unwrap(),
            NetworkInterface::new("eni-2", "", "in-use", "10.0.1.7", &[], &["10.0.1.16/28"]).unwrap(),
        ];
        let reservations = vec![CidrReservation::new("scr-1", "10.0.1.8/30", "explicit", "").unwrap()];
        let index = AllocationIndex::build(space, &enis, &reservations);
        let counts = aggregate(&classify(&index));

        assert_eq!(counts.total, 32);
        assert_eq!(counts.primary, 2);
        assert_eq!(counts.secondary, 2);
        // 10.0.1.31 is the broadcast address, used by the prefix
        assert_eq!(counts.prefix_delegation, 16);
        assert_eq!(counts.used, 20);
        assert_eq!(counts.reserved, 4);
        assert_eq!(counts.cidr_reservation, 4);
        assert_eq!(counts.available, 4);
        assert_eq!(
            counts.used + counts.reserved + counts.cidr_reservation + counts.available,
            counts.total
        );
        assert_eq!(counts.utilization(), 62.5);
    }

    #[test]
    fn test_empty_utilization() {
        assert_eq!(AddressCounts::default().utilization(), 0.0);
    }
}
