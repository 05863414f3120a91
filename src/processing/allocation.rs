//! Address to allocation source mapping.
//!
//! Every address keeps at most one source per [`Layer`]: an interface
//! source, the AWS-reserved marker and a CIDR reservation. Which one decides
//! the address status comes from the [`PRECEDENCE`] table; the others stay
//! attached as overlay detail.

use super::classifier::AddressStatus;
use crate::error::InconsistentInventory;
use crate::models::{AddressSpace, CidrReservation, Ipv4, NetworkInterface, ReservationType};
use serde::Serialize;
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Where an address allocation comes from.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AllocationSource {
    #[serde(rename = "primary", rename_all = "camelCase")]
    PrimaryEni {
        interface_id: String,
        description: String,
        eni_status: String,
    },
    #[serde(rename = "secondary", rename_all = "camelCase")]
    SecondaryEni {
        interface_id: String,
        description: String,
        eni_status: String,
    },
    #[serde(rename_all = "camelCase")]
    PrefixDelegation {
        interface_id: String,
        prefix_cidr: Ipv4,
        description: String,
        eni_status: String,
    },
    AwsReserved { reason: &'static str },
    #[serde(rename = "explicit", rename_all = "camelCase")]
    ExplicitReservation {
        reservation_id: String,
        cidr: Ipv4,
        description: String,
    },
    #[serde(rename = "prefix", rename_all = "camelCase")]
    PrefixReservation {
        reservation_id: String,
        cidr: Ipv4,
        description: String,
    },
}

/// Variant tag of [`AllocationSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    PrimaryEni,
    SecondaryEni,
    PrefixDelegation,
    AwsReserved,
    ExplicitReservation,
    PrefixReservation,
}

/// Slot a source occupies on an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Interface = 0,
    AwsReserved = 1,
    Reservation = 2,
}

const LAYERS: usize = 3;

/// Lower rank decides the address status, the rest become overlay detail.
pub const PRECEDENCE: [(SourceKind, u8); 6] = [
    (SourceKind::PrimaryEni, 0),
    (SourceKind::SecondaryEni, 1),
    (SourceKind::PrefixDelegation, 2),
    (SourceKind::AwsReserved, 3),
    (SourceKind::ExplicitReservation, 4),
    (SourceKind::PrefixReservation, 4),
];

impl SourceKind {
    pub fn rank(self) -> u8 {
        PRECEDENCE
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, rank)| *rank)
            .unwrap_or(u8::MAX)
    }

    pub fn layer(self) -> Layer {
        match self {
            SourceKind::PrimaryEni | SourceKind::SecondaryEni | SourceKind::PrefixDelegation => {
                Layer::Interface
            }
            SourceKind::AwsReserved => Layer::AwsReserved,
            SourceKind::ExplicitReservation | SourceKind::PrefixReservation => Layer::Reservation,
        }
    }

    pub fn status(self) -> AddressStatus {
        match self.layer() {
            Layer::Interface => AddressStatus::Used,
            Layer::AwsReserved => AddressStatus::Reserved,
            Layer::Reservation => AddressStatus::CidrReservation,
        }
    }
}

impl AllocationSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            AllocationSource::PrimaryEni { .. } => SourceKind::PrimaryEni,
            AllocationSource::SecondaryEni { .. } => SourceKind::SecondaryEni,
            AllocationSource::PrefixDelegation { .. } => SourceKind::PrefixDelegation,
            AllocationSource::AwsReserved { .. } => SourceKind::AwsReserved,
            AllocationSource::ExplicitReservation { .. } => SourceKind::ExplicitReservation,
            AllocationSource::PrefixReservation { .. } => SourceKind::PrefixReservation,
        }
    }

    /// Free-text description of the interface or reservation, empty otherwise.
    pub fn description(&self) -> &str {
        match self {
            AllocationSource::PrimaryEni { description, .. }
            | AllocationSource::SecondaryEni { description, .. }
            | AllocationSource::PrefixDelegation { description, .. }
            | AllocationSource::ExplicitReservation { description, .. }
            | AllocationSource::PrefixReservation { description, .. } => description.as_str(),
            AllocationSource::AwsReserved { reason } => reason,
        }
    }

    /// Short label used in warnings and logs, e.g. `eni-1 (secondary)`.
    pub fn label(&self) -> String {
        match self {
            AllocationSource::PrimaryEni { interface_id, .. } => format!("{interface_id} (primary)"),
            AllocationSource::SecondaryEni { interface_id, .. } => {
                format!("{interface_id} (secondary)")
            }
            AllocationSource::PrefixDelegation {
                interface_id,
                prefix_cidr,
                ..
            } => format!("{interface_id} (prefix {prefix_cidr})"),
            AllocationSource::AwsReserved { reason } => format!("AWS reserved ({reason})"),
            AllocationSource::ExplicitReservation {
                reservation_id,
                cidr,
                ..
            }
            | AllocationSource::PrefixReservation {
                reservation_id,
                cidr,
                ..
            } => format!("{reservation_id} ({cidr})"),
        }
    }

    fn from_reservation(reservation: &CidrReservation) -> AllocationSource {
        let reservation_id = reservation.reservation_id.clone();
        let cidr = reservation.cidr;
        let description = reservation.description.clone();
        match reservation.reservation_type {
            ReservationType::Explicit => AllocationSource::ExplicitReservation {
                reservation_id,
                cidr,
                description,
            },
            ReservationType::Prefix => AllocationSource::PrefixReservation {
                reservation_id,
                cidr,
                description,
            },
        }
    }
}

/// Reason for each AWS-reserved offset, the broadcast address is handled apart.
const AWS_RESERVED_OFFSETS: [(u64, &str); 4] = [
    (0, "Network address"),
    (1, "VPC router"),
    (2, "DNS server"),
    (3, "Reserved for future use"),
];
const AWS_RESERVED_BROADCAST: &str = "Broadcast address";

/// Immutable mapping from address index to allocation sources for one subnet.
#[derive(Debug)]
pub struct AllocationIndex {
    space: AddressSpace,
    sources: Vec<Arc<AllocationSource>>,
    slots: Vec<[Option<u32>; LAYERS]>,
    warnings: Vec<InconsistentInventory>,
}

impl AllocationIndex {
    /// Build the index from inventory.
    ///
    /// Interfaces go first (primaries, then secondaries, then delegated
    /// prefixes), followed by the AWS-reserved addresses and finally the CIDR
    /// reservations in the order given. Collisions inside a layer are logged
    /// and reported as warnings, never fatal.
    pub fn build(
        space: AddressSpace,
        interfaces: &[NetworkInterface],
        reservations: &[CidrReservation],
    ) -> AllocationIndex {
        let mut builder = IndexBuilder::new(space);

        for eni in interfaces {
            let source = builder.add_source(AllocationSource::PrimaryEni {
                interface_id: eni.interface_id.clone(),
                description: eni.description.clone(),
                eni_status: eni.status.clone(),
            });
            builder.assign_ip(eni.primary_private_ip, source);
        }

        for eni in interfaces.iter().filter(|e| !e.secondary_private_ips.is_empty()) {
            let source = builder.add_source(AllocationSource::SecondaryEni {
                interface_id: eni.interface_id.clone(),
                description: eni.description.clone(),
                eni_status: eni.status.clone(),
            });
            for ip in &eni.secondary_private_ips {
                builder.assign_ip(*ip, source);
            }
        }

        for eni in interfaces {
            for prefix in &eni.attached_ipv4_prefixes {
                log::debug!("Prefix {} delegated to {}", prefix, eni.interface_id);
                let source = builder.add_source(AllocationSource::PrefixDelegation {
                    interface_id: eni.interface_id.clone(),
                    prefix_cidr: *prefix,
                    description: format!("{} (Prefix: {})", eni.description, prefix),
                    eni_status: eni.status.clone(),
                });
                builder.assign_block(*prefix, source);
            }
        }

        builder.mark_aws_reserved();

        for reservation in reservations {
            log::debug!(
                "CIDR reservation {} {} ({})",
                reservation.reservation_id,
                reservation.cidr,
                reservation.reservation_type
            );
            let source = builder.add_source(AllocationSource::from_reservation(reservation));
            builder.assign_block(reservation.cidr, source);
        }

        builder.finish()
    }

    pub fn space(&self) -> &AddressSpace {
        &self.space
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sources on the address at `index`, highest precedence first.
    pub fn sources_at(&self, index: usize) -> Vec<Arc<AllocationSource>> {
        let mut found: Vec<Arc<AllocationSource>> = self
            .slots
            .get(index)
            .into_iter()
            .flat_map(|slot| slot.iter().flatten())
            .map(|id| Arc::clone(&self.sources[*id as usize]))
            .collect();
        found.sort_by_key(|s| s.kind().rank());
        found
    }

    pub fn warnings(&self) -> &[InconsistentInventory] {
        &self.warnings
    }
}

struct IndexBuilder {
    space: AddressSpace,
    sources: Vec<Arc<AllocationSource>>,
    slots: Vec<[Option<u32>; LAYERS]>,
    warnings: Vec<InconsistentInventory>,
    reported: HashSet<(u32, u32)>,
}

impl IndexBuilder {
    fn new(space: AddressSpace) -> IndexBuilder {
        IndexBuilder {
            space,
            sources: Vec::new(),
            slots: vec![[None; LAYERS]; space.size() as usize],
            warnings: Vec::new(),
            reported: HashSet::new(),
        }
    }

    fn add_source(&mut self, source: AllocationSource) -> u32 {
        self.sources.push(Arc::new(source));
        (self.sources.len() - 1) as u32
    }

    fn assign_ip(&mut self, ip: Ipv4Addr, source: u32) {
        match self.space.index_of(ip) {
            Some(index) => self.assign(index as usize, source),
            None => self.outside_subnet(source, &ip.to_string()),
        }
    }

    fn assign_block(&mut self, block: Ipv4, source: u32) {
        let Some(range) = self.space.clip(block) else {
            self.outside_subnet(source, &block.to_string());
            return;
        };
        if range.end - range.start < block.size() {
            self.outside_subnet(source, &block.to_string());
        }
        for index in range {
            self.assign(index as usize, source);
        }
    }

    fn mark_aws_reserved(&mut self) {
        let size = self.space.size();
        let last = size - 1;
        for (offset, reason) in AWS_RESERVED_OFFSETS {
            if offset < size {
                let source = self.add_source(AllocationSource::AwsReserved { reason });
                self.assign(offset as usize, source);
            }
        }
        if last >= AWS_RESERVED_OFFSETS.len() as u64 {
            let source = self.add_source(AllocationSource::AwsReserved {
                reason: AWS_RESERVED_BROADCAST,
            });
            self.assign(last as usize, source);
        }
    }

    /// Put `source` on the address, resolving a same-layer collision.
    fn assign(&mut self, index: usize, source: u32) {
        let kind = self.sources[source as usize].kind();
        let layer = kind.layer() as usize;
        let Some(existing) = self.slots[index][layer] else {
            if layer == Layer::AwsReserved as usize && self.slots[index][Layer::Interface as usize].is_some() {
                log::info!(
                    "AWS reserved address {} is occupied by an interface",
                    self.ip_at(index)
                );
            }
            self.slots[index][layer] = Some(source);
            return;
        };
        if existing == source {
            return;
        }
        match kind.layer() {
            Layer::Interface => {
                // Equal rank is a duplicate record: the later one wins.
                let existing_rank = self.sources[existing as usize].kind().rank();
                let (kept, dropped) = if kind.rank() <= existing_rank {
                    self.slots[index][layer] = Some(source);
                    (source, existing)
                } else {
                    (existing, source)
                };
                self.report_duplicate(index, kept, dropped);
            }
            Layer::Reservation => self.report_conflict(index, existing, source),
            Layer::AwsReserved => {}
        }
    }

    fn report_duplicate(&mut self, index: usize, kept: u32, dropped: u32) {
        if !self.reported.insert((kept, dropped)) {
            return;
        }
        let warning = InconsistentInventory::DuplicateAddress {
            ip: self.ip_at(index),
            kept: self.sources[kept as usize].label(),
            dropped: self.sources[dropped as usize].label(),
        };
        log::warn!("Inconsistent inventory: {warning}");
        self.warnings.push(warning);
    }

    fn report_conflict(&mut self, index: usize, kept: u32, ignored: u32) {
        if !self.reported.insert((kept, ignored)) {
            return;
        }
        let warning = InconsistentInventory::ConflictingReservation {
            ip: self.ip_at(index),
            kept: self.sources[kept as usize].label(),
            ignored: self.sources[ignored as usize].label(),
        };
        log::warn!("Inconsistent inventory: {warning}");
        self.warnings.push(warning);
    }

    fn outside_subnet(&mut self, source: u32, what: &str) {
        let warning = InconsistentInventory::OutsideSubnet {
            source: format!("{} {}", self.sources[source as usize].label(), what),
            cidr: self.space.cidr().to_string(),
        };
        log::warn!("Inconsistent inventory: {warning}");
        self.warnings.push(warning);
    }

    fn ip_at(&self, index: usize) -> Ipv4Addr {
        self.space
            .address_at(index as u64)
            .unwrap_or(self.space.network())
    }

    fn finish(self) -> AllocationIndex {
        log::debug!(
            "Allocation index for {}: {} sources over {} addresses, {} warnings",
            self.space.cidr(),
            self.sources.len(),
            self.slots.len(),
            self.warnings.len()
        );
        AllocationIndex {
            space: self.space,
            sources: self.sources,
            slots: self.slots,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> AddressSpace {
        AddressSpace::parse("10.0.1.0/28").unwrap()
    }

    fn eni(id: &str, primary: &str, secondary: &[&str], prefixes: &[&str]) -> NetworkInterface {
        NetworkInterface::new(id, "test", "in-use", primary, secondary, prefixes).unwrap()
    }

    fn kinds_at(index: &AllocationIndex, i: usize) -> Vec<SourceKind> {
        index.sources_at(i).iter().map(|s| s.kind()).collect()
    }

    #[test]
    fn test_precedence_table_orders_layers() {
        assert!(SourceKind::PrimaryEni.rank() < SourceKind::SecondaryEni.rank());
        assert!(SourceKind::SecondaryEni.rank() < SourceKind::PrefixDelegation.rank());
        assert!(SourceKind::PrefixDelegation.rank() < SourceKind::AwsReserved.rank());
        assert!(SourceKind::AwsReserved.rank() < SourceKind::ExplicitReservation.rank());
        assert_eq!(
            SourceKind::ExplicitReservation.rank(),
            SourceKind::PrefixReservation.rank()
        );
        for (kind, _) in PRECEDENCE {
            assert_ne!(kind.rank(), u8::MAX, "{kind:?} missing from table");
        }
    }

    #[test]
    fn test_aws_reserved_addresses() {
        let index = AllocationIndex::build(space(), &[], &[]);
        for i in [0usize, 1, 2, 3, 15] {
            assert_eq!(kinds_at(&index, i), vec![SourceKind::AwsReserved], "index {i}");
        }
        for i in 4..15 {
            assert!(index.sources_at(i).is_empty(), "index {i} should be free");
        }
        assert!(index.warnings().is_empty());
    }

    #[test]
    fn test_aws_reserved_tiny_subnets() {
        let index = AllocationIndex::build(AddressSpace::parse("10.0.1.7/32").unwrap(), &[], &[]);
        assert_eq!(index.len(), 1);
        assert_eq!(kinds_at(&index, 0), vec![SourceKind::AwsReserved]);

        let index = AllocationIndex::build(AddressSpace::parse("10.0.1.4/30").unwrap(), &[], &[]);
        assert!((0..4).all(|i| kinds_at(&index, i) == vec![SourceKind::AwsReserved]));
    }

    #[test]
    fn test_primary_and_secondary() {
        let enis = vec![eni("eni-1", "10.0.1.4", &["10.0.1.5"], &[])];
        let index = AllocationIndex::build(space(), &enis, &[]);
        assert_eq!(kinds_at(&index, 4), vec![SourceKind::PrimaryEni]);
        assert_eq!(kinds_at(&index, 5), vec![SourceKind::SecondaryEni]);
    }

    #[test]
    fn test_secondary_does_not_replace_primary() {
        let enis = vec![
            eni("eni-1", "10.0.1.4", &[], &[]),
            eni("eni-2", "10.0.1.6", &["10.0.1.4"], &[]),
        ];
        let index = AllocationIndex::build(space(), &enis, &[]);
        let sources = index.sources_at(4);
        assert_eq!(sources[0].label(), "eni-1 (primary)");
        assert_eq!(
            index.warnings(),
            &[InconsistentInventory::DuplicateAddress {
                ip: Ipv4Addr::new(10, 0, 1, 4),
                kept: "eni-1 (primary)".to_string(),
                dropped: "eni-2 (secondary)".to_string(),
            }]
        );
    }

    #[test]
    fn test_duplicate_primary_last_write_wins() {
        let enis = vec![
            eni("eni-1", "10.0.1.4", &[], &[]),
            eni("eni-2", "10.0.1.4", &[], &[]),
        ];
        let index = AllocationIndex::build(space(), &enis, &[]);
        assert_eq!(index.sources_at(4)[0].label(), "eni-2 (primary)");
        assert_eq!(index.warnings().len(), 1);
    }

    #[test]
    fn test_prefix_delegation_fills_unassigned_only() {
        let space = AddressSpace::parse("10.0.1.0/27").unwrap();
        let enis = vec![eni("eni-1", "10.0.1.20", &[], &["10.0.1.16/28"])];
        let index = AllocationIndex::build(space, &enis, &[]);
        assert_eq!(kinds_at(&index, 20), vec![SourceKind::PrimaryEni]);
        for i in (16..32).filter(|i| *i != 20 && *i != 31) {
            assert_eq!(kinds_at(&index, i), vec![SourceKind::PrefixDelegation], "index {i}");
        }
        // broadcast inside the prefix keeps both facts
        assert_eq!(
            kinds_at(&index, 31),
            vec![SourceKind::PrefixDelegation, SourceKind::AwsReserved]
        );
    }

    #[test]
    fn test_eni_on_aws_reserved_keeps_both() {
        let enis = vec![eni("eni-1", "10.0.1.3", &[], &[])];
        let index = AllocationIndex::build(space(), &enis, &[]);
        assert_eq!(
            kinds_at(&index, 3),
            vec![SourceKind::PrimaryEni, SourceKind::AwsReserved]
        );
        assert!(index.warnings().is_empty());
    }

    #[test]
    fn test_reservation_overlaps_used_address() {
        let enis = vec![eni("eni-1", "10.0.1.10", &[], &[])];
        let reservations = vec![CidrReservation::new("scr-1", "10.0.1.10/31", "explicit", "lb").unwrap()];
        let index = AllocationIndex::build(space(), &enis, &reservations);
        assert_eq!(
            kinds_at(&index, 10),
            vec![SourceKind::PrimaryEni, SourceKind::ExplicitReservation]
        );
        assert_eq!(kinds_at(&index, 11), vec![SourceKind::ExplicitReservation]);
    }

    #[test]
    fn test_overlapping_reservations_first_listed_wins() {
        let reservations = vec![
            CidrReservation::new("scr-a", "10.0.1.8/30", "prefix", "").unwrap(),
            CidrReservation::new("scr-b", "10.0.1.8/29", "explicit", "").unwrap(),
        ];
        let index = AllocationIndex::build(space(), &[], &reservations);
        assert_eq!(kinds_at(&index, 8), vec![SourceKind::PrefixReservation]);
        assert_eq!(kinds_at(&index, 12), vec![SourceKind::ExplicitReservation]);
        assert_eq!(index.warnings().len(), 1, "one warning per conflicting pair");
        assert!(matches!(
            &index.warnings()[0],
            InconsistentInventory::ConflictingReservation { kept, .. } if kept == "scr-a (10.0.1.8/30)"
        ));
    }

    #[test]
    fn test_outside_subnet_is_warned_and_skipped() {
        let enis = vec![eni("eni-1", "10.0.2.4", &[], &[])];
        let reservations = vec![CidrReservation::new("scr-1", "10.0.1.0/27", "explicit", "").unwrap()];
        let index = AllocationIndex::build(space(), &enis, &reservations);
        assert_eq!(index.warnings().len(), 2);
        assert!(index
            .warnings()
            .iter()
            .all(|w| matches!(w, InconsistentInventory::OutsideSubnet { .. })));
        // the in-range part of the reservation still applies
        assert_eq!(kinds_at(&index, 7), vec![SourceKind::ExplicitReservation]);
    }
}
