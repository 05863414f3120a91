//! Per-address classification of a subnet.

use super::allocation::{AllocationIndex, AllocationSource, SourceKind};
use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Status of one address.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AddressStatus {
    Used,
    Reserved,
    CidrReservation,
    Free,
}

impl fmt::Display for AddressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AddressStatus::Used => "used",
            AddressStatus::Reserved => "reserved",
            AddressStatus::CidrReservation => "cidr_reservation",
            AddressStatus::Free => "free",
        };
        write!(f, "{s}")
    }
}

/// Source payload of a classified address plus the facts it overrides.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddressDetail {
    #[serde(flatten)]
    pub source: Arc<AllocationSource>,
    /// CIDR reservation covering an address that is used or AWS reserved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr_reservation: Option<Arc<AllocationSource>>,
    /// AWS-reserved marker on an address occupied by an interface.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_reserved: Option<Arc<AllocationSource>>,
}

impl AddressDetail {
    pub fn kind(&self) -> SourceKind {
        self.source.kind()
    }

    /// True when the address is used and a CIDR reservation also covers it.
    pub fn has_reservation_overlap(&self) -> bool {
        self.cidr_reservation.is_some()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedAddress {
    pub ip: Ipv4Addr,
    pub status: AddressStatus,
    pub details: Option<AddressDetail>,
}

/// Classify every address of the index, in address order.
pub fn classify(index: &AllocationIndex) -> Vec<ClassifiedAddress> {
    index
        .space()
        .iter()
        .enumerate()
        .map(|(i, ip)| classify_at(index, i, ip))
        .collect()
}

fn classify_at(index: &AllocationIndex, i: usize, ip: Ipv4Addr) -> ClassifiedAddress {
    let mut sources = index.sources_at(i).into_iter();
    let Some(winner) = sources.next() else {
        return ClassifiedAddress {
            ip,
            status: AddressStatus::Free,
            details: None,
        };
    };
    let mut detail = AddressDetail {
        source: winner,
        cidr_reservation: None,
        aws_reserved: None,
    };
    for overlay in sources {
        match overlay.kind() {
            SourceKind::AwsReserved => detail.aws_reserved = Some(overlay),
            SourceKind::ExplicitReservation | SourceKind::PrefixReservation => {
                detail.cidr_reservation = Some(overlay)
            }
            _ => {}
        }
    }
    ClassifiedAddress {
        ip,
        status: detail.kind().status(),
        details: Some(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AddressSpace, CidrReservation, NetworkInterface};

    fn classified(enis: &[NetworkInterface], reservations: &[CidrReservation]) -> Vec<ClassifiedAddress> {
        let space = AddressSpace::parse("10.0.1.0/28").unwrap();
        classify(&AllocationIndex::build(space, enis, reservations))
    }

    #[test]
    fn test_classify_order_and_statuses() {
        let enis = vec![NetworkInterface::new("eni-1", "web", "in-use", "10.0.1.4", &["10.0.1.5"], &[]).unwrap()];
        let result = classified(&enis, &[]);
        assert_eq!(result.len(), 16);
        for (i, address) in result.iter().enumerate() {
            assert_eq!(address.ip, Ipv4Addr::new(10, 0, 1, i as u8), "order at {i}");
        }
        let statuses: Vec<AddressStatus> = result.iter().map(|a| a.status).collect();
        use AddressStatus::*;
        assert_eq!(
            statuses,
            vec![
                Reserved, Reserved, Reserved, Reserved, Used, Used, Free, Free, Free, Free, Free,
                Free, Free, Free, Free, Reserved
            ]
        );
        assert!(result[6].details.is_none());
    }

    #[test]
    fn test_used_address_keeps_reservation_overlay() {
        let enis = vec![NetworkInterface::new("eni-1", "web", "in-use", "10.0.1.10", &[], &[]).unwrap()];
        let reservations = vec![CidrReservation::new("scr-1", "10.0.1.10/31", "explicit", "lb").unwrap()];
        let result = classified(&enis, &reservations);

        assert_eq!(result[10].status, AddressStatus::Used);
        let detail = result[10].details.as_ref().unwrap();
        assert!(detail.has_reservation_overlap());
        assert_eq!(
            detail.cidr_reservation.as_deref(),
            Some(&AllocationSource::ExplicitReservation {
                reservation_id: "scr-1".to_string(),
                cidr: "10.0.1.10/31".parse().unwrap(),
                description: "lb".to_string(),
            })
        );
        assert_eq!(result[11].status, AddressStatus::CidrReservation);
    }

    #[test]
    fn test_detail_json_shape() {
        let enis = vec![NetworkInterface::new("eni-1", "web", "in-use", "10.0.1.10", &[], &[]).unwrap()];
        let reservations = vec![CidrReservation::new("scr-1", "10.0.1.10/31", "prefix", "k8s").unwrap()];
        let result = classified(&enis, &reservations);

        let json = serde_json::to_value(&result[10]).unwrap();
        assert_eq!(json["ip"], "10.0.1.10");
        assert_eq!(json["status"], "used");
        assert_eq!(json["details"]["type"], "primary");
        assert_eq!(json["details"]["interfaceId"], "eni-1");
        assert_eq!(json["details"]["cidrReservation"]["type"], "prefix");
        assert_eq!(json["details"]["cidrReservation"]["cidr"], "10.0.1.10/31");

        let json = serde_json::to_value(&result[0]).unwrap();
        assert_eq!(json["status"], "reserved");
        assert_eq!(json["details"]["type"], "aws_reserved");
        assert_eq!(json["details"]["reason"], "Network address");

        let json = serde_json::to_value(&result[7]).unwrap();
        assert_eq!(json["status"], "free");
        assert!(json["details"].is_null());
    }
}
