//! Network interface and CIDR reservation records.
//!
//! Records are typed on deserialization and checked again with `validate`
//! before they reach the allocation index, so malformed inventory fails the
//! analysis up front instead of surfacing inside the classifier.

use super::Ipv4;
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Elastic network interface attached to a subnet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    pub interface_id: String,
    #[serde(default)]
    pub description: String,
    /// ENI status, e.g. `in-use` or `available`.
    #[serde(default)]
    pub status: String,
    pub primary_private_ip: Ipv4Addr,
    #[serde(default)]
    pub secondary_private_ips: Vec<Ipv4Addr>,
    /// IPv4 prefixes delegated to the interface, commonly /28.
    #[serde(default)]
    pub attached_ipv4_prefixes: Vec<Ipv4>,
}

impl NetworkInterface {
    /// Build an interface from inventory strings.
    pub fn new(
        interface_id: &str,
        description: &str,
        status: &str,
        primary_private_ip: &str,
        secondary_private_ips: &[&str],
        attached_ipv4_prefixes: &[&str],
    ) -> Result<NetworkInterface> {
        let parse_ip = |ip: &str| {
            ip.trim().parse::<Ipv4Addr>().map_err(|_| {
                AnalysisError::invalid_record(
                    "network interface",
                    interface_id,
                    format!("invalid private address '{ip}'"),
                )
            })
        };
        let eni = NetworkInterface {
            interface_id: interface_id.to_string(),
            description: description.to_string(),
            status: status.to_string(),
            primary_private_ip: parse_ip(primary_private_ip)?,
            secondary_private_ips: secondary_private_ips
                .iter()
                .map(|ip| parse_ip(ip))
                .collect::<Result<Vec<_>>>()?,
            attached_ipv4_prefixes: attached_ipv4_prefixes
                .iter()
                .map(|p| Ipv4::new(p))
                .collect::<Result<Vec<_>>>()?,
        };
        eni.validate()?;
        Ok(eni)
    }

    /// Reject empty ids and prefixes with host bits set.
    pub fn validate(&self) -> Result<()> {
        if self.interface_id.trim().is_empty() {
            return Err(AnalysisError::invalid_record(
                "network interface",
                &self.interface_id,
                "empty interface id",
            ));
        }
        if let Some(prefix) = self.attached_ipv4_prefixes.iter().find(|p| !p.is_network()) {
            return Err(AnalysisError::invalid_record(
                "network interface",
                &self.interface_id,
                format!("prefix {prefix} has host bits set"),
            ));
        }
        Ok(())
    }
}

/// Reservation type tag of a subnet CIDR reservation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReservationType {
    Explicit,
    Prefix,
}

impl std::str::FromStr for ReservationType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "explicit" => Ok(ReservationType::Explicit),
            "prefix" => Ok(ReservationType::Prefix),
            other => Err(format!("unknown reservation type '{other}'")),
        }
    }
}

impl fmt::Display for ReservationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationType::Explicit => write!(f, "explicit"),
            ReservationType::Prefix => write!(f, "prefix"),
        }
    }
}

/// Address range carved out of a subnet independently of any interface.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CidrReservation {
    pub reservation_id: String,
    pub cidr: Ipv4,
    #[serde(rename = "type")]
    pub reservation_type: ReservationType,
    #[serde(default)]
    pub description: String,
}

impl CidrReservation {
    pub fn new(
        reservation_id: &str,
        cidr: &str,
        reservation_type: &str,
        description: &str,
    ) -> Result<CidrReservation> {
        let reservation_type = reservation_type
            .parse::<ReservationType>()
            .map_err(|e| AnalysisError::invalid_record("cidr reservation", reservation_id, e))?;
        let reservation = CidrReservation {
            reservation_id: reservation_id.to_string(),
            cidr: Ipv4::new(cidr)?,
            reservation_type,
            description: description.to_string(),
        };
        reservation.validate()?;
        Ok(reservation)
    }

    pub fn validate(&self) -> Result<()> {
        if self.reservation_id.trim().is_empty() {
            return Err(AnalysisError::invalid_record(
                "cidr reservation",
                &self.reservation_id,
                "empty reservation id",
            ));
        }
        if !self.cidr.is_network() {
            return Err(AnalysisError::invalid_record(
                "cidr reservation",
                &self.reservation_id,
                format!("cidr {} has host bits set", self.cidr),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_interface() {
        let eni = NetworkInterface::new(
            "eni-1",
            "web",
            "in-use",
            "10.0.1.4",
            &["10.0.1.5"],
            &["10.0.1.16/28"],
        )
        .unwrap();
        assert_eq!(eni.primary_private_ip, Ipv4Addr::new(10, 0, 1, 4));
        assert_eq!(eni.secondary_private_ips.len(), 1);
        assert_eq!(eni.attached_ipv4_prefixes[0].size(), 16);
    }

    #[test]
    fn test_interface_rejects_malformed() {
        let err = NetworkInterface::new("eni-1", "", "in-use", "10.0.1.300", &[], &[]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidRecord { .. }));
        assert!(NetworkInterface::new("eni-1", "", "in-use", "10.0.1.4", &["x"], &[]).is_err());
        assert!(NetworkInterface::new("eni-1", "", "in-use", "10.0.1.4", &[], &["10.0.1.17/28"]).is_err());
        assert!(NetworkInterface::new(" ", "", "in-use", "10.0.1.4", &[], &[]).is_err());
    }

    #[test]
    fn test_new_reservation() {
        let r = CidrReservation::new("scr-1", "10.0.1.10/31", "explicit", "lb").unwrap();
        assert_eq!(r.reservation_type, ReservationType::Explicit);
        let r = CidrReservation::new("scr-2", "10.0.1.32/28", "Prefix", "").unwrap();
        assert_eq!(r.reservation_type, ReservationType::Prefix);
        assert!(CidrReservation::new("scr-3", "10.0.1.10/31", "bogus", "").is_err());
        assert!(CidrReservation::new("scr-4", "10.0.1.11/31", "explicit", "").is_err());
    }

    #[test]
    fn test_reservation_json_shape() {
        let json = r#"{"reservationId":"scr-1","cidr":"10.0.1.10/31","type":"explicit","description":"lb"}"#;
        let r: CidrReservation = serde_json::from_str(json).unwrap();
        assert_eq!(r.cidr.to_string(), "10.0.1.10/31");
        assert!(serde_json::from_str::<CidrReservation>(
            r#"{"reservationId":"scr-1","cidr":"10.0.1.10/31","type":"other"}"#
        )
        .is_err());
    }
}
