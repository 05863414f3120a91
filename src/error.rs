//! Error and warning types for subnet analysis.
//!
//! [`AnalysisError`] fails the analysis of a subnet as a whole.
//! [`InconsistentInventory`] is recovered from by precedence and reported
//! next to a complete result.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Fatal error for one analysis pass.
///
/// Serialisable so a record rejected while fetching inventory can travel in
/// a cached snapshot to the analysis of its subnet.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AnalysisError {
    #[error("Invalid CIDR '{cidr}': {reason}")]
    InvalidCidr { cidr: String, reason: String },

    #[error("Subnet {cidr} has {size} addresses, above the limit of {limit}")]
    SubnetTooLarge { cidr: String, size: u64, limit: u64 },

    #[error("Invalid {record} record '{id}': {reason}")]
    InvalidRecord {
        record: String,
        id: String,
        reason: String,
    },

    /// The analysis task of a subnet panicked or was cancelled.
    #[error("Analysis of subnet {subnet} did not complete: {reason}")]
    Interrupted { subnet: String, reason: String },
}

impl AnalysisError {
    pub(crate) fn invalid_cidr(cidr: &str, reason: impl Into<String>) -> Self {
        AnalysisError::InvalidCidr {
            cidr: cidr.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_record(
        record: &'static str,
        id: &str,
        reason: impl Into<String>,
    ) -> Self {
        AnalysisError::InvalidRecord {
            record: record.to_string(),
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Data-consistency anomaly found while building the allocation index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InconsistentInventory {
    /// Two interface sources claimed the same address.
    #[serde(rename_all = "camelCase")]
    DuplicateAddress {
        ip: Ipv4Addr,
        kept: String,
        dropped: String,
    },
    /// Two CIDR reservations cover the same address; the first listed wins.
    #[serde(rename_all = "camelCase")]
    ConflictingReservation {
        ip: Ipv4Addr,
        kept: String,
        ignored: String,
    },
    /// An inventory record names addresses outside the subnet CIDR.
    #[serde(rename_all = "camelCase")]
    OutsideSubnet { source: String, cidr: String },
}

impl fmt::Display for InconsistentInventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InconsistentInventory::DuplicateAddress { ip, kept, dropped } => {
                write!(f, "{ip} claimed twice: kept {kept}, dropped {dropped}")
            }
            InconsistentInventory::ConflictingReservation { ip, kept, ignored } => {
                write!(f, "{ip} in overlapping reservations: kept {kept}, ignored {ignored}")
            }
            InconsistentInventory::OutsideSubnet { source, cidr } => {
                write!(f, "{source} has addresses outside subnet {cidr}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = AnalysisError::invalid_cidr("10.0.0.0/33", "prefix length above 32");
        assert_eq!(
            e.to_string(),
            "Invalid CIDR '10.0.0.0/33': prefix length above 32"
        );
        let e = AnalysisError::SubnetTooLarge {
            cidr: "10.0.0.0/8".to_string(),
            size: 16_777_216,
            limit: 65_536,
        };
        assert!(e.to_string().contains("above the limit of 65536"));
    }

    #[test]
    fn test_invalid_record_survives_json() {
        let e = AnalysisError::invalid_record("network interface", "eni-x", "no primary private address");
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"kind\":\"invalidRecord\""), "{json}");
        assert_eq!(serde_json::from_str::<AnalysisError>(&json).unwrap(), e);
    }

    #[test]
    fn test_warning_serializes_with_kind() {
        let w = InconsistentInventory::DuplicateAddress {
            ip: Ipv4Addr::new(10, 0, 1, 4),
            kept: "eni-b".to_string(),
            dropped: "eni-a".to_string(),
        };
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["kind"], "duplicateAddress");
        assert_eq!(json["ip"], "10.0.1.4");
        assert_eq!(json["kept"], "eni-b");
    }
}
