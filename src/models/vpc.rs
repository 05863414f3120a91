//! AWS VPC data model and the per-VPC inventory snapshot.

use super::{CidrReservation, NetworkInterface, Subnet};
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An AWS region as listed by `describe-regions`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub id: String,
    pub endpoint: String,
}

/// A VPC with its primary CIDR block.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Vpc {
    pub id: String,
    /// Value of the `Name` tag, or the id when untagged.
    pub name: String,
    pub cidr: String,
    pub state: String,
}

/// Everything one analysis run needs for a VPC, as fetched at one point in time.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct VpcSnapshot {
    pub region: String,
    pub vpc_id: String,
    /// When the snapshot was taken, RFC 3339.
    #[serde(default)]
    pub fetched_at: String,
    pub subnets: Vec<Subnet>,
    /// Network interfaces keyed by subnet id.
    #[serde(default)]
    pub interfaces: BTreeMap<String, Vec<NetworkInterface>>,
    /// CIDR reservations keyed by subnet id.
    #[serde(default)]
    pub reservations: BTreeMap<String, Vec<CidrReservation>>,
    /// Malformed inventory record seen while fetching, keyed by subnet id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub record_errors: BTreeMap<String, AnalysisError>,
}

impl VpcSnapshot {
    pub fn interfaces_for(&self, subnet_id: &str) -> &[NetworkInterface] {
        self.interfaces
            .get(subnet_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Error that fails the analysis of `subnet_id` before it starts.
    pub fn record_error_for(&self, subnet_id: &str) -> Option<&AnalysisError> {
        self.record_errors.get(subnet_id)
    }

    pub fn reservations_for(&self, subnet_id: &str) -> &[CidrReservation] {
        self.reservations
            .get(subnet_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl fmt::Display for Vpc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' [{}] ({})", self.id, self.name, self.cidr, self.state)
    }
}
