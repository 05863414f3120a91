//! AWS subnet data model.

use super::{AddressSpace, Ipv4};
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Represents a VPC subnet as returned by inventory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    /// Subnet id, e.g. `subnet-0abc`.
    pub id: String,
    /// Value of the `Name` tag, or the id when untagged.
    pub name: String,
    /// IPv4 CIDR block of the subnet.
    pub cidr: Ipv4,
    pub availability_zone: String,
    /// Id of the VPC containing this subnet.
    #[serde(default)]
    pub vpc_id: String,
    /// Free address count as reported by AWS, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_ip_address_count: Option<u32>,
}

impl Subnet {
    /// Build a subnet from inventory strings, rejecting a malformed CIDR.
    pub fn new(id: &str, name: &str, cidr: &str, availability_zone: &str) -> Result<Subnet> {
        if id.trim().is_empty() {
            return Err(AnalysisError::invalid_record("subnet", id, "empty subnet id"));
        }
        Ok(Subnet {
            id: id.to_string(),
            name: name.to_string(),
            cidr: Ipv4::network(cidr)?,
            availability_zone: availability_zone.to_string(),
            vpc_id: String::new(),
            available_ip_address_count: None,
        })
    }

    /// Address space of the subnet, the CIDR must be a network address.
    pub fn address_space(&self) -> Result<AddressSpace> {
        if self.id.trim().is_empty() {
            return Err(AnalysisError::invalid_record("subnet", &self.id, "empty subnet id"));
        }
        if !self.cidr.is_network() {
            return Err(AnalysisError::invalid_cidr(
                &self.cidr.to_string(),
                "host bits set",
            ));
        }
        Ok(AddressSpace::from_cidr(self.cidr))
    }
}
