//! Whole-subnet analysis pass.
//!
//! inventory -> [`AllocationIndex`] -> [`classify`] -> gaps and counts -> score.
//! Each call owns everything it builds, so subnets can be analysed in parallel.

use super::allocation::AllocationIndex;
use super::classifier::{classify, ClassifiedAddress};
use super::fragmentation::{fragmentation_score, FragmentationLevel};
use super::gap_finder::{find_gaps, gap_stats, Gap};
use super::stats::aggregate;
use crate::config;
use crate::error::{InconsistentInventory, Result};
use crate::models::{CidrReservation, NetworkInterface, Subnet};
use itertools::Itertools;
use serde::Serialize;

/// Gap details attached to a [`FragmentationReport`].
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FragmentationDetails {
    pub num_gaps: usize,
    pub largest_gap: usize,
    pub avg_gap_size: f64,
    pub usable_prefixes: usize,
    pub largest_gaps: Vec<Gap>,
}

/// Subnet-level summary of one analysis pass.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FragmentationReport {
    pub total_ips: usize,
    pub used_ips: usize,
    pub available_ips: usize,
    pub reserved_ips: usize,
    pub primary_ips: usize,
    pub secondary_ips: usize,
    pub prefix_delegation_ips: usize,
    pub cidr_reservation_ips: usize,
    pub utilization: f64,
    pub fragmentation_score: f64,
    pub fragmentation_details: FragmentationDetails,
}

impl FragmentationReport {
    pub fn level(&self) -> FragmentationLevel {
        FragmentationLevel::from_score(self.fragmentation_score)
    }
}

/// Result of [`analyze_subnet`].
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetAnalysis {
    pub subnet_id: String,
    pub name: String,
    pub cidr: String,
    pub availability_zone: String,
    pub ips: Vec<ClassifiedAddress>,
    pub summary: FragmentationReport,
    /// Distinct reservation blocks of the subnet, in inventory order.
    pub cidr_reservations: Vec<CidrReservation>,
    /// Free address count reported by AWS, for comparison.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_available_ip_count: Option<u32>,
    pub warnings: Vec<InconsistentInventory>,
}

/// Analyse a subnet with the default address limit.
pub fn analyze_subnet(
    subnet: &Subnet,
    interfaces: &[NetworkInterface],
    reservations: &[CidrReservation],
) -> Result<SubnetAnalysis> {
    analyze_subnet_with_limit(subnet, interfaces, reservations, config::MAX_SUBNET_ADDRESSES)
}

/// Analyse a subnet, rejecting it when it has more than `max_addresses`.
///
/// Either returns a complete analysis or a single error; malformed records
/// fail the whole pass.
pub fn analyze_subnet_with_limit(
    subnet: &Subnet,
    interfaces: &[NetworkInterface],
    reservations: &[CidrReservation],
    max_addresses: u64,
) -> Result<SubnetAnalysis> {
    let space = subnet.address_space()?;
    space.ensure_within(max_addresses)?;
    for eni in interfaces {
        eni.validate()?;
    }
    for reservation in reservations {
        reservation.validate()?;
    }

    let index = AllocationIndex::build(space, interfaces, reservations);
    let ips = classify(&index);
    let counts = aggregate(&ips);
    let gaps = gap_stats(&find_gaps(&ips));
    let score = fragmentation_score(gaps.num_gaps, gaps.largest_gap, counts.available, counts.total);

    let summary = FragmentationReport {
        total_ips: counts.total,
        used_ips: counts.used,
        available_ips: counts.available,
        reserved_ips: counts.reserved,
        primary_ips: counts.primary,
        secondary_ips: counts.secondary,
        prefix_delegation_ips: counts.prefix_delegation,
        cidr_reservation_ips: counts.cidr_reservation,
        utilization: counts.utilization(),
        fragmentation_score: score,
        fragmentation_details: FragmentationDetails {
            num_gaps: gaps.num_gaps,
            largest_gap: gaps.largest_gap,
            avg_gap_size: gaps.avg_gap_size,
            usable_prefixes: gaps.usable_prefixes,
            largest_gaps: gaps.largest_gaps,
        },
    };

    log::info!(
        "Subnet {} ({}) {}: used={} free={} reserved={} cidr_reserved={} utilization={}% gaps={} score={} [{}]",
        subnet.name,
        subnet.id,
        subnet.cidr,
        summary.used_ips,
        summary.available_ips,
        summary.reserved_ips,
        summary.cidr_reservation_ips,
        summary.utilization,
        summary.fragmentation_details.num_gaps,
        summary.fragmentation_score,
        summary.level()
    );

    Ok(SubnetAnalysis {
        subnet_id: subnet.id.clone(),
        name: subnet.name.clone(),
        cidr: subnet.cidr.to_string(),
        availability_zone: subnet.availability_zone.clone(),
        ips,
        summary,
        cidr_reservations: reservations
            .iter()
            .unique_by(|r| r.cidr)
            .cloned()
            .collect(),
        aws_available_ip_count: subnet.available_ip_address_count,
        warnings: index.warnings().to_vec(),
    })
}
