//! Gap finding inside a classified subnet.
//!
//! A gap is a maximal run of consecutive `free` addresses. Reserved and
//! CIDR-reserved addresses end a run like used ones do.

use super::classifier::{AddressStatus, ClassifiedAddress};
use crate::config;
use itertools::Itertools;
use serde::Serialize;
use std::net::Ipv4Addr;

/// One contiguous free run.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    pub start: Ipv4Addr,
    pub end: Ipv4Addr,
    pub size: usize,
}

impl Gap {
    /// Number of aligned blocks of `block_size` addresses that fit in the run.
    pub fn aligned_blocks(&self, block_size: u32) -> usize {
        if block_size == 0 {
            return 0;
        }
        let start = u32::from(self.start) as u64;
        let end = u32::from(self.end) as u64 + 1;
        let block = block_size as u64;
        let first = start.div_ceil(block);
        let last = end / block;
        last.saturating_sub(first) as usize
    }
}

/// Gap statistics of one subnet.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GapStats {
    pub num_gaps: usize,
    pub largest_gap: usize,
    pub avg_gap_size: f64,
    /// Aligned /28 blocks that still fit in the free runs.
    pub usable_prefixes: usize,
    /// Largest runs first, ties by start address.
    pub largest_gaps: Vec<Gap>,
}

/// Single left to right pass collecting every free run.
pub fn find_gaps(addresses: &[ClassifiedAddress]) -> Vec<Gap> {
    let mut gaps = Vec::new();
    let mut run: Option<(Ipv4Addr, Ipv4Addr, usize)> = None;

    for address in addresses {
        if address.status == AddressStatus::Free {
            run = match run {
                Some((start, _, size)) => Some((start, address.ip, size + 1)),
                None => Some((address.ip, address.ip, 1)),
            };
        } else if let Some((start, end, size)) = run.take() {
            gaps.push(Gap { start, end, size });
        }
    }
    if let Some((start, end, size)) = run {
        gaps.push(Gap { start, end, size });
    }
    gaps
}

/// Reduce free runs to the statistics used by scoring and reports.
pub fn gap_stats(gaps: &[Gap]) -> GapStats {
    if gaps.is_empty() {
        return GapStats::default();
    }
    let total: usize = gaps.iter().map(|g| g.size).sum();
    let avg_gap_size = round2(total as f64 / gaps.len() as f64);
    let largest_gaps: Vec<Gap> = gaps
        .iter()
        .copied()
        .sorted_by(|a, b| b.size.cmp(&a.size).then(a.start.cmp(&b.start)))
        .take(config::LARGEST_GAPS_REPORTED)
        .collect();

    GapStats {
        num_gaps: gaps.len(),
        largest_gap: largest_gaps.first().map(|g| g.size).unwrap_or(0),
        avg_gap_size,
        usable_prefixes: gaps
            .iter()
            .map(|g| g.aligned_blocks(config::PREFIX_BLOCK_SIZE))
            .sum(),
        largest_gaps,
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
