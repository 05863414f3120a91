//! IP allocation and fragmentation analysis of AWS VPC subnets.
//!
//! The engine in [`processing`] is a pure function of a subnet and its
//! inventory. [`aws`] fetches and caches that inventory, [`output`] renders
//! the results.

pub mod aws;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod processing;

pub use error::{AnalysisError, InconsistentInventory};
pub use processing::{analyze_subnet, analyze_vpc, FragmentationReport, SubnetAnalysis};

use aws::{fetch_vpc_snapshot, read_vpc_cache, AwsCli};
use models::VpcSnapshot;
use std::error::Error;

/// Snapshot of a VPC from cache or the AWS CLI, normalised and checked.
pub fn load_vpc_snapshot(
    region: &str,
    vpc_id: &str,
    cache_file: Option<&str>,
    refresh: bool,
) -> Result<VpcSnapshot, Box<dyn Error>> {
    let cli = AwsCli::new(region);
    let snapshot = read_vpc_cache(cache_file, region, vpc_id, refresh, || {
        fetch_vpc_snapshot(&cli, region, vpc_id)
    })?;
    processing::normalize_snapshot(snapshot)
}

/// Normalised snapshot read from a cache file only, never calling AWS.
pub fn read_cached_snapshot(cache_file: &str) -> Result<VpcSnapshot, Box<dyn Error>> {
    let snapshot = read_vpc_cache(Some(cache_file), "", "", false, || {
        Err(format!("Cache file {cache_file} could not be read").into())
    })?;
    processing::normalize_snapshot(snapshot)
}
