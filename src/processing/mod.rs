//! IP allocation and fragmentation analysis.
//!
//! This module contains the analysis engine:
//! - [`allocation`] - Address to allocation source index
//! - [`classifier`] - Per-address status
//! - [`gap_finder`] - Free runs and gap statistics
//! - [`fragmentation`] - Fragmentation score
//! - [`stats`] - Subnet-level counts
//! - [`analyze`] - One subnet end to end
//! - [`dedup`] - Inventory normalisation
//! - [`vpc`] - Concurrent analysis of all subnets of a VPC

mod allocation;
mod analyze;
mod classifier;
mod dedup;
mod fragmentation;
mod gap_finder;
mod stats;
mod vpc;

// Re-export public types and functions
pub use allocation::{AllocationIndex, AllocationSource, Layer, SourceKind, PRECEDENCE};
pub use analyze::{
    analyze_subnet, analyze_subnet_with_limit, FragmentationDetails, FragmentationReport,
    SubnetAnalysis,
};
pub use classifier::{classify, AddressDetail, AddressStatus, ClassifiedAddress};
pub use dedup::{check_for_duplicate_subnets, normalize_snapshot};
pub use fragmentation::{fragmentation_score, FragmentationLevel, HIGH_THRESHOLD, MODERATE_THRESHOLD};
pub use gap_finder::{find_gaps, gap_stats, Gap, GapStats};
pub use stats::{aggregate, AddressCounts};
pub use vpc::{analyze_vpc, select_subnet, SubnetOutcome};
