//! AWS CLI interaction.
//!
//! This module handles all AWS-related operations:
//! - [`cli`] - Command execution for the AWS CLI
//! - [`ec2`] - EC2 inventory queries
//! - [`cache`] - Caching of VPC snapshots

mod cache;
mod cli;
mod ec2;

// Re-export public types and functions
pub use cache::{default_cache_file, read_vpc_cache};
pub use cli::run;
pub use ec2::{fetch_vpc_snapshot, AwsCli, Inventory};
