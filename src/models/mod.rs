//! Domain models for VPC IP fragmentation analysis.
//!
//! This module contains the core data structures used throughout the application:
//! - [`Ipv4`] - IPv4 CIDR block
//! - [`AddressSpace`] - A subnet CIDR as an indexable address range
//! - [`Subnet`] - AWS subnet representation
//! - [`NetworkInterface`] and [`CidrReservation`] - Inventory records
//! - [`Vpc`] and [`VpcSnapshot`] - VPC structures

mod address_space;
mod inventory;
mod ipv4;
mod subnet;
mod vpc;

// Re-export public types
pub use address_space::AddressSpace;
pub use inventory::{CidrReservation, NetworkInterface, ReservationType};
pub use ipv4::{Ipv4, MAX_LENGTH};
pub use subnet::Subnet;
pub use vpc::{Region, Vpc, VpcSnapshot};
