//! Fragmentation score of a subnet's free space.
//!
//! ```text
//! score = 100 * (1 - largest_gap / available_ips) * (1 - 1 / num_gaps)
//! ```
//!
//! The first factor is the share of free addresses outside the largest run,
//! the second grows with the number of runs. The score is 0 with at most one
//! run or at most one free address, and lies in [0, 100).

use super::gap_finder::round2;
use serde::Serialize;
use std::fmt;

/// Scores below this are low fragmentation.
pub const MODERATE_THRESHOLD: f64 = 20.0;
/// Scores above this are high fragmentation.
pub const HIGH_THRESHOLD: f64 = 50.0;

/// Compute the 0-100 score, rounded to 2 decimals.
pub fn fragmentation_score(
    num_gaps: usize,
    largest_gap: usize,
    available_ips: usize,
    total_ips: usize,
) -> f64 {
    if total_ips == 0 || available_ips <= 1 || num_gaps <= 1 {
        return 0.0;
    }
    let outside_largest = 1.0 - (largest_gap.min(available_ips) as f64 / available_ips as f64);
    let spread = 1.0 - 1.0 / num_gaps as f64;
    round2((100.0 * outside_largest * spread).clamp(0.0, 100.0))
}

/// Presentation band of a score.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FragmentationLevel {
    Low,
    Moderate,
    High,
}

impl FragmentationLevel {
    pub fn from_score(score: f64) -> FragmentationLevel {
        if score < MODERATE_THRESHOLD {
            FragmentationLevel::Low
        } else if score <= HIGH_THRESHOLD {
            FragmentationLevel::Moderate
        } else {
            FragmentationLevel::High
        }
    }
}

impl fmt::Display for FragmentationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FragmentationLevel::Low => write!(f, "low"),
            FragmentationLevel::Moderate => write!(f, "moderate"),
            FragmentationLevel::High => write!(f, "high"),
        }
    }
}
