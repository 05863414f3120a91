//! Output formatting for analysis results.
//!
//! This module handles formatting and outputting subnet analyses:
//! - [`csv`] - CSV output formatting
//! - [`json`] - JSON output
//! - [`terminal`] - Terminal output with colors

mod csv;
mod json;
mod terminal;

pub use csv::{ip_csv_rows, print_ip_csv, print_subnet_csv, subnet_csv_row, IP_CSV_HEADER, SUBNET_CSV_HEADER};
pub use json::{outcomes_json, AnalysisJson};
pub use terminal::{format_field, format_summary, format_vpcs, print_outcomes};
