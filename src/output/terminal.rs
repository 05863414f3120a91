//! Terminal output utilities.
//!
//! Formatting helpers plus the coloured per-subnet summary and VPC listing.

use crate::models::Vpc;
use crate::processing::{FragmentationLevel, SubnetAnalysis, SubnetOutcome};
use colored::{ColoredString, Colorize};
use std::fmt::Write;

/// Format a value as a quoted, right-aligned field.
///
/// Embedded double quotes are doubled so the field stays valid CSV.
///
/// # Arguments
/// * `value` - The value to format
/// * `width` - The minimum width of the field
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let value_str = value.to_string().replace('"', "\"\"");
    let quoted = format!("\"{value_str}\"");

    if quoted.len() >= width {
        quoted
    } else {
        format!("{quoted:>width$}")
    }
}

fn colored_level(level: FragmentationLevel) -> ColoredString {
    let text = level.to_string().to_uppercase();
    match level {
        FragmentationLevel::Low => text.green(),
        FragmentationLevel::Moderate => text.yellow(),
        FragmentationLevel::High => text.red().bold(),
    }
}

/// Multi-line summary of one analysed subnet.
pub fn format_summary(analysis: &SubnetAnalysis) -> String {
    let s = &analysis.summary;
    let d = &s.fragmentation_details;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{id} {name} [{cidr}] {az}",
        id = analysis.subnet_id.bold(),
        name = analysis.name,
        cidr = analysis.cidr,
        az = analysis.availability_zone
    );
    let _ = writeln!(
        out,
        "  total {} used {} (primary {} secondary {} prefix {}) reserved {} cidr-reserved {} available {}",
        s.total_ips,
        s.used_ips,
        s.primary_ips,
        s.secondary_ips,
        s.prefix_delegation_ips,
        s.reserved_ips,
        s.cidr_reservation_ips,
        s.available_ips
    );
    if let Some(aws_count) = analysis.aws_available_ip_count {
        if aws_count as usize != s.available_ips {
            let _ = writeln!(
                out,
                "  {} AWS reports {aws_count} available",
                "NOTE".on_yellow()
            );
        }
    }
    let _ = writeln!(
        out,
        "  utilization {:.2}%  fragmentation {:.2} {}",
        s.utilization,
        s.fragmentation_score,
        colored_level(s.level())
    );
    let _ = writeln!(
        out,
        "  gaps {} largest {} avg {:.2} usable /28 prefixes {}",
        d.num_gaps, d.largest_gap, d.avg_gap_size, d.usable_prefixes
    );
    for gap in &d.largest_gaps {
        let _ = writeln!(out, "    {} - {} ({})", gap.start, gap.end, gap.size);
    }
    for reservation in &analysis.cidr_reservations {
        let _ = writeln!(
            out,
            "  reservation {} {} {} {}",
            reservation.reservation_id,
            reservation.cidr,
            reservation.reservation_type,
            reservation.description
        );
    }
    for warning in &analysis.warnings {
        let _ = writeln!(out, "  {} {warning}", "WARN".on_red());
    }
    out
}

/// Print every subnet outcome of a VPC, failures included.
pub fn print_outcomes(outcomes: &[SubnetOutcome]) {
    for outcome in outcomes {
        match &outcome.result {
            Ok(analysis) => println!("{}", format_summary(analysis)),
            Err(e) => println!(
                "{} {} [{}] {}\n",
                outcome.subnet_id.bold(),
                outcome.name,
                outcome.cidr,
                format!("failed: {e}").red()
            ),
        }
    }
}

/// One line per VPC.
pub fn format_vpcs(region: &str, vpcs: &[Vpc]) -> String {
    let mut out = format!("VPCs in {region}: {}\n", vpcs.len());
    for vpc in vpcs {
        let _ = writeln!(out, "  {vpc}");
    }
    out
}
