//! CSV output of subnet summaries and per-address classification.

use super::terminal::format_field;
use crate::processing::{ClassifiedAddress, SubnetAnalysis, SubnetOutcome};

pub const SUBNET_CSV_HEADER: &str = r#"     "subnet_id",            "cidr",       "az",  "total",   "used", "reserved", "cidr_res",  "avail",  "util%", "score",    "level", "gaps", "largest", "prefixes",      "name", "error""#;

pub const IP_CSV_HEADER: &str = r#"          "ip",       "status",        "type",                      "source", "description", "overlay""#;

/// One CSV row per subnet, failed subnets keep their error message.
pub fn subnet_csv_row(outcome: &SubnetOutcome) -> String {
    match &outcome.result {
        Ok(analysis) => {
            let s = &analysis.summary;
            let d = &s.fragmentation_details;
            format!(
                "{id},{cidr},{az},{total},{used},{reserved},{cidr_res},{avail},{util},{score},{level},{gaps},{largest},{prefixes},{name},{error}",
                id = format_field(&analysis.subnet_id, 28),
                cidr = format_field(&analysis.cidr, 18),
                az = format_field(&analysis.availability_zone, 12),
                total = format_field(s.total_ips, 8),
                used = format_field(s.used_ips, 8),
                reserved = format_field(s.reserved_ips, 11),
                cidr_res = format_field(s.cidr_reservation_ips, 11),
                avail = format_field(s.available_ips, 8),
                util = format_field(format!("{:.2}", s.utilization), 8),
                score = format_field(format!("{:.2}", s.fragmentation_score), 8),
                level = format_field(s.level(), 10),
                gaps = format_field(d.num_gaps, 7),
                largest = format_field(d.largest_gap, 10),
                prefixes = format_field(d.usable_prefixes, 11),
                name = format_field(&analysis.name, 12),
                error = format_field("", 2),
            )
        }
        Err(e) => {
            let empty = |width| format_field("", width);
            format!(
                "{id},{cidr},{az},{total},{used},{reserved},{cidr_res},{avail},{util},{score},{level},{gaps},{largest},{prefixes},{name},{error}",
                id = format_field(&outcome.subnet_id, 28),
                cidr = format_field(&outcome.cidr, 18),
                az = empty(12),
                total = empty(8),
                used = empty(8),
                reserved = empty(11),
                cidr_res = empty(11),
                avail = empty(8),
                util = empty(8),
                score = empty(8),
                level = empty(10),
                gaps = empty(7),
                largest = empty(10),
                prefixes = empty(11),
                name = format_field(&outcome.name, 12),
                error = format_field(e, 2),
            )
        }
    }
}

/// One CSV row per address of the subnet.
pub fn ip_csv_rows(analysis: &SubnetAnalysis) -> Vec<String> {
    analysis.ips.iter().map(ip_csv_row).collect()
}

fn ip_csv_row(address: &ClassifiedAddress) -> String {
    let (kind, source, description, overlay) = match &address.details {
        Some(detail) => {
            let overlay = detail
                .cidr_reservation
                .iter()
                .chain(detail.aws_reserved.iter())
                .map(|o| o.label())
                .collect::<Vec<_>>()
                .join("; ");
            (
                format!("{:?}", detail.kind()),
                detail.source.label(),
                detail.source.description().to_string(),
                overlay,
            )
        }
        None => Default::default(),
    };
    format!(
        "{ip},{status},{kind},{source},{description},{overlay}",
        ip = format_field(address.ip, 16),
        status = format_field(address.status, 15),
        kind = format_field(kind, 16),
        source = format_field(source, 30),
        description = format_field(description, 14),
        overlay = format_field(overlay, 10),
    )
}

/// Print the subnet summary CSV to stdout.
pub fn print_subnet_csv(outcomes: &[SubnetOutcome]) {
    println!("{SUBNET_CSV_HEADER}");
    for outcome in outcomes {
        println!("{}", subnet_csv_row(outcome));
    }
}

/// Print the per-address CSV of every analysed subnet to stdout.
pub fn print_ip_csv(outcomes: &[SubnetOutcome]) {
    println!("{IP_CSV_HEADER}");
    for outcome in outcomes {
        match &outcome.result {
            Ok(analysis) => ip_csv_rows(analysis).iter().for_each(|row| println!("{row}")),
            Err(e) => log::warn!("No address rows for {}: {e}", outcome.subnet_id),
        }
    }
}
