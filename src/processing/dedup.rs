//! Inventory normalisation before analysis.
//!
//! Collaborators may return records in any order. Sorting and de-duplicating
//! here makes first-listed-wins tie-breaks reproducible.

use crate::models::VpcSnapshot;
use std::collections::HashSet;
use std::error::Error;

/// Sort subnets by CIDR, de-duplicate interfaces by id and sort reservations by CIDR.
///
/// # Returns
/// * `Ok(VpcSnapshot)` - Normalised snapshot
/// * `Err` - If two subnets share an id
pub fn normalize_snapshot(mut snapshot: VpcSnapshot) -> Result<VpcSnapshot, Box<dyn Error>> {
    snapshot.subnets.sort_by_key(|s| (s.cidr, s.id.clone()));
    check_for_duplicate_subnets(&snapshot)?;

    for interfaces in snapshot.interfaces.values_mut() {
        let before = interfaces.len();
        interfaces.sort_by(|a, b| a.interface_id.cmp(&b.interface_id));
        interfaces.dedup_by(|a, b| a.interface_id == b.interface_id);
        if interfaces.len() != before {
            log::warn!(
                "Dropped {} duplicate network interface record(s)",
                before - interfaces.len()
            );
        }
    }

    for reservations in snapshot.reservations.values_mut() {
        reservations.sort_by_key(|r| (r.cidr, r.reservation_id.clone()));
        reservations.dedup_by(|a, b| a.reservation_id == b.reservation_id);
    }

    Ok(snapshot)
}

/// Return error if two subnets share an id.
pub fn check_for_duplicate_subnets(snapshot: &VpcSnapshot) -> Result<(), Box<dyn Error>> {
    let mut seen = HashSet::new();

    for sub in snapshot.subnets.iter() {
        if !seen.insert(sub.id.as_str()) {
            return Err(format!("Duplicate subnet found: {} {}", sub.id, sub.cidr).into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CidrReservation, NetworkInterface, Subnet};
    use crate::processing::analyze_subnet;

    fn snapshot() -> VpcSnapshot {
        let mut snapshot = VpcSnapshot::default();
        snapshot.subnets = vec![
            Subnet::new("subnet-b", "b", "10.0.2.0/24", "us-east-1b").unwrap(),
            Subnet::new("subnet-a", "a", "10.0.1.0/24", "us-east-1a").unwrap(),
        ];
        snapshot.interfaces.insert(
            "subnet-a".to_string(),
            vec![
                NetworkInterface::new("eni-2", "", "in-use", "10.0.1.9", &[], &[]).unwrap(),
                NetworkInterface::new("eni-1", "", "in-use", "10.0.1.8", &[], &[]).unwrap(),
                NetworkInterface::new("eni-2", "", "in-use", "10.0.1.9", &[], &[]).unwrap(),
            ],
        );
        snapshot.reservations.insert(
            "subnet-a".to_string(),
            vec![
                CidrReservation::new("scr-2", "10.0.1.64/26", "prefix", "").unwrap(),
                CidrReservation::new("scr-1", "10.0.1.32/27", "explicit", "").unwrap(),
            ],
        );
        snapshot
    }

    #[test]
    fn test_normalize_snapshot() {
        let result = normalize_snapshot(snapshot()).expect("normalize failed");
        assert_eq!(result.subnets[0].id, "subnet-a");
        let ids: Vec<&str> = result
            .interfaces_for("subnet-a")
            .iter()
            .map(|e| e.interface_id.as_str())
            .collect();
        assert_eq!(ids, vec!["eni-1", "eni-2"]);
        assert_eq!(result.reservations_for("subnet-a")[0].reservation_id, "scr-1");
    }

    #[test]
    fn test_overlapping_reservations_analyse_the_same_in_any_order() {
        let subnet = Subnet::new("subnet-r", "r", "10.0.1.0/28", "us-east-1a").unwrap();
        let scr_a = CidrReservation::new("scr-a", "10.0.1.8/30", "prefix", "").unwrap();
        let scr_b = CidrReservation::new("scr-b", "10.0.1.8/29", "explicit", "").unwrap();

        let analyse = |reservations: Vec<CidrReservation>| {
            let mut data = VpcSnapshot::default();
            data.subnets = vec![subnet.clone()];
            data.reservations.insert(subnet.id.clone(), reservations);
            let data = normalize_snapshot(data).unwrap();
            analyze_subnet(&subnet, &[], data.reservations_for(&subnet.id)).unwrap()
        };
        let forward = analyse(vec![scr_a.clone(), scr_b.clone()]);
        let backward = analyse(vec![scr_b, scr_a]);

        assert_eq!(forward, backward);
        assert_eq!(forward.summary.cidr_reservation_ips, 7);
        assert_eq!(forward.warnings.len(), 1, "{:?}", forward.warnings);
    }

    #[test]
    fn test_duplicate_subnet_is_error() {
        let mut data = snapshot();
        data.subnets.push(Subnet::new("subnet-a", "a", "10.0.1.0/24", "us-east-1a").unwrap());
        assert!(normalize_snapshot(data).is_err());
    }
}
