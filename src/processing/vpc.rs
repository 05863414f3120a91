//! VPC-wide analysis.
//!
//! Subnets share nothing during analysis, so each one runs on its own
//! blocking task.

use super::analyze::{analyze_subnet_with_limit, SubnetAnalysis};
use crate::error::AnalysisError;
use crate::models::VpcSnapshot;
use futures::future::join_all;
use std::sync::Arc;
use tokio::task::JoinError;

/// Analysis result of one subnet of a VPC.
#[derive(Debug)]
pub struct SubnetOutcome {
    pub subnet_id: String,
    pub name: String,
    pub cidr: String,
    pub result: Result<SubnetAnalysis, AnalysisError>,
}

/// Analyse every subnet of the snapshot concurrently, results in subnet order.
///
/// A subnet with a record error from fetching fails with that error and is
/// not analysed. Every subnet yields exactly one outcome.
pub async fn analyze_vpc(snapshot: Arc<VpcSnapshot>, max_addresses: u64) -> Vec<SubnetOutcome> {
    log::info!(
        "#Start analyze_vpc() {} with {} subnets",
        snapshot.vpc_id,
        snapshot.subnets.len()
    );

    let tasks = (0..snapshot.subnets.len()).map(|i| {
        let snapshot = Arc::clone(&snapshot);
        tokio::task::spawn_blocking(move || {
            let subnet = &snapshot.subnets[i];
            let result = match snapshot.record_error_for(&subnet.id) {
                Some(e) => Err(e.clone()),
                None => analyze_subnet_with_limit(
                    subnet,
                    snapshot.interfaces_for(&subnet.id),
                    snapshot.reservations_for(&subnet.id),
                    max_addresses,
                ),
            };
            if let Err(e) = &result {
                log::error!("Analysis of subnet {} failed: {e}", subnet.id);
            }
            result
        })
    });

    join_all(tasks)
        .await
        .into_iter()
        .zip(snapshot.subnets.iter())
        .map(|(joined, subnet)| SubnetOutcome {
            subnet_id: subnet.id.clone(),
            name: subnet.name.clone(),
            cidr: subnet.cidr.to_string(),
            result: joined.unwrap_or_else(|e| Err(interrupted(&subnet.id, e))),
        })
        .collect()
}

fn interrupted(subnet_id: &str, e: JoinError) -> AnalysisError {
    log::error!("Analysis task of subnet {subnet_id} failed: {e}");
    AnalysisError::Interrupted {
        subnet: subnet_id.to_string(),
        reason: e.to_string(),
    }
}

/// Keep only the subnet with `subnet_id`, when given.
pub fn select_subnet(mut snapshot: VpcSnapshot, subnet_id: Option<&str>) -> VpcSnapshot {
    if let Some(id) = subnet_id {
        snapshot.subnets.retain(|s| s.id == id);
        if snapshot.subnets.is_empty() {
            log::warn!("Subnet {id} not found in VPC {}", snapshot.vpc_id);
        }
    }
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NetworkInterface, Subnet};

    fn snapshot() -> VpcSnapshot {
        let mut snapshot = VpcSnapshot::default();
        snapshot.vpc_id = "vpc-1".to_string();
        snapshot.subnets = vec![
            Subnet::new("subnet-a", "a", "10.0.1.0/28", "us-east-1a").unwrap(),
            Subnet::new("subnet-big", "big", "10.2.0.0/15", "us-east-1b").unwrap(),
            Subnet::new("subnet-c", "c", "10.0.2.0/24", "us-east-1c").unwrap(),
        ];
        snapshot.interfaces.insert(
            "subnet-a".to_string(),
            vec![NetworkInterface::new("eni-1", "", "in-use", "10.0.1.4", &["10.0.1.5"], &[]).unwrap()],
        );
        snapshot
    }

    #[tokio::test]
    async fn test_analyze_vpc_keeps_order_and_errors() {
        let outcomes = analyze_vpc(Arc::new(snapshot()), 65_536).await;
        let ids: Vec<&str> = outcomes.iter().map(|o| o.subnet_id.as_str()).collect();
        assert_eq!(ids, vec!["subnet-a", "subnet-big", "subnet-c"]);

        let a = outcomes[0].result.as_ref().expect("subnet-a should analyse");
        assert_eq!(a.summary.used_ips, 2);
        assert!(matches!(
            outcomes[1].result,
            Err(AnalysisError::SubnetTooLarge { .. })
        ));
        assert_eq!(outcomes[2].result.as_ref().unwrap().summary.total_ips, 256);
    }

    #[tokio::test]
    async fn test_record_error_fails_only_its_subnet() {
        let mut data = snapshot();
        let record_error = AnalysisError::InvalidRecord {
            record: "network interface".to_string(),
            id: "eni-x".to_string(),
            reason: "no primary private address".to_string(),
        };
        data.record_errors.insert("subnet-c".to_string(), record_error.clone());

        let outcomes = analyze_vpc(Arc::new(data), 65_536).await;
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].result.as_ref().unwrap().summary.used_ips, 2);
        assert_eq!(outcomes[2].subnet_id, "subnet-c");
        assert_eq!(outcomes[2].result.as_ref().unwrap_err(), &record_error);
    }

    #[tokio::test]
    async fn test_panicked_task_becomes_interrupted_outcome() {
        let e = tokio::task::spawn_blocking(|| panic!("boom")).await.unwrap_err();
        let err = interrupted("subnet-a", e);
        assert!(matches!(
            &err,
            AnalysisError::Interrupted { subnet, .. } if subnet == "subnet-a"
        ));
        assert!(err.to_string().starts_with("Analysis of subnet subnet-a did not complete"));
    }

    #[test]
    fn test_select_subnet() {
        let selected = select_subnet(snapshot(), Some("subnet-c"));
        assert_eq!(selected.subnets.len(), 1);
        assert_eq!(select_subnet(snapshot(), None).subnets.len(), 3);
    }
}
