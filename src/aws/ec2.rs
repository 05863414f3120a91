//! EC2 inventory queries through the `aws` CLI.
//!
//! AWS responses are parsed into the raw `Aws*` shapes below and converted
//! into validated domain records here, at the system boundary.

use super::cli;
use crate::config;
use crate::error::AnalysisError;
use crate::models::{CidrReservation, NetworkInterface, Region, Subnet, Vpc, VpcSnapshot};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::error::Error;

/// Inventory collaborator consumed by one analysis run.
pub trait Inventory {
    fn list_subnets(&self, vpc_id: &str) -> Result<Vec<Subnet>, Box<dyn Error>>;
    fn list_network_interfaces(&self, subnet_id: &str) -> Result<Vec<NetworkInterface>, Box<dyn Error>>;
    fn list_cidr_reservations(&self, subnet_id: &str) -> Result<Vec<CidrReservation>, Box<dyn Error>>;
}

/// [`Inventory`] backed by the `aws ec2` CLI in one region.
#[derive(Debug, Clone)]
pub struct AwsCli {
    pub region: String,
}

impl AwsCli {
    pub fn new(region: &str) -> AwsCli {
        AwsCli {
            region: region.to_string(),
        }
    }

    fn ec2(&self, args: &str) -> Result<String, Box<dyn Error>> {
        let output = cli::run(&format!(
            "aws ec2 {args} --region {region} --output json",
            region = self.region
        ))?;
        std::thread::sleep(std::time::Duration::from_millis(config::SLEEP_MSEC));
        Ok(output)
    }

    pub fn list_regions(&self) -> Result<Vec<Region>, Box<dyn Error>> {
        parse_regions(&self.ec2("describe-regions")?)
    }

    pub fn list_vpcs(&self) -> Result<Vec<Vpc>, Box<dyn Error>> {
        parse_vpcs(&self.ec2("describe-vpcs")?)
    }
}

impl Inventory for AwsCli {
    fn list_subnets(&self, vpc_id: &str) -> Result<Vec<Subnet>, Box<dyn Error>> {
        parse_subnets(&self.ec2(&format!(
            "describe-subnets --filters Name=vpc-id,Values={vpc_id}"
        ))?)
    }

    fn list_network_interfaces(&self, subnet_id: &str) -> Result<Vec<NetworkInterface>, Box<dyn Error>> {
        parse_network_interfaces(&self.ec2(&format!(
            "describe-network-interfaces --filters Name=subnet-id,Values={subnet_id}"
        ))?)
    }

    fn list_cidr_reservations(&self, subnet_id: &str) -> Result<Vec<CidrReservation>, Box<dyn Error>> {
        parse_cidr_reservations(&self.ec2(&format!(
            "get-subnet-cidr-reservations --subnet-id {subnet_id}"
        ))?)
    }
}

/// Fetch subnets, interfaces and reservations of a VPC into one snapshot.
///
/// A malformed interface or reservation record is kept as the record error
/// of its subnet, other subnets are fetched as usual. Transport and parse
/// failures still fail the whole fetch.
pub fn fetch_vpc_snapshot(
    inventory: &impl Inventory,
    region: &str,
    vpc_id: &str,
) -> Result<VpcSnapshot, Box<dyn Error>> {
    let subnets = inventory.list_subnets(vpc_id)?;
    log::info!("Got {} IPv4 subnets for {vpc_id} in {region}", subnets.len());

    let mut snapshot = VpcSnapshot {
        region: region.to_string(),
        vpc_id: vpc_id.to_string(),
        fetched_at: chrono::Utc::now().to_rfc3339(),
        ..Default::default()
    };
    for subnet in &subnets {
        let fetched = match record_level(inventory.list_network_interfaces(&subnet.id))? {
            Ok(interfaces) => record_level(inventory.list_cidr_reservations(&subnet.id))?
                .map(|reservations| (interfaces, reservations)),
            Err(e) => Err(e),
        };
        match fetched {
            Ok((interfaces, reservations)) => {
                log::info!(
                    "subnet {} {}: {} interfaces, {} cidr reservations",
                    subnet.id,
                    subnet.cidr,
                    interfaces.len(),
                    reservations.len()
                );
                snapshot.interfaces.insert(subnet.id.clone(), interfaces);
                snapshot.reservations.insert(subnet.id.clone(), reservations);
            }
            Err(e) => {
                log::warn!("subnet {} {}: {e}", subnet.id, subnet.cidr);
                snapshot.record_errors.insert(subnet.id.clone(), e);
            }
        }
    }
    snapshot.subnets = subnets;
    Ok(snapshot)
}

/// Split a listing result into a record error (inner) and any other failure (outer).
fn record_level<T>(
    listed: Result<Vec<T>, Box<dyn Error>>,
) -> Result<Result<Vec<T>, AnalysisError>, Box<dyn Error>> {
    match listed {
        Ok(records) => Ok(Ok(records)),
        Err(e) => match e.downcast::<AnalysisError>() {
            Ok(record_error) => Ok(Err(*record_error)),
            Err(other) => Err(other),
        },
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AwsTag {
    key: String,
    value: String,
}

fn name_tag(tags: &[AwsTag], default: &str) -> String {
    tags.iter()
        .find(|t| t.key == "Name")
        .map(|t| t.value.clone())
        .unwrap_or_else(|| default.to_string())
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AwsRegions {
    regions: Vec<AwsRegion>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AwsRegion {
    region_name: String,
    endpoint: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AwsVpcs {
    vpcs: Vec<AwsVpc>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AwsVpc {
    vpc_id: String,
    cidr_block: String,
    state: String,
    #[serde(default)]
    tags: Vec<AwsTag>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AwsSubnets {
    subnets: Vec<AwsSubnet>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AwsSubnet {
    subnet_id: String,
    vpc_id: String,
    cidr_block: Option<String>,
    availability_zone: String,
    available_ip_address_count: Option<u32>,
    #[serde(default)]
    ipv6_native: bool,
    #[serde(default)]
    tags: Vec<AwsTag>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AwsNetworkInterfaces {
    network_interfaces: Vec<AwsNetworkInterface>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AwsNetworkInterface {
    network_interface_id: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    status: String,
    private_ip_address: Option<String>,
    #[serde(default)]
    private_ip_addresses: Vec<AwsPrivateIp>,
    #[serde(default)]
    ipv4_prefixes: Vec<AwsIpv4Prefix>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AwsPrivateIp {
    private_ip_address: String,
    #[serde(default)]
    primary: bool,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AwsIpv4Prefix {
    ipv4_prefix: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AwsCidrReservations {
    #[serde(default)]
    subnet_ipv4_cidr_reservations: Vec<AwsCidrReservation>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AwsCidrReservation {
    subnet_cidr_reservation_id: String,
    cidr: String,
    reservation_type: String,
    #[serde(default)]
    description: String,
}

fn parse_json<T: DeserializeOwned>(output: &str, what: &str) -> Result<T, Box<dyn Error>> {
    let mut deserializer = serde_json::Deserializer::from_str(output);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        log::error!("OUTPUT START:\n\n{}\n\nOUTPUT END\n", output);
        format!("Error parsing {what} JSON: path={} error={}", e.path(), e).into()
    })
}

fn parse_regions(output: &str) -> Result<Vec<Region>, Box<dyn Error>> {
    let parsed: AwsRegions = parse_json(output, "describe-regions")?;
    let mut regions: Vec<Region> = parsed
        .regions
        .into_iter()
        .map(|r| Region {
            id: r.region_name,
            endpoint: r.endpoint,
        })
        .collect();
    regions.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(regions)
}

fn parse_vpcs(output: &str) -> Result<Vec<Vpc>, Box<dyn Error>> {
    let parsed: AwsVpcs = parse_json(output, "describe-vpcs")?;
    Ok(parsed
        .vpcs
        .into_iter()
        .map(|v| Vpc {
            name: name_tag(&v.tags, &v.vpc_id),
            id: v.vpc_id,
            cidr: v.cidr_block,
            state: v.state,
        })
        .collect())
}

fn parse_subnets(output: &str) -> Result<Vec<Subnet>, Box<dyn Error>> {
    let parsed: AwsSubnets = parse_json(output, "describe-subnets")?;
    let mut subnets = Vec::new();
    for s in parsed.subnets {
        let Some(cidr) = s.cidr_block.as_deref().filter(|_| !s.ipv6_native) else {
            log::info!("Skipping IPv6-only subnet {}", s.subnet_id);
            continue;
        };
        let mut subnet = Subnet::new(
            &s.subnet_id,
            &name_tag(&s.tags, &s.subnet_id),
            cidr,
            &s.availability_zone,
        )?;
        subnet.vpc_id = s.vpc_id;
        subnet.available_ip_address_count = s.available_ip_address_count;
        subnets.push(subnet);
    }
    Ok(subnets)
}

fn parse_network_interfaces(output: &str) -> Result<Vec<NetworkInterface>, Box<dyn Error>> {
    let parsed: AwsNetworkInterfaces = parse_json(output, "describe-network-interfaces")?;
    let interfaces = parsed
        .network_interfaces
        .into_iter()
        .map(to_network_interface)
        .collect::<Result<Vec<_>, AnalysisError>>()?;
    Ok(interfaces)
}

fn to_network_interface(eni: AwsNetworkInterface) -> Result<NetworkInterface, AnalysisError> {
    let primary = eni
        .private_ip_addresses
        .iter()
        .find(|ip| ip.primary)
        .map(|ip| ip.private_ip_address.as_str())
        .or(eni.private_ip_address.as_deref())
        .ok_or_else(|| {
            AnalysisError::invalid_record(
                "network interface",
                &eni.network_interface_id,
                "no primary private address",
            )
        })?;
    let secondary: Vec<&str> = eni
        .private_ip_addresses
        .iter()
        .filter(|ip| !ip.primary && ip.private_ip_address != primary)
        .map(|ip| ip.private_ip_address.as_str())
        .collect();
    let prefixes: Vec<&str> = eni.ipv4_prefixes.iter().map(|p| p.ipv4_prefix.as_str()).collect();
    for prefix in &prefixes {
        log::info!("Found IPv4 prefix: {prefix} on ENI {}", eni.network_interface_id);
    }

    NetworkInterface::new(
        &eni.network_interface_id,
        &eni.description,
        &eni.status,
        primary,
        &secondary,
        &prefixes,
    )
}

fn parse_cidr_reservations(output: &str) -> Result<Vec<CidrReservation>, Box<dyn Error>> {
    let parsed: AwsCidrReservations = parse_json(output, "get-subnet-cidr-reservations")?;
    let mut reservations = Vec::new();
    for r in parsed.subnet_ipv4_cidr_reservations {
        log::info!(
            "Found CIDR reservation: {} ({}) - {}",
            r.cidr,
            r.reservation_type,
            r.description
        );
        reservations.push(CidrReservation::new(
            &r.subnet_cidr_reservation_id,
            &r.cidr,
            &r.reservation_type,
            &r.description,
        )?);
    }
    Ok(reservations)
}
