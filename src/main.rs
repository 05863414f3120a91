use clap::{Parser, ValueEnum};
use std::error::Error;
use std::sync::Arc;
use vpc_ip_fragmentation::aws::AwsCli;
use vpc_ip_fragmentation::processing::select_subnet;
use vpc_ip_fragmentation::{analyze_vpc, config, load_vpc_snapshot, output};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Summary,
    Csv,
    Json,
}

/// Per-address allocation and fragmentation report of AWS VPC subnets.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// AWS region
    #[arg(long, env = "AWS_DEFAULT_REGION", default_value = config::DEFAULT_REGION)]
    region: String,

    /// VPC to analyse, lists the VPCs of the region when absent
    #[arg(long)]
    vpc_id: Option<String>,

    /// List the regions enabled for the account and exit
    #[arg(long)]
    list_regions: bool,

    /// Analyse only this subnet of the VPC
    #[arg(long)]
    subnet_id: Option<String>,

    /// Read the VPC snapshot from this cache file
    #[arg(long)]
    cache_file: Option<String>,

    /// Ignore any cached snapshot and query AWS again
    #[arg(long)]
    refresh: bool,

    #[arg(long, value_enum, default_value_t = Format::Summary)]
    format: Format,

    /// Include every address in csv and json output
    #[arg(long)]
    ips: bool,

    /// Largest subnet analysed, in addresses
    #[arg(long, default_value_t = config::MAX_SUBNET_ADDRESSES)]
    max_addresses: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    if let Err(e) = config::init_logging("log4rs.yml") {
        eprintln!("Error initializing logging: {e}");
    }
    let args = Args::parse();
    log::info!("#Start main() {:?}", args);

    if args.list_regions {
        for region in AwsCli::new(&args.region).list_regions()? {
            println!("{:<16} {}", region.id, region.endpoint);
        }
        return Ok(());
    }

    let Some(vpc_id) = args.vpc_id.as_deref() else {
        let vpcs = AwsCli::new(&args.region).list_vpcs()?;
        print!("{}", output::format_vpcs(&args.region, &vpcs));
        return Ok(());
    };

    let snapshot = load_vpc_snapshot(
        &args.region,
        vpc_id,
        args.cache_file.as_deref(),
        args.refresh,
    )?;
    let snapshot = select_subnet(snapshot, args.subnet_id.as_deref());
    let outcomes = analyze_vpc(Arc::new(snapshot), args.max_addresses).await;

    match args.format {
        Format::Summary => output::print_outcomes(&outcomes),
        Format::Csv if args.ips => output::print_ip_csv(&outcomes),
        Format::Csv => output::print_subnet_csv(&outcomes),
        Format::Json => println!("{}", output::outcomes_json(&outcomes, args.ips)?),
    }

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    if failed > 0 {
        return Err(format!("{failed} of {} subnets failed analysis", outcomes.len()).into());
    }
    Ok(())
}
