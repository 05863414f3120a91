//! Constants and environment settings.

use chrono_tz::Tz;
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use std::error::Error;

/// Pause between AWS CLI calls, in milliseconds.
pub const SLEEP_MSEC: u64 = 100;

/// Largest subnet analysed per address (/16).
pub const MAX_SUBNET_ADDRESSES: u64 = 65_536;

/// Addresses in a delegated /28 prefix.
pub const PREFIX_BLOCK_SIZE: u32 = 16;

/// Number of largest free runs kept in a report.
pub const LARGEST_GAPS_REPORTED: usize = 10;

/// Region used when neither `--region` nor `AWS_DEFAULT_REGION` is set.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Time zone naming the day of a cache file, from `CACHE_TZ` (default UTC).
pub fn cache_timezone() -> Tz {
    match std::env::var("CACHE_TZ") {
        Ok(name) => name.parse::<Tz>().unwrap_or_else(|e| {
            log::warn!("Ignoring CACHE_TZ={name}: {e}");
            Tz::UTC
        }),
        Err(_) => Tz::UTC,
    }
}

/// Start logging from `file`, or warnings to stderr when it cannot be loaded.
///
/// # Returns
/// * `Err` - if no logger could be installed, e.g. one is already set
pub fn init_logging(file: &str) -> Result<(), Box<dyn Error>> {
    let Err(e) = log4rs::init_file(file, Default::default()) else {
        return Ok(());
    };
    let stderr = ConsoleAppender::builder().target(Target::Stderr).build();
    let fallback = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Warn))?;
    log4rs::init_config(fallback)
        .map_err(|init| format!("{file} not loaded ({e}) and stderr fallback failed: {init}"))?;
    log::warn!("{file} not loaded ({e}), logging warnings to stderr");
    Ok(())
}
