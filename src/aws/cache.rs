//! Cache management for VPC snapshots.
//!
//! Avoids repeated AWS CLI calls for the same VPC on the same day.

use crate::config;
use crate::models::VpcSnapshot;
use std::error::Error;
use std::path::Path;

/// Default cache file name for a VPC, dated in [`config::cache_timezone`].
pub fn default_cache_file(region: &str, vpc_id: &str) -> String {
    let now = chrono::Utc::now().with_timezone(&config::cache_timezone());
    format!("vpc_cache_{region}_{vpc_id}_{}.json", now.format("%Y-%m-%d"))
}

/// Read a VPC snapshot from cache, or fetch it and write the cache.
///
/// # Arguments
/// * `cache_file` - Optional path to a specific cache file, which must exist unless `refresh` is set.
/// * `refresh` - Ignore an existing cache file and fetch again.
/// * `fetch` - Produces the snapshot when the cache is not used.
pub fn read_vpc_cache<F>(
    cache_file: Option<&str>,
    region: &str,
    vpc_id: &str,
    refresh: bool,
    fetch: F,
) -> Result<VpcSnapshot, Box<dyn Error>>
where
    F: FnOnce() -> Result<VpcSnapshot, Box<dyn Error>>,
{
    let cache_file = match cache_file {
        Some(file) => {
            if !refresh && !Path::new(file).exists() {
                return Err(format!("Cache file does not exist: {file}").into());
            }
            log::info!("Using provided cache file: {file}");
            file.to_string()
        }
        None => default_cache_file(region, vpc_id),
    };

    let cached = if refresh {
        log::info!("Refresh requested, ignoring cache file: {cache_file}");
        None
    } else {
        std::fs::read_to_string(&cache_file).ok()
    };

    let snapshot = match cached {
        Some(json) => {
            log::info!("Reading from cache file: {cache_file}");
            let mut deserializer = serde_json::Deserializer::from_str(&json);
            let snapshot: VpcSnapshot = serde_path_to_error::deserialize(&mut deserializer)
                .map_err(|e| {
                    format!("Error parsing cache JSON {cache_file}: path={} error={e}", e.path())
                })?;
            if snapshot.vpc_id != vpc_id && !vpc_id.is_empty() {
                log::warn!(
                    "Cache file {cache_file} holds {} not {vpc_id}",
                    snapshot.vpc_id
                );
            }
            snapshot
        }
        None => {
            log::warn!("Cache file not used: {cache_file}");
            let snapshot = fetch()?;
            log::info!("Fetched snapshot of {} from AWS", snapshot.vpc_id);

            let json = serde_json::to_string_pretty(&snapshot)
                .map_err(|e| format!("Error serializing JSON: {e}"))?;
            log::warn!("Writing data to cache file: {cache_file}");
            std::fs::write(&cache_file, json)
                .map_err(|e| format!("Error writing cache file {cache_file}: {e}"))?;
            snapshot
        }
    };

    Ok(snapshot)
}
