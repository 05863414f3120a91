//! AWS CLI command execution.
//!
//! Commands are given as one string and split on whitespace, keeping quoted
//! JMESPath queries in one piece.

use colored::Colorize;
use regex::Regex;
use std::error::Error;
use std::process::{Command, Output};
use std::sync::OnceLock;

/// Upper bound on accepted stdout, large VPCs list many interfaces.
const MAX_OUTPUT_BYTES: usize = 50_000_000;

static ARG_REGEX: OnceLock<Regex> = OnceLock::new();

fn arg_regex() -> &'static Regex {
    ARG_REGEX.get_or_init(|| Regex::new(r#"'([^']*)'|"([^"]*)"|(\S+)"#).expect("Invalid Regex"))
}

/// Split a command line into arguments, unquoting `'..'` and `".."` parts.
fn split_args(cmd: &str) -> Vec<&str> {
    arg_regex()
        .captures_iter(cmd)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)).or_else(|| c.get(3)))
        .map(|m| m.as_str())
        .collect()
}

/// Run a command and return its stdout.
///
/// # Returns
/// * `Ok(String)` - stdout of a successful run
/// * `Err` - the command could not start, exited non-zero, or printed too much
pub fn run(cmd: &str) -> Result<String, Box<dyn Error>> {
    log::debug!("run({cmd})", cmd = cmd.on_blue());

    let args = split_args(cmd);
    log::trace!("split args={:?}", args);
    let Some((program, rest)) = args.split_first() else {
        return Err("Empty command".into());
    };

    let output = Command::new(program).args(rest).output().map_err(|e| {
        log::error!("Failed to start {program}: {e}");
        format!("Failed to execute {program}: {e}")
    })?;
    check_output(cmd, output)
}

fn check_output(cmd: &str, output: Output) -> Result<String, Box<dyn Error>> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::trace!(
            "code={code:?}\n┎######\nstderr=\n{stderr}\n┖######",
            code = output.status.code(),
            stderr = stderr.red()
        );
        log::warn!("{failed} to run {cmd}", failed = "failed".on_red(), cmd = cmd.on_blue());
        return Err(format!("ERROR running {cmd}: {}", stderr.trim()).into());
    }

    log::debug!("Success {cmd}, {} bytes", output.stdout.len());
    if output.stdout.len() > MAX_OUTPUT_BYTES {
        return Err(format!("Response too large: {} bytes for {cmd}", output.stdout.len()).into());
    }
    String::from_utf8(output.stdout).map_err(|e| format!("Invalid UTF-8 from {cmd}: {e}").into())
}
