//! Response normalizer
//!
//! etcdctl changed its `endpoint health` output across releases. Recent
//! versions honour `-w json` and print an array of records; older ones ignore
//! it and print one line per endpoint:
//!
//! ```text
//! http://10.0.0.1:2380 is healthy: successfully committed proposal: took = 2.1ms
//! http://10.0.0.2:2380 is unhealthy: failed to commit proposal: context deadline exceeded
//! ```
//!
//! Both are reduced to a list of [`HealthObservation`].

use crate::etcdctl::non_blank_lines;
use crate::probe::ProbeResult;
use etcdcheck_common::{Error, HealthObservation, Result};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::{debug, error, info};

/// Latency recorded for legacy unhealthy lines, which carry none
pub const UNKNOWN_LATENCY: &str = "n/a";

static HEALTHY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<endpoint>\S+) is healthy:.+took = (?P<took>\S+)$").unwrap()
});

static UNHEALTHY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<endpoint>\S+) is unhealthy: (?P<error>.+)$").unwrap()
});

#[derive(Debug, Deserialize)]
struct EndpointHealth {
    endpoint: String,
    health: bool,
    took: String,
    #[serde(default)]
    error: Option<String>,
}

impl From<EndpointHealth> for HealthObservation {
    fn from(record: EndpointHealth) -> Self {
        Self {
            endpoint: record.endpoint,
            healthy: record.health,
            latency: record.took,
            error: record.error,
        }
    }
}

/// Parsed probe output, tagged with the format it was read in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthResponse {
    Structured(Vec<HealthObservation>),
    Legacy(Vec<HealthObservation>),
}

impl HealthResponse {
    pub fn into_observations(self) -> Vec<HealthObservation> {
        match self {
            HealthResponse::Structured(observations) | HealthResponse::Legacy(observations) => {
                observations
            }
        }
    }
}

/// Parse raw probe output, trying the structured format first
pub fn parse(raw: &str) -> Result<HealthResponse> {
    if let Some(observations) = parse_structured(raw) {
        return Ok(HealthResponse::Structured(observations));
    }

    info!("Health response is not JSON, falling back to line format");
    parse_legacy(raw).map(HealthResponse::Legacy)
}

/// `None` means the output is not in the structured format at all
fn parse_structured(raw: &str) -> Option<Vec<HealthObservation>> {
    match serde_json::from_str::<Vec<EndpointHealth>>(raw) {
        Ok(records) => Some(records.into_iter().map(HealthObservation::from).collect()),
        Err(e) => {
            debug!("Structured decode failed: {}", e);
            None
        }
    }
}

fn parse_legacy(raw: &str) -> Result<Vec<HealthObservation>> {
    let lines: Vec<&str> = raw.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        return Err(Error::unparsable("Empty health response", raw));
    }

    lines
        .into_iter()
        .map(|line| {
            parse_legacy_line(line).ok_or_else(|| {
                Error::unparsable(
                    format!("etcdctl without JSON support but unparsable line: {}", line),
                    raw,
                )
            })
        })
        .collect()
}

fn parse_legacy_line(line: &str) -> Option<HealthObservation> {
    if let Some(caps) = HEALTHY_LINE.captures(line) {
        return Some(HealthObservation {
            endpoint: caps["endpoint"].to_string(),
            healthy: true,
            latency: caps["took"].to_string(),
            error: None,
        });
    }

    UNHEALTHY_LINE.captures(line).map(|caps| HealthObservation {
        endpoint: caps["endpoint"].to_string(),
        healthy: false,
        latency: UNKNOWN_LATENCY.to_string(),
        error: Some(caps["error"].to_string()),
    })
}

/// Turn a probe result into observations.
///
/// Structured output only counts when etcdctl also exited 0. Line output
/// already encodes failures per endpoint, so its exit code is not checked.
pub fn normalize(probe: &ProbeResult) -> Result<Vec<HealthObservation>> {
    let code = probe.output.exit_code(&probe.invocation)?;

    let response = parse(&probe.output.stdout).map_err(|e| match e {
        Error::UnparsableResponse { message, .. } => {
            error!("{}", message);
            Error::unparsable(message, full_output(probe))
        }
        other => other,
    })?;

    match response {
        HealthResponse::Structured(_) if code != 0 => {
            let command = probe.invocation.command_line();
            error!(command = %command, code, "Health probe failed");
            // stderr carries the reason, stdout only the JSON records
            let mut lines = non_blank_lines(&probe.output.stderr);
            lines.extend(non_blank_lines(&probe.output.stdout));
            Err(Error::command_failed(&command, code, &lines))
        }
        response => Ok(response.into_observations()),
    }
}

fn full_output(probe: &ProbeResult) -> String {
    let stdout = probe.output.stdout.trim_end();
    let stderr = probe.output.stderr.trim_end();
    match (stdout.is_empty(), stderr.is_empty()) {
        (_, true) => stdout.to_string(),
        (true, false) => stderr.to_string(),
        (false, false) => format!("{}\n{}", stdout, stderr),
    }
}
