///! Health probe
///! Asks etcdctl for the health of every member in a single call

use crate::etcdctl::{CommandOutput, Etcdctl, Invocation};
use etcdcheck_common::Result;
use tracing::debug;

/// Raw, uninterpreted result of `etcdctl endpoint health`
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub invocation: Invocation,
    pub output: CommandOutput,
}

/// Probe all `endpoints` at once. Blocks until etcdctl exits.
pub async fn probe_health(etcdctl: &Etcdctl, endpoints: &[&str]) -> Result<ProbeResult> {
    let endpoints_arg = format!("--endpoints={}", endpoints.join(","));
    debug!(endpoints = endpoints.len(), "Probing endpoint health");

    let (invocation, output) = etcdctl
        .run(&[endpoints_arg.as_str(), "endpoint", "health", "-w", "json"])
        .await?;

    Ok(ProbeResult { invocation, output })
}
