use crate::config::Config;
use crate::ClusterMembersArgs;
use anyhow::Result;
use etcdcheck_common::{Error, Verdict};
use etcdcheck_core::{ClusterChecker, CommandRunner, Etcdctl, ProcessRunner, Thresholds};
use tracing::debug;

/// -1 on the command line means "no threshold"
const UNSET: i64 = -1;

pub async fn handle_cluster_members_command(
    args: ClusterMembersArgs,
    config: &Config,
) -> Result<Verdict> {
    check_cluster_members(args, config, Box::new(ProcessRunner)).await
}

async fn check_cluster_members(
    args: ClusterMembersArgs,
    config: &Config,
    runner: Box<dyn CommandRunner>,
) -> Result<Verdict> {
    // Validated before etcdctl is ever run
    let thresholds = thresholds_from_args(args.warning, args.critical)?;
    debug!(warning = ?thresholds.warning(), critical = ?thresholds.critical(), "Thresholds");

    let program = match &config.etcdctl {
        Some(path) => path.clone(),
        None => Etcdctl::locate()?,
    };
    let etcdctl = Etcdctl::new(runner, program).with_env(config.env.clone());

    let verdict = ClusterChecker::new(etcdctl)
        .check_cluster_members(&thresholds)
        .await?;
    Ok(verdict)
}

fn thresholds_from_args(warning: Option<i64>, critical: Option<i64>) -> etcdcheck_common::Result<Thresholds> {
    Thresholds::new(
        decode_threshold("warning", warning)?,
        decode_threshold("critical", critical)?,
    )
}

fn decode_threshold(name: &str, value: Option<i64>) -> etcdcheck_common::Result<Option<usize>> {
    match value {
        None | Some(UNSET) => Ok(None),
        Some(count) => usize::try_from(count).map(Some).map_err(|_| {
            Error::Configuration(format!(
                "{} threshold must be a dead node count or {} (got {})",
                name, UNSET, count
            ))
        }),
    }
}
