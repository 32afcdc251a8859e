///! Cluster check pipeline
///! member list -> health probe -> normalize -> reconcile -> evaluate

use crate::etcdctl::Etcdctl;
use crate::evaluate::{evaluate, Thresholds};
use crate::members::list_members;
use crate::normalize::normalize;
use crate::probe::probe_health;
use crate::reconcile::reconcile;
use etcdcheck_common::{MemberHealth, Result, Verdict};
use tracing::info;

/// Checks an etcd v3 cluster through etcdctl. Holds no state between runs.
pub struct ClusterChecker {
    etcdctl: Etcdctl,
}

impl ClusterChecker {
    pub fn new(etcdctl: Etcdctl) -> Self {
        Self { etcdctl }
    }

    /// Health of every member; `member list` does not report it
    pub async fn members_health(&self) -> Result<Vec<MemberHealth>> {
        let members = list_members(&self.etcdctl).await?;
        let endpoints: Vec<&str> = members.iter().filter_map(|m| m.canonical_url()).collect();

        let probe = probe_health(&self.etcdctl, &endpoints).await?;
        let observations = normalize(&probe)?;
        reconcile(observations, &members)
    }

    pub async fn check_cluster_members(&self, thresholds: &Thresholds) -> Result<Verdict> {
        let records = self.members_health().await?;
        let verdict = evaluate(&records, thresholds);

        info!(status = %verdict.status, "{}", verdict.summary);
        Ok(verdict)
    }
}
