///! Reconciler
///! Joins health observations, keyed by address, to member identities

use etcdcheck_common::{ClusterMember, Error, HealthObservation, MemberHealth, Result};
use tracing::error;

/// Attach every observation to the one member advertising its endpoint as a
/// peer URL. Zero or several candidates mean the member list changed between
/// the listing and the probe, which is fatal. So is a member nothing was
/// reported for.
pub fn reconcile(
    observations: Vec<HealthObservation>,
    members: &[ClusterMember],
) -> Result<Vec<MemberHealth>> {
    let records = observations
        .into_iter()
        .map(|observation| {
            let candidates: Vec<&ClusterMember> = members
                .iter()
                .filter(|member| member.peer_urls.contains(&observation.endpoint))
                .collect();

            match candidates.as_slice() {
                [member] => Ok(MemberHealth::new(member, observation)),
                _ => {
                    error!(
                        endpoint = %observation.endpoint,
                        matches = candidates.len(),
                        "Endpoint does not map to a single member"
                    );
                    Err(Error::Reconciliation {
                        endpoint: observation.endpoint,
                        matches: candidates.len(),
                    })
                }
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let unobserved: Vec<String> = members
        .iter()
        .filter(|member| !records.iter().any(|record| record.id == member.id))
        .map(describe)
        .collect();

    if !unobserved.is_empty() {
        error!(members = ?unobserved, "Probe reported nothing for some members");
        return Err(Error::Unobserved { members: unobserved });
    }

    Ok(records)
}

/// `name (url)`, or just the url for a member that never started
fn describe(member: &ClusterMember) -> String {
    let url = member.canonical_url().unwrap_or_default();
    if member.name.is_empty() {
        url.to_string()
    } else {
        format!("{} ({})", member.name, url)
    }
}
