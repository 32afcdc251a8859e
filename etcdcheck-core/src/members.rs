///! Member directory
///! Lists cluster members through `etcdctl member list`

use crate::etcdctl::Etcdctl;
use etcdcheck_common::{ClusterMember, Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, error};

#[derive(Debug, Deserialize)]
struct MemberListing {
    members: Vec<ClusterMember>,
}

/// Fetch the current member set, in the order etcd reports it
pub async fn list_members(etcdctl: &Etcdctl) -> Result<Vec<ClusterMember>> {
    let (invocation, output) = etcdctl.run(&["member", "list", "-w", "json"]).await?;
    let command = invocation.command_line();

    let code = output.exit_code(&invocation)?;
    if code != 0 {
        error!(command = %command, code, "Member listing failed");
        return Err(Error::command_failed(&command, code, &output.lines()));
    }

    // Undecodable output is reported like a failed command, exit code included
    let listing: MemberListing = serde_json::from_str(&output.stdout).map_err(|e| {
        error!(command = %command, "Member listing is not JSON: {}", e);
        Error::command_failed(&command, code, &output.lines())
    })?;

    validate_members(&listing.members)
        .map_err(|reason| Error::invalid_listing(&command, code, reason, &output.stdout))?;

    debug!(count = listing.members.len(), "Listed cluster members");
    Ok(listing.members)
}

fn validate_members(members: &[ClusterMember]) -> std::result::Result<(), String> {
    if members.is_empty() {
        return Err("no members".to_string());
    }

    let mut seen = HashSet::new();
    for member in members {
        if member.peer_urls.is_empty() {
            return Err(format!("member {:x} ({}) advertises no peer URLs", member.id, member.name));
        }
        if !seen.insert(member.id) {
            return Err(format!("duplicate member id {:x}", member.id));
        }
    }

    Ok(())
}
