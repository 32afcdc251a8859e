//! Common test utilities and helpers

#![allow(dead_code)]

use etcdcheck_common::Result;
use etcdcheck_core::{ClusterChecker, CommandOutput, CommandRunner, Etcdctl, Invocation};
use std::sync::{Arc, Mutex};

pub const ETCDCTL: &str = "/usr/bin/etcdctl";

/// Canned etcdctl: answers `member list` and `endpoint health` with fixed output
/// and records every invocation it receives
#[derive(Clone, Default)]
pub struct FakeRunner {
    member_list: CommandOutput,
    endpoint_health: CommandOutput,
    pub calls: Arc<Mutex<Vec<Invocation>>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn member_list(mut self, stdout: &str, stderr: &str, code: i32) -> Self {
        self.member_list = output(stdout, stderr, Some(code));
        self
    }

    pub fn endpoint_health(mut self, stdout: &str, stderr: &str, code: i32) -> Self {
        self.endpoint_health = output(stdout, stderr, Some(code));
        self
    }

    pub fn endpoint_health_killed(mut self) -> Self {
        self.endpoint_health = output("", "", None);
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn checker(&self) -> ClusterChecker {
        ClusterChecker::new(Etcdctl::new(Box::new(self.clone()), ETCDCTL))
    }
}

fn output(stdout: &str, stderr: &str, code: Option<i32>) -> CommandOutput {
    CommandOutput {
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
        code,
    }
}

#[async_trait::async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(invocation.clone());

        if invocation.args.iter().any(|arg| arg == "member") {
            Ok(self.member_list.clone())
        } else {
            Ok(self.endpoint_health.clone())
        }
    }
}

/// `etcdctl member list -w json` output for etcd1..etcdN on 10.0.0.1..N
pub fn member_list_json(count: usize) -> String {
    let members: Vec<String> = (1..=count)
        .map(|i| {
            format!(
                r#"{{"ID":{},"name":"etcd{}","peerURLs":["http://10.0.0.{}:2380"],"clientURLs":["http://10.0.0.{}:2379"]}}"#,
                1000 + i,
                i,
                i,
                i
            )
        })
        .collect();

    format!(
        r#"{{"header":{{"cluster_id":17237436991929493444,"member_id":9372538179322589801,"raft_term":2}},"members":[{}]}}"#,
        members.join(",")
    )
}

/// Structured health output; `dead` lists 1-based member indexes
pub fn health_json(count: usize, dead: &[usize]) -> String {
    let records: Vec<String> = (1..=count)
        .map(|i| {
            if dead.contains(&i) {
                format!(
                    r#"{{"endpoint":"http://10.0.0.{}:2380","health":false,"took":"5.000s","error":"context deadline exceeded"}}"#,
                    i
                )
            } else {
                format!(r#"{{"endpoint":"http://10.0.0.{}:2380","health":true,"took":"{}ms"}}"#, i, i)
            }
        })
        .collect();

    format!("[{}]\n", records.join(","))
}

/// Line-format health output; `dead` lists 1-based member indexes
pub fn health_lines(count: usize, dead: &[usize]) -> String {
    (1..=count)
        .map(|i| {
            if dead.contains(&i) {
                format!("http://10.0.0.{}:2380 is unhealthy: failed to commit proposal: context deadline exceeded\n", i)
            } else {
                format!("http://10.0.0.{}:2380 is healthy: successfully committed proposal: took = {}ms\n", i, i)
            }
        })
        .collect()
}
