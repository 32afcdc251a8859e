//! Common types shared between etcdcheck-core and etcdcheck-cli

use serde::{Deserialize, Serialize};

/// Cluster member as advertised by `etcdctl member list`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterMember {
    #[serde(rename = "ID")]
    pub id: u64,
    /// Empty for members that were added but never started
    #[serde(default)]
    pub name: String,
    #[serde(rename = "peerURLs", default)]
    pub peer_urls: Vec<String>,
    #[serde(rename = "clientURLs", default)]
    pub client_urls: Vec<String>,
}

impl ClusterMember {
    /// Address used to reach this member when probing
    pub fn canonical_url(&self) -> Option<&str> {
        self.peer_urls.first().map(String::as_str)
    }
}

/// One endpoint's health as reported by the probe, before it is tied to a member
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthObservation {
    pub endpoint: String,
    pub healthy: bool,
    pub latency: String,
    pub error: Option<String>,
}

/// Member identity joined with its observed health
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberHealth {
    pub id: u64,
    pub name: String,
    pub peer_urls: Vec<String>,
    pub client_urls: Vec<String>,
    pub healthy: bool,
    pub latency: String,
    pub error: Option<String>,
}

impl MemberHealth {
    pub fn new(member: &ClusterMember, observation: HealthObservation) -> Self {
        Self {
            id: member.id,
            name: member.name.clone(),
            peer_urls: member.peer_urls.clone(),
            client_urls: member.client_urls.clone(),
            healthy: observation.healthy,
            latency: observation.latency,
            error: observation.error,
        }
    }

    pub fn error_text(&self) -> &str {
        self.error.as_deref().unwrap_or("unknown error")
    }
}

/// Monitoring severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Status {
    /// Standard four-level plugin exit code
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Warning => 1,
            Self::Critical => 2,
            Self::Unknown => 3,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warning => write!(f, "WARNING"),
            Self::Critical => write!(f, "CRITICAL"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Outcome of one check run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Verdict {
    pub status: Status,
    pub summary: String,
    pub detail: Option<String>,
}

impl Verdict {
    pub fn new(status: Status, summary: impl Into<String>) -> Self {
        Self {
            status,
            summary: summary.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        self.detail = if detail.is_empty() { None } else { Some(detail) };
        self
    }

    /// Turn a fatal condition into the verdict reported for it.
    ///
    /// Command failures are the incident itself and keep their message as
    /// is; everything else is prefixed with the kind of condition.
    pub fn from_error(err: &Error) -> Self {
        let status = err.status();
        let summary = match err {
            Error::ControlPlane { .. } => err.to_string(),
            _ => format!("{}: {}", err.kind(), err),
        };
        let verdict = Self::new(status, summary);
        match err.detail() {
            Some(detail) => verdict.with_detail(detail),
            None => verdict,
        }
    }
}

/// Fatal conditions raised while checking a cluster
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// etcdctl failed or returned data that breaks the member model
    #[error("{message}")]
    ControlPlane {
        message: String,
        output: Option<String>,
    },

    /// The run was cut short by a signal, either to etcdctl or to us
    #[error("{0}")]
    Interrupted(String),

    #[error("{message}")]
    UnparsableResponse {
        message: String,
        output: Option<String>,
    },

    #[error("Unable to find node definition matching endpoint {endpoint} ({matches} matching members)")]
    Reconciliation { endpoint: String, matches: usize },

    /// Members the probe said nothing about
    #[error("No health reported for member(s): {}", .members.join(", "))]
    Unobserved { members: Vec<String> },

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Unable to find {0} command in path")]
    BinaryNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// `Command <cmd> failed with code <code>: <first line>`
    pub fn command_failed(command: &str, code: i32, lines: &[String]) -> Self {
        let first = lines.first().map(String::as_str).unwrap_or("No output");
        Error::ControlPlane {
            message: format!("Command {} failed with code {}: {}", command, code, first),
            output: (!lines.is_empty()).then(|| lines.join("\n")),
        }
    }

    /// Listing that decoded but breaks the member invariants
    pub fn invalid_listing(
        command: &str,
        code: i32,
        reason: impl std::fmt::Display,
        output: &str,
    ) -> Self {
        Error::ControlPlane {
            message: format!(
                "Command {} exited with code {} but returned an invalid member list: {}",
                command, code, reason
            ),
            output: (!output.trim().is_empty()).then(|| output.trim_end().to_string()),
        }
    }

    pub fn unparsable(message: impl Into<String>, output: impl Into<String>) -> Self {
        let output = output.into();
        Error::UnparsableResponse {
            message: message.into(),
            output: (!output.trim().is_empty()).then_some(output),
        }
    }

    /// Name of the condition as shown in UNKNOWN output
    pub fn kind(&self) -> &'static str {
        match self {
            Error::ControlPlane { .. } => "ControlPlaneError",
            Error::Interrupted(_) => "InterruptedError",
            Error::UnparsableResponse { .. } => "UnparsableResponseError",
            Error::Reconciliation { .. } | Error::Unobserved { .. } => "ReconciliationError",
            Error::Configuration(_) => "ConfigurationError",
            Error::BinaryNotFound(_) => "BinaryNotFoundError",
            Error::Io(_) => "IoError",
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Error::ControlPlane { .. } => Status::Critical,
            _ => Status::Unknown,
        }
    }

    /// Multi-line body printed after the summary line
    pub fn detail(&self) -> Option<&str> {
        match self {
            Error::ControlPlane { output, .. } | Error::UnparsableResponse { output, .. } => {
                output.as_deref()
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ordering_and_exit_codes() {
        assert!(Status::Unknown > Status::Critical);
        assert!(Status::Critical > Status::Warning);
        assert!(Status::Warning > Status::Ok);
        assert_eq!(Status::Ok.exit_code(), 0);
        assert_eq!(Status::Warning.exit_code(), 1);
        assert_eq!(Status::Critical.exit_code(), 2);
        assert_eq!(Status::Unknown.exit_code(), 3);
    }

    #[test]
    fn test_member_deserializes_etcdctl_keys() {
        let member: ClusterMember = serde_json::from_str(
            r#"{"ID":11602954883745373329,"name":"etcd1","peerURLs":["http://10.0.0.1:2380"],"clientURLs":[],"isLearner":false}"#,
        )
        .unwrap();
        assert_eq!(member.id, 11602954883745373329);
        assert_eq!(member.canonical_url(), Some("http://10.0.0.1:2380"));
        assert!(member.client_urls.is_empty());
    }

    #[test]
    fn test_unstarted_member_has_empty_name() {
        let member: ClusterMember =
            serde_json::from_str(r#"{"ID":1,"peerURLs":["http://10.0.0.4:2380"]}"#).unwrap();
        assert_eq!(member.name, "");
        assert!(member.client_urls.is_empty());
    }

    #[test]
    fn test_command_failed_without_output() {
        let err = Error::command_failed("ETCDCTL_API=3 etcdctl member list -w json", 1, &[]);
        assert_eq!(
            err.to_string(),
            "Command ETCDCTL_API=3 etcdctl member list -w json failed with code 1: No output"
        );
        assert!(err.detail().is_none());
        assert_eq!(err.status(), Status::Critical);
    }

    #[test]
    fn test_verdict_from_unknown_error_names_kind() {
        let err = Error::Reconciliation {
            endpoint: "http://10.0.0.9:2380".to_string(),
            matches: 0,
        };
        let verdict = Verdict::from_error(&err);
        assert_eq!(verdict.status, Status::Unknown);
        assert!(verdict.summary.starts_with("ReconciliationError: "));
        assert!(verdict.summary.contains("http://10.0.0.9:2380"));
        assert!(verdict.detail.is_none());
    }

    #[test]
    fn test_unobserved_members_are_reconciliation_errors() {
        let err = Error::Unobserved {
            members: vec!["etcd3 (http://10.0.0.3:2380)".to_string()],
        };
        assert_eq!(err.kind(), "ReconciliationError");
        assert_eq!(err.status(), Status::Unknown);
        assert_eq!(
            Verdict::from_error(&err).summary,
            "ReconciliationError: No health reported for member(s): etcd3 (http://10.0.0.3:2380)"
        );
    }

    #[test]
    fn test_verdict_from_command_failure_keeps_detail() {
        let lines = vec!["context deadline exceeded".to_string(), "retrying".to_string()];
        let verdict = Verdict::from_error(&Error::command_failed("etcdctl", 2, &lines));
        assert_eq!(verdict.status, Status::Critical);
        assert!(verdict.summary.ends_with(": context deadline exceeded"));
        assert_eq!(verdict.detail.as_deref(), Some("context deadline exceeded\nretrying"));
    }
}
