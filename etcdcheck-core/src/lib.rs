//! etcd v3 cluster health check engine
//!
//! Lists members and probes their health through etcdctl, then reduces the
//! result to a monitoring verdict.

pub mod checker;
pub mod etcdctl;
pub mod evaluate;
pub mod logging;
pub mod members;
pub mod normalize;
pub mod probe;
pub mod reconcile;

pub use checker::ClusterChecker;
pub use etcdctl::{CommandOutput, CommandRunner, Etcdctl, Invocation, ProcessRunner};
pub use evaluate::Thresholds;
