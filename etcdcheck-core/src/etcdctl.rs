///! etcdctl invocation
///!
///! etcdctl is the only access to cluster state. Running it goes through the
///! `CommandRunner` trait so tests can substitute canned output.

use etcdcheck_common::{Error, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

const API_VERSION_VAR: &str = "ETCDCTL_API";

/// A fully described external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Complete child environment, in the order it is rendered
    pub env: Vec<(String, String)>,
}

impl Invocation {
    /// Shell-like rendering used in error messages, e.g.
    /// `ETCDCTL_API=3 /usr/bin/etcdctl member list -w json`
    pub fn command_line(&self) -> String {
        let env = self.env.iter().map(|(key, value)| format!("{}={}", key, value));
        let program = std::iter::once(self.program.display().to_string());
        env.chain(program)
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Exit code, treating death by signal as an interrupted run
    pub fn exit_code(&self, invocation: &Invocation) -> Result<i32> {
        self.code.ok_or_else(|| {
            Error::Interrupted(format!(
                "Command {} was terminated by a signal",
                invocation.command_line()
            ))
        })
    }

    /// Non-blank trimmed lines, stdout first
    pub fn lines(&self) -> Vec<String> {
        let mut lines = non_blank_lines(&self.stdout);
        lines.extend(non_blank_lines(&self.stderr));
        lines
    }
}

pub fn non_blank_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Capability to run an external command to completion
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// Runs commands as real child processes. No timeout is applied.
pub struct ProcessRunner;

#[async_trait::async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .env_clear()
            .kill_on_drop(true)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .output()
            .await?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        })
    }
}

/// etcdctl speaking the v3 API
pub struct Etcdctl {
    runner: Box<dyn CommandRunner>,
    program: PathBuf,
    extra_env: BTreeMap<String, String>,
}

impl Etcdctl {
    pub fn new(runner: Box<dyn CommandRunner>, program: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            program: program.into(),
            extra_env: BTreeMap::new(),
        }
    }

    /// Additional variables for the child, e.g. `ETCDCTL_CACERT`.
    /// `ETCDCTL_API` cannot be overridden.
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.extra_env = env;
        self
    }

    /// Find etcdctl on `PATH`
    pub fn locate() -> Result<PathBuf> {
        which::which("etcdctl").map_err(|_| Error::BinaryNotFound("etcdctl".to_string()))
    }

    pub fn invocation(&self, args: &[&str]) -> Invocation {
        let mut env = vec![(API_VERSION_VAR.to_string(), "3".to_string())];
        env.extend(
            self.extra_env
                .iter()
                .filter(|(key, _)| key.as_str() != API_VERSION_VAR)
                .map(|(key, value)| (key.clone(), value.clone())),
        );

        Invocation {
            program: self.program.clone(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
            env,
        }
    }

    pub async fn run(&self, args: &[&str]) -> Result<(Invocation, CommandOutput)> {
        let invocation = self.invocation(args);
        debug!(command = %invocation.command_line(), "Running etcdctl");

        let output = self.runner.run(&invocation).await?;
        debug!(
            code = ?output.code,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "etcdctl finished"
        );

        Ok((invocation, output))
    }
}
