///! check_etcd_cluster
///!
///! Monitoring plugin checking an etcd v3 cluster through etcdctl

mod commands;
mod config;
mod output;

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use etcdcheck_common::{Error, Verdict};
use std::future::Future;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (default: /etc/etcdcheck/config.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// etcdctl binary to run (default: looked up on PATH)
    #[arg(long)]
    etcdctl: Option<PathBuf>,

    /// Log level for diagnostics on stderr (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check members of etcd cluster
    #[command(name = "cluster_members")]
    ClusterMembers(ClusterMembersArgs),
    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct ClusterMembersArgs {
    /// Minimum number (inclusive) of dead node(s) in cluster to trigger warning, -1 as null value
    #[arg(long, allow_negative_numbers = true)]
    warning: Option<i64>,
    /// Minimum number (inclusive) of dead node(s) in cluster to trigger critical, -1 as null value
    #[arg(long, allow_negative_numbers = true)]
    critical: Option<i64>,
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => std::process::exit(output::emit(&output::bad_arguments(&err))),
    };

    let args = match cli.command {
        Commands::ClusterMembers(args) => args,
        Commands::Completions { shell } => {
            generate_completions(shell);
            return;
        }
    };

    let mut config = match config::Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => std::process::exit(output::emit(&output::failure(&err))),
    };
    if let Some(etcdctl) = cli.etcdctl {
        config.etcdctl = Some(etcdctl);
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    // Held until exit so buffered file logs get flushed
    let guard = match config.logging().init() {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Failed to initialize logging: {}", err);
            None
        }
    };

    let check = commands::cluster_members::handle_cluster_members_command(args, &config);
    let code = match with_interrupt(check, interrupt_signal()).await {
        Ok(verdict) => output::emit(&verdict),
        Err(err) => {
            tracing::error!("Check failed: {:#}", err);
            output::emit(&output::failure(&err))
        }
    };

    // process::exit skips destructors
    drop(guard);
    std::process::exit(code);
}

/// Wait for the first terminating signal and return its name
#[cfg(unix)]
async fn interrupt_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(name)
}

#[cfg(not(unix))]
async fn interrupt_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl+C")
}

/// Run the check until it finishes or a signal arrives. An interrupted check
/// still yields a plugin line; dropping it kills any running etcdctl.
async fn with_interrupt<C, I>(check: C, interrupt: I) -> anyhow::Result<Verdict>
where
    C: Future<Output = anyhow::Result<Verdict>>,
    I: Future<Output = std::io::Result<&'static str>>,
{
    tokio::pin!(check);

    tokio::select! {
        result = &mut check => result,
        signal = interrupt => match signal {
            Ok(name) => {
                tracing::info!("Received {}", name);
                Err(Error::Interrupted(format!("Received {} while checking the cluster", name)).into())
            }
            Err(err) => {
                tracing::warn!("Failed to install signal handlers: {}", err);
                check.await
            }
        },
    }
}

/// Generate shell completions
fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut io::stdout());
}
