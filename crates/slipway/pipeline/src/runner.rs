//! External build/start boundary.
//!
//! The harness delegates image builds and service startup to an
//! external declarative system (a compose runner). Only the exit status
//! crosses the boundary: non-zero means the stage failed, and the
//! runner's own logs are not interpreted.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

/// Errors from invoking the external runner.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The runner binary could not be started.
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The runner exited unsuccessfully.
    #[error("'{command}' exited with status {code:?}")]
    NonZeroExit {
        command: String,
        code: Option<i32>,
    },
}

/// Result type for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// The external build/start system, seen through its exit status only.
#[async_trait]
pub trait ComposeRunner: Send + Sync {
    /// Build service images.
    async fn build(&self) -> RunnerResult<()>;

    /// Start services in the background, converging on the declared
    /// state (safe to repeat).
    async fn up(&self) -> RunnerResult<()>;
}

/// Runner backed by `docker compose`.
pub struct ProcessComposeRunner {
    compose_file: PathBuf,
    quiet: bool,
}

impl ProcessComposeRunner {
    pub fn new(compose_file: impl Into<PathBuf>) -> Self {
        Self {
            compose_file: compose_file.into(),
            quiet: false,
        }
    }

    /// Discard the runner's stdout instead of inheriting it.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    async fn run(&self, args: &[&str]) -> RunnerResult<()> {
        let command = format!(
            "docker compose -f {} {}",
            self.compose_file.display(),
            args.join(" ")
        );
        info!(%command, "invoking external runner");

        let mut cmd = tokio::process::Command::new("docker");
        cmd.arg("compose")
            .arg("-f")
            .arg(&self.compose_file)
            .args(args);
        if self.quiet {
            cmd.stdout(Stdio::null());
        }

        let status = cmd.status().await.map_err(|source| RunnerError::Spawn {
            command: command.clone(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(RunnerError::NonZeroExit {
                command,
                code: status.code(),
            })
        }
    }
}

#[async_trait]
impl ComposeRunner for ProcessComposeRunner {
    async fn build(&self) -> RunnerResult<()> {
        self.run(&["build"]).await
    }

    async fn up(&self) -> RunnerResult<()> {
        self.run(&["up", "-d"]).await
    }
}
