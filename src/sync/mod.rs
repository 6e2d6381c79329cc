//! Synchronization of the record directory through git.
//!
//! Local records are the source of truth. If git can't be reached the command still succeeds and
//! the failure is reported as a warning, see [synchronized].

use std::{future::Future, path::PathBuf, process::ExitStatus, time::Duration};

use anyhow::Result;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::GitConfig;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' didn't finish in {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    #[error("'{command}' failed with {status}: {stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Actions run around the commands of the cli.
pub trait SyncHook {
    /// Fetches changes made elsewhere. Runs before every command.
    fn pull(&self) -> impl Future<Output = Result<(), SyncError>>;

    /// Publishes local changes. Runs after every successful command that changed records.
    fn push(&self) -> impl Future<Output = Result<(), SyncError>>;
}

/// Runs git inside the record directory.
pub struct GitSync {
    dir: PathBuf,
    program: String,
    message: String,
    timeout: Duration,
}

impl GitSync {
    pub fn new(dir: PathBuf, config: &GitConfig) -> Self {
        Self {
            dir,
            program: config.command.clone(),
            message: config.message.clone(),
            timeout: Duration::from_secs(config.timeout),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<(), SyncError> {
        let command = format!("{} {}", self.program, args.join(" "));
        debug!("Running '{command}' in {:?}", self.dir);

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(&self.dir)
            .kill_on_drop(true)
            .output();
        let output = match tokio::time::timeout(self.timeout, output).await {
            Ok(Ok(v)) => v,
            Ok(Err(source)) => return Err(SyncError::Spawn { command, source }),
            Err(_) => {
                return Err(SyncError::Timeout {
                    command,
                    timeout: self.timeout,
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stdout.lines().chain(stderr.lines()) {
            debug!("{}: {line}", self.program);
        }

        if output.status.success() {
            Ok(())
        } else {
            Err(SyncError::Failed {
                command,
                status: output.status,
                stderr: stderr.trim().to_string(),
            })
        }
    }
}

impl SyncHook for GitSync {
    async fn pull(&self) -> Result<(), SyncError> {
        self.run(&["pull"]).await
    }

    async fn push(&self) -> Result<(), SyncError> {
        self.run(&["add", "."]).await?;
        self.run(&["commit", "-m", self.message.as_str()]).await?;
        self.run(&["push"]).await
    }
}

/// Wraps `operation` into pull and push of `hook`. Failures of the hook are logged as warnings
/// and never change the result of `operation`. Push is skipped for failed or read-only operations.
pub async fn synchronized<T>(
    hook: Option<&impl SyncHook>,
    mutating: bool,
    operation: impl Future<Output = Result<T>>,
) -> Result<T> {
    if let Some(hook) = hook {
        if let Err(e) = hook.pull().await {
            warn!("Pulling records failed, continuing with local state. {e}");
        }
    }

    let result = operation.await?;

    if let Some(hook) = hook.filter(|_| mutating) {
        if let Err(e) = hook.push().await {
            warn!("Pushing records failed, changes are only saved locally. {e}");
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::{path::Path, sync::Mutex};

    use anyhow::{anyhow, Result};
    use tempfile::tempdir;

    use crate::config::GitConfig;

    use super::{synchronized, GitSync, SyncError, SyncHook};

    /// Records calls, optionally failing all of them.
    #[derive(Default)]
    struct RecordingHook {
        calls: Mutex<Vec<&'static str>>,
        fail: bool,
    }

    impl RecordingHook {
        fn outcome(&self, call: &'static str) -> Result<(), SyncError> {
            self.calls.lock().unwrap().push(call);
            if self.fail {
                Err(SyncError::Spawn {
                    command: call.into(),
                    source: std::io::Error::other("unreachable remote"),
                })
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl SyncHook for RecordingHook {
        async fn pull(&self) -> Result<(), SyncError> {
            self.outcome("pull")
        }

        async fn push(&self) -> Result<(), SyncError> {
            self.outcome("push")
        }
    }

    #[tokio::test]
    async fn test_pull_and_push_around_mutation() -> Result<()> {
        let hook = RecordingHook::default();
        let value = synchronized(Some(&hook), true, async {
            hook.calls.lock().unwrap().push("operation");
            Ok(5)
        })
        .await?;

        assert_eq!(value, 5);
        assert_eq!(hook.calls(), vec!["pull", "operation", "push"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_read_only_skips_push() -> Result<()> {
        let hook = RecordingHook::default();
        synchronized(Some(&hook), false, async { Ok(()) }).await?;
        assert_eq!(hook.calls(), vec!["pull"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_operation_skips_push() {
        let hook = RecordingHook::default();
        let result: Result<()> =
            synchronized(Some(&hook), true, async { Err(anyhow!("no active record")) }).await;
        assert!(result.is_err());
        assert_eq!(hook.calls(), vec!["pull"]);
    }

    #[tokio::test]
    async fn test_sync_failures_are_not_fatal() -> Result<()> {
        let hook = RecordingHook {
            fail: true,
            ..Default::default()
        };
        let value = synchronized(Some(&hook), true, async { Ok("saved") }).await?;
        assert_eq!(value, "saved");
        assert_eq!(hook.calls(), vec!["pull", "push"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_without_hook() -> Result<()> {
        let value = synchronized(None::<&GitSync>, true, async { Ok(1) }).await?;
        assert_eq!(value, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_program() -> Result<()> {
        let dir = tempdir()?;
        let config = GitConfig {
            enabled: true,
            command: "tl-definitely-missing-git".into(),
            ..Default::default()
        };
        let git = GitSync::new(dir.path().to_owned(), &config);

        assert!(matches!(git.pull().await, Err(SyncError::Spawn { .. })));
        assert!(matches!(git.push().await, Err(SyncError::Spawn { .. })));
        Ok(())
    }

    /// Points [GitSync] at a shell script that logs its arguments into `calls.log` of `dir`, then
    /// runs `body`.
    #[cfg(unix)]
    fn scripted_git(dir: &Path, body: &str, timeout: u64) -> Result<GitSync> {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("fake-git");
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho \"$*\" >> calls.log\n{body}\n"),
        )?;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;

        let config = GitConfig {
            enabled: true,
            command: script.to_string_lossy().into_owned(),
            timeout,
            message: "sync".into(),
        };
        Ok(GitSync::new(dir.to_owned(), &config))
    }

    #[cfg(unix)]
    fn logged_calls(dir: &Path) -> Result<Vec<String>> {
        let log = std::fs::read_to_string(dir.join("calls.log"))?;
        Ok(log.lines().map(str::to_owned).collect())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_push_runs_every_step() -> Result<()> {
        let dir = tempdir()?;
        let git = scripted_git(dir.path(), "exit 0", 5)?;

        git.pull().await?;
        git.push().await?;

        assert_eq!(
            logged_calls(dir.path())?,
            vec!["pull", "add .", "commit -m sync", "push"]
        );
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_push_stops_at_failed_step() -> Result<()> {
        let dir = tempdir()?;
        let git = scripted_git(
            dir.path(),
            "if [ \"$1\" = commit ]; then echo 'nothing to commit' >&2; exit 1; fi",
            5,
        )?;

        let error = git.push().await.unwrap_err();

        assert!(
            matches!(&error, SyncError::Failed { command, stderr, .. }
                if command.ends_with("commit -m sync") && stderr == "nothing to commit"),
            "{error}"
        );
        assert_eq!(logged_calls(dir.path())?, vec!["add .", "commit -m sync"]);
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_command_times_out() -> Result<()> {
        let dir = tempdir()?;
        let git = scripted_git(dir.path(), "if [ \"$1\" = pull ]; then exec sleep 10; fi", 1)?;

        let started = std::time::Instant::now();
        let error = git.pull().await.unwrap_err();

        assert!(matches!(error, SyncError::Timeout { .. }), "{error}");
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
        assert_eq!(logged_calls(dir.path())?, vec!["pull"]);
        Ok(())
    }
}
