use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use kiln_core::api::{normalize_exit, CommandConfig, CommandOutcome, RunnerError, RunnerPlugin};

/// Runs a command line through the configured shell (`sh -c` / `cmd /C`).
///
/// stdout and stderr are drained concurrently by `wait_with_output`, so a
/// chatty child cannot block on a full pipe. On unix the shell leads its own
/// process group; a timeout, or dropping the run before the shell exits,
/// kills the whole group so nothing the shell started outlives it.
pub struct ShellProcessRunner {
    shell: String,
    shell_arg: String,
    default_dir: String,
    timeout_ms: u64,
}

impl ShellProcessRunner {
    pub fn new(cfg: &CommandConfig) -> Self {
        Self {
            shell: cfg.shell.clone(),
            shell_arg: cfg.shell_arg.clone(),
            default_dir: cfg.default_dir.clone(),
            timeout_ms: cfg.timeout_ms,
        }
    }

    /// `None` means inherit the server's working directory.
    fn resolve_dir(&self, working_dir: &str) -> Result<Option<PathBuf>, RunnerError> {
        let raw = match working_dir.trim() {
            "" => self.default_dir.trim(),
            dir => dir,
        };
        if raw.is_empty() {
            return Ok(None);
        }

        let expanded = PathBuf::from(shellexpand::tilde(raw).as_ref());
        if !expanded.is_dir() {
            return Err(RunnerError::InvalidWorkingDirectory {
                dir: raw.to_string(),
            });
        }
        Ok(Some(expanded))
    }
}

#[async_trait]
impl RunnerPlugin for ShellProcessRunner {
    fn name(&self) -> &str {
        "shell"
    }

    async fn run(&self, command: &str, working_dir: &str) -> Result<CommandOutcome, RunnerError> {
        if command.trim().is_empty() {
            return Err(RunnerError::EmptyCommand);
        }
        if command.contains('\0') {
            return Err(RunnerError::MalformedCommand {
                reason: "command line contains a NUL byte".to_string(),
            });
        }
        let dir = self.resolve_dir(working_dir)?;

        let mut cmd = Command::new(&self.shell);
        cmd.arg(&self.shell_arg)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        if let Some(dir) = &dir {
            cmd.current_dir(dir);
        }

        let child = cmd
            .spawn()
            .map_err(|source| RunnerError::from_spawn(&self.shell, source))?;
        tracing::debug!(
            target: "kiln.runner",
            pid = child.id(),
            dir = ?dir,
            "spawned child process"
        );
        let mut group = GroupKill::new(child.id());

        let waited = if self.timeout_ms > 0 {
            match tokio::time::timeout(
                Duration::from_millis(self.timeout_ms),
                child.wait_with_output(),
            )
            .await
            {
                Ok(waited) => waited,
                Err(_) => {
                    group.kill();
                    return Err(RunnerError::Timeout {
                        timeout_ms: self.timeout_ms,
                    })
                }
            }
        } else {
            child.wait_with_output().await
        };
        group.disarm();
        let output = waited.map_err(|source| RunnerError::StreamIo {
            stream: "child output",
            source,
        })?;

        let exit_code = normalize_exit(output.status);
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if exit_code == 0 && !stderr.is_empty() {
            tracing::debug!(
                target: "kiln.runner",
                stderr = %stderr.trim_end(),
                "discarding stderr of successful command"
            );
        }

        Ok(CommandOutcome::from_exit(stdout, stderr, exit_code))
    }
}

/// Kills the child's process group when dropped, unless disarmed once the
/// shell has been reaped.
struct GroupKill {
    pgid: Option<u32>,
}

impl GroupKill {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_process_group(pgid);
        }
    }
}

impl Drop for GroupKill {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pgid) else {
        return;
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) => tracing::debug!(target: "kiln.runner", pgid, "killed process group"),
        Err(Errno::ESRCH) => {}
        Err(e) => tracing::warn!(target: "kiln.runner", pgid, error = %e, "failed to kill process group"),
    }
}

// Without process groups only the direct child is reachable; `kill_on_drop`
// already covers it.
#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) {}
