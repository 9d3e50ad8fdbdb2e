//! Connect and close paths for the subprocess transport

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::ChildStderr;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{ClaudeError, Result};
use crate::types::options::StderrCallback;

use super::command::CommandBuilder;
use super::config::{PromptInput, SHUTDOWN_TIMEOUT, build_environment};
use super::reader::spawn_stdout_reader;
use super::transport::SubprocessTransport;
use super::version::check_cli_version;

impl SubprocessTransport {
    /// Spawn the CLI process and set up pipes, readers, and state
    ///
    /// Reentrant: connecting an already-connected transport is a no-op.
    pub(super) async fn connect_impl(&mut self) -> Result<()> {
        if self.child.lock().await.is_some() {
            return Ok(());
        }
        if self.state.lock().closed {
            return Err(ClaudeError::connection("transport has been closed"));
        }

        check_cli_version(&self.cli_path).await?;

        let builder = CommandBuilder::new(&self.cli_path, &self.prompt, &self.options);
        let (mut cmd, temp_files) = builder.build()?;

        cmd.env_clear().envs(build_environment(
            &self.options.env,
            self.options.include_partial_messages,
        ));

        if let Some(ref cwd) = self.options.cwd {
            cmd.current_dir(cwd);
        }

        // Stderr is piped rather than inherited so the child can never touch
        // the host terminal's state.
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                for path in &temp_files {
                    let _ = std::fs::remove_file(path);
                }
                if let Some(ref cwd) = self.options.cwd
                    && !cwd.exists()
                {
                    return Err(ClaudeError::connection(format!(
                        "working directory does not exist: {}",
                        cwd.display()
                    )));
                }
                return Err(ClaudeError::connection(format!(
                    "failed to start Claude Code: {e}"
                )));
            }
        };

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ClaudeError::connection("failed to get stdin handle"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClaudeError::connection("failed to get stdout handle"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ClaudeError::connection("failed to get stderr handle"))?;

        let stderr_task = spawn_stderr_reader(stderr, self.options.stderr.clone());

        *self.child.lock().await = Some(child);

        let (tx, rx) = mpsc::unbounded_channel();
        let reader_task = spawn_stdout_reader(
            stdout,
            tx,
            self.max_buffer_size,
            self.child.clone(),
            self.exit_status.clone(),
        );

        let one_shot = matches!(self.prompt, PromptInput::String(_));
        if one_shot {
            // Prompt already on argv; EOF on stdin tells the CLI to run it.
            let mut stdin = stdin;
            let _ = stdin.shutdown().await;
        } else {
            *self.stdin.lock().await = Some(stdin);
        }

        {
            let mut state = self.state.lock();
            state.ready = !one_shot;
            state.reader_task = Some(reader_task);
            state.stderr_task = Some(stderr_task);
            state.message_rx = Some(rx);
            state.temp_files = temp_files;
        }

        log::debug!("spawned {} ({:?} mode)", self.cli_path.display(), self.prompt);
        Ok(())
    }

    /// Close the transport and release every resource it owns
    ///
    /// Takes the write mutex before flipping the closed flag inside the
    /// state lock, so no writer that passed its ready check can still be
    /// mid-write when teardown starts. Idempotent.
    pub(super) async fn close_impl(&self) -> Result<()> {
        let mut stdin_guard = self.stdin.lock().await;
        {
            let mut state = self.state.lock();
            state.ready = false;
            state.closed = true;
        }
        if let Some(mut stdin) = stdin_guard.take() {
            let _ = stdin.shutdown().await;
        }
        drop(stdin_guard);

        // Reap, unless the reader already did at EOF.
        let taken = self.child.lock().await.take();
        if let Some(mut child) = taken {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, child.wait()).await {
                Ok(Ok(status)) => {
                    *self.exit_status.lock() = Some(status);
                }
                Ok(Err(e)) => return Err(ClaudeError::Io(e)),
                Err(_) => {
                    log::warn!(
                        "CLI did not exit within {SHUTDOWN_TIMEOUT:?} after stdin close; killing"
                    );
                    let _ = child.kill().await;
                    if let Ok(status) = child.wait().await {
                        *self.exit_status.lock() = Some(status);
                    }
                }
            }
        }

        let (reader_task, stderr_task, temp_files, message_rx) = {
            let mut state = self.state.lock();
            (
                state.reader_task.take(),
                state.stderr_task.take(),
                std::mem::take(&mut state.temp_files),
                state.message_rx.take(),
            )
        };
        drop(message_rx);
        if let Some(mut task) = reader_task {
            // The reader ends on its own once the child is gone and stdout
            // hits EOF; it may be mid-reap, so let it finish before aborting.
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut task).await.is_err() {
                log::warn!("stdout reader did not finish after close; aborting");
                task.abort();
            }
        }
        if let Some(task) = stderr_task {
            task.abort();
        }
        for path in temp_files {
            if let Err(e) = std::fs::remove_file(&path) {
                log::warn!("failed to unlink spill file {}: {e}", path.display());
            }
        }

        Ok(())
    }

    /// Best-effort synchronous cleanup for `Drop`
    pub(super) fn drop_impl(&mut self) {
        let (reader_task, stderr_task, temp_files) = {
            let mut state = self.state.lock();
            state.ready = false;
            state.closed = true;
            (
                state.reader_task.take(),
                state.stderr_task.take(),
                std::mem::take(&mut state.temp_files),
            )
        };
        if let Some(task) = reader_task {
            task.abort();
        }
        if let Some(task) = stderr_task {
            task.abort();
        }
        if let Ok(mut guard) = self.child.try_lock()
            && let Some(child) = guard.as_mut()
        {
            let _ = child.start_kill();
        }
        for path in temp_files {
            let _ = std::fs::remove_file(&path);
        }
    }
}

/// Forward each stderr line to the caller's callback, or to the log
fn spawn_stderr_reader(stderr: ChildStderr, callback: Option<StderrCallback>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match callback {
                Some(ref cb) => cb(&line),
                None => log::debug!("claude stderr: {line}"),
            }
        }
    })
}
