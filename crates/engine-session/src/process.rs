//! Engine process handle.
//!
//! One [`EngineProcess`] owns one engine subprocess for the lifetime of a
//! single analysis. The command script is written as soon as the process
//! is up; output is exposed as raw chunks for the caller to parse.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use uci::{CommandScript, GuiCommand, Handshake};

use crate::error::EngineError;
use crate::AnalysisRequest;

/// Size of a single stdout read.
const CHUNK_SIZE: usize = 4096;

/// How long an engine gets to honour `quit` before it is killed.
const QUIT_GRACE: Duration = Duration::from_millis(100);

/// A running engine subprocess.
pub struct EngineProcess {
    child: Child,
    /// Kept open for the session: engines treat EOF on stdin as `quit`.
    stdin: Option<ChildStdin>,
    stdout: ChildStdout,
    pid: Option<u32>,
    terminated: bool,
    exit_status: Option<ExitStatus>,
}

impl EngineProcess {
    /// Spawn `program args...` and send it the script for `request`.
    ///
    /// Equivalent to [`spawn`](Self::spawn) followed by
    /// [`send_script`](Self::send_script).
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidRequest`] if the FEN cannot be scripted (nothing is spawned)
    /// - [`EngineError::Spawn`] if the executable cannot be launched
    /// - [`EngineError::Write`] if the engine closed stdin before the script
    ///   was written; the process has been terminated when this is returned
    pub async fn start<P: AsRef<Path>>(
        program: P,
        args: &[String],
        request: &AnalysisRequest,
        handshake: Handshake,
    ) -> Result<Self, EngineError> {
        let script = request.script(handshake)?;
        let mut process = Self::spawn(program, args)?;
        process.send_script(&script).await?;
        Ok(process)
    }

    /// Launch the engine with piped stdin and stdout.
    ///
    /// The child is created with `kill_on_drop`, so dropping the handle
    /// without calling [`terminate`](Self::terminate) still ends it.
    pub fn spawn<P: AsRef<Path>>(program: P, args: &[String]) -> Result<Self, EngineError> {
        let mut child = Command::new(program.as_ref())
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(EngineError::Spawn)?;

        let stdin = child.stdin.take().ok_or_else(|| {
            EngineError::Spawn(std::io::Error::other("engine stdin was not captured"))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            EngineError::Spawn(std::io::Error::other("engine stdout was not captured"))
        })?;
        let pid = child.id();

        tracing::debug!(
            pid = pid,
            program = %program.as_ref().display(),
            "engine spawned"
        );

        Ok(Self {
            child,
            stdin: Some(stdin),
            stdout,
            pid,
            terminated: false,
            exit_status: None,
        })
    }

    /// Write the whole command script to the engine's stdin.
    ///
    /// On failure the process is terminated before the error is returned.
    pub async fn send_script(&mut self, script: &CommandScript) -> Result<(), EngineError> {
        tracing::debug!(pid = self.pid, commands = script.commands().len(), "sending script");
        if let Err(e) = self.send(&script.to_bytes()).await {
            self.terminate().await;
            return Err(EngineError::Write(e));
        }
        Ok(())
    }

    async fn send(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::BrokenPipe))?;
        stdin.write_all(bytes).await?;
        stdin.flush().await
    }

    /// Read the next chunk of raw output.
    ///
    /// Returns `Ok(None)` once the engine has closed stdout. Chunk
    /// boundaries carry no meaning.
    pub async fn next_chunk(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; CHUNK_SIZE];
        let n = self.stdout.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some(buf))
    }

    /// OS process id, until [`terminate`](Self::terminate) has run.
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// Ask the engine to quit, kill it if it does not, and reap it.
    ///
    /// Idempotent: later calls return the status recorded by the first.
    pub async fn terminate(&mut self) -> Option<ExitStatus> {
        if self.terminated {
            return self.exit_status;
        }
        self.terminated = true;
        let pid = self.pid.take();

        let status = match self.child.try_wait() {
            Ok(Some(status)) => Some(status),
            _ => {
                let graceful = tokio::time::timeout(QUIT_GRACE, async {
                    if let Some(mut stdin) = self.stdin.take() {
                        let quit = format!("{}\n", GuiCommand::Quit);
                        // The engine may already have closed its input.
                        let _ = stdin.write_all(quit.as_bytes()).await;
                    }
                    self.child.wait().await
                })
                .await;
                match graceful {
                    Ok(Ok(status)) => Some(status),
                    _ => {
                        if let Err(e) = self.child.start_kill() {
                            tracing::warn!(pid = pid, error = %e, "failed to kill engine");
                        }
                        match self.child.wait().await {
                            Ok(status) => Some(status),
                            Err(e) => {
                                tracing::warn!(pid = pid, error = %e, "failed to reap engine");
                                None
                            }
                        }
                    }
                }
            }
        };
        self.stdin = None;

        tracing::debug!(pid = pid, status = ?status, "engine terminated");
        self.exit_status = status;
        status
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn request() -> AnalysisRequest {
        AnalysisRequest::new("8/8/8/8/8/8/8/K6k w - - 0 1", 5).unwrap()
    }

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_spawn_nonexistent_executable_returns_error() {
        let result =
            EngineProcess::start("/nonexistent/path/to/engine", &[], &request(), Handshake::Minimal)
                .await;
        match result {
            Err(EngineError::Spawn(_)) => {}
            _ => panic!("Expected Spawn error"),
        }
    }

    #[tokio::test]
    async fn test_invalid_request_spawns_nothing() {
        // The program does not exist, so reaching spawn would produce Spawn instead.
        let bad = AnalysisRequest {
            fen: "a\nb".to_string(),
            depth: 1,
        };
        let result = EngineProcess::start("/nonexistent", &[], &bad, Handshake::Minimal).await;
        assert!(matches!(result, Err(EngineError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_script_is_delivered_in_order() {
        // Echo every received command back, then exit after `go`.
        let mut process = EngineProcess::start(
            "/bin/sh",
            &sh(r#"while read -r l; do echo "got $l"; case "$l" in go*) exit 0;; esac; done"#),
            &request(),
            Handshake::NewGame,
        )
        .await
        .unwrap();

        let mut output = Vec::new();
        while let Some(chunk) = process.next_chunk().await.unwrap() {
            output.extend(chunk);
        }
        let text = String::from_utf8(output).unwrap();
        assert_eq!(
            text,
            "got uci\ngot ucinewgame\ngot position fen 8/8/8/8/8/8/8/K6k w - - 0 1\ngot go depth 5\n"
        );

        let status = process.terminate().await;
        assert!(status.is_some());
    }

    #[tokio::test]
    async fn test_terminate_is_idempotent() {
        // Ignores stdin entirely, so only a kill ends it.
        let mut process = EngineProcess::start(
            "/bin/sh",
            &sh("exec sleep 30"),
            &request(),
            Handshake::Minimal,
        )
        .await
        .unwrap();
        assert!(process.id().is_some());

        let first = process.terminate().await;
        assert_eq!(process.id(), None);
        let second = process.terminate().await;
        assert_eq!(first, second);
        // Killed by signal, so no exit code.
        assert_eq!(first.and_then(|s| s.code()), None);
    }

    #[tokio::test]
    async fn test_terminate_sends_quit_first() {
        let mut process = EngineProcess::start(
            "/bin/sh",
            &sh(r#"while read -r l; do [ "$l" = quit ] && exit 7; done; exit 1"#),
            &request(),
            Handshake::Minimal,
        )
        .await
        .unwrap();

        let status = process.terminate().await;
        assert_eq!(status.and_then(|s| s.code()), Some(7));
    }

    #[tokio::test]
    async fn test_send_script_after_exit_is_write_error() {
        let mut process = EngineProcess::spawn("/bin/sh", &sh("exit 0")).unwrap();
        // Let the shell exit and close its end of the pipe.
        process.child.wait().await.unwrap();

        let script = request().script(Handshake::Minimal).unwrap();
        let result = process.send_script(&script).await;

        assert!(matches!(result, Err(EngineError::Write(_))));
        assert_eq!(process.id(), None);
    }
}
