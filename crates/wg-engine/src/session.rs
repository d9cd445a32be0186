//! Scoped engine process session.
//!
//! A session owns the engine child process. Dropping a session that was
//! not finished kills and reaps the process, so no error path can leak a
//! running simulator.

use std::process::{Child, Command, Stdio};

use crate::error::{EngineError, EngineResult};

const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Clone, Default)]
pub struct SessionOutput {
    pub stdout: String,
    pub stderr: String,
}

pub struct EngineSession {
    program: String,
    child: Option<Child>,
}

impl EngineSession {
    /// Spawn `command` with captured output.
    pub fn start(command: &mut Command) -> EngineResult<Self> {
        let program = command.get_program().to_string_lossy().into_owned();
        let child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EngineError::Launch {
                program: program.clone(),
                source,
            })?;
        tracing::debug!(program = %program, pid = child.id(), "engine session started");
        Ok(Self {
            program,
            child: Some(child),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Block until the engine exits; a non-zero exit becomes an error
    /// carrying the tail of its stderr.
    pub fn finish(mut self) -> EngineResult<SessionOutput> {
        let Some(child) = self.child.take() else {
            return Ok(SessionOutput::default());
        };
        let output = child.wait_with_output()?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        tracing::debug!(program = %self.program, status = %output.status, "engine session finished");

        if !output.status.success() {
            return Err(EngineError::Exit {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: tail_lines(&stderr, STDERR_TAIL_LINES),
            });
        }
        Ok(SessionOutput { stdout, stderr })
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        if let Ok(Some(_)) = child.try_wait() {
            return;
        }
        tracing::warn!(program = %self.program, pid = child.id(), "killing unfinished engine session");
        let _ = child.kill();
        let _ = child.wait();
    }
}

fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_last_lines() {
        let text = (1..=30).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let tail = tail_lines(&text, 3);
        assert_eq!(tail, "28\n29\n30");
        assert_eq!(tail_lines("one", 5), "one");
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let err = EngineSession::start(&mut Command::new("/nonexistent/engine-binary"))
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::Launch { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_reports_stderr() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo first >&2; echo 'engine exploded' >&2; exit 3"]);
        let err = EngineSession::start(&mut cmd).unwrap().finish().unwrap_err();
        match err {
            EngineError::Exit { stderr, .. } => assert!(stderr.contains("engine exploded")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn dropping_unfinished_session_kills_process() {
        let started = std::time::Instant::now();
        let session = EngineSession::start(Command::new("sleep").arg("30")).unwrap();
        assert!(session.pid().is_some());
        drop(session);
        assert!(started.elapsed().as_secs() < 10);
    }
}
