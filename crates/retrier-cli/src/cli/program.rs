//! The retried action: spawn a program and wait for its exit status.

use retrier_core::Action;
use std::fmt;
use std::sync::Arc;

/// Why one run of the program did not count as a success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramFailure {
    /// The program could not be started (not found, permission denied, ...).
    Spawn(String),
    /// The program exited non-zero; `None` if it was killed by a signal.
    Exit(Option<i32>),
}

impl fmt::Display for ProgramFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramFailure::Spawn(e) => write!(f, "failed to start: {}", e),
            ProgramFailure::Exit(Some(code)) => write!(f, "exited with status {}", code),
            ProgramFailure::Exit(None) => write!(f, "terminated by signal"),
        }
    }
}

impl std::error::Error for ProgramFailure {}

/// Build an action that runs `argv` once per attempt.
pub fn program_action(argv: Vec<String>) -> impl Action<Value = (), Error = ProgramFailure> {
    let argv = Arc::new(argv);
    move || {
        let argv = Arc::clone(&argv);
        async move { run_once(&argv).await }
    }
}

async fn run_once(argv: &[String]) -> Result<(), ProgramFailure> {
    let Some((program, args)) = argv.split_first() else {
        return Err(ProgramFailure::Spawn("empty command".to_string()));
    };
    let status = tokio::process::Command::new(program)
        .args(args)
        .status()
        .await
        .map_err(|e| ProgramFailure::Spawn(e.to_string()))?;
    if status.success() {
        Ok(())
    } else {
        tracing::debug!(program = %program, code = ?status.code(), "attempt failed");
        Err(ProgramFailure::Exit(status.code()))
    }
}
