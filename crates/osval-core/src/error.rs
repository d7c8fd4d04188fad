//! Error types for osval-core

use thiserror::Error;

use crate::group::{PackageManager, StepKind};

/// Result type for fatal-tier harness operations.
pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

/// A wrapped process did not run to a clean exit.
#[derive(Error, Debug)]
pub enum CommandFailed {
    /// The program could not be started at all (missing binary, permissions).
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran but exited non-zero or was killed by a signal.
    #[error("`{program}` {}", describe_exit(.code))]
    Exit { program: String, code: Option<i32> },
}

impl CommandFailed {
    /// Program that failed.
    pub fn program(&self) -> &str {
        match self {
            CommandFailed::Launch { program, .. } | CommandFailed::Exit { program, .. } => program,
        }
    }

    /// Exit code, if the process ran and exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandFailed::Exit { code, .. } => *code,
            CommandFailed::Launch { .. } => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

/// Errors that abort a harness run.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// A package-manager step failed its assertion.
    #[error("{manager} {step} step failed: {source}")]
    StepFailed {
        manager: PackageManager,
        step: StepKind,
        #[source]
        source: CommandFailed,
    },
}
