//! In-memory fakes for the command executor (testing only)
//!
//! `ScriptedExecutor` records every invocation it receives and answers with a
//! scripted outcome per program, so harness runs can be asserted without
//! touching the host's package manager.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::CommandFailed;
use crate::invocation::Invocation;
use crate::runner::CommandExecutor;

#[derive(Debug, Clone, Copy)]
enum Script {
    Exit(i32),
    Missing,
}

/// One call observed by [`ScriptedExecutor`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub invocation: Invocation,

    /// Environment the child would have seen, resolved against the
    /// executor's base environment.
    pub environment: BTreeMap<String, String>,
}

/// Executor that succeeds unless told otherwise.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    scripts: HashMap<String, Script>,
    base_env: Vec<(String, String)>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every invocation of `program` exit with `code`.
    pub fn fail_with(mut self, program: &str, code: i32) -> Self {
        self.scripts.insert(program.to_string(), Script::Exit(code));
        self
    }

    /// Make every invocation of `program` fail to launch.
    pub fn missing(mut self, program: &str) -> Self {
        self.scripts.insert(program.to_string(), Script::Missing);
        self
    }

    /// Environment treated as inherited when resolving overrides.
    pub fn with_base_env(mut self, env: Vec<(String, String)>) -> Self {
        self.base_env = env;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls().into_iter().map(|c| c.invocation).collect()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.invocation.program).collect()
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn execute(&self, invocation: &Invocation) -> Result<(), CommandFailed> {
        let environment = invocation.environment(self.base_env.clone());
        self.calls.lock().unwrap().push(RecordedCall {
            invocation: invocation.clone(),
            environment,
        });

        match self.scripts.get(&invocation.program) {
            None | Some(Script::Exit(0)) => Ok(()),
            Some(Script::Exit(code)) => Err(CommandFailed::Exit {
                program: invocation.program.clone(),
                code: Some(*code),
            }),
            Some(Script::Missing) => Err(CommandFailed::Launch {
                program: invocation.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such program"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_script_succeeds() {
        let fake = ScriptedExecutor::new();
        assert!(fake.execute(&Invocation::new("apk").args(["update"])).await.is_ok());
        assert_eq!(fake.programs(), vec!["apk"]);
    }

    #[tokio::test]
    async fn test_recorded_environment_uses_base() {
        let fake = ScriptedExecutor::new()
            .with_base_env(vec![("PATH".to_string(), "/bin".to_string())]);
        fake.execute(&Invocation::new("apt-get").with_env("DEBIAN_FRONTEND", "noninteractive"))
            .await
            .unwrap();

        let calls = fake.calls();
        assert_eq!(calls[0].environment.len(), 2);
        assert_eq!(calls[0].environment["PATH"], "/bin");
    }
}
