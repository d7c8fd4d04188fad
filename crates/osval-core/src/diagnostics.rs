//! Read-only Linux inspection commands, logged for context.

use crate::invocation::Invocation;
use crate::runner::CommandRunner;
use serde::{Deserialize, Serialize};

/// Inspection commands in the order they run.
pub fn linux_diagnostics() -> Vec<Invocation> {
    vec![
        Invocation::new("ip").args(["address"]),
        Invocation::new("ip").args(["link"]),
        Invocation::new("ip").args(["route"]),
        Invocation::new("lspci"),
        Invocation::new("lshw"),
    ]
}

/// Tally of a diagnostics pass. Never affects the run outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsSummary {
    pub attempted: usize,
    pub failed: usize,
}

/// Run every diagnostic on the tolerant path.
pub async fn run_diagnostics(runner: &CommandRunner) -> DiagnosticsSummary {
    let mut summary = DiagnosticsSummary::default();
    for invocation in linux_diagnostics() {
        summary.attempted += 1;
        if !runner.run_tolerant(&invocation).await {
            summary.failed += 1;
        }
    }
    summary
}
