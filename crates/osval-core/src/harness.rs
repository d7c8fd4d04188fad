//! Run orchestration: diagnostics, group selection, fail-fast step execution.

use crate::diagnostics::{linux_diagnostics, run_diagnostics, DiagnosticsSummary};
use crate::error::{HarnessError, HarnessResult};
use crate::group::{PackageManager, Step, StepKind};
use crate::host::HostDescriptor;
use crate::invocation::Invocation;
use crate::obs;
use crate::runner::CommandRunner;
use crate::selector::{select_group, Selection};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Knobs for a harness run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Package for the install step; `None` uses the manager's default.
    pub sample_package: Option<String>,

    /// Whether Linux hosts run the diagnostics list first.
    pub run_diagnostics: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            sample_package: None,
            run_diagnostics: true,
        }
    }
}

impl HarnessConfig {
    pub fn with_sample_package(mut self, package: impl Into<String>) -> Self {
        self.sample_package = Some(package.into());
        self
    }

    pub fn without_diagnostics(mut self) -> Self {
        self.run_diagnostics = false;
        self
    }
}

/// Everything a run would execute on a host, in order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunPlan {
    pub selection: Selection,
    pub diagnostics: Vec<Invocation>,
    pub steps: Vec<Step>,
}

/// A step that ran and passed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepRecord {
    pub manager: PackageManager,
    pub kind: StepKind,
    pub command: String,
    pub duration_ms: u64,
}

/// Result of a run in which no fatal step failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub host: HostDescriptor,
    pub selection: Selection,

    /// `None` when diagnostics did not run (non-Linux, or disabled).
    pub diagnostics: Option<DiagnosticsSummary>,

    pub steps: Vec<StepRecord>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn passed_count(&self) -> usize {
        self.steps.len()
    }

    /// Whether a package-manager group was exercised at all.
    pub fn ran_group(&self) -> bool {
        self.selection.manager().is_some()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Drives one validation run against a host.
#[derive(Debug, Clone)]
pub struct Harness {
    runner: CommandRunner,
    config: HarnessConfig,
}

impl Harness {
    pub fn new(runner: CommandRunner, config: HarnessConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// What [`Harness::run`] would execute on `host`, without executing it.
    pub fn plan(&self, host: &HostDescriptor) -> RunPlan {
        let selection = select_group(host);
        let diagnostics = if self.diagnostics_enabled(host) {
            linux_diagnostics()
        } else {
            Vec::new()
        };
        let steps = selection
            .manager()
            .map(|m| m.steps(self.config.sample_package.as_deref()))
            .unwrap_or_default();
        RunPlan {
            selection,
            diagnostics,
            steps,
        }
    }

    /// Execute a full run.
    ///
    /// Steps run strictly one after another. The first failing step is logged
    /// as a failed assertion and returned as [`HarnessError::StepFailed`];
    /// nothing after it runs. Hosts with no matching group succeed with an
    /// empty step list.
    pub async fn run(&self, host: &HostDescriptor) -> HarnessResult<RunReport> {
        let run_id = Uuid::new_v4().to_string();
        let span = obs::run_span(&run_id);
        self.run_inner(host, run_id).instrument(span).await
    }

    async fn run_inner(&self, host: &HostDescriptor, run_id: String) -> HarnessResult<RunReport> {
        let started_at = Utc::now();
        let start = Instant::now();

        obs::emit_run_started(&run_id);
        obs::emit_host_detected(host);

        let diagnostics = if self.diagnostics_enabled(host) {
            let summary = run_diagnostics(&self.runner).await;
            obs::emit_diagnostics_finished(&summary);
            Some(summary)
        } else {
            None
        };

        let selection = select_group(host);
        let mut records = Vec::new();

        match &selection {
            Selection::NoGroup(reason) => obs::emit_group_skipped(reason),
            Selection::Group(manager) => {
                obs::emit_group_selected(manager.name());
                for step in manager.steps(self.config.sample_package.as_deref()) {
                    match self.run_step(&step).await {
                        Ok(record) => records.push(record),
                        Err(e) => {
                            obs::emit_run_finished(
                                &run_id,
                                start.elapsed().as_millis() as u64,
                                records.len(),
                                false,
                            );
                            return Err(e);
                        }
                    }
                }
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        obs::emit_run_finished(&run_id, duration_ms, records.len(), true);

        Ok(RunReport {
            run_id,
            host: host.clone(),
            selection,
            diagnostics,
            steps: records,
            started_at,
            duration_ms,
        })
    }

    async fn run_step(&self, step: &Step) -> HarnessResult<StepRecord> {
        obs::emit_step_started(step);
        let start = Instant::now();

        if let Err(source) = self.runner.run_checked(&step.invocation).await {
            obs::emit_step_failed(step, &source);
            return Err(HarnessError::StepFailed {
                manager: step.manager,
                step: step.kind,
                source,
            });
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        obs::emit_step_passed(step, duration_ms);
        Ok(StepRecord {
            manager: step.manager,
            kind: step.kind,
            command: step.invocation.command_line(),
            duration_ms,
        })
    }

    fn diagnostics_enabled(&self, host: &HostDescriptor) -> bool {
        self.config.run_diagnostics && host.os.is_linux()
    }
}
