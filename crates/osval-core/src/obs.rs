//! Structured observability hooks for harness run lifecycle events.
//!
//! This module provides:
//! - A run-scoped tracing span carrying the `run_id`
//! - Emission functions for key lifecycle events: start, host detection,
//!   diagnostics, group selection, each step, and finish
//!
//! Events are emitted at `info!` level, failures at `error!`. Filtering
//! follows `RUST_LOG`; pass `--json` to the CLI for JSON lines.

use crate::diagnostics::DiagnosticsSummary;
use crate::error::CommandFailed;
use crate::group::Step;
use crate::host::HostDescriptor;
use crate::selector::SkipReason;
use tracing::{error, info};

/// Span tagging every event of one run with its `run_id`.
///
/// Attach it to the run future with `tracing::Instrument` so it stays
/// correct across await points.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("osval.run", run_id = %run_id)
}

pub fn emit_run_started(run_id: &str) {
    info!(event = "run.started", run_id = %run_id);
}

/// Emit event: host OS and vendor as detected (or overridden).
pub fn emit_host_detected(host: &HostDescriptor) {
    let vendor = host.vendor.as_ref().map(|v| v.as_str()).unwrap_or("-");
    let pretty = host
        .release
        .as_ref()
        .and_then(|r| r.pretty_name.as_deref())
        .unwrap_or("-");
    info!(event = "host.detected", os = %host.os, vendor = %vendor, release = %pretty);
}

pub fn emit_diagnostics_finished(summary: &DiagnosticsSummary) {
    info!(
        event = "diagnostics.finished",
        attempted = summary.attempted,
        failed = summary.failed,
    );
}

pub fn emit_group_selected(manager: &str) {
    info!(event = "group.selected", manager = %manager);
}

/// Emit event: no group applies; logs the "no tests implemented" reason.
pub fn emit_group_skipped(reason: &SkipReason) {
    info!(event = "group.skipped", "{}", reason);
}

pub fn emit_step_started(step: &Step) {
    info!(
        event = "step.started",
        manager = %step.manager,
        step = %step.kind,
        command = %step.invocation,
        "{}",
        step.description()
    );
}

pub fn emit_step_passed(step: &Step, duration_ms: u64) {
    info!(
        event = "step.passed",
        manager = %step.manager,
        step = %step.kind,
        duration_ms = duration_ms,
    );
}

/// Emit event: a step's assertion failed (error level).
pub fn emit_step_failed(step: &Step, err: &CommandFailed) {
    error!(
        event = "step.failed",
        manager = %step.manager,
        step = %step.kind,
        command = %step.invocation,
        exit_code = ?err.exit_code(),
        error = %err,
        "assertion failed: {}",
        step.description()
    );
}

/// Emit event: run finished with duration and success status.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, steps_passed: usize, success: bool) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        steps_passed = steps_passed,
        success = success,
    );
}
