//! OSVAL Core - package-manager validation for the running host
//!
//! Provides a validation harness that:
//! - Detects the host OS family and Linux distribution vendor
//! - Logs read-only network and hardware diagnostics on Linux
//! - Selects one package-manager group (yum, apt, apk, nix)
//! - Runs its refresh, upgrade and install steps, failing on the first
//!   command that does not exit 0

pub mod diagnostics;
pub mod error;
pub mod fakes;
pub mod group;
pub mod harness;
pub mod host;
pub mod invocation;
pub mod obs;
pub mod runner;
pub mod selector;
pub mod telemetry;

// Re-export key types
pub use diagnostics::{linux_diagnostics, run_diagnostics, DiagnosticsSummary};
pub use error::{CommandFailed, HarnessError, HarnessResult};
pub use group::{PackageManager, Step, StepKind};
pub use harness::{Harness, HarnessConfig, RunPlan, RunReport, StepRecord};
pub use host::{detect_host, HostDescriptor, HostDetector, OsFamily, OsRelease, Vendor};
pub use invocation::{EnvOverride, Invocation};
pub use runner::{CommandExecutor, CommandRunner, ProcessExecutor};
pub use selector::{group_for_vendor, select_group, Selection, SkipReason, VENDOR_GROUPS};
pub use telemetry::init_tracing;
