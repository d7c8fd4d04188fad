//! End-to-end harness runs against a ScriptedExecutor.

use osval_core::fakes::ScriptedExecutor;
use osval_core::{
    CommandFailed, CommandRunner, Harness, HarnessConfig, HarnessError, HostDescriptor, OsFamily,
    PackageManager, Selection, StepKind,
};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// Collects formatted log output so tests can assert on it.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

fn harness(fake: &Arc<ScriptedExecutor>) -> Harness {
    Harness::new(CommandRunner::new(fake.clone()), HarnessConfig::default())
}

/// Test: ubuntu runs diagnostics, then the three apt steps non-interactively
#[tokio::test]
async fn test_ubuntu_runs_diagnostics_then_apt() {
    let fake = Arc::new(
        ScriptedExecutor::new()
            .with_base_env(vec![("PATH".to_string(), "/usr/bin".to_string())])
            .fail_with("lspci", 1)
            .missing("lshw"),
    );

    let report = harness(&fake)
        .run(&HostDescriptor::linux("ubuntu"))
        .await
        .expect("run should pass despite diagnostic failures");

    assert_eq!(report.selection, Selection::Group(PackageManager::Apt));
    let diagnostics = report.diagnostics.expect("diagnostics should run on linux");
    assert_eq!(diagnostics.attempted, 5);
    assert_eq!(diagnostics.failed, 2);

    let calls = fake.calls();
    let programs: Vec<&str> = calls.iter().map(|c| c.invocation.program.as_str()).collect();
    assert_eq!(
        programs,
        vec!["ip", "ip", "ip", "lspci", "lshw", "apt-get", "apt-get", "apt-get"]
    );

    let apt_calls = &calls[5..];
    assert_eq!(apt_calls[0].invocation.args, vec!["update"]);
    assert!(apt_calls[1].invocation.args.contains(&"dist-upgrade".to_string()));
    assert!(apt_calls[2].invocation.args.contains(&"fortune-mod".to_string()));
    for call in apt_calls {
        assert_eq!(
            call.environment.get("DEBIAN_FRONTEND").map(String::as_str),
            Some("noninteractive")
        );
        assert_eq!(call.environment.get("PATH").map(String::as_str), Some("/usr/bin"));
        assert_eq!(call.environment.len(), 2);
    }

    let kinds: Vec<StepKind> = report.steps.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, StepKind::ORDER.to_vec());
}

/// Test: windows runs nothing and logs that no tests exist
#[tokio::test]
async fn test_windows_runs_nothing() {
    let (logs, _guard) = capture_logs();
    let fake = Arc::new(ScriptedExecutor::new());

    let report = harness(&fake)
        .run(&HostDescriptor::new(OsFamily::Windows, None))
        .await
        .expect("unsupported OS is not a failure");

    assert!(fake.calls().is_empty(), "no command may run on windows");
    assert!(report.diagnostics.is_none());
    assert!(!report.ran_group());
    assert!(report.steps.is_empty());
    assert!(
        logs.contents().contains("no tests implemented for OS windows"),
        "missing skip log line in: {}",
        logs.contents()
    );
}

/// Test: unknown vendor runs diagnostics but no group
#[tokio::test]
async fn test_unrecognized_vendor_runs_no_group() {
    let (logs, _guard) = capture_logs();
    let fake = Arc::new(ScriptedExecutor::new());

    let report = harness(&fake)
        .run(&HostDescriptor::linux("slackware"))
        .await
        .expect("unrecognized vendor is not a failure");

    assert!(!report.ran_group());
    assert_eq!(fake.calls().len(), 5, "only diagnostics should run");
    assert!(logs
        .contents()
        .contains("no tests implemented for vendor slackware"));
}

/// Test: failing yum refresh aborts before upgrade and install
#[tokio::test]
async fn test_yum_failure_aborts_run() {
    let (logs, _guard) = capture_logs();
    let fake = Arc::new(ScriptedExecutor::new().fail_with("yum", 1));

    let err = harness(&fake)
        .run(&HostDescriptor::linux("almalinux"))
        .await
        .expect_err("failing yum must abort the run");

    match err {
        HarnessError::StepFailed {
            manager,
            step,
            source,
        } => {
            assert_eq!(manager, PackageManager::Yum);
            assert_eq!(step, StepKind::Refresh);
            assert!(matches!(source, CommandFailed::Exit { code: Some(1), .. }));
        }
    }

    let yum_calls: Vec<_> = fake
        .invocations()
        .into_iter()
        .filter(|i| i.program == "yum")
        .collect();
    assert_eq!(yum_calls.len(), 1, "no step may run after the failure");
    assert_eq!(yum_calls[0].args, vec!["-y", "makecache"]);

    let output = logs.contents();
    assert!(output.contains("assertion failed: yum should be able to update its cache files"));
    assert!(output.contains("step.failed"));
}

/// Test: a missing package manager binary is as fatal as a non-zero exit
#[tokio::test]
async fn test_missing_package_manager_is_fatal() {
    let fake = Arc::new(ScriptedExecutor::new().missing("apk"));

    let err = harness(&fake)
        .run(&HostDescriptor::linux("alpine"))
        .await
        .expect_err("missing apk must abort the run");

    let HarnessError::StepFailed { step, source, .. } = err;
    assert_eq!(step, StepKind::Refresh);
    assert!(matches!(source, CommandFailed::Launch { .. }));
    assert_eq!(
        fake.programs().iter().filter(|p| p.as_str() == "apk").count(),
        1
    );
}

/// Test: the failing step is the one reported, earlier steps having passed
#[tokio::test]
async fn test_nix_env_failure_stops_at_upgrade() {
    let fake = Arc::new(ScriptedExecutor::new().fail_with("nix-env", 100));
    let config = HarnessConfig::default().without_diagnostics();
    let harness = Harness::new(CommandRunner::new(fake.clone()), config);

    let err = harness
        .run(&HostDescriptor::linux("nixos"))
        .await
        .expect_err("nix-env failure must abort");

    // nix-env --upgrade is the first nix-env call, so the upgrade step fails.
    let HarnessError::StepFailed { step, .. } = err;
    assert_eq!(step, StepKind::Upgrade);
    assert_eq!(fake.programs(), vec!["nix-channel", "nix-env"]);
}
