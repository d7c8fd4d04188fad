//! OSVAL - OS package-manager validation CLI
//!
//! The `osval` command checks that the host's package manager works end to
//! end by refreshing its cache, upgrading, and installing a sample package.
//!
//! ## Commands
//!
//! - `run`: detect the host, log diagnostics, run the package-manager group
//! - `detect`: print the detected host as JSON
//! - `plan`: print what `run` would execute, without executing it
//! - `diagnostics`: run only the Linux inspection commands

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use osval_core::{
    run_diagnostics, CommandRunner, Harness, HarnessConfig, HostDescriptor, HostDetector,
    RunPlan, Vendor,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "osval")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate the host's package manager end to end", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run diagnostics and the package-manager group for this host
    Run {
        #[command(flatten)]
        host: HostArgs,

        #[command(flatten)]
        harness: HarnessArgs,
    },

    /// Print the detected host descriptor
    Detect {
        #[command(flatten)]
        host: HostArgs,
    },

    /// Show the commands `run` would execute, without running them
    Plan {
        #[command(flatten)]
        host: HostArgs,

        #[command(flatten)]
        harness: HarnessArgs,
    },

    /// Run only the Linux network and hardware diagnostics
    Diagnostics,
}

#[derive(Args, Debug, Clone, Default)]
struct HostArgs {
    /// Use this vendor id instead of the one in os-release
    #[arg(long, env = "OSVAL_VENDOR")]
    vendor: Option<String>,

    /// Read this os-release file instead of /etc/os-release
    #[arg(long, env = "OSVAL_OS_RELEASE")]
    os_release: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
struct HarnessArgs {
    /// Package to install in the install step (default depends on the manager)
    #[arg(short, long, env = "OSVAL_SAMPLE_PACKAGE")]
    package: Option<String>,

    /// Skip the Linux diagnostics commands
    #[arg(long, env = "OSVAL_SKIP_DIAGNOSTICS")]
    skip_diagnostics: bool,
}

impl HarnessArgs {
    fn to_config(&self) -> HarnessConfig {
        let mut config = HarnessConfig::default();
        if let Some(package) = &self.package {
            config = config.with_sample_package(package.clone());
        }
        if self.skip_diagnostics {
            config = config.without_diagnostics();
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    osval_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Run { host, harness } => cmd_run(&host, &harness).await,
        Commands::Detect { host } => cmd_detect(&host).await,
        Commands::Plan { host, harness } => cmd_plan(&host, &harness).await,
        Commands::Diagnostics => cmd_diagnostics().await,
    }
}

/// Detect the host, then apply any vendor override.
async fn resolve_host(args: &HostArgs) -> HostDescriptor {
    let mut detector = HostDetector::new();
    if let Some(path) = &args.os_release {
        detector = detector.with_os_release(path.clone());
    }
    let host = detector.detect().await;

    match &args.vendor {
        Some(vendor) => {
            info!(vendor = %vendor, "Overriding detected vendor");
            host.with_vendor(Vendor::new(vendor))
        }
        None => host,
    }
}

/// Run the full validation
async fn cmd_run(host_args: &HostArgs, harness_args: &HarnessArgs) -> Result<()> {
    let host = resolve_host(host_args).await;
    let harness = Harness::new(CommandRunner::process(), harness_args.to_config());

    let report = harness
        .run(&host)
        .await
        .context("Package manager validation failed")?;

    println!();
    println!("Run ID: {}", report.run_id);
    println!("Host: {} ({})", report.host.os, describe_vendor(&report.host));
    match report.selection.manager() {
        Some(manager) => println!("Group: {}", manager),
        None => println!("Group: none (no tests implemented)"),
    }
    if let Some(diag) = &report.diagnostics {
        println!(
            "Diagnostics: {} run, {} failed (ignored)",
            diag.attempted, diag.failed
        );
    }
    println!("Duration: {}ms", report.duration_ms);
    println!();

    for step in &report.steps {
        println!("  ✓ {} ({}ms): {}", step.kind, step.duration_ms, step.command);
    }

    println!("Status: ✓ PASSED");
    Ok(())
}

/// Print the detected host descriptor
async fn cmd_detect(host_args: &HostArgs) -> Result<()> {
    let host = resolve_host(host_args).await;
    println!("{}", serde_json::to_string_pretty(&host)?);
    Ok(())
}

#[derive(Serialize)]
struct PlanView<'a> {
    host: &'a HostDescriptor,
    #[serde(flatten)]
    plan: RunPlan,
}

/// Print the selected commands without executing them
async fn cmd_plan(host_args: &HostArgs, harness_args: &HarnessArgs) -> Result<()> {
    let host = resolve_host(host_args).await;
    let harness = Harness::new(CommandRunner::process(), harness_args.to_config());
    let view = PlanView {
        host: &host,
        plan: harness.plan(&host),
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

/// Run the diagnostics list; never fails on command errors
async fn cmd_diagnostics() -> Result<()> {
    let host = HostDetector::new().detect().await;
    if !host.os.is_linux() {
        info!(os = %host.os, "Diagnostics are only implemented for linux");
        return Ok(());
    }

    let summary = run_diagnostics(&CommandRunner::process()).await;
    println!(
        "Diagnostics: {} run, {} failed",
        summary.attempted, summary.failed
    );
    Ok(())
}

fn describe_vendor(host: &HostDescriptor) -> String {
    host.vendor
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}
