//! Package-manager test groups and their steps.

use crate::invocation::Invocation;
use serde::{Deserialize, Serialize};
use std::fmt;

const APT_ENV_KEY: &str = "DEBIAN_FRONTEND";
const APT_ENV_VALUE: &str = "noninteractive";
const APT_KEEP_CONFIG: &str = "Dpkg::Options::=--force-confold";

/// Package managers the harness knows how to drive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PackageManager {
    /// yum -y makecache / upgrade / install
    Yum,

    /// apt-get update / dist-upgrade / install, non-interactive
    Apt,

    /// apk update / upgrade / add
    Apk,

    /// nix-channel --update, nix-env --upgrade / -i
    Nix,
}

impl PackageManager {
    pub const ALL: [PackageManager; 4] = [
        PackageManager::Yum,
        PackageManager::Apt,
        PackageManager::Apk,
        PackageManager::Nix,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PackageManager::Yum => "yum",
            PackageManager::Apt => "apt",
            PackageManager::Apk => "apk",
            PackageManager::Nix => "nix",
        }
    }

    /// Package installed by the install step when none is configured.
    pub fn default_sample_package(&self) -> &'static str {
        match self {
            PackageManager::Yum => "httpd",
            PackageManager::Apt => "fortune-mod",
            PackageManager::Apk => "fortune",
            PackageManager::Nix => "fortune-mod",
        }
    }

    /// Refresh the local package cache or index.
    pub fn refresh(&self) -> Invocation {
        match self {
            PackageManager::Yum => Invocation::new("yum").args(["-y", "makecache"]),
            PackageManager::Apt => apt(["update"]),
            PackageManager::Apk => Invocation::new("apk").args(["update"]),
            PackageManager::Nix => Invocation::new("nix-channel").args(["--update"]),
        }
    }

    /// Upgrade all installed packages without prompting.
    pub fn upgrade(&self) -> Invocation {
        match self {
            PackageManager::Yum => Invocation::new("yum").args(["-y", "upgrade"]),
            PackageManager::Apt => apt(["-o", APT_KEEP_CONFIG, "dist-upgrade", "-q", "-y"]),
            PackageManager::Apk => Invocation::new("apk").args(["upgrade"]),
            PackageManager::Nix => Invocation::new("nix-env").args(["--upgrade"]),
        }
    }

    /// Install `package` without prompting.
    pub fn install(&self, package: &str) -> Invocation {
        match self {
            PackageManager::Yum => Invocation::new("yum").args(["-y", "install", package]),
            PackageManager::Apt => {
                apt(["-o", APT_KEEP_CONFIG, "install", "-q", "-y", package])
            }
            PackageManager::Apk => Invocation::new("apk").args(["add", package]),
            PackageManager::Nix => Invocation::new("nix-env").args(["-i", package]),
        }
    }

    /// The group's three steps in execution order.
    ///
    /// `sample_package` overrides [`Self::default_sample_package`].
    pub fn steps(&self, sample_package: Option<&str>) -> Vec<Step> {
        let package = sample_package.unwrap_or_else(|| self.default_sample_package());
        StepKind::ORDER
            .iter()
            .map(|kind| {
                let invocation = match kind {
                    StepKind::Refresh => self.refresh(),
                    StepKind::Upgrade => self.upgrade(),
                    StepKind::Install => self.install(package),
                };
                Step {
                    manager: *self,
                    kind: *kind,
                    invocation,
                }
            })
            .collect()
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn apt<const N: usize>(args: [&str; N]) -> Invocation {
    Invocation::new("apt-get")
        .args(args)
        .with_env(APT_ENV_KEY, APT_ENV_VALUE)
}

/// Position of a step within its group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Refresh,
    Upgrade,
    Install,
}

impl StepKind {
    pub const ORDER: [StepKind; 3] = [StepKind::Refresh, StepKind::Upgrade, StepKind::Install];

    pub fn name(&self) -> &'static str {
        match self {
            StepKind::Refresh => "refresh",
            StepKind::Upgrade => "upgrade",
            StepKind::Install => "install",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single asserted command within a group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Step {
    pub manager: PackageManager,
    pub kind: StepKind,
    pub invocation: Invocation,
}

impl Step {
    /// The assertion this step makes, e.g. "apk should be able to upgrade
    /// installed packages".
    pub fn description(&self) -> String {
        let action = match self.kind {
            StepKind::Refresh => "update its cache files",
            StepKind::Upgrade => "upgrade installed packages",
            StepKind::Install => "install a new package",
        };
        format!("{} should be able to {}", self.manager, action)
    }
}
