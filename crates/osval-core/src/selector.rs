//! Maps a host descriptor to the package-manager group that runs on it.

use crate::group::PackageManager;
use crate::host::{HostDescriptor, OsFamily, Vendor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Vendor ids (os-release `ID`) and the group each one runs.
pub const VENDOR_GROUPS: &[(&str, PackageManager)] = &[
    ("debian", PackageManager::Apt),
    ("ubuntu", PackageManager::Apt),
    ("almalinux", PackageManager::Yum),
    ("redhat", PackageManager::Yum),
    ("rhel", PackageManager::Yum),
    ("centos", PackageManager::Yum),
    ("rocky", PackageManager::Yum),
    ("fedora", PackageManager::Yum),
    ("amzn", PackageManager::Yum),
    ("alpine", PackageManager::Apk),
    ("nixos", PackageManager::Nix),
];

/// Why no group was selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    UnsupportedOs { os: OsFamily },
    UnrecognizedVendor { vendor: Vendor },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedOs { os } => {
                write!(f, "no tests implemented for OS {}", os)
            }
            SkipReason::UnrecognizedVendor { vendor } => {
                write!(f, "no tests implemented for vendor {}", vendor)
            }
        }
    }
}

/// Outcome of group selection: exactly one group, or none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    Group(PackageManager),
    NoGroup(SkipReason),
}

impl Selection {
    pub fn manager(&self) -> Option<PackageManager> {
        match self {
            Selection::Group(manager) => Some(*manager),
            Selection::NoGroup(_) => None,
        }
    }
}

/// Look a vendor id up in [`VENDOR_GROUPS`].
pub fn group_for_vendor(vendor: &Vendor) -> Option<PackageManager> {
    VENDOR_GROUPS
        .iter()
        .find(|(id, _)| *id == vendor.as_str())
        .map(|(_, manager)| *manager)
}

/// Choose the group for `host`. Pure; performs no I/O.
pub fn select_group(host: &HostDescriptor) -> Selection {
    if !host.os.is_linux() {
        return Selection::NoGroup(SkipReason::UnsupportedOs {
            os: host.os.clone(),
        });
    }

    let vendor = host.vendor.clone().unwrap_or_else(Vendor::unrecognized);
    match group_for_vendor(&vendor) {
        Some(manager) => Selection::Group(manager),
        None => Selection::NoGroup(SkipReason::UnrecognizedVendor { vendor }),
    }
}
