//! Host OS family and Linux distribution vendor detection.
//!
//! The vendor is the `ID=` field of os-release(5). Anything that goes wrong
//! while reading it yields [`Vendor::unrecognized`] rather than an error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Standard os-release locations, in lookup order.
pub const OS_RELEASE_PATHS: [&str; 2] = ["/etc/os-release", "/usr/lib/os-release"];

/// Operating system family of the running host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsFamily {
    Linux,
    MacOs,
    Windows,
    FreeBsd,
    Other(String),
}

impl OsFamily {
    /// Family of the platform this binary was built for.
    pub fn current() -> Self {
        Self::from_name(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` style name onto a family.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "linux" => OsFamily::Linux,
            "macos" | "darwin" => OsFamily::MacOs,
            "windows" => OsFamily::Windows,
            "freebsd" => OsFamily::FreeBsd,
            other => OsFamily::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OsFamily::Linux => "linux",
            OsFamily::MacOs => "macos",
            OsFamily::Windows => "windows",
            OsFamily::FreeBsd => "freebsd",
            OsFamily::Other(name) => name,
        }
    }

    pub fn is_linux(&self) -> bool {
        matches!(self, OsFamily::Linux)
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distribution vendor identifier, lower-cased (e.g. `ubuntu`, `almalinux`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vendor(String);

impl Vendor {
    pub const UNRECOGNIZED: &'static str = "unknown";

    pub fn new(id: impl AsRef<str>) -> Self {
        let id = id.as_ref().trim().to_ascii_lowercase();
        if id.is_empty() {
            Self::unrecognized()
        } else {
            Vendor(id)
        }
    }

    pub fn unrecognized() -> Self {
        Vendor(Self::UNRECOGNIZED.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_recognized(&self) -> bool {
        self.0 != Self::UNRECOGNIZED
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields of os-release the harness reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsRelease {
    pub id: Option<String>,
    pub name: Option<String>,
    pub version_id: Option<String>,
    pub pretty_name: Option<String>,
}

impl OsRelease {
    /// Parse os-release(5) `KEY=value` lines. Unknown keys, comments and
    /// malformed lines are ignored.
    pub fn parse(content: &str) -> Self {
        let mut release = OsRelease::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = unquote(value.trim());
            match key.trim() {
                "ID" => release.id = Some(value),
                "NAME" => release.name = Some(value),
                "VERSION_ID" => release.version_id = Some(value),
                "PRETTY_NAME" => release.pretty_name = Some(value),
                _ => {}
            }
        }
        release
    }

    pub fn vendor(&self) -> Vendor {
        self.id
            .as_deref()
            .map(Vendor::new)
            .unwrap_or_else(Vendor::unrecognized)
    }
}

fn unquote(value: &str) -> String {
    let stripped = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);
    stripped.replace("\\\"", "\"")
}

/// What the harness knows about the host. Read once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDescriptor {
    pub os: OsFamily,

    /// Present only on Linux.
    pub vendor: Option<Vendor>,

    /// Informational os-release fields; never used for selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<OsRelease>,
}

impl HostDescriptor {
    pub fn new(os: OsFamily, vendor: Option<Vendor>) -> Self {
        let vendor = if os.is_linux() { vendor } else { None };
        Self {
            os,
            vendor,
            release: None,
        }
    }

    /// Linux host with the given vendor id.
    pub fn linux(vendor: impl AsRef<str>) -> Self {
        Self::new(OsFamily::Linux, Some(Vendor::new(vendor)))
    }

    /// Replace the vendor (ignored for non-Linux hosts).
    pub fn with_vendor(mut self, vendor: Vendor) -> Self {
        if self.os.is_linux() {
            self.vendor = Some(vendor);
        }
        self
    }
}

/// Reads the host descriptor from the running system.
#[derive(Debug, Clone)]
pub struct HostDetector {
    os: OsFamily,
    os_release_paths: Vec<PathBuf>,
}

impl Default for HostDetector {
    fn default() -> Self {
        Self {
            os: OsFamily::current(),
            os_release_paths: OS_RELEASE_PATHS.iter().map(PathBuf::from).collect(),
        }
    }
}

impl HostDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read os-release from `path` only, instead of the standard locations.
    pub fn with_os_release(mut self, path: impl Into<PathBuf>) -> Self {
        self.os_release_paths = vec![path.into()];
        self
    }

    /// Pretend to be running on `os`.
    pub fn with_os(mut self, os: OsFamily) -> Self {
        self.os = os;
        self
    }

    pub async fn detect(&self) -> HostDescriptor {
        if !self.os.is_linux() {
            return HostDescriptor::new(self.os.clone(), None);
        }

        match self.read_os_release().await {
            Some(release) => HostDescriptor {
                os: OsFamily::Linux,
                vendor: Some(release.vendor()),
                release: Some(release),
            },
            None => HostDescriptor::new(OsFamily::Linux, Some(Vendor::unrecognized())),
        }
    }

    async fn read_os_release(&self) -> Option<OsRelease> {
        for path in &self.os_release_paths {
            match read_file(path).await {
                Ok(content) => return Some(OsRelease::parse(&content)),
                Err(e) => debug!(path = %path.display(), error = %e, "os-release not readable"),
            }
        }
        None
    }
}

async fn read_file(path: &Path) -> std::io::Result<String> {
    tokio::fs::read_to_string(path).await
}

/// Detect the running host using the standard os-release locations.
pub async fn detect_host() -> HostDescriptor {
    HostDetector::new().detect().await
}
