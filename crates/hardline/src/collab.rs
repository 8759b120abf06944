//! Package and service collaborators used by the manager.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use parking_lot::Mutex;

use hardline_common::{HardlineError, HardlineResult};

/// Purpose tag for packages required by the enabled security policy.
pub const SECURITY_POLICY_PURPOSE: &str = "security_policy";

/// Selects packages for installation.
pub trait PackageSelector: Send + Sync {
    /// Add `packages` under the `purpose` tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection cannot be changed.
    fn select(&self, purpose: &str, packages: &[String]) -> HardlineResult<()>;

    /// Remove `packages` from the `purpose` tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection cannot be changed.
    fn deselect(&self, purpose: &str, packages: &[String]) -> HardlineResult<()>;
}

/// Package selection kept in memory. Clones share the same selection.
#[derive(Debug, Clone, Default)]
pub struct PackageSelection {
    selected: Arc<Mutex<BTreeMap<String, BTreeSet<String>>>>,
}

impl PackageSelection {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Packages selected under `purpose`, sorted.
    #[must_use]
    pub fn packages(&self, purpose: &str) -> Vec<String> {
        self.selected
            .lock()
            .get(purpose)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl PackageSelector for PackageSelection {
    fn select(&self, purpose: &str, packages: &[String]) -> HardlineResult<()> {
        self.selected
            .lock()
            .entry(purpose.to_string())
            .or_default()
            .extend(packages.iter().cloned());
        tracing::debug!(purpose, ?packages, "Packages selected");
        Ok(())
    }

    fn deselect(&self, purpose: &str, packages: &[String]) -> HardlineResult<()> {
        let mut selected = self.selected.lock();
        if let Some(set) = selected.get_mut(purpose) {
            for package in packages {
                set.remove(package);
            }
            if set.is_empty() {
                selected.remove(purpose);
            }
        }
        tracing::debug!(purpose, ?packages, "Packages deselected");
        Ok(())
    }
}

/// Enables system services.
pub trait ServiceManager: Send + Sync {
    /// Enable `name` so it starts on the next boot.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot be enabled.
    fn enable(&self, name: &str) -> HardlineResult<()>;
}

/// Enables services with `systemctl`, inside `root` when it is not `/`.
#[derive(Debug, Clone)]
pub struct Systemctl {
    root: PathBuf,
}

impl Systemctl {
    /// Manage the services of the system installed at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn args(&self, name: &str) -> Vec<String> {
        let mut args = Vec::new();
        if self.root != std::path::Path::new("/") {
            args.push(format!("--root={}", self.root.display()));
        }
        args.push("enable".to_string());
        args.push(name.to_string());
        args
    }
}

impl ServiceManager for Systemctl {
    fn enable(&self, name: &str) -> HardlineResult<()> {
        let args = self.args(name);
        tracing::debug!(?args, "Running systemctl");

        let output = Command::new("systemctl")
            .args(&args)
            .output()
            .map_err(|e| spawn_error(&e, name))?;

        if !output.status.success() {
            return Err(HardlineError::Config {
                message: format!(
                    "Failed to enable service {name}: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        tracing::info!(service = name, "Service enabled");
        Ok(())
    }
}

fn spawn_error(e: &std::io::Error, service: &str) -> HardlineError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => HardlineError::PermissionDenied {
            operation: format!("enable service {service}"),
        },
        _ => HardlineError::Internal {
            message: format!("Failed to run systemctl: {e}"),
        },
    }
}

/// Records enabled services without touching the system. Clones share the
/// same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingServices {
    enabled: Arc<Mutex<Vec<String>>>,
}

impl RecordingServices {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Services enabled so far, in order.
    #[must_use]
    pub fn enabled(&self) -> Vec<String> {
        self.enabled.lock().clone()
    }
}

impl ServiceManager for RecordingServices {
    fn enable(&self, name: &str) -> HardlineResult<()> {
        let mut enabled = self.enabled.lock();
        if !enabled.iter().any(|service| service == name) {
            enabled.push(name.to_string());
        }
        Ok(())
    }
}
