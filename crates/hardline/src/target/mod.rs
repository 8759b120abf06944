//! The system being evaluated.
//!
//! Rules never talk to the system directly: they read frozen views through
//! a [`TargetConfig`](crate::snapshot::TargetConfig) and remediate through
//! the mutators of [`TargetSystem`].

mod views;

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use hardline_common::{HardlineError, HardlineResult};
use hardline_lsm::Mode;

pub use views::{
    BootloaderView, Connection, Filesystem, InterfaceType, LsmState, NetworkView, SecurityView,
    StorageView,
};

/// Access to the configuration of the system being evaluated.
///
/// Fetchers return `None` when the corresponding subsystem is not
/// available. Mutators are used by remediation actions and must be
/// idempotent.
pub trait TargetSystem: Send + Sync {
    /// Fetch the storage layout.
    fn storage(&self) -> Option<StorageView>;

    /// Fetch the bootloader settings.
    fn bootloader(&self) -> Option<BootloaderView>;

    /// Fetch the network configuration.
    fn network(&self) -> Option<NetworkView>;

    /// Fetch the security toggles.
    fn security(&self) -> Option<SecurityView>;

    /// Enable the firewall.
    ///
    /// # Errors
    ///
    /// Returns an error if the firewall cannot be enabled.
    fn enable_firewall(&self) -> HardlineResult<()> {
        Err(unsupported("enabling the firewall"))
    }

    /// Bring a network connection down permanently.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be changed.
    fn deactivate_connection(&self, name: &str) -> HardlineResult<()> {
        let _ = name;
        Err(unsupported("deactivating network connections"))
    }

    /// Switch the security module to `mode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the mode cannot be changed.
    fn set_lsm_mode(&self, mode: &'static Mode) -> HardlineResult<()> {
        let _ = mode;
        Err(unsupported("changing the security module mode"))
    }
}

fn unsupported(what: &str) -> HardlineError {
    HardlineError::Remediation {
        message: format!("{what} is not supported by this target"),
    }
}

/// Serializable description of a whole target system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemState {
    /// Storage layout, if known.
    #[serde(default)]
    pub storage: Option<StorageView>,
    /// Bootloader settings, if known.
    #[serde(default)]
    pub bootloader: Option<BootloaderView>,
    /// Network configuration, if known.
    #[serde(default)]
    pub network: Option<NetworkView>,
    /// Security toggles, if known.
    #[serde(default)]
    pub security: Option<SecurityView>,
}

/// A target system held in memory, optionally backed by a JSON state file
/// that remediation writes back to.
#[derive(Debug, Default)]
pub struct InMemorySystem {
    state: Mutex<SystemState>,
    backing_file: Option<PathBuf>,
}

impl InMemorySystem {
    /// Create a system from a state description.
    #[must_use]
    pub fn new(state: SystemState) -> Self {
        Self {
            state: Mutex::new(state),
            backing_file: None,
        }
    }

    /// Load a system from a JSON state file. Remediation persists changes
    /// to the same file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> HardlineResult<Self> {
        let path = path.into();
        let json = fs::read_to_string(&path)?;
        let state: SystemState = serde_json::from_str(&json)?;

        tracing::debug!(path = %path.display(), "Loaded target system state");

        Ok(Self {
            state: Mutex::new(state),
            backing_file: Some(path),
        })
    }

    /// Copy of the current state.
    #[must_use]
    pub fn state(&self) -> SystemState {
        self.state.lock().clone()
    }

    /// The backing file, if any.
    #[must_use]
    pub fn backing_file(&self) -> Option<&Path> {
        self.backing_file.as_deref()
    }

    fn update(&self, what: &str, f: impl FnOnce(&mut SystemState) -> HardlineResult<()>) -> HardlineResult<()> {
        let mut state = self.state.lock();
        f(&mut state)?;

        if let Some(path) = &self.backing_file {
            let json = serde_json::to_string_pretty(&*state)?;
            fs::write(path, json)?;
            tracing::debug!(path = %path.display(), change = what, "Saved target system state");
        }

        Ok(())
    }
}

impl TargetSystem for InMemorySystem {
    fn storage(&self) -> Option<StorageView> {
        self.state.lock().storage.clone()
    }

    fn bootloader(&self) -> Option<BootloaderView> {
        self.state.lock().bootloader.clone()
    }

    fn network(&self) -> Option<NetworkView> {
        self.state.lock().network.clone()
    }

    fn security(&self) -> Option<SecurityView> {
        self.state.lock().security.clone()
    }

    fn enable_firewall(&self) -> HardlineResult<()> {
        self.update("firewall", |state| {
            state.security.get_or_insert_with(SecurityView::default).firewall_enabled = true;
            Ok(())
        })?;
        tracing::info!("Firewall enabled");
        Ok(())
    }

    fn deactivate_connection(&self, name: &str) -> HardlineResult<()> {
        self.update("network", |state| {
            let connection = state
                .network
                .as_mut()
                .and_then(|network| network.connections.iter_mut().find(|c| c.name == name))
                .ok_or_else(|| HardlineError::Remediation {
                    message: format!("network connection {name} does not exist"),
                })?;
            connection.active = false;
            Ok(())
        })?;
        tracing::info!(connection = name, "Network connection deactivated");
        Ok(())
    }

    fn set_lsm_mode(&self, mode: &'static Mode) -> HardlineResult<()> {
        self.update("lsm", |state| {
            let lsm = state
                .security
                .get_or_insert_with(SecurityView::default)
                .lsm
                .get_or_insert_with(LsmState::default);
            lsm.boot_params.apply_mode(mode);
            lsm.config_mode = Some(mode.id().to_string());
            Ok(())
        })?;
        tracing::info!(mode = %mode, "Security module mode changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hardline_lsm::ModeId;

    fn state() -> SystemState {
        SystemState {
            network: Some(NetworkView {
                connections: vec![Connection::new("wlan0", InterfaceType::Wireless, true)],
            }),
            security: Some(SecurityView::default()),
            ..SystemState::default()
        }
    }

    #[test]
    fn mutators_change_state() {
        let system = InMemorySystem::new(state());
        system.enable_firewall().unwrap();
        system.deactivate_connection("wlan0").unwrap();
        system.set_lsm_mode(Mode::get(ModeId::Enforcing)).unwrap();

        let security = system.security().unwrap();
        assert!(security.firewall_enabled);
        assert_eq!(security.lsm.unwrap().mode().id(), ModeId::Enforcing);
        assert!(!system.network().unwrap().connections[0].active);
    }

    #[test]
    fn mutators_are_idempotent() {
        let system = InMemorySystem::new(state());
        system.enable_firewall().unwrap();
        let once = system.state();
        system.enable_firewall().unwrap();
        assert_eq!(system.state(), once);
    }

    #[test]
    fn unknown_connection_is_an_error() {
        let system = InMemorySystem::new(state());
        let err = system.deactivate_connection("eth9").unwrap_err();
        assert!(matches!(err, HardlineError::Remediation { .. }));
    }

    #[test]
    fn backing_file_is_updated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system.json");
        fs::write(&path, serde_json::to_string(&state()).unwrap()).unwrap();

        let system = InMemorySystem::open(&path).unwrap();
        system.enable_firewall().unwrap();

        let reloaded = InMemorySystem::open(&path).unwrap();
        assert!(reloaded.security().unwrap().firewall_enabled);
        assert!(reloaded.storage().is_none());
    }
}
