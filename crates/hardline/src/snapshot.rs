//! Per-evaluation snapshot of the target configuration.

use std::fmt;
use std::sync::Arc;

use once_cell::unsync::OnceCell;

use crate::rule::Scope;
use crate::target::{
    BootloaderView, InMemorySystem, NetworkView, SecurityView, StorageView, SystemState,
    TargetSystem,
};

/// A frozen view of the target system for one evaluation pass.
///
/// Each view is fetched from the [`TargetSystem`] on first access and
/// cached for the lifetime of the snapshot, so every rule evaluated against
/// the same snapshot observes the same data. A missing view is cached too.
pub struct TargetConfig {
    system: Arc<dyn TargetSystem>,
    storage: OnceCell<Option<StorageView>>,
    bootloader: OnceCell<Option<BootloaderView>>,
    network: OnceCell<Option<NetworkView>>,
    security: OnceCell<Option<SecurityView>>,
}

impl TargetConfig {
    /// Create a snapshot over `system`. Nothing is fetched yet.
    pub fn new(system: Arc<dyn TargetSystem>) -> Self {
        Self {
            system,
            storage: OnceCell::new(),
            bootloader: OnceCell::new(),
            network: OnceCell::new(),
            security: OnceCell::new(),
        }
    }

    /// Create a snapshot over an in-memory system holding `state`.
    #[must_use]
    pub fn from_state(state: SystemState) -> Self {
        Self::new(Arc::new(InMemorySystem::new(state)))
    }

    /// The system this snapshot was taken from; remediation goes here.
    #[must_use]
    pub fn system(&self) -> &Arc<dyn TargetSystem> {
        &self.system
    }

    /// Storage layout.
    pub fn storage(&self) -> Option<&StorageView> {
        self.storage
            .get_or_init(|| {
                tracing::debug!("Fetching storage view");
                self.system.storage()
            })
            .as_ref()
    }

    /// Bootloader settings.
    pub fn bootloader(&self) -> Option<&BootloaderView> {
        self.bootloader
            .get_or_init(|| {
                tracing::debug!("Fetching bootloader view");
                self.system.bootloader()
            })
            .as_ref()
    }

    /// Network configuration.
    pub fn network(&self) -> Option<&NetworkView> {
        self.network
            .get_or_init(|| {
                tracing::debug!("Fetching network view");
                self.system.network()
            })
            .as_ref()
    }

    /// Security toggles (firewall, security module).
    pub fn firewall(&self) -> Option<&SecurityView> {
        self.security
            .get_or_init(|| {
                tracing::debug!("Fetching security view");
                self.system.security()
            })
            .as_ref()
    }

    /// Whether the view a scope depends on is available.
    pub fn has_scope(&self, scope: Scope) -> bool {
        match scope {
            Scope::Storage => self.storage().is_some(),
            Scope::Bootloader => self.bootloader().is_some(),
            Scope::Network => self.network().is_some(),
            Scope::Firewall => self.firewall().is_some(),
            Scope::Unknown => true,
        }
    }
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("storage", &self.storage.get())
            .field("bootloader", &self.bootloader.get())
            .field("network", &self.network.get())
            .field("security", &self.security.get())
            .finish_non_exhaustive()
    }
}
