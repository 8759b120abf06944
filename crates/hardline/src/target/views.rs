//! Read-only views of the target system consumed by rules.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use hardline_common::DiskSize;
use hardline_lsm::{KernelParams, Mode};

/// A filesystem in the storage layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filesystem {
    /// Block device or volume name.
    pub device: String,
    /// Mount point, if the filesystem is mounted.
    #[serde(default)]
    pub mount_path: Option<PathBuf>,
    /// Filesystem size.
    #[serde(default)]
    pub size: DiskSize,
    /// Whether the underlying device is encrypted.
    #[serde(default)]
    pub encrypted: bool,
}

impl Filesystem {
    /// Create an unencrypted filesystem mounted at `path`.
    pub fn mounted(device: &str, path: impl Into<PathBuf>, size: DiskSize) -> Self {
        Self {
            device: device.to_string(),
            mount_path: Some(path.into()),
            size,
            encrypted: false,
        }
    }

    /// Mark the filesystem as encrypted.
    #[must_use]
    pub fn encrypted(mut self) -> Self {
        self.encrypted = true;
        self
    }
}

/// The storage layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageView {
    /// All filesystems, mounted or not.
    #[serde(default)]
    pub filesystems: Vec<Filesystem>,
}

impl StorageView {
    /// Create a view over the given filesystems.
    #[must_use]
    pub fn new(filesystems: Vec<Filesystem>) -> Self {
        Self { filesystems }
    }

    /// Filesystems that have a mount point.
    pub fn mounted(&self) -> impl Iterator<Item = (&Filesystem, &Path)> {
        self.filesystems
            .iter()
            .filter_map(|fs| fs.mount_path.as_deref().map(|path| (fs, path)))
    }

    /// The filesystem mounted exactly at `path`.
    #[must_use]
    pub fn filesystem_at(&self, path: &Path) -> Option<&Filesystem> {
        self.mounted()
            .find(|(_, mount)| *mount == path)
            .map(|(fs, _)| fs)
    }

    /// The filesystem that holds `path`: the one with the longest mount
    /// point that is an ancestor of (or equal to) `path`.
    #[must_use]
    pub fn filesystem_containing(&self, path: &Path) -> Option<&Filesystem> {
        self.mounted()
            .filter(|(_, mount)| path.starts_with(mount))
            .max_by_key(|(_, mount)| mount.components().count())
            .map(|(fs, _)| fs)
    }
}

/// Bootloader protection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootloaderView {
    /// Whether a bootloader password is configured.
    #[serde(default)]
    pub password: bool,
    /// Whether boot entries can be edited without the password.
    #[serde(default)]
    pub unrestricted_menu: bool,
}

/// Kind of network interface a connection uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceType {
    /// Wired Ethernet.
    Ethernet,
    /// Wireless LAN.
    Wireless,
    /// Software bridge.
    Bridge,
    /// Bonded interfaces.
    Bond,
    /// VLAN on top of another interface.
    Vlan,
    /// Anything else.
    #[serde(other)]
    Other,
}

/// A configured network connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Connection (interface) name.
    pub name: String,
    /// Interface type.
    pub interface_type: InterfaceType,
    /// Whether the connection is brought up.
    #[serde(default)]
    pub active: bool,
}

impl Connection {
    /// Create a connection.
    pub fn new(name: &str, interface_type: InterfaceType, active: bool) -> Self {
        Self {
            name: name.to_string(),
            interface_type,
            active,
        }
    }
}

/// The network configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkView {
    /// All configured connections.
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl NetworkView {
    /// Active wireless connections.
    pub fn active_wireless(&self) -> impl Iterator<Item = &Connection> {
        self.connections
            .iter()
            .filter(|c| c.active && c.interface_type == InterfaceType::Wireless)
    }
}

/// Security module state: boot parameters plus persisted configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LsmState {
    /// Kernel parameters the system boots with.
    #[serde(default)]
    pub boot_params: KernelParams,
    /// Value persisted in the module configuration file.
    #[serde(default)]
    pub config_mode: Option<String>,
}

impl LsmState {
    /// The effective mode.
    #[must_use]
    pub fn mode(&self) -> &'static Mode {
        hardline_lsm::resolve(&self.boot_params, self.config_mode.as_deref())
    }
}

/// Security toggles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityView {
    /// Whether the firewall is enabled.
    #[serde(default)]
    pub firewall_enabled: bool,
    /// Security module state, when the system ships one.
    #[serde(default)]
    pub lsm: Option<LsmState>,
}
