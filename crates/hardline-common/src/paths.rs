//! Well-known filesystem locations used by the engine.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;

/// Default root of the target system.
pub static HARDLINE_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("HARDLINE_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
});

const FAILED_RULES: &str = "var/lib/hardline/security_policy_failed_rules";
const SSG_APPLY_DEFAULT: &str = "etc/ssg-apply/default.conf";
const SSG_APPLY_OVERRIDE: &str = "etc/ssg-apply/override.conf";
const LSM_CONFIG: &str = "etc/selinux/config";

/// Paths of the artifacts the engine reads and writes on the target system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardlinePaths {
    /// Root of the target system (default: /).
    pub root: PathBuf,
}

impl HardlinePaths {
    /// Create paths with the default root.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create paths relative to a custom root directory.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Whether the target is the running system itself.
    #[must_use]
    pub fn is_host_root(&self) -> bool {
        self.root == Path::new("/")
    }

    /// File listing the identifiers of failing rules, one per line.
    #[must_use]
    pub fn failed_rules(&self) -> PathBuf {
        self.root.join(FAILED_RULES)
    }

    /// Default configuration template shipped with ssg-apply.
    #[must_use]
    pub fn ssg_apply_default(&self) -> PathBuf {
        self.root.join(SSG_APPLY_DEFAULT)
    }

    /// Override configuration read by ssg-apply on the next boot.
    #[must_use]
    pub fn ssg_apply_override(&self) -> PathBuf {
        self.root.join(SSG_APPLY_OVERRIDE)
    }

    /// Persisted security module configuration.
    #[must_use]
    pub fn lsm_config(&self) -> PathBuf {
        self.root.join(LSM_CONFIG)
    }
}

impl Default for HardlinePaths {
    fn default() -> Self {
        Self {
            root: HARDLINE_ROOT.clone(),
        }
    }
}
