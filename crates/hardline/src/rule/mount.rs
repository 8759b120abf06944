//! Storage layout rules.

use std::path::{Path, PathBuf};

use hardline_common::{DiskSize, RuleId};

use super::{Rule, RuleMeta, Scope};
use crate::snapshot::TargetConfig;

/// Requires a filesystem mounted exactly at a path.
#[derive(Debug, Clone)]
pub struct SeparateMountPointRule {
    meta: RuleMeta,
    path: PathBuf,
}

impl SeparateMountPointRule {
    /// Create the rule for `path`.
    pub fn new(id: RuleId, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let meta = RuleMeta::new(
            id,
            format!("{} must be on a separate mount point", path.display()),
            Scope::Storage,
        );
        Self { meta, path }
    }

    /// Attach extra metadata.
    #[must_use]
    pub fn with_meta(mut self, f: impl FnOnce(RuleMeta) -> RuleMeta) -> Self {
        self.meta = f(self.meta);
        self
    }

    /// The required mount point.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Rule for SeparateMountPointRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RuleMeta {
        &mut self.meta
    }

    fn pass(&self, target: &TargetConfig) -> bool {
        target
            .storage()
            .is_none_or(|storage| storage.filesystem_at(&self.path).is_some())
    }

    fn failure_message(&self, _target: &TargetConfig) -> String {
        format!("No filesystem is mounted at {}", self.path.display())
    }
}

/// Requires that a path does not live on the root filesystem.
///
/// Unlike [`SeparateMountPointRule`] the path itself does not need to be a
/// mount point: any filesystem mounted at an ancestor other than `/` is
/// enough.
#[derive(Debug, Clone)]
pub struct SeparateFilesystemRule {
    meta: RuleMeta,
    path: PathBuf,
}

impl SeparateFilesystemRule {
    /// Create the rule for `path`.
    pub fn new(id: RuleId, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let meta = RuleMeta::new(
            id,
            format!("{} must be on a filesystem separate from /", path.display()),
            Scope::Storage,
        );
        Self { meta, path }
    }

    /// Attach extra metadata.
    #[must_use]
    pub fn with_meta(mut self, f: impl FnOnce(RuleMeta) -> RuleMeta) -> Self {
        self.meta = f(self.meta);
        self
    }
}

impl Rule for SeparateFilesystemRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RuleMeta {
        &mut self.meta
    }

    fn pass(&self, target: &TargetConfig) -> bool {
        let Some(storage) = target.storage() else {
            return true;
        };
        let Some(root) = storage.filesystem_at(Path::new("/")) else {
            return true;
        };
        storage
            .filesystem_containing(&self.path)
            .is_none_or(|fs| fs != root)
    }

    fn failure_message(&self, _target: &TargetConfig) -> String {
        format!("{} is on the root filesystem", self.path.display())
    }
}

/// Requires the filesystem holding a path to have a minimum size.
#[derive(Debug, Clone)]
pub struct MinimumFilesystemSizeRule {
    meta: RuleMeta,
    path: PathBuf,
    min_size: DiskSize,
}

impl MinimumFilesystemSizeRule {
    /// Create the rule for `path` with the given threshold.
    pub fn new(id: RuleId, path: impl Into<PathBuf>, min_size: DiskSize) -> Self {
        let path = path.into();
        let meta = RuleMeta::new(
            id,
            format!(
                "The filesystem holding {} must be at least {min_size}",
                path.display()
            ),
            Scope::Storage,
        );
        Self {
            meta,
            path,
            min_size,
        }
    }

    /// Attach extra metadata.
    #[must_use]
    pub fn with_meta(mut self, f: impl FnOnce(RuleMeta) -> RuleMeta) -> Self {
        self.meta = f(self.meta);
        self
    }

    /// The size threshold.
    #[must_use]
    pub fn min_size(&self) -> DiskSize {
        self.min_size
    }
}

impl Rule for MinimumFilesystemSizeRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RuleMeta {
        &mut self.meta
    }

    fn pass(&self, target: &TargetConfig) -> bool {
        target
            .storage()
            .and_then(|storage| storage.filesystem_containing(&self.path))
            .is_none_or(|fs| fs.size >= self.min_size)
    }

    fn failure_message(&self, target: &TargetConfig) -> String {
        let actual = target
            .storage()
            .and_then(|storage| storage.filesystem_containing(&self.path))
            .map(|fs| fs.size)
            .unwrap_or_default();
        format!(
            "The filesystem holding {} is {actual}, at least {} is required",
            self.path.display(),
            self.min_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{Filesystem, StorageView, SystemState};

    fn id(s: &str) -> RuleId {
        RuleId::new(s).unwrap()
    }

    fn target(filesystems: Vec<Filesystem>) -> TargetConfig {
        TargetConfig::from_state(SystemState {
            storage: Some(StorageView::new(filesystems)),
            ..SystemState::default()
        })
    }

    fn root_only() -> TargetConfig {
        target(vec![Filesystem::mounted("/dev/vda2", "/", DiskSize::gib(20))])
    }

    fn split_var() -> TargetConfig {
        target(vec![
            Filesystem::mounted("/dev/vda2", "/", DiskSize::gib(20)),
            Filesystem::mounted("/dev/vda3", "/var", DiskSize::gib(4)),
        ])
    }

    #[test]
    fn separate_mount_point() {
        let rule = SeparateMountPointRule::new(id("SLES-15-040200"), "/home");
        assert!(!rule.pass(&root_only()));
        assert!(!rule.pass(&split_var()));
        assert!(
            rule.pass(&target(vec![
                Filesystem::mounted("/dev/vda2", "/", DiskSize::gib(20)),
                Filesystem::mounted("/dev/vda4", "/home", DiskSize::gib(20)),
            ]))
        );
        assert_eq!(
            rule.failure_message(&root_only()),
            "No filesystem is mounted at /home"
        );
    }

    #[test]
    fn separate_filesystem_accepts_ancestor_mounts() {
        let rule = SeparateFilesystemRule::new(id("SLES-15-030810"), "/var/log/audit");
        assert!(!rule.pass(&root_only()));
        assert!(rule.pass(&split_var()));
    }

    #[test]
    fn minimum_size_checks_containing_filesystem() {
        let small = MinimumFilesystemSizeRule::new(id("A-1"), "/var/log/audit", DiskSize::gib(2));
        let large = MinimumFilesystemSizeRule::new(id("A-2"), "/var/log/audit", DiskSize::gib(8));
        assert!(small.pass(&split_var()));
        assert!(!large.pass(&split_var()));
        assert_eq!(
            large.failure_message(&split_var()),
            "The filesystem holding /var/log/audit is 4 GiB, at least 8 GiB is required"
        );
    }

    #[test]
    fn missing_storage_passes() {
        let target = TargetConfig::from_state(SystemState::default());
        assert!(SeparateMountPointRule::new(id("A-1"), "/home").pass(&target));
        assert!(SeparateFilesystemRule::new(id("A-2"), "/var").pass(&target));
        assert!(MinimumFilesystemSizeRule::new(id("A-3"), "/", DiskSize::gib(1)).pass(&target));
    }

    #[test]
    fn storage_rules_are_not_fixable() {
        let rule = SeparateMountPointRule::new(id("A-1"), "/home");
        assert!(!rule.fixable());
        assert!(rule.fix(&root_only()).is_err());
    }
}
