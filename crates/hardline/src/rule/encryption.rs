//! Full disk encryption.

use std::path::PathBuf;

use hardline_common::RuleId;

use super::{Rule, RuleMeta, Scope};
use crate::snapshot::TargetConfig;

/// Mount points that firmware must be able to read unencrypted.
const DEFAULT_EXEMPT: &[&str] = &["/boot/efi"];

/// Requires every mounted filesystem to be encrypted.
#[derive(Debug, Clone)]
pub struct EncryptedFilesystemsRule {
    meta: RuleMeta,
    exempt: Vec<PathBuf>,
}

impl EncryptedFilesystemsRule {
    /// Create the rule with the default exemptions.
    pub fn new(id: RuleId) -> Self {
        Self {
            meta: RuleMeta::new(
                id,
                "All filesystems must be encrypted",
                Scope::Storage,
            ),
            exempt: DEFAULT_EXEMPT.iter().map(PathBuf::from).collect(),
        }
    }

    /// Replace the exempt mount points.
    #[must_use]
    pub fn with_exempt<I, P>(mut self, exempt: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.exempt = exempt.into_iter().map(Into::into).collect();
        self
    }

    /// Attach extra metadata.
    #[must_use]
    pub fn with_meta(mut self, f: impl FnOnce(RuleMeta) -> RuleMeta) -> Self {
        self.meta = f(self.meta);
        self
    }

    fn unencrypted(&self, target: &TargetConfig) -> Vec<String> {
        let Some(storage) = target.storage() else {
            return Vec::new();
        };
        storage
            .mounted()
            .filter(|(fs, path)| !fs.encrypted && !self.exempt.iter().any(|e| e == path))
            .map(|(_, path)| path.display().to_string())
            .collect()
    }
}

impl Rule for EncryptedFilesystemsRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RuleMeta {
        &mut self.meta
    }

    fn pass(&self, target: &TargetConfig) -> bool {
        self.unencrypted(target).is_empty()
    }

    fn failure_message(&self, target: &TargetConfig) -> String {
        format!(
            "Unencrypted filesystems: {}",
            self.unencrypted(target).join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hardline_common::DiskSize;

    use crate::target::{Filesystem, StorageView, SystemState};

    fn target(filesystems: Vec<Filesystem>) -> TargetConfig {
        TargetConfig::from_state(SystemState {
            storage: Some(StorageView::new(filesystems)),
            ..SystemState::default()
        })
    }

    fn rule() -> EncryptedFilesystemsRule {
        EncryptedFilesystemsRule::new(RuleId::new("SLES-15-010330").unwrap())
    }

    #[test]
    fn all_encrypted_passes() {
        let target = target(vec![
            Filesystem::mounted("/dev/vda1", "/boot/efi", DiskSize::mib(512)),
            Filesystem::mounted("/dev/mapper/root", "/", DiskSize::gib(20)).encrypted(),
        ]);
        assert!(rule().pass(&target));
    }

    #[test]
    fn plain_filesystem_fails() {
        let target = target(vec![
            Filesystem::mounted("/dev/mapper/root", "/", DiskSize::gib(20)).encrypted(),
            Filesystem::mounted("/dev/vda3", "/home", DiskSize::gib(20)),
        ]);
        assert!(!rule().pass(&target));
        assert_eq!(rule().failure_message(&target), "Unencrypted filesystems: /home");
    }

    #[test]
    fn exemptions_are_configurable() {
        let target = target(vec![Filesystem::mounted(
            "/dev/vda1",
            "/boot/efi",
            DiskSize::mib(512),
        )]);
        assert!(rule().pass(&target));
        assert!(!rule().with_exempt(Vec::<PathBuf>::new()).pass(&target));
    }

    #[test]
    fn missing_storage_passes() {
        assert!(rule().pass(&TargetConfig::from_state(SystemState::default())));
    }
}
