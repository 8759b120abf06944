//! Bootloader protection.

use hardline_common::RuleId;

use super::{Rule, RuleMeta, Scope};
use crate::snapshot::TargetConfig;

/// Requires a bootloader password that also protects menu editing.
#[derive(Debug, Clone)]
pub struct BootloaderPasswordRule {
    meta: RuleMeta,
}

impl BootloaderPasswordRule {
    /// Create the rule.
    pub fn new(id: RuleId) -> Self {
        Self {
            meta: RuleMeta::new(
                id,
                "The bootloader must require a password to modify boot entries",
                Scope::Bootloader,
            ),
        }
    }

    /// Attach extra metadata.
    #[must_use]
    pub fn with_meta(mut self, f: impl FnOnce(RuleMeta) -> RuleMeta) -> Self {
        self.meta = f(self.meta);
        self
    }
}

impl Rule for BootloaderPasswordRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RuleMeta {
        &mut self.meta
    }

    fn pass(&self, target: &TargetConfig) -> bool {
        target
            .bootloader()
            .is_none_or(|boot| boot.password && !boot.unrestricted_menu)
    }

    fn failure_message(&self, target: &TargetConfig) -> String {
        match target.bootloader() {
            Some(boot) if boot.password => "Boot entries can be edited without the password".to_string(),
            _ => "No bootloader password is set".to_string(),
        }
    }
}
