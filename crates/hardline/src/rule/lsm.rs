//! Security module enforcement.

use hardline_common::RuleId;
use hardline_lsm::{Mode, ModeId};

use super::{Rule, RuleMeta, Scope};
use crate::issue::Action;
use crate::snapshot::TargetConfig;

/// Requires the security module to run in enforcing mode.
#[derive(Debug, Clone)]
pub struct LsmEnforcingRule {
    meta: RuleMeta,
}

impl LsmEnforcingRule {
    /// Create the rule.
    pub fn new(id: RuleId) -> Self {
        Self {
            meta: RuleMeta::new(
                id,
                "SELinux must be enabled in enforcing mode",
                Scope::Firewall,
            ),
        }
    }

    /// Attach extra metadata.
    #[must_use]
    pub fn with_meta(mut self, f: impl FnOnce(RuleMeta) -> RuleMeta) -> Self {
        self.meta = f(self.meta);
        self
    }

    fn mode(target: &TargetConfig) -> Option<&'static Mode> {
        target
            .firewall()
            .and_then(|security| security.lsm.as_ref())
            .map(|lsm| lsm.mode())
    }
}

impl Rule for LsmEnforcingRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RuleMeta {
        &mut self.meta
    }

    fn pass(&self, target: &TargetConfig) -> bool {
        Self::mode(target).is_none_or(|mode| mode.id() == ModeId::Enforcing)
    }

    fn fixable(&self) -> bool {
        true
    }

    fn remediation(&self, target: &TargetConfig) -> Option<Action> {
        if self.pass(target) {
            return None;
        }
        let system = target.system().clone();
        let enforcing = Mode::get(ModeId::Enforcing);
        Some(Action::new(
            format!("Switch SELinux to {}", enforcing.display_name()),
            move || system.set_lsm_mode(enforcing),
        ))
    }

    fn failure_message(&self, target: &TargetConfig) -> String {
        match Self::mode(target) {
            Some(mode) => format!("SELinux is {}", mode.display_name()),
            None => self.description().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use hardline_lsm::KernelParams;

    use crate::target::{InMemorySystem, LsmState, SecurityView, SystemState};

    fn system(cmdline: &str, config: Option<&str>) -> Arc<InMemorySystem> {
        Arc::new(InMemorySystem::new(SystemState {
            security: Some(SecurityView {
                firewall_enabled: true,
                lsm: Some(LsmState {
                    boot_params: KernelParams::parse(cmdline).unwrap(),
                    config_mode: config.map(str::to_string),
                }),
            }),
            ..SystemState::default()
        }))
    }

    fn rule() -> LsmEnforcingRule {
        LsmEnforcingRule::new(RuleId::new("xccdf_org.ssgproject.content_rule_selinux_state").unwrap())
    }

    #[test]
    fn enforcing_passes() {
        let target = TargetConfig::new(system("security=selinux selinux=1 enforcing=1", None));
        assert!(rule().pass(&target));
    }

    #[test]
    fn config_fallback_is_honoured() {
        let target = TargetConfig::new(system("security=selinux selinux=1", Some("enforcing")));
        assert!(rule().pass(&target));
        let target = TargetConfig::new(system("security=selinux selinux=1", None));
        assert!(!rule().pass(&target));
        assert_eq!(rule().failure_message(&target), "SELinux is Permissive");
    }

    #[test]
    fn fix_switches_to_enforcing() {
        let system = system("quiet", None);
        let target = TargetConfig::new(system.clone());
        assert_eq!(rule().failure_message(&target), "SELinux is Disabled");

        rule().fix(&target).unwrap();
        let fresh = TargetConfig::new(system.clone());
        assert!(rule().pass(&fresh));

        let before = system.state();
        rule().fix(&fresh).unwrap();
        assert_eq!(system.state(), before);
    }

    #[test]
    fn missing_lsm_passes() {
        let target = TargetConfig::from_state(SystemState {
            security: Some(SecurityView::default()),
            ..SystemState::default()
        });
        assert!(rule().pass(&target));
    }
}
