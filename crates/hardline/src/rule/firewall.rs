//! Firewall state.

use hardline_common::RuleId;

use super::{Rule, RuleMeta, Scope};
use crate::issue::Action;
use crate::snapshot::TargetConfig;

/// Requires the firewall to be enabled.
#[derive(Debug, Clone)]
pub struct FirewallEnabledRule {
    meta: RuleMeta,
}

impl FirewallEnabledRule {
    /// Create the rule.
    pub fn new(id: RuleId) -> Self {
        Self {
            meta: RuleMeta::new(id, "The firewall must be enabled", Scope::Firewall),
        }
    }

    /// Attach extra metadata.
    #[must_use]
    pub fn with_meta(mut self, f: impl FnOnce(RuleMeta) -> RuleMeta) -> Self {
        self.meta = f(self.meta);
        self
    }
}

impl Rule for FirewallEnabledRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RuleMeta {
        &mut self.meta
    }

    fn pass(&self, target: &TargetConfig) -> bool {
        target.firewall().is_none_or(|security| security.firewall_enabled)
    }

    fn fixable(&self) -> bool {
        true
    }

    fn remediation(&self, target: &TargetConfig) -> Option<Action> {
        if self.pass(target) {
            return None;
        }
        let system = target.system().clone();
        Some(Action::new("Enable the firewall", move || {
            system.enable_firewall()
        }))
    }

    fn failure_message(&self, _target: &TargetConfig) -> String {
        "The firewall is disabled".to_string()
    }
}
