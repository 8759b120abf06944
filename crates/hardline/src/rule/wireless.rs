//! Wireless network interfaces.

use hardline_common::{HardlineResult, RuleId};

use super::{Rule, RuleMeta, Scope};
use crate::issue::Action;
use crate::snapshot::TargetConfig;

/// Requires every wireless connection to be down.
#[derive(Debug, Clone)]
pub struct NoWirelessRule {
    meta: RuleMeta,
}

impl NoWirelessRule {
    /// Create the rule.
    pub fn new(id: RuleId) -> Self {
        Self {
            meta: RuleMeta::new(
                id,
                "Wireless network interfaces must be disabled",
                Scope::Network,
            ),
        }
    }

    /// Attach extra metadata.
    #[must_use]
    pub fn with_meta(mut self, f: impl FnOnce(RuleMeta) -> RuleMeta) -> Self {
        self.meta = f(self.meta);
        self
    }

    fn active(target: &TargetConfig) -> Vec<String> {
        target
            .network()
            .map(|network| network.active_wireless().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }
}

impl Rule for NoWirelessRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RuleMeta {
        &mut self.meta
    }

    fn pass(&self, target: &TargetConfig) -> bool {
        Self::active(target).is_empty()
    }

    fn fixable(&self) -> bool {
        true
    }

    fn remediation(&self, target: &TargetConfig) -> Option<Action> {
        let names = Self::active(target);
        if names.is_empty() {
            return None;
        }
        let system = target.system().clone();
        Some(Action::new(
            format!("Deactivate {}", names.join(", ")),
            move || -> HardlineResult<()> {
                for name in &names {
                    system.deactivate_connection(name)?;
                }
                Ok(())
            },
        ))
    }

    fn failure_message(&self, target: &TargetConfig) -> String {
        format!(
            "Active wireless connections: {}",
            Self::active(target).join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::target::{Connection, InMemorySystem, InterfaceType, NetworkView, SystemState};

    fn system() -> Arc<InMemorySystem> {
        Arc::new(InMemorySystem::new(SystemState {
            network: Some(NetworkView {
                connections: vec![
                    Connection::new("eth0", InterfaceType::Ethernet, true),
                    Connection::new("wlan0", InterfaceType::Wireless, true),
                    Connection::new("wlan1", InterfaceType::Wireless, true),
                    Connection::new("wlan2", InterfaceType::Wireless, false),
                ],
            }),
            ..SystemState::default()
        }))
    }

    fn rule() -> NoWirelessRule {
        NoWirelessRule::new(RuleId::new("SLES-15-010380").unwrap())
    }

    #[test]
    fn active_wireless_fails() {
        let target = TargetConfig::new(system());
        assert!(!rule().pass(&target));
        assert_eq!(
            rule().failure_message(&target),
            "Active wireless connections: wlan0, wlan1"
        );
    }

    #[test]
    fn fix_deactivates_every_wireless_connection() {
        let system = system();
        let target = TargetConfig::new(system.clone());
        let action = rule().remediation(&target).unwrap();
        assert_eq!(action.message(), "Deactivate wlan0, wlan1");
        action.run().unwrap();
        action.run().unwrap();

        assert!(rule().pass(&TargetConfig::new(system.clone())));
        let connections = system.state().network.unwrap().connections;
        assert!(connections[0].active);
    }

    #[test]
    fn missing_network_passes() {
        let target = TargetConfig::from_state(SystemState::default());
        assert!(rule().pass(&target));
        assert!(rule().remediation(&target).is_none());
    }
}
