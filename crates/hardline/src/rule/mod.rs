//! Compliance rules.
//!
//! Every check implements [`Rule`]. A rule reads exactly one view of the
//! [`TargetConfig`], tagged by its [`Scope`]; when that view is missing the
//! rule does not apply and passes.

mod bootloader;
mod encryption;
mod firewall;
mod lsm;
mod mount;
mod unknown;
mod wireless;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use hardline_common::{HardlineError, HardlineResult, RuleId};

use crate::issue::{Action, Issue};
use crate::snapshot::TargetConfig;

pub use bootloader::BootloaderPasswordRule;
pub use encryption::EncryptedFilesystemsRule;
pub use firewall::FirewallEnabledRule;
pub use lsm::LsmEnforcingRule;
pub use mount::{MinimumFilesystemSizeRule, SeparateFilesystemRule, SeparateMountPointRule};
pub use unknown::UnknownRule;
pub use wireless::NoWirelessRule;

/// The part of the system a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Storage layout.
    Storage,
    /// Bootloader settings.
    Bootloader,
    /// Network configuration.
    Network,
    /// Security toggles (firewall, security module).
    Firewall,
    /// Rules the engine does not understand.
    Unknown,
}

impl Scope {
    /// Scope name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Storage => "storage",
            Self::Bootloader => "bootloader",
            Self::Network => "network",
            Self::Firewall => "firewall",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = HardlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "storage" => Ok(Self::Storage),
            "bootloader" => Ok(Self::Bootloader),
            "network" => Ok(Self::Network),
            "firewall" | "security" => Ok(Self::Firewall),
            "unknown" => Ok(Self::Unknown),
            _ => Err(HardlineError::Config {
                message: format!("unknown rule scope: {s}"),
            }),
        }
    }
}

/// Identity and state shared by every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMeta {
    /// Stable external identifier.
    pub id: RuleId,
    /// Cross-reference identifiers (e.g. CCE codes).
    pub identifiers: Vec<String>,
    /// References to requirement documents (e.g. SRG codes).
    pub references: Vec<String>,
    /// What the rule requires.
    pub description: String,
    /// View the rule inspects.
    pub scope: Scope,
    /// Whether policies evaluate the rule.
    pub enabled: bool,
}

impl RuleMeta {
    /// Create enabled rule metadata.
    pub fn new(id: RuleId, description: impl Into<String>, scope: Scope) -> Self {
        Self {
            id,
            identifiers: Vec::new(),
            references: Vec::new(),
            description: description.into(),
            scope,
            enabled: true,
        }
    }

    /// Set the cross-reference identifiers.
    #[must_use]
    pub fn with_identifiers<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identifiers = identifiers.into_iter().map(Into::into).collect();
        self
    }

    /// Set the references.
    #[must_use]
    pub fn with_references<I, S>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references = references.into_iter().map(Into::into).collect();
        self
    }
}

/// A checkable requirement.
///
/// `pass` must be a pure function of the snapshot. Remediation never
/// touches the snapshot: it changes the system behind it, so only a fresh
/// snapshot observes the fix.
pub trait Rule: fmt::Debug + Send + Sync {
    /// Identity and enabled state.
    fn meta(&self) -> &RuleMeta;

    /// Mutable access to the metadata.
    fn meta_mut(&mut self) -> &mut RuleMeta;

    /// Whether the snapshot satisfies the rule.
    fn pass(&self, target: &TargetConfig) -> bool;

    /// Whether every failure of this rule comes with an automatic fix.
    fn fixable(&self) -> bool {
        false
    }

    /// The remediation for a failure against `target`.
    ///
    /// Fixable rules return `Some` whenever `pass(target)` is false.
    fn remediation(&self, target: &TargetConfig) -> Option<Action> {
        let _ = target;
        None
    }

    /// Describe the failure against `target`.
    fn failure_message(&self, target: &TargetConfig) -> String {
        let _ = target;
        self.description().to_string()
    }

    /// Stable identifier.
    fn id(&self) -> &RuleId {
        &self.meta().id
    }

    /// What the rule requires.
    fn description(&self) -> &str {
        &self.meta().description
    }

    /// View the rule inspects.
    fn scope(&self) -> Scope {
        self.meta().scope
    }

    /// Whether policies evaluate the rule.
    fn enabled(&self) -> bool {
        self.meta().enabled
    }

    /// Include the rule in policy evaluation.
    fn enable(&mut self) {
        self.meta_mut().enabled = true;
    }

    /// Exclude the rule from policy evaluation.
    fn disable(&mut self) {
        self.meta_mut().enabled = false;
    }

    /// Remediate the system behind `target`.
    ///
    /// Calling it again after a successful fix changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`HardlineError::RuleNotFixable`] for rules without an
    /// automatic fix, or the collaborator's error if remediation fails.
    fn fix(&self, target: &TargetConfig) -> HardlineResult<()> {
        if !self.fixable() {
            return Err(HardlineError::RuleNotFixable {
                rule: self.id().to_string(),
            });
        }
        match self.remediation(target) {
            Some(action) => action.run(),
            None => {
                tracing::debug!(rule = %self.id(), "Nothing to fix");
                Ok(())
            }
        }
    }

    /// The issue for a failing evaluation, `None` when the rule passes.
    fn issue(&self, target: &TargetConfig) -> Option<Issue> {
        if self.pass(target) {
            return None;
        }
        let action = if self.fixable() {
            self.remediation(target)
        } else {
            None
        };
        let message = self.failure_message(target);
        match Issue::from_failure(self, message, action) {
            Ok(issue) => Some(issue),
            Err(e) => {
                tracing::warn!(rule = %self.id(), error = %e, "Falling back to the rule id");
                Issue::from_failure(self, format!("{} failed", self.id()), None).ok()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_parsing() {
        assert_eq!("storage".parse::<Scope>().unwrap(), Scope::Storage);
        assert_eq!("Firewall".parse::<Scope>().unwrap(), Scope::Firewall);
        assert_eq!("security".parse::<Scope>().unwrap(), Scope::Firewall);
        assert!("kernel".parse::<Scope>().is_err());
    }

    #[test]
    fn meta_builders() {
        let id = RuleId::new("SLES-15-010220").unwrap();
        let meta = RuleMeta::new(id, "Firewall", Scope::Firewall)
            .with_identifiers(["CCE-85751-5"])
            .with_references(vec!["SRG-OS-000480-GPOS-00227".to_string()]);
        assert!(meta.enabled);
        assert_eq!(meta.identifiers, vec!["CCE-85751-5"]);
        assert_eq!(meta.references.len(), 1);
    }
}
