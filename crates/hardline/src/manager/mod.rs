//! The security policy manager.
//!
//! A [`Manager`] tracks which policy (if any) is enabled and what the
//! remediation tool should do on the next boot, and externalizes that
//! state with [`Manager::write`].

mod failed_rules;
mod profile;

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use hardline_common::{HardlinePaths, HardlineError, HardlineResult, KeyValueFile, RuleId};

use crate::collab::{
    PackageSelection, PackageSelector, SECURITY_POLICY_PURPOSE, ServiceManager, Systemctl,
};
use crate::issue::IssueList;
use crate::policy::{self, Policy};
use crate::rule::{Rule, Scope};
use crate::snapshot::TargetConfig;

pub use failed_rules::FailedRulesFile;
pub use profile::{ScapAction, SecurityPolicyProfile};

/// Environment variable naming the policy to enable at startup.
pub const SECURITY_POLICY_ENV: &str = "HARDLINE_SECURITY_POLICY";

/// Service that scans or remediates the system on the next boot.
pub const SSG_APPLY_SERVICE: &str = "ssg-apply";

const PROFILE_KEY: &str = "profile";
const REMEDIATE_KEY: &str = "remediate";

/// Manager configuration.
#[derive(Debug)]
pub struct ManagerConfig {
    /// Locations on the target system.
    pub paths: HardlinePaths,
    /// Known policies.
    pub policies: Vec<Policy>,
}

impl ManagerConfig {
    /// Use the built-in policy catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be built.
    pub fn new(paths: HardlinePaths) -> HardlineResult<Self> {
        Ok(Self {
            paths,
            policies: policy::catalog()?,
        })
    }

    /// Use the given policies instead of the catalog.
    #[must_use]
    pub fn with_policies(mut self, policies: Vec<Policy>) -> Self {
        self.policies = policies;
        self
    }

    /// Set the root directory.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.paths = HardlinePaths::with_root(root);
        self
    }
}

/// External collaborators the manager drives.
#[derive(Clone)]
pub struct Collaborators {
    /// Package selection.
    pub packages: Arc<dyn PackageSelector>,
    /// Service enablement.
    pub services: Arc<dyn ServiceManager>,
}

impl Collaborators {
    /// Collaborators acting on the system installed at `paths.root`.
    #[must_use]
    pub fn system(paths: &HardlinePaths) -> Self {
        Self {
            packages: Arc::new(PackageSelection::new()),
            services: Arc::new(Systemctl::new(&paths.root)),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// What [`Manager::write`] produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    /// Policy that was written, if any.
    pub policy: Option<String>,
    /// Failing rule ids, sorted.
    pub failing_rules: Vec<RuleId>,
    /// Failing rules file, when one was written.
    pub failed_rules_file: Option<PathBuf>,
    /// Remediation tool override, when one was written.
    pub override_file: Option<PathBuf>,
    /// Service enabled for the next boot, if any.
    pub service: Option<String>,
}

/// Tracks the enabled security policy and the requested remediation.
#[derive(Debug)]
pub struct Manager {
    paths: HardlinePaths,
    policies: Vec<Policy>,
    enabled: Option<usize>,
    scap_action: ScapAction,
    collaborators: Collaborators,
}

impl Manager {
    /// Create a manager, enabling the policy named by
    /// [`SECURITY_POLICY_ENV`] if it is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the packages of that policy cannot be selected.
    pub fn new(config: ManagerConfig, collaborators: Collaborators) -> HardlineResult<Self> {
        Self::with_env(config, collaborators, std::env::vars())
    }

    /// Like [`Manager::new`] but reads the environment from `vars`.
    ///
    /// The variable name and its value are matched case-insensitively. An
    /// unknown policy id leaves no policy enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the packages of the named policy cannot be
    /// selected.
    pub fn with_env<I, K, V>(
        config: ManagerConfig,
        collaborators: Collaborators,
        vars: I,
    ) -> HardlineResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut manager = Self {
            paths: config.paths,
            policies: config.policies,
            enabled: None,
            scap_action: ScapAction::default(),
            collaborators,
        };

        let requested = vars
            .into_iter()
            .find(|(name, _)| name.as_ref().eq_ignore_ascii_case(SECURITY_POLICY_ENV))
            .map(|(_, value)| value.as_ref().trim().to_string());

        if let Some(id) = requested.filter(|id| !id.is_empty()) {
            match manager.enable_policy(&id) {
                Ok(_) => {}
                Err(HardlineError::PolicyNotFound { .. }) => {
                    tracing::warn!(
                        policy = %id,
                        variable = SECURITY_POLICY_ENV,
                        "Unknown security policy requested by the environment"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok(manager)
    }

    /// Locations on the target system.
    #[must_use]
    pub fn paths(&self) -> &HardlinePaths {
        &self.paths
    }

    /// Known policies.
    #[must_use]
    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    /// Look a policy up by id (case-insensitive).
    #[must_use]
    pub fn find_policy(&self, id: &str) -> Option<&Policy> {
        self.position(id).map(|index| &self.policies[index])
    }

    /// The enabled policy.
    #[must_use]
    pub fn enabled_policy(&self) -> Option<&Policy> {
        self.enabled.map(|index| &self.policies[index])
    }

    /// The enabled policy, for toggling its rules.
    pub fn enabled_policy_mut(&mut self) -> Option<&mut Policy> {
        self.enabled.map(|index| &mut self.policies[index])
    }

    /// Enable a policy, replacing the one enabled before.
    ///
    /// The packages of the new policy are selected first, then those only
    /// the previous one needed are deselected.
    ///
    /// # Errors
    ///
    /// Returns [`HardlineError::PolicyNotFound`] for an unknown id, or the
    /// package selector's error.
    pub fn enable_policy(&mut self, id: &str) -> HardlineResult<&Policy> {
        let index = self
            .position(id)
            .ok_or_else(|| HardlineError::PolicyNotFound { id: id.to_string() })?;

        let packages = self.policies[index].packages();
        self.collaborators
            .packages
            .select(SECURITY_POLICY_PURPOSE, packages)?;
        if let Some(previous) = self.enabled.filter(|previous| *previous != index) {
            let stale: Vec<String> = self.policies[previous]
                .packages()
                .iter()
                .filter(|package| !packages.contains(package))
                .cloned()
                .collect();
            self.collaborators
                .packages
                .deselect(SECURITY_POLICY_PURPOSE, &stale)?;
        }
        self.enabled = Some(index);

        let policy = &self.policies[index];
        tracing::info!(policy = %policy.id(), "Security policy enabled");
        Ok(policy)
    }

    /// Disable the enabled policy, deselecting its packages.
    ///
    /// # Errors
    ///
    /// Returns the package selector's error.
    pub fn disable_policy(&mut self) -> HardlineResult<()> {
        if let Some(index) = self.enabled {
            let policy = &self.policies[index];
            self.collaborators
                .packages
                .deselect(SECURITY_POLICY_PURPOSE, policy.packages())?;
            tracing::info!(policy = %policy.id(), "Security policy disabled");
        }
        self.enabled = None;
        Ok(())
    }

    /// The requested remediation.
    #[must_use]
    pub fn scap_action(&self) -> ScapAction {
        self.scap_action
    }

    /// Request a remediation for the next boot.
    pub fn set_scap_action(&mut self, action: ScapAction) {
        self.scap_action = action;
    }

    /// Rules of the enabled policy that fail against `target`; empty when no
    /// policy is enabled.
    pub fn failing_rules(
        &self,
        target: &TargetConfig,
        scope: Option<Scope>,
        include_disabled: bool,
    ) -> Vec<&dyn Rule> {
        self.enabled_policy()
            .map(|policy| policy.failing_rules(target, scope, include_disabled))
            .unwrap_or_default()
    }

    /// Issues of the enabled policy; empty when no policy is enabled.
    pub fn validate(&self, target: &TargetConfig) -> IssueList {
        self.enabled_policy()
            .map(|policy| policy.validate(target))
            .unwrap_or_default()
    }

    /// Persist the evaluation of `target` and configure the remediation
    /// tool.
    ///
    /// Writes the failing rules file (including disabled rules), then,
    /// unless the SCAP action is [`ScapAction::None`], patches the
    /// remediation tool override and enables its service. Does nothing
    /// when no policy is enabled. Every step can be repeated safely.
    ///
    /// # Errors
    ///
    /// Returns the first I/O or service error; earlier steps are not rolled
    /// back.
    pub fn write(&self, target: &TargetConfig) -> HardlineResult<WriteSummary> {
        let Some(policy) = self.enabled_policy() else {
            tracing::debug!("No security policy enabled, nothing to write");
            return Ok(WriteSummary::default());
        };

        let mut summary = WriteSummary {
            policy: Some(policy.id().to_string()),
            ..WriteSummary::default()
        };

        let failing = policy.failing_rules(target, None, true);
        let file = FailedRulesFile::new(self.paths.failed_rules());
        if file.save(failing.iter().map(|rule| rule.id()))? > 0 {
            summary.failed_rules_file = Some(file.path().to_path_buf());
        }
        summary.failing_rules = failing.iter().map(|rule| rule.id().clone()).collect();
        summary.failing_rules.sort();
        tracing::info!(
            policy = %policy.id(),
            failing = summary.failing_rules.len(),
            "Security policy evaluated"
        );

        if self.scap_action == ScapAction::None {
            return Ok(summary);
        }

        summary.override_file = Some(self.write_override(policy)?);

        self.collaborators.services.enable(SSG_APPLY_SERVICE)?;
        summary.service = Some(SSG_APPLY_SERVICE.to_string());

        Ok(summary)
    }

    /// Apply a profile: enable its policy, set its action and disable its
    /// rules.
    ///
    /// An unknown policy leaves no policy enabled and unknown rule ids are
    /// kept as disabled placeholders. Rule ids that are not well formed are
    /// skipped. All three are reported as warnings.
    ///
    /// # Errors
    ///
    /// Returns the package selector's error.
    pub fn import(&mut self, profile: &SecurityPolicyProfile) -> HardlineResult<()> {
        let ids: Vec<RuleId> = profile
            .disabled_rules
            .iter()
            .filter_map(|raw| match RuleId::new(raw.as_str()) {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!(rule = %raw, error = %e, "Skipping malformed rule in imported profile");
                    None
                }
            })
            .collect();

        self.scap_action = profile.action;

        let Some(id) = profile.policy.as_deref() else {
            return self.disable_policy();
        };

        match self.enable_policy(id) {
            Ok(_) => {}
            Err(HardlineError::PolicyNotFound { .. }) => {
                tracing::warn!(policy = %id, "Unknown security policy in imported profile");
                return self.disable_policy();
            }
            Err(e) => return Err(e),
        }

        if let Some(policy) = self.enabled_policy_mut() {
            for id in ids {
                policy.disable_imported(id);
            }
        }
        Ok(())
    }

    /// The profile describing the current state.
    #[must_use]
    pub fn export(&self) -> SecurityPolicyProfile {
        let policy = self.enabled_policy();
        SecurityPolicyProfile {
            policy: policy.map(|policy| policy.id().to_string()),
            action: self.scap_action,
            disabled_rules: policy
                .map(|policy| {
                    policy
                        .rules()
                        .filter(|rule| !rule.enabled())
                        .map(|rule| rule.id().to_string())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.policies
            .iter()
            .position(|policy| policy.id().eq_ignore_ascii_case(id.trim()))
    }

    fn write_override(&self, policy: &Policy) -> HardlineResult<PathBuf> {
        let target = self.paths.ssg_apply_override();
        let template = self.paths.ssg_apply_default();

        let mut config = if target.exists() {
            KeyValueFile::load(&target)?
        } else if template.exists() {
            KeyValueFile::load(&template)?
        } else {
            tracing::warn!(
                path = %template.display(),
                "Remediation tool template not found, writing a minimal override"
            );
            KeyValueFile::new()
        };

        config.set(PROFILE_KEY, policy.id());
        let remediate = if self.scap_action == ScapAction::Remediate {
            "yes"
        } else {
            "no"
        };
        config.set(REMEDIATE_KEY, remediate);
        config.strip_empty();
        config.save(&target)?;

        tracing::info!(
            path = %target.display(),
            profile = %policy.id(),
            remediate,
            "Remediation tool configured"
        );
        Ok(target)
    }
}
