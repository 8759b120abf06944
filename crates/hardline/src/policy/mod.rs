//! Security policies.
//!
//! A [`Policy`] is a named, versioned bundle of rules evaluated together
//! against one [`TargetConfig`].

mod catalog;

use std::collections::BTreeSet;

use hardline_common::{HardlineError, HardlineResult, RuleId};

use crate::issue::IssueList;
use crate::rule::{Rule, Scope, UnknownRule};
use crate::snapshot::TargetConfig;

pub use catalog::{STIG_ID, catalog, stig};

/// A named bundle of rules.
#[derive(Debug)]
pub struct Policy {
    id: String,
    name: String,
    version: String,
    rules: Vec<Box<dyn Rule>>,
    packages: Vec<String>,
}

impl Policy {
    /// Create a policy.
    ///
    /// # Errors
    ///
    /// Returns [`HardlineError::Config`] if two rules share an id.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        rules: Vec<Box<dyn Rule>>,
    ) -> HardlineResult<Self> {
        let id = id.into();
        let mut seen = BTreeSet::new();
        for rule in &rules {
            if !seen.insert(rule.id().clone()) {
                return Err(HardlineError::Config {
                    message: format!("policy {id} declares rule {} twice", rule.id()),
                });
            }
        }

        Ok(Self {
            id,
            name: name.into(),
            version: String::new(),
            rules,
            packages: Vec::new(),
        })
    }

    /// Set the policy version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the packages needed to scan and remediate the policy.
    #[must_use]
    pub fn with_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages = packages.into_iter().map(Into::into).collect();
        self
    }

    /// Policy identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version of the baseline.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Packages needed to scan and remediate the policy.
    #[must_use]
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|rule| &**rule as &dyn Rule)
    }

    /// Look a rule up by id.
    #[must_use]
    pub fn rule(&self, id: &str) -> Option<&dyn Rule> {
        self.rules().find(|rule| rule.id() == id)
    }

    /// Look a rule up by id for modification.
    pub fn rule_mut(&mut self, id: &str) -> Option<&mut Box<dyn Rule>> {
        self.rules.iter_mut().find(|rule| rule.id() == id)
    }

    /// Append a rule.
    ///
    /// # Errors
    ///
    /// Returns [`HardlineError::Config`] if a rule with the same id exists.
    pub fn add_rule(&mut self, rule: Box<dyn Rule>) -> HardlineResult<()> {
        if self.rule(rule.id().as_str()).is_some() {
            return Err(HardlineError::Config {
                message: format!("policy {} declares rule {} twice", self.id, rule.id()),
            });
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Include a rule in evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`HardlineError::RuleNotFound`] if the policy has no such rule.
    pub fn enable_rule(&mut self, id: &str) -> HardlineResult<()> {
        self.find_mut(id)?.enable();
        Ok(())
    }

    /// Exclude a rule from evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`HardlineError::RuleNotFound`] if the policy has no such rule.
    pub fn disable_rule(&mut self, id: &str) -> HardlineResult<()> {
        self.find_mut(id)?.disable();
        Ok(())
    }

    /// Disable a rule named by imported configuration.
    ///
    /// Ids this policy does not know are kept as disabled [`UnknownRule`]s
    /// so that exporting the policy again preserves them.
    pub fn disable_imported(&mut self, id: RuleId) {
        if let Some(rule) = self.rule_mut(id.as_str()) {
            rule.disable();
            return;
        }

        tracing::warn!(policy = %self.id, rule = %id, "Unknown rule in imported configuration");
        let mut rule = UnknownRule::new(id);
        rule.disable();
        self.rules.push(Box::new(rule));
    }

    /// Rules that fail against `target`, in declaration order.
    ///
    /// Only rules with the given `scope` are evaluated when one is given.
    /// Disabled rules are skipped unless `include_disabled` is set. Nothing
    /// is fixed.
    pub fn failing_rules(
        &self,
        target: &TargetConfig,
        scope: Option<Scope>,
        include_disabled: bool,
    ) -> Vec<&dyn Rule> {
        self.rules()
            .filter(|rule| scope.is_none_or(|scope| rule.scope() == scope))
            .filter(|rule| include_disabled || rule.enabled())
            .filter(|rule| !rule.pass(target))
            .collect()
    }

    /// Issues for every enabled rule that fails against `target`.
    pub fn validate(&self, target: &TargetConfig) -> IssueList {
        self.rules()
            .filter(|rule| rule.enabled())
            .filter_map(|rule| rule.issue(target))
            .collect()
    }

    fn find_mut(&mut self, id: &str) -> HardlineResult<&mut Box<dyn Rule>> {
        let policy = self.id.clone();
        self.rule_mut(id).ok_or_else(|| HardlineError::RuleNotFound {
            policy,
            rule: id.to_string(),
        })
    }
}
