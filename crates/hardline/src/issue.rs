//! Issues found by rule evaluation and their remediation actions.

use std::fmt;

use hardline_common::{HardlineError, HardlineResult, RuleId};

use crate::rule::Rule;

type Procedure = Box<dyn Fn() -> HardlineResult<()> + Send + Sync>;

/// An automatic remediation.
///
/// The procedure owns whatever it needs to reach the system (usually a
/// clone of the snapshot's [`TargetSystem`](crate::target::TargetSystem)
/// handle). Running it twice leaves the system as running it once does.
pub struct Action {
    message: String,
    procedure: Procedure,
}

impl Action {
    /// Create an action.
    pub fn new(
        message: impl Into<String>,
        procedure: impl Fn() -> HardlineResult<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            procedure: Box::new(procedure),
        }
    }

    /// What running the action does.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Run the remediation. Collaborator failures are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns whatever error the underlying collaborator reports.
    pub fn run(&self) -> HardlineResult<()> {
        tracing::debug!(action = %self.message, "Running remediation");
        (self.procedure)()
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// One violation found during evaluation.
#[derive(Debug)]
pub struct Issue {
    rule: RuleId,
    message: String,
    action: Option<Action>,
}

impl Issue {
    /// Record the failure of `rule`.
    ///
    /// # Errors
    ///
    /// Returns [`HardlineError::EmptyIssueMessage`] if `message` is blank.
    pub fn from_failure<R: Rule + ?Sized>(
        rule: &R,
        message: impl Into<String>,
        action: Option<Action>,
    ) -> HardlineResult<Self> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(HardlineError::EmptyIssueMessage {
                rule: rule.id().to_string(),
            });
        }
        Ok(Self {
            rule: rule.id().clone(),
            message,
            action,
        })
    }

    /// The failing rule.
    #[must_use]
    pub fn rule(&self) -> &RuleId {
        &self.rule
    }

    /// Human readable description of the violation.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The automatic remediation, if any.
    #[must_use]
    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.rule, self.message)
    }
}

/// Issues from one evaluation pass, in rule declaration order.
#[derive(Debug, Default)]
pub struct IssueList {
    issues: Vec<Issue>,
}

impl IssueList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an issue.
    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    /// Whether no issue was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Iterate over the issues.
    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.issues.iter()
    }

    /// Issues that carry an automatic remediation.
    pub fn fixable(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|issue| issue.action.is_some())
    }

    /// Run every remediation in order, stopping at the first failure.
    ///
    /// Returns the number of actions run.
    ///
    /// # Errors
    ///
    /// Propagates the first remediation error unchanged.
    pub fn fix_all(&self) -> HardlineResult<usize> {
        let mut count = 0;
        for issue in self.fixable() {
            if let Some(action) = &issue.action {
                action.run()?;
                tracing::info!(rule = %issue.rule, action = %action.message(), "Issue fixed");
                count += 1;
            }
        }
        Ok(count)
    }
}

impl<'a> IntoIterator for &'a IssueList {
    type Item = &'a Issue;
    type IntoIter = std::slice::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}

impl FromIterator<Issue> for IssueList {
    fn from_iter<I: IntoIterator<Item = Issue>>(iter: I) -> Self {
        Self {
            issues: iter.into_iter().collect(),
        }
    }
}
