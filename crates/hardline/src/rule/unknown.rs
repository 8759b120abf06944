//! Placeholder for rules the engine does not implement.

use hardline_common::RuleId;

use super::{Rule, RuleMeta, Scope};
use crate::snapshot::TargetConfig;

/// A rule referenced by imported configuration that this engine does not
/// implement. It always passes and cannot be fixed.
#[derive(Debug, Clone)]
pub struct UnknownRule {
    meta: RuleMeta,
}

impl UnknownRule {
    /// Create a placeholder for `id`.
    pub fn new(id: RuleId) -> Self {
        let description = format!("Unknown rule {id}");
        Self {
            meta: RuleMeta::new(id, description, Scope::Unknown),
        }
    }
}

impl Rule for UnknownRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RuleMeta {
        &mut self.meta
    }

    fn pass(&self, _target: &TargetConfig) -> bool {
        true
    }
}
