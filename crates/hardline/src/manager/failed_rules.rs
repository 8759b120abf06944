//! Persistence of the failing rule list.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use hardline_common::{HardlineResult, RuleId};

/// The file listing every rule known to fail, one id per line, sorted.
///
/// A missing file means no rule was known to fail when it was last
/// written.
#[derive(Debug, Clone)]
pub struct FailedRulesFile {
    path: PathBuf,
}

impl FailedRulesFile {
    /// Use the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file contents with `ids`.
    ///
    /// An empty list removes any existing file instead of writing an empty
    /// one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or removed.
    pub fn save<'a>(&self, ids: impl IntoIterator<Item = &'a RuleId>) -> HardlineResult<usize> {
        let sorted: BTreeSet<&RuleId> = ids.into_iter().collect();

        if sorted.is_empty() {
            if self.path.exists() {
                fs::remove_file(&self.path)?;
                tracing::debug!(path = %self.path.display(), "Removed stale failing rules file");
            }
            return Ok(0);
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content: String = sorted.iter().map(|id| format!("{id}\n")).collect();
        fs::write(&self.path, content)?;

        tracing::debug!(
            path = %self.path.display(),
            count = sorted.len(),
            "Saved failing rules"
        );

        Ok(sorted.len())
    }

    /// Read the ids back, sorted. A missing file yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or holds an invalid id.
    pub fn load(&self) -> HardlineResult<Vec<RuleId>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let mut ids = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(RuleId::new)
            .collect::<HardlineResult<Vec<_>>>()?;
        ids.sort();
        Ok(ids)
    }
}
