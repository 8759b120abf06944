//! Persisted security module configuration (`/etc/selinux/config`).

use std::fs;
use std::path::{Path, PathBuf};

use hardline_common::HardlineResult;

use crate::mode::Mode;

const MODE_KEY: &str = "SELINUX";

/// The persisted configuration file, edited in place.
///
/// Only the `SELINUX=` line is interpreted; every other line is written
/// back untouched.
#[derive(Debug, Clone)]
pub struct LsmConfigFile {
    path: PathBuf,
    lines: Vec<String>,
}

impl LsmConfigFile {
    /// Load the configuration. A missing file yields an empty document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load(path: impl Into<PathBuf>) -> HardlineResult<Self> {
        let path = path.into();
        let lines = match fs::read_to_string(&path) {
            Ok(content) => content.lines().map(String::from).collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Security module configuration not found");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, lines })
    }

    /// Path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The raw mode value, if configured.
    #[must_use]
    pub fn mode_value(&self) -> Option<&str> {
        self.lines.iter().rev().find_map(|line| parse_mode_line(line))
    }

    /// The configured mode. Unknown values are reported and ignored.
    #[must_use]
    pub fn mode(&self) -> Option<&'static Mode> {
        let value = self.mode_value()?;
        let mode = Mode::find(value);
        if mode.is_none() {
            tracing::warn!(value, path = %self.path.display(), "Unknown security module mode");
        }
        mode
    }

    /// Set the persisted mode.
    pub fn set_mode(&mut self, mode: &Mode) {
        let line = format!("{MODE_KEY}={}", mode.id());
        match self
            .lines
            .iter()
            .rposition(|l| parse_mode_line(l).is_some())
        {
            Some(index) => self.lines[index] = line,
            None => self.lines.push(line),
        }
    }

    /// Write the configuration back to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> HardlineResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut content = self.lines.join("\n");
        content.push('\n');
        fs::write(&self.path, content)?;
        tracing::info!(path = %self.path.display(), "Security module configuration written");
        Ok(())
    }
}

fn parse_mode_line(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.starts_with('#') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    (key.trim() == MODE_KEY).then(|| value.trim().trim_matches('"'))
}
