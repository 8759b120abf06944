//! Reading and patching simple `key = value` configuration files.
//!
//! Comments and blank lines are preserved in place. Keys are unique; a
//! repeated key overrides the earlier value, as readers of these files do.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::HardlineResult;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Entry { key: String, value: String },
    Verbatim(String),
}

/// An ordered `key = value` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueFile {
    lines: Vec<Line>,
}

impl KeyValueFile {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut file = Self::new();

        for raw in content.lines() {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                file.lines.push(Line::Verbatim(raw.to_string()));
                continue;
            }

            match trimmed.split_once('=') {
                Some((key, value)) => file.set(key.trim(), unquote(value.trim())),
                None => {
                    tracing::debug!(line = %trimmed, "Ignoring malformed configuration line");
                    file.lines.push(Line::Verbatim(raw.to_string()));
                }
            }
        }

        file
    }

    /// Load a document from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn load(path: &Path) -> HardlineResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Get the value of a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            Line::Entry { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Set a key, keeping its position when it already exists.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        for line in &mut self.lines {
            if let Line::Entry { key: k, value: v } = line {
                if k == key {
                    *v = value;
                    return;
                }
            }
        }
        self.lines.push(Line::Entry {
            key: key.to_string(),
            value,
        });
    }

    /// Iterate over the entries in document order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry { key, value } => Some((key.as_str(), value.as_str())),
            Line::Verbatim(_) => None,
        })
    }

    /// Drop every entry whose value is empty.
    pub fn strip_empty(&mut self) {
        self.lines
            .retain(|line| !matches!(line, Line::Entry { value, .. } if value.is_empty()));
    }

    /// Write the document to disk, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> HardlineResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_string())?;
        tracing::debug!(path = %path.display(), "Saved configuration file");
        Ok(())
    }
}

impl fmt::Display for KeyValueFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            match line {
                Line::Entry { key, value } => writeln!(f, "{key} = {value}")?,
                Line::Verbatim(raw) => writeln!(f, "{raw}")?,
            }
        }
        Ok(())
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "\
# ssg-apply configuration
profile =
remediate = no

fetch-remote-resources = yes
";

    #[test]
    fn parse_and_get() {
        let file = KeyValueFile::parse(TEMPLATE);
        assert_eq!(file.get("profile"), Some(""));
        assert_eq!(file.get("remediate"), Some("no"));
        assert_eq!(file.get("fetch-remote-resources"), Some("yes"));
        assert_eq!(file.get("missing"), None);
    }

    #[test]
    fn set_keeps_position() {
        let mut file = KeyValueFile::parse(TEMPLATE);
        file.set("profile", "stig");
        file.set("extra", "1");
        let keys: Vec<_> = file.entries().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec!["profile", "remediate", "fetch-remote-resources", "extra"]
        );
        assert_eq!(file.get("profile"), Some("stig"));
    }

    #[test]
    fn strip_empty_values() {
        let mut file = KeyValueFile::parse(TEMPLATE);
        file.strip_empty();
        assert_eq!(file.get("profile"), None);
        assert!(file.to_string().starts_with("# ssg-apply configuration\n"));
    }

    #[test]
    fn quoted_values_and_duplicates() {
        let file = KeyValueFile::parse("a = \"x y\"\nb='z'\na = last\n");
        assert_eq!(file.get("a"), Some("last"));
        assert_eq!(file.get("b"), Some("z"));
        assert_eq!(file.entries().count(), 2);
    }

    #[test]
    fn display_normalizes_spacing() {
        let file = KeyValueFile::parse("key=value\n");
        assert_eq!(file.to_string(), "key = value\n");
    }
}
