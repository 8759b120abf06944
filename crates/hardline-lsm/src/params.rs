//! Kernel command line parameters.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use hardline_common::{HardlineError, HardlineResult};

use crate::mode::Mode;

/// State of one raw parameter as seen by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamValue<'a> {
    /// The parameter is present with this value (empty for a bare flag).
    Present(&'a str),
    /// The parameter is known not to be present.
    Absent,
    /// The parameter was never queried.
    Unknown,
}

impl<'a> ParamValue<'a> {
    /// The value, when present.
    #[must_use]
    pub fn value(self) -> Option<&'a str> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent | Self::Unknown => None,
        }
    }
}

/// A set of kernel parameters.
///
/// A parameter set read from a complete command line reports every
/// parameter it does not contain as [`ParamValue::Absent`]. A partial set
/// (built by hand, e.g. from a bootloader view that only tracks some
/// parameters) reports unlisted parameters as [`ParamValue::Unknown`] and
/// only those explicitly removed as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelParams {
    /// Parameter name to value; `None` marks an explicitly absent parameter.
    #[serde(default)]
    entries: BTreeMap<String, Option<String>>,
    /// Whether unlisted parameters are known to be absent.
    #[serde(default)]
    complete: bool,
}

impl KernelParams {
    /// An empty, partial parameter set: everything is unknown.
    #[must_use]
    pub fn unknown() -> Self {
        Self::default()
    }

    /// An empty, complete parameter set: everything is absent.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
            complete: true,
        }
    }

    /// Parse a full kernel command line.
    ///
    /// Double-quoted values may contain spaces. Later occurrences of a
    /// parameter override earlier ones, as the kernel does.
    ///
    /// # Errors
    ///
    /// Returns an error for an unterminated quote or an empty parameter
    /// name.
    pub fn parse(cmdline: &str) -> HardlineResult<Self> {
        let mut params = Self::empty();

        for word in split_words(cmdline)? {
            let (name, value) = match word.split_once('=') {
                Some((name, value)) => (name, value),
                None => (word.as_str(), ""),
            };
            if name.is_empty() {
                return Err(HardlineError::InvalidKernelParam { param: word.clone() });
            }
            params.set(name, value.trim_matches('"'));
        }

        Ok(params)
    }

    /// Read the command line of the running kernel.
    ///
    /// # Errors
    ///
    /// Returns an error if `/proc/cmdline` cannot be read or parsed.
    #[cfg(target_os = "linux")]
    pub fn from_running_kernel() -> HardlineResult<Self> {
        let cmdline = std::fs::read_to_string("/proc/cmdline")?;
        Self::parse(cmdline.trim())
    }

    /// Read the command line of the running kernel.
    ///
    /// # Errors
    ///
    /// Always fails on platforms without `/proc/cmdline`.
    #[cfg(not(target_os = "linux"))]
    pub fn from_running_kernel() -> HardlineResult<Self> {
        Err(HardlineError::Config {
            message: "kernel command line is only available on Linux".to_string(),
        })
    }

    /// Look a parameter up.
    #[must_use]
    pub fn get(&self, name: &str) -> ParamValue<'_> {
        match self.entries.get(name) {
            Some(Some(value)) => ParamValue::Present(value.as_str()),
            Some(None) => ParamValue::Absent,
            None if self.complete => ParamValue::Absent,
            None => ParamValue::Unknown,
        }
    }

    /// Set a parameter.
    pub fn set(&mut self, name: &str, value: &str) {
        self.entries.insert(name.to_string(), Some(value.to_string()));
    }

    /// Mark a parameter as absent.
    pub fn remove(&mut self, name: &str) {
        self.entries.insert(name.to_string(), None);
    }

    /// Builder form of [`KernelParams::set`].
    #[must_use]
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.set(name, value);
        self
    }

    /// Builder form of [`KernelParams::remove`].
    #[must_use]
    pub fn without(mut self, name: &str) -> Self {
        self.remove(name);
        self
    }

    /// Rewrite the parameters so that they describe `mode`.
    pub fn apply_mode(&mut self, mode: &Mode) {
        for (name, value) in mode.params_to_set() {
            self.set(name, value);
        }
        for name in mode.params_to_remove() {
            self.remove(name);
        }
    }
}

impl fmt::Display for KernelParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.entries {
            let Some(value) = value else { continue };
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            if value.is_empty() {
                f.write_str(name)?;
            } else if value.contains(' ') {
                write!(f, "{name}=\"{value}\"")?;
            } else {
                write!(f, "{name}={value}")?;
            }
        }
        Ok(())
    }
}

fn split_words(cmdline: &str) -> HardlineResult<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in cmdline.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if quoted {
        return Err(HardlineError::InvalidKernelParam { param: current });
    }
    if !current.is_empty() {
        words.push(current);
    }

    Ok(words)
}
