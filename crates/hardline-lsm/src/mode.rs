//! The fixed set of security module modes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kernel parameter selecting the major security module.
pub const SECURITY_PARAM: &str = "security";
/// Kernel parameter enabling or disabling the module.
pub const ENABLE_PARAM: &str = "selinux";
/// Kernel parameter selecting the enforcement level.
pub const ENFORCE_PARAM: &str = "enforcing";
/// Value of [`SECURITY_PARAM`] naming this module.
pub const MODULE_NAME: &str = "selinux";

/// Identifier of a mode, ordered by increasing strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeId {
    /// The module is not loaded.
    Disabled,
    /// Policy violations are logged but allowed.
    Permissive,
    /// Policy violations are denied.
    Enforcing,
}

impl ModeId {
    /// Name used in configuration files.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Permissive => "permissive",
            Self::Enforcing => "enforcing",
        }
    }
}

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw representation of one kernel parameter in a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawOption {
    /// The parameter is set to this value.
    Value(&'static str),
    /// The parameter must not be present.
    Absent,
}

/// One operating level of the security module.
#[derive(Debug, PartialEq, Eq)]
pub struct Mode {
    id: ModeId,
    display_name: &'static str,
    raw_options: &'static [(&'static str, RawOption)],
}

static MODES: [Mode; 3] = [
    Mode {
        id: ModeId::Disabled,
        display_name: "Disabled",
        raw_options: &[
            (SECURITY_PARAM, RawOption::Absent),
            (ENABLE_PARAM, RawOption::Absent),
            (ENFORCE_PARAM, RawOption::Absent),
        ],
    },
    Mode {
        id: ModeId::Permissive,
        display_name: "Permissive",
        raw_options: &[
            (SECURITY_PARAM, RawOption::Value(MODULE_NAME)),
            (ENABLE_PARAM, RawOption::Value("1")),
            (ENFORCE_PARAM, RawOption::Value("0")),
        ],
    },
    Mode {
        id: ModeId::Enforcing,
        display_name: "Enforcing",
        raw_options: &[
            (SECURITY_PARAM, RawOption::Value(MODULE_NAME)),
            (ENABLE_PARAM, RawOption::Value("1")),
            (ENFORCE_PARAM, RawOption::Value("1")),
        ],
    },
];

impl Mode {
    /// All modes, least strict first.
    #[must_use]
    pub fn all() -> &'static [Mode] {
        &MODES
    }

    /// Look a mode up by its configuration name (case-insensitive).
    ///
    /// Returns `None` for unknown names; the caller chooses the fallback.
    #[must_use]
    pub fn find(id: &str) -> Option<&'static Mode> {
        let id = id.trim();
        MODES.iter().find(|mode| mode.id.as_str().eq_ignore_ascii_case(id))
    }

    /// The mode with the given identifier.
    #[must_use]
    pub fn get(id: ModeId) -> &'static Mode {
        match id {
            ModeId::Disabled => &MODES[0],
            ModeId::Permissive => &MODES[1],
            ModeId::Enforcing => &MODES[2],
        }
    }

    /// Least strict mode, used when nothing else matches.
    #[must_use]
    pub fn least_strict() -> &'static Mode {
        &MODES[0]
    }

    /// Mode identifier.
    #[must_use]
    pub fn id(&self) -> ModeId {
        self.id
    }

    /// Human readable name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        self.display_name
    }

    /// Kernel parameters describing this mode, in application order.
    #[must_use]
    pub fn raw_options(&self) -> &'static [(&'static str, RawOption)] {
        self.raw_options
    }

    /// Parameters to set on the kernel command line for this mode.
    pub fn params_to_set(&self) -> impl Iterator<Item = (&'static str, &'static str)> {
        self.raw_options.iter().filter_map(|(name, option)| match option {
            RawOption::Value(value) => Some((*name, *value)),
            RawOption::Absent => None,
        })
    }

    /// Parameters to remove from the kernel command line for this mode.
    pub fn params_to_remove(&self) -> impl Iterator<Item = &'static str> {
        self.raw_options
            .iter()
            .filter(|(_, option)| *option == RawOption::Absent)
            .map(|(name, _)| *name)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name)
    }
}

impl PartialOrd for Mode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Mode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}
