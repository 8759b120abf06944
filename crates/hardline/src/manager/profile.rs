//! Serializable manager state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use hardline_common::{HardlineError, HardlineResult};

/// What the remediation tool does on the next boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScapAction {
    /// Do not configure the remediation tool.
    #[default]
    None,
    /// Scan only.
    Scan,
    /// Scan and remediate.
    Remediate,
}

impl ScapAction {
    /// Action name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Scan => "scan",
            Self::Remediate => "remediate",
        }
    }
}

impl fmt::Display for ScapAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScapAction {
    type Err = HardlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "scan" => Ok(Self::Scan),
            "remediate" => Ok(Self::Remediate),
            _ => Err(HardlineError::InvalidScapAction {
                value: s.to_string(),
            }),
        }
    }
}

/// The security policy settings of an installation, as exchanged with
/// other tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityPolicyProfile {
    /// Id of the enabled policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    /// Requested remediation.
    #[serde(default)]
    pub action: ScapAction,
    /// Rules excluded from evaluation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled_rules: Vec<String>,
}

impl SecurityPolicyProfile {
    /// Parse a profile from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> HardlineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the profile as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> HardlineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scap_action_parsing() {
        assert_eq!("Remediate".parse::<ScapAction>().unwrap(), ScapAction::Remediate);
        assert_eq!("scan".parse::<ScapAction>().unwrap(), ScapAction::Scan);
        let err = "fix".parse::<ScapAction>().unwrap_err();
        assert!(matches!(err, HardlineError::InvalidScapAction { .. }));
        assert_eq!(ScapAction::default(), ScapAction::None);
    }

    #[test]
    fn profile_defaults() {
        let profile = SecurityPolicyProfile::from_json("{}").unwrap();
        assert_eq!(profile, SecurityPolicyProfile::default());

        let profile =
            SecurityPolicyProfile::from_json(r#"{"policy":"stig","action":"scan"}"#).unwrap();
        assert_eq!(profile.policy.as_deref(), Some("stig"));
        assert_eq!(profile.action, ScapAction::Scan);
        assert!(profile.disabled_rules.is_empty());
    }

    #[test]
    fn profile_json_shape() {
        let profile = SecurityPolicyProfile {
            policy: Some("stig".to_string()),
            action: ScapAction::Remediate,
            disabled_rules: vec!["SLES-15-010380".to_string()],
        };
        insta::assert_snapshot!(profile.to_json().unwrap(), @r#"
        {
          "policy": "stig",
          "action": "remediate",
          "disabled_rules": [
            "SLES-15-010380"
          ]
        }
        "#);
    }
}
