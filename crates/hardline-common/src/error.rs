//! Common error types for the hardline engine.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`HardlineError`].
pub type HardlineResult<T> = Result<T, HardlineError>;

/// Errors raised by the policy engine and its collaborators.
#[derive(Error, Diagnostic, Debug)]
pub enum HardlineError {
    /// Security policy not found in the catalog.
    #[error("Security policy not found: {id}")]
    #[diagnostic(
        code(hardline::policy::not_found),
        help("Run `hardline policies` to list the known policies")
    )]
    PolicyNotFound {
        /// The policy ID that was not found.
        id: String,
    },

    /// No security policy is enabled.
    #[error("No security policy is enabled")]
    #[diagnostic(
        code(hardline::policy::none_enabled),
        help("Enable a policy with --policy or the HARDLINE_SECURITY_POLICY variable")
    )]
    NoPolicyEnabled,

    /// Rule not found in a policy.
    #[error("Rule {rule} not found in policy {policy}")]
    #[diagnostic(code(hardline::rule::not_found))]
    RuleNotFound {
        /// The policy searched.
        policy: String,
        /// The rule ID that was not found.
        rule: String,
    },

    /// The rule cannot be remediated automatically.
    #[error("Rule cannot be fixed automatically: {rule}")]
    #[diagnostic(
        code(hardline::rule::not_fixable),
        help("This requirement has to be fixed manually")
    )]
    RuleNotFixable {
        /// The rule ID.
        rule: String,
    },

    /// Invalid rule identifier format.
    #[error("Invalid rule ID: {id}")]
    #[diagnostic(
        code(hardline::rule::invalid_id),
        help("Rule IDs must be 1-128 characters of letters, digits, '-', '_', '.' or ':'")
    )]
    InvalidRuleId {
        /// The invalid rule ID.
        id: String,
    },

    /// Invalid disk size format.
    #[error("Invalid disk size: {value}")]
    #[diagnostic(
        code(hardline::size::invalid),
        help("Use formats like '512MiB', '5GiB', '10G' or a plain number of bytes")
    )]
    InvalidSize {
        /// The invalid value.
        value: String,
    },

    /// Unknown SCAP action name.
    #[error("Invalid SCAP action: {value}")]
    #[diagnostic(
        code(hardline::scap::invalid_action),
        help("Valid actions are 'none', 'scan' and 'remediate'")
    )]
    InvalidScapAction {
        /// The invalid value.
        value: String,
    },

    /// Malformed kernel command line parameter.
    #[error("Invalid kernel parameter: {param}")]
    #[diagnostic(code(hardline::lsm::invalid_param))]
    InvalidKernelParam {
        /// The offending parameter.
        param: String,
    },

    /// An issue was created without a message.
    #[error("Issue for rule {rule} has an empty message")]
    #[diagnostic(code(hardline::issue::empty_message))]
    EmptyIssueMessage {
        /// The rule the issue belongs to.
        rule: String,
    },

    /// A remediation collaborator failed.
    #[error("Remediation failed: {message}")]
    #[diagnostic(code(hardline::remediation))]
    Remediation {
        /// The message reported by the collaborator.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(hardline::io))]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    #[diagnostic(code(hardline::serialization))]
    Serialization(String),

    /// Permission denied.
    #[error("Permission denied: {operation}")]
    #[diagnostic(
        code(hardline::permission_denied),
        help("Try running with elevated privileges (sudo)")
    )]
    PermissionDenied {
        /// The operation that was denied.
        operation: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(hardline::config))]
    Config {
        /// The error message.
        message: String,
    },

    /// Internal error (should not happen).
    #[error("Internal error: {message}")]
    #[diagnostic(code(hardline::internal), help("This is a bug, please report it"))]
    Internal {
        /// The error message.
        message: String,
    },
}

impl From<serde_json::Error> for HardlineError {
    fn from(err: serde_json::Error) -> Self {
        HardlineError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = HardlineError::PolicyNotFound {
            id: "cis".to_string(),
        };
        assert_eq!(err.to_string(), "Security policy not found: cis");

        let err = HardlineError::RuleNotFound {
            policy: "stig".to_string(),
            rule: "SLES-15-000000".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Rule SLES-15-000000 not found in policy stig"
        );
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: HardlineError = io_err.into();
        assert!(matches!(err, HardlineError::Io(_)));
    }

    #[test]
    fn error_from_json() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: HardlineError = json_err.into();
        assert!(matches!(err, HardlineError::Serialization(_)));
    }
}
