//! Resolution of the active mode from boot parameters and configuration.
//!
//! Precedence, highest first:
//! 1. module not selected or switched off on the kernel command line: Disabled
//! 2. enforcement parameter strictly positive: Enforcing
//! 3. enforcement parameter zero, negative or unparseable: Permissive
//! 4. enforcement parameter absent or unknown: the persisted configuration
//!    value, or Permissive when there is none; an unknown value falls back
//!    to the least strict mode

use crate::mode::{ENABLE_PARAM, ENFORCE_PARAM, MODULE_NAME, Mode, ModeId, SECURITY_PARAM};
use crate::params::{KernelParams, ParamValue};

/// Outcome of resolving the kernel parameters alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootResolution {
    /// The parameters determine the mode.
    Resolved(&'static Mode),
    /// The module is enabled but the parameters say nothing about strictness.
    Indeterminate,
}

/// Resolve the mode described by kernel parameters alone.
///
/// An unknown enable parameter counts as absent. A `security=` parameter
/// naming a different module disables this one.
#[must_use]
pub fn resolve_boot(params: &KernelParams) -> BootResolution {
    if !module_selected(params) || !is_on(params.get(ENABLE_PARAM)) {
        return BootResolution::Resolved(Mode::get(ModeId::Disabled));
    }

    match params.get(ENFORCE_PARAM) {
        ParamValue::Present(value) if is_positive(value) => {
            BootResolution::Resolved(Mode::get(ModeId::Enforcing))
        }
        ParamValue::Present(_) => BootResolution::Resolved(Mode::get(ModeId::Permissive)),
        ParamValue::Absent | ParamValue::Unknown => BootResolution::Indeterminate,
    }
}

/// Resolve the mode from kernel parameters, falling back to the persisted
/// configuration value.
///
/// A missing configuration value means Permissive. An unknown one is
/// reported and resolves to the least strict mode.
#[must_use]
pub fn resolve(params: &KernelParams, config_value: Option<&str>) -> &'static Mode {
    match resolve_boot(params) {
        BootResolution::Resolved(mode) => mode,
        BootResolution::Indeterminate => match config_value {
            Some(value) => Mode::find(value).unwrap_or_else(|| {
                let fallback = Mode::least_strict();
                tracing::warn!(value, fallback = %fallback, "Unknown security module mode in configuration");
                fallback
            }),
            None => Mode::get(ModeId::Permissive),
        },
    }
}

fn module_selected(params: &KernelParams) -> bool {
    match params.get(SECURITY_PARAM) {
        ParamValue::Present(value) => value.is_empty() || value == MODULE_NAME,
        ParamValue::Absent | ParamValue::Unknown => true,
    }
}

fn is_on(value: ParamValue<'_>) -> bool {
    value.value().is_some_and(is_positive)
}

fn is_positive(value: &str) -> bool {
    let value = value.trim();
    if ["on", "yes", "true"]
        .iter()
        .any(|word| value.eq_ignore_ascii_case(word))
    {
        return true;
    }
    value.parse::<i64>().is_ok_and(|n| n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(mode: &Mode) -> ModeId {
        mode.id()
    }

    #[test]
    fn enable_absent_is_disabled_regardless_of_enforcing() {
        let params = KernelParams::empty().with("enforcing", "1");
        assert_eq!(id(resolve(&params, Some("enforcing"))), ModeId::Disabled);

        let params = KernelParams::unknown().with("enforcing", "1");
        assert_eq!(id(resolve(&params, None)), ModeId::Disabled);
    }

    #[test]
    fn enable_off_is_disabled() {
        for off in ["0", "off", "no", "", "-1"] {
            let params = KernelParams::empty().with("selinux", off).with("enforcing", "1");
            assert_eq!(id(resolve(&params, None)), ModeId::Disabled, "selinux={off}");
        }
    }

    #[test]
    fn other_major_module_is_disabled() {
        let params = KernelParams::empty()
            .with("security", "apparmor")
            .with("selinux", "1")
            .with("enforcing", "1");
        assert_eq!(id(resolve(&params, None)), ModeId::Disabled);
    }

    #[test]
    fn positive_enforcing_is_enforcing() {
        let params = KernelParams::empty().with("selinux", "on").with("enforcing", "1");
        assert_eq!(id(resolve(&params, Some("permissive"))), ModeId::Enforcing);

        let params = KernelParams::empty().with("selinux", "1").with("enforcing", "7");
        assert_eq!(id(resolve(&params, None)), ModeId::Enforcing);
    }

    #[test]
    fn zero_or_negative_enforcing_is_permissive() {
        for value in ["0", "-3", "garbage"] {
            let params = KernelParams::empty().with("selinux", "1").with("enforcing", value);
            assert_eq!(
                id(resolve(&params, Some("enforcing"))),
                ModeId::Permissive,
                "enforcing={value}"
            );
        }
    }

    #[test]
    fn missing_enforcing_falls_back_to_config() {
        let params = KernelParams::empty().with("selinux", "on");
        assert_eq!(resolve_boot(&params), BootResolution::Indeterminate);
        assert_eq!(id(resolve(&params, Some("enforcing"))), ModeId::Enforcing);
        assert_eq!(id(resolve(&params, Some("disabled"))), ModeId::Disabled);
        assert_eq!(id(resolve(&params, None)), ModeId::Permissive);
    }

    #[test]
    fn unknown_config_value_is_least_strict() {
        let params = KernelParams::empty().with("security", "selinux").with("selinux", "1");
        assert_eq!(id(resolve(&params, Some("paranoid"))), ModeId::Disabled);
        assert_eq!(id(resolve(&params, Some(""))), ModeId::Disabled);
    }

    #[test]
    fn unqueried_enforcing_falls_back_to_config() {
        let params = KernelParams::unknown().with("selinux", "1");
        assert_eq!(id(resolve(&params, Some("enforcing"))), ModeId::Enforcing);
    }

    #[test]
    fn mode_params_resolve_to_the_mode() {
        for mode in Mode::all() {
            let mut params = KernelParams::empty();
            params.apply_mode(mode);
            assert_eq!(resolve(&params, None), mode);
        }
    }

    fn raw_value() -> impl Strategy<Value = Option<Option<String>>> {
        prop_oneof![
            Just(None),
            Just(Some(None)),
            prop::sample::select(vec!["0", "1", "-1", "2", "on", "off", "yes", "no", "selinux", "apparmor", ""])
                .prop_map(|v| Some(Some(v.to_string()))),
        ]
    }

    fn build(entries: [(&str, Option<Option<String>>); 3], complete: bool) -> KernelParams {
        let mut params = if complete {
            KernelParams::empty()
        } else {
            KernelParams::unknown()
        };
        for (name, value) in entries {
            match value {
                Some(Some(value)) => params.set(name, &value),
                Some(None) => params.remove(name),
                None => {}
            }
        }
        params
    }

    proptest! {
        #[test]
        fn resolution_is_total_and_deterministic(
            security in raw_value(),
            enable in raw_value(),
            enforce in raw_value(),
            complete in any::<bool>(),
            config in proptest::option::of(prop::sample::select(vec!["disabled", "permissive", "enforcing", "bogus"])),
        ) {
            let params = build(
                [("security", security), ("selinux", enable), ("enforcing", enforce)],
                complete,
            );
            let first = resolve(&params, config);
            let second = resolve(&params, config);
            prop_assert_eq!(first, second);
            prop_assert!(Mode::all().contains(first));

            if !matches!(params.get("selinux"), ParamValue::Present(v) if is_positive(v)) {
                prop_assert_eq!(first.id(), ModeId::Disabled);
            }
        }
    }
}
