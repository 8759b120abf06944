//! Built-in policies.

use hardline_common::{DiskSize, HardlineResult, RuleId};

use super::Policy;
use crate::rule::{
    BootloaderPasswordRule, EncryptedFilesystemsRule, FirewallEnabledRule, LsmEnforcingRule,
    MinimumFilesystemSizeRule, NoWirelessRule, Rule, RuleMeta, SeparateFilesystemRule,
    SeparateMountPointRule,
};

/// Id of the DISA STIG policy.
pub const STIG_ID: &str = "stig";

const STIG_PACKAGES: &[&str] = &["ssg-apply", "scap-security-guide"];
const GENERAL_SRG: &str = "SRG-OS-000480-GPOS-00227";

/// Every built-in policy.
///
/// # Errors
///
/// Returns an error if a built-in rule definition is invalid.
pub fn catalog() -> HardlineResult<Vec<Policy>> {
    Ok(vec![stig()?])
}

/// The Defense Information Systems Agency STIG.
///
/// # Errors
///
/// Returns an error if a built-in rule definition is invalid.
pub fn stig() -> HardlineResult<Policy> {
    let srg = |meta: RuleMeta| meta.with_references([GENERAL_SRG]);

    let rules: Vec<Box<dyn Rule>> = vec![
        Box::new(SeparateMountPointRule::new(RuleId::new("SLES-15-040200")?, "/home").with_meta(srg)),
        Box::new(SeparateMountPointRule::new(RuleId::new("SLES-15-040210")?, "/var").with_meta(srg)),
        Box::new(
            SeparateFilesystemRule::new(RuleId::new("SLES-15-030810")?, "/var/log/audit")
                .with_meta(|meta| meta.with_references(["SRG-OS-000341-GPOS-00132"])),
        ),
        Box::new(
            MinimumFilesystemSizeRule::new(
                RuleId::new("SLES-15-030660")?,
                "/var/log/audit",
                DiskSize::gib(10),
            )
            .with_meta(|meta| meta.with_references(["SRG-OS-000341-GPOS-00132"])),
        ),
        Box::new(
            EncryptedFilesystemsRule::new(RuleId::new("SLES-15-010330")?)
                .with_meta(|meta| meta.with_references(["SRG-OS-000405-GPOS-00184"])),
        ),
        Box::new(
            BootloaderPasswordRule::new(RuleId::new("SLES-15-010190")?)
                .with_meta(|meta| meta.with_references(["SRG-OS-000080-GPOS-00048"])),
        ),
        Box::new(
            FirewallEnabledRule::new(RuleId::new("SLES-15-010220")?)
                .with_meta(|meta| meta.with_references(["SRG-OS-000096-GPOS-00050"])),
        ),
        Box::new(
            NoWirelessRule::new(RuleId::new("SLES-15-010380")?)
                .with_meta(|meta| meta.with_references(["SRG-OS-000299-GPOS-00117"])),
        ),
        Box::new(
            LsmEnforcingRule::new(RuleId::new("xccdf_org.ssgproject.content_rule_selinux_state")?)
                .with_meta(srg),
        ),
    ];

    Ok(Policy::new(STIG_ID, "Defense Information Systems Agency STIG", rules)?
        .with_version("V2R1")
        .with_packages(STIG_PACKAGES.iter().copied()))
}
