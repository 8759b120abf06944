//! # Hardline
//!
//! Hardline evaluates security policies against the configuration of a
//! target system and hands unresolved findings to the post-install
//! compliance tool.
//!
//! ## Features
//!
//! - **Rules**: storage, bootloader, network and security module checks with
//!   optional automatic remediation
//! - **Policies**: named baselines such as the DISA STIG
//! - **Snapshots**: every rule of one evaluation sees the same frozen view
//! - **Write phase**: failing rules file and `ssg-apply` configuration
//!
//! ## Usage
//!
//! ```no_run
//! use hardline::manager::{Collaborators, Manager, ManagerConfig, ScapAction};
//! use hardline::snapshot::TargetConfig;
//! use hardline::target::SystemState;
//! use hardline_common::HardlinePaths;
//!
//! # fn example() -> hardline_common::HardlineResult<()> {
//! let paths = HardlinePaths::with_root("/mnt");
//! let collaborators = Collaborators::system(&paths);
//! let mut manager = Manager::new(ManagerConfig::new(paths)?, collaborators)?;
//!
//! manager.enable_policy("stig")?;
//! manager.set_scap_action(ScapAction::Scan);
//!
//! let target = TargetConfig::from_state(SystemState::default());
//! for rule in manager.failing_rules(&target, None, false) {
//!     println!("{}: {}", rule.id(), rule.description());
//! }
//! manager.write(&target)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod cli;
pub mod collab;
pub mod issue;
pub mod manager;
pub mod policy;
pub mod rule;
pub mod snapshot;
pub mod target;

pub use issue::{Action, Issue, IssueList};
pub use manager::{Manager, ScapAction};
pub use policy::Policy;
pub use rule::{Rule, Scope};
pub use snapshot::TargetConfig;
