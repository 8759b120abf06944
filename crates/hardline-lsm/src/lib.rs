//! # hardline-lsm
//!
//! Mode handling for the SELinux-style security module.
//!
//! The module runs in one of a fixed, ordered set of [`Mode`]s. The active
//! mode is derived from kernel boot parameters ([`KernelParams`]) with the
//! persisted configuration file ([`LsmConfigFile`]) as fallback; see
//! [`resolve`] for the precedence rules.

#![warn(missing_docs)]

pub mod config;
pub mod mode;
pub mod params;
pub mod resolve;

pub use config::LsmConfigFile;
pub use mode::{Mode, ModeId, RawOption};
pub use params::{KernelParams, ParamValue};
pub use resolve::{BootResolution, resolve, resolve_boot};
