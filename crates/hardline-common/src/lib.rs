//! # hardline-common
//!
//! Shared types for the hardline compliance engine.
//!
//! This crate provides functionality used across all hardline crates:
//! - The error taxonomy
//! - Well-known paths on the target system
//! - Rule identifiers
//! - Disk size quantities
//! - `key = value` configuration files

#![warn(missing_docs)]

pub mod error;
pub mod id;
pub mod keyvalue;
pub mod paths;
pub mod size;

pub use error::{HardlineError, HardlineResult};
pub use id::RuleId;
pub use keyvalue::KeyValueFile;
pub use paths::HardlinePaths;
pub use size::DiskSize;
