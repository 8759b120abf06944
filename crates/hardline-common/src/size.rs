//! Disk size parsing and representation.
//!
//! Accepts the units found in storage tooling:
//! - Binary: "512KiB", "512Ki", "1MiB", "5GiB", "2TiB"
//! - Decimal: "500k", "500KB", "10M", "10MB", "5G", "5GB", "1T"
//! - Plain number of bytes: "1048576"

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::error::{HardlineError, HardlineResult};

const KI: u64 = 1024;
const MI: u64 = 1024 * KI;
const GI: u64 = 1024 * MI;
const TI: u64 = 1024 * GI;

/// A size in bytes.
///
/// Serialized as a plain byte count; deserialized from either a byte count
/// or a size string such as `"10GiB"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct DiskSize(u64);

impl DiskSize {
    /// Zero bytes.
    pub const ZERO: Self = Self(0);

    /// Create a size from bytes.
    #[must_use]
    pub const fn bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Create a size from mebibytes (MiB).
    #[must_use]
    pub const fn mib(mib: u64) -> Self {
        Self(mib * MI)
    }

    /// Create a size from gibibytes (GiB).
    #[must_use]
    pub const fn gib(gib: u64) -> Self {
        Self(gib * GI)
    }

    /// Get the size in bytes.
    #[must_use]
    pub const fn to_bytes(self) -> u64 {
        self.0
    }

    /// Parse a size string.
    ///
    /// # Errors
    ///
    /// Returns [`HardlineError::InvalidSize`] when the value has an unknown
    /// unit, is not a number, or overflows.
    pub fn parse(s: &str) -> HardlineResult<Self> {
        let s = s.trim();
        let invalid = || HardlineError::InvalidSize {
            value: s.to_string(),
        };

        // Longest suffixes first so "GiB" is not read as "B".
        let suffixes = [
            ("KiB", KI),
            ("MiB", MI),
            ("GiB", GI),
            ("TiB", TI),
            ("Ki", KI),
            ("Mi", MI),
            ("Gi", GI),
            ("Ti", TI),
            ("KB", 1000),
            ("MB", 1000 * 1000),
            ("GB", 1000 * 1000 * 1000),
            ("TB", 1000 * 1000 * 1000 * 1000),
            ("k", 1000),
            ("K", 1000),
            ("M", 1000 * 1000),
            ("G", 1000 * 1000 * 1000),
            ("T", 1000 * 1000 * 1000 * 1000),
            ("B", 1),
        ];

        for (suffix, multiplier) in suffixes {
            if let Some(stripped) = s.strip_suffix(suffix) {
                let value: u64 = stripped.trim().parse().map_err(|_| invalid())?;
                return value
                    .checked_mul(multiplier)
                    .map(Self)
                    .ok_or_else(invalid);
            }
        }

        s.parse().map(Self).map_err(|_| invalid())
    }
}

impl fmt::Display for DiskSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0;
        if value >= TI && value % TI == 0 {
            write!(f, "{} TiB", value / TI)
        } else if value >= GI && value % GI == 0 {
            write!(f, "{} GiB", value / GI)
        } else if value >= MI && value % MI == 0 {
            write!(f, "{} MiB", value / MI)
        } else if value >= KI && value % KI == 0 {
            write!(f, "{} KiB", value / KI)
        } else {
            write!(f, "{value} B")
        }
    }
}

impl FromStr for DiskSize {
    type Err = HardlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for DiskSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bytes(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bytes(bytes) => Ok(Self(bytes)),
            Raw::Text(text) => Self::parse(&text).map_err(de::Error::custom),
        }
    }
}
