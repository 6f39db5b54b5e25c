//! How strictly `get_or_fail` validates handles.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Validation performed by [`HandleRegistry::get_or_fail`](crate::HandleRegistry::get_or_fail).
///
/// This is a runtime setting, independent of the build profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Validation {
    /// Compare the slot generation with the handle generation.
    #[default]
    Checked,
    /// Only check that the slot is occupied.
    ///
    /// Skips the generation comparison. A stale handle whose slot has been
    /// recycled resolves to the new occupant instead of failing. Never
    /// unsound, but logically wrong for stale handles.
    Trusted,
}

impl Validation {
    /// Whether generations are compared.
    #[must_use]
    pub const fn is_checked(self) -> bool {
        matches!(self, Self::Checked)
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checked => f.write_str("checked"),
            Self::Trusted => f.write_str("trusted"),
        }
    }
}

/// Error for an unrecognised validation mode string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown validation mode `{0}` (expected `checked` or `trusted`)")]
pub struct ParseValidationError(pub String);

impl FromStr for Validation {
    type Err = ParseValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "checked" => Ok(Self::Checked),
            "trusted" => Ok(Self::Trusted),
            _ => Err(ParseValidationError(s.to_owned())),
        }
    }
}
