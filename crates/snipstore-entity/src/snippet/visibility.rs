//! Snippet visibility enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use snipstore_core::AppError;

/// Sharing scope of a snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Only the owner.
    User,
    /// Everyone in the project.
    Project,
    /// Everyone in the organization.
    Org,
    /// Anyone.
    Public,
}

impl Visibility {
    /// All variants, in widening order.
    pub const ALL: [Self; 4] = [Self::User, Self::Project, Self::Org, Self::Public];

    /// Return the visibility as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Project => "project",
            Self::Org => "org",
            Self::Public => "public",
        }
    }

    /// Whether the snippet is private to its owner.
    pub fn is_private(&self) -> bool {
        matches!(self, Self::User)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| {
                AppError::validation(format!(
                    "Invalid visibility: '{s}'. Expected one of: user, project, org, public"
                ))
            })
    }
}
