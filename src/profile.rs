//! Build profile identifiers.
//!
//! A [`Profile`] names a build configuration (for example a target platform).
//! Profiles are only ever used as lookup keys: each one owns a snapshot store
//! directory named after it under the data root, so a profile name has to be
//! a single, plain path component.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors produced when validating a profile name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    /// The name was empty or whitespace only.
    #[error("profile name cannot be empty")]
    Empty,

    /// The name contains a path separator or a character that is not valid in file names.
    #[error("profile name '{0}' contains an invalid character")]
    InvalidCharacter(String),

    /// The name starts with '.', which is reserved for store metadata.
    #[error("profile name '{0}' is reserved (names cannot start with '.')")]
    Reserved(String),
}

/// A validated build profile name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Profile(String);

impl Profile {
    /// Validate and wrap a profile name.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError`] if the name is empty, starts with `.`, or
    /// contains a separator, a control character or a Windows-reserved
    /// character.
    ///
    /// # Example
    ///
    /// ```
    /// use swapcache::profile::Profile;
    ///
    /// let profile = Profile::new("android").unwrap();
    /// assert_eq!(profile.as_str(), "android");
    /// assert!(Profile::new("../escape").is_err());
    /// ```
    pub fn new(name: impl Into<String>) -> Result<Self, ProfileError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ProfileError::Empty);
        }
        if trimmed.starts_with('.') {
            return Err(ProfileError::Reserved(name));
        }
        let invalid = trimmed
            .chars()
            .any(|c| c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'));
        if invalid {
            return Err(ProfileError::InvalidCharacter(name));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The profile name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Profile {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Profile {
    type Error = ProfileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Profile> for String {
    fn from(profile: Profile) -> Self {
        profile.0
    }
}

impl AsRef<str> for Profile {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
