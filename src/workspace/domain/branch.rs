//! Branch-name value object.

use super::WorkspaceDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters `git check-ref-format` refuses inside a ref name.
const FORBIDDEN_CHARACTERS: [char; 7] = [':', '~', '^', '?', '*', '[', '\\'];

/// Validated Git branch name.
///
/// Branch names are compared exactly: no case folding or other
/// normalisation beyond trimming surrounding whitespace is applied, because
/// review systems treat `Feature/X` and `feature/x` as different branches.
///
/// # Examples
///
///     use atelier::workspace::domain::BranchName;
///
///     let name = BranchName::new("feat/dark-mode").expect("valid");
///     assert_eq!(name.as_str(), "feat/dark-mode");
///     assert_ne!(name, BranchName::new("Feat/dark-mode").expect("valid"));
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchName(String);

impl BranchName {
    /// Creates a validated branch name.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceDomainError::InvalidBranchName`] when the value is
    /// empty, contains whitespace or a forbidden character, or breaks the
    /// ref shape rules. Length is not limited.
    pub fn new(value: impl Into<String>) -> Result<Self, WorkspaceDomainError> {
        let raw = value.into();
        let normalized = raw.trim();

        if Self::is_invalid_branch_name(normalized) {
            return Err(WorkspaceDomainError::InvalidBranchName(raw));
        }

        Ok(Self(normalized.to_owned()))
    }

    /// Wraps a name assembled from lowercase ASCII slugs and digits, which is
    /// valid by construction.
    pub(crate) const fn from_sanitised(name: String) -> Self {
        Self(name)
    }

    fn is_invalid_branch_name(name: &str) -> bool {
        let is_empty = name.is_empty();
        let contains_forbidden_char = name
            .chars()
            .any(|ch| ch.is_whitespace() || ch.is_control() || FORBIDDEN_CHARACTERS.contains(&ch));
        let has_bad_shape = name.contains("..")
            || name.contains("//")
            || name.starts_with(['-', '/'])
            || name.ends_with(['/', '.'])
            || name.ends_with(".lock");

        is_empty || contains_forbidden_char || has_bad_shape
    }

    /// Returns the branch name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
