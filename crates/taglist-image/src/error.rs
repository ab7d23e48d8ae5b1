//! Error types for taglist-image

use thiserror::Error;

/// Result type alias using taglist-image's error type
pub type Result<T> = std::result::Result<T, ImageError>;

/// Failures surfaced while querying and selecting image tags.
///
/// Tags that do not parse as versions are never errors; they are skipped.
#[derive(Error, Debug)]
pub enum ImageError {
    /// The canonical address does not name a usable repository
    #[error("unable to open repository '{reference}': {reason}")]
    RepositoryOpen { reference: String, reason: String },

    /// The registry could not produce a tag list
    #[error("unable to query tags for repository '{repository}': {reason}")]
    TagListing { repository: String, reason: String },

    /// The constraint expression does not parse
    #[error("invalid version constraint '{constraint}': {reason}")]
    ConstraintSyntax { constraint: String, reason: String },

    /// Latest was requested but no tag is a version
    #[error("no valid version found among {candidates} tag(s)")]
    NoValidVersion { candidates: usize },
}

impl ImageError {
    /// Create a repository open error
    pub fn repository_open(reference: impl Into<String>, reason: impl ToString) -> Self {
        Self::RepositoryOpen {
            reference: reference.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a tag listing error
    pub fn tag_listing(repository: impl Into<String>, reason: impl ToString) -> Self {
        Self::TagListing {
            repository: repository.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a constraint syntax error
    pub fn constraint_syntax(constraint: impl Into<String>, reason: impl ToString) -> Self {
        Self::ConstraintSyntax {
            constraint: constraint.into(),
            reason: reason.to_string(),
        }
    }
}
