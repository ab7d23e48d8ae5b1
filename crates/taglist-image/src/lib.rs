//! Container image tags for the taglist CLI
//!
//! This crate provides functionality for:
//! - Normalizing repository names into `registry/namespace/name` form
//! - Filtering tags by version-range constraints
//! - Picking the highest version among a repository's tags
//! - Listing tags from OCI-compatible container registries (Docker Hub, GHCR, etc.)
//!
//! # Example
//!
//! ```no_run
//! use taglist_image::{ClientOptions, QueryOutcome, RegistryClient, TagQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RegistryClient::new(ClientOptions::default())?;
//!
//!     let query = TagQuery::new("nginx").with_constraint("~1.25").latest(true);
//!     if let QueryOutcome::Latest(tag) = query.execute(&client).await? {
//!         println!("Resolved to: {}", tag);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod query;
pub mod reference;
pub mod registry;
pub mod selector;
pub mod version;

// Re-export main types for convenience
pub use error::{ImageError, Result};
pub use query::{QueryOutcome, TagQuery};
pub use reference::{normalize, RepositoryAddress};
pub use registry::{ClientOptions, RegistryClient, TagLister};
pub use selector::{filter_by_constraint, highest};
pub use version::{parse_tag_version, Constraint};
