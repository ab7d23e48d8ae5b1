//! The tag query pipeline: normalize, list, filter, select

use crate::error::Result;
use crate::reference::{normalize, RepositoryAddress};
use crate::registry::TagLister;
use crate::selector::{filter_with, highest};
use crate::version::Constraint;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What to ask the registry for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagQuery {
    /// Repository as given by the user (e.g., "nginx", "ghcr.io/acme/app")
    pub repository: String,
    /// Optional version-range constraint
    pub constraint: Option<String>,
    /// Reduce the result to the highest version
    pub latest: bool,
}

/// Result of a [`TagQuery`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryOutcome {
    /// The single highest tag, in its original spelling
    Latest(String),
    /// All (possibly filtered) tags in registry order
    Tags(Vec<String>),
}

impl TagQuery {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            ..Self::default()
        }
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    pub fn latest(mut self, latest: bool) -> Self {
        self.latest = latest;
        self
    }

    /// Run the query against `lister`.
    ///
    /// The constraint is parsed before the registry is contacted, and the
    /// lister is called exactly once.
    pub async fn execute<L>(&self, lister: &L) -> Result<QueryOutcome>
    where
        L: TagLister + ?Sized,
    {
        let canonical = normalize(&self.repository);
        debug!("Normalized '{}' to '{}'", self.repository, canonical);

        let constraint = self.constraint.as_deref().map(Constraint::parse).transpose()?;
        let address = RepositoryAddress::parse(&canonical)?;

        info!("Querying tags for {}", address);
        let mut tags = lister.list_tags(&address).await?;
        debug!("Registry returned {} tags", tags.len());

        if let Some(constraint) = &constraint {
            tags = filter_with(&tags, constraint);
            debug!("{} tags satisfy the constraint", tags.len());
        }

        if self.latest {
            return highest(&tags).map(QueryOutcome::Latest);
        }

        Ok(QueryOutcome::Tags(tags))
    }
}
