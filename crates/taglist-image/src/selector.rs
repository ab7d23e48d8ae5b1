//! Tag selection: constraint filtering and highest-version lookup
//!
//! Both operations are pure. Tags that are not versions are skipped
//! silently since registries mix release tags with `latest`, `stable`,
//! digests and the like.

use crate::error::{ImageError, Result};
use crate::version::{parse_tag_version, Constraint};
use semver::Version;
use std::cmp::Ordering;
use tracing::trace;

/// Keep the tags whose version satisfies `constraint`, in input order.
///
/// The constraint is parsed once up front; a syntax error fails the whole
/// call before any tag is looked at.
pub fn filter_by_constraint<S: AsRef<str>>(tags: &[S], constraint: &str) -> Result<Vec<String>> {
    let constraint = Constraint::parse(constraint)?;
    Ok(filter_with(tags, &constraint))
}

/// Same as [`filter_by_constraint`] with an already parsed constraint
pub fn filter_with<S: AsRef<str>>(tags: &[S], constraint: &Constraint) -> Vec<String> {
    tags.iter()
        .map(AsRef::as_ref)
        .filter(|tag| match parse_tag_version(tag) {
            Some(version) => constraint.matches(&version),
            None => {
                trace!("Skipping non-semver tag: {}", tag);
                false
            }
        })
        .map(str::to_string)
        .collect()
}

/// The tag with the highest version, in its original spelling.
///
/// Build metadata does not take part in the ordering; on equal precedence
/// the earliest tag wins.
pub fn highest<S: AsRef<str>>(tags: &[S]) -> Result<String> {
    let mut best: Option<(Version, &str)> = None;

    for tag in tags.iter().map(AsRef::as_ref) {
        let Some(version) = parse_tag_version(tag) else {
            trace!("Skipping non-semver tag: {}", tag);
            continue;
        };

        let is_higher = match &best {
            Some((current, _)) => version.cmp_precedence(current) == Ordering::Greater,
            None => true,
        };
        if is_higher {
            best = Some((version, tag));
        }
    }

    best.map(|(_, tag)| tag.to_string())
        .ok_or(ImageError::NoValidVersion {
            candidates: tags.len(),
        })
}
