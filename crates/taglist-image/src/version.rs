//! Lenient tag versions and version-range constraints
//!
//! Registry tags are rarely strict semver: `v1.2`, `1.25` and `3` are all
//! common. Tags are coerced into [`semver::Version`] for ordering, while
//! constraint expressions are parsed into [`semver::Comparator`]s.
//!
//! Comparators are evaluated here rather than through
//! [`VersionReq::matches`]: a pre-release version is rejected only by a
//! comparator that names no pre-release itself, so `>=1.0.0-0` admits
//! pre-releases of every later version.

use crate::error::{ImageError, Result};
use regex::Regex;
use semver::{BuildMetadata, Comparator, Op, Prerelease, Version, VersionReq};
use std::sync::LazyLock;

static TAG_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^v?([0-9]+)(?:\.([0-9]+))?(?:\.([0-9]+))?(?:-([0-9A-Za-z.-]+))?(?:\+([0-9A-Za-z.-]+))?$",
    )
    .expect("tag version regex is valid")
});

static HYPHEN_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\S+)\s+-\s+(\S+)\s*$").expect("hyphen range regex is valid")
});

/// Parse a tag as a version, accepting a `v` prefix and missing minor/patch.
///
/// Returns `None` for tags that are not versions (`latest`, `stable`, ...).
pub fn parse_tag_version(tag: &str) -> Option<Version> {
    let caps = TAG_VERSION_RE.captures(tag)?;

    let number = |idx: usize| -> Option<u64> {
        match caps.get(idx) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };

    let mut version = Version::new(number(1)?, number(2)?, number(3)?);
    if let Some(pre) = caps.get(4) {
        version.pre = Prerelease::new(pre.as_str()).ok()?;
    }
    if let Some(build) = caps.get(5) {
        version.build = BuildMetadata::new(build.as_str()).ok()?;
    }
    Some(version)
}

/// A parsed constraint expression.
///
/// Alternatives are separated by `||`; within one alternative every
/// comparator must hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    alternatives: Vec<Conjunction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Conjunction {
    comparators: Vec<Comparator>,
    excluded: Vec<Version>,
}

impl Conjunction {
    fn matches(&self, version: &Version) -> bool {
        // `*` on its own leaves no rule behind and still keeps pre-releases out
        if self.comparators.is_empty() && self.excluded.is_empty() {
            return version.pre.is_empty();
        }

        let admits = |rule_pre: &Prerelease| version.pre.is_empty() || !rule_pre.is_empty();

        self.comparators
            .iter()
            .all(|cmp| admits(&cmp.pre) && comparator_matches(cmp, version))
            && self
                .excluded
                .iter()
                .all(|ex| admits(&ex.pre) && !ex.cmp_precedence(version).is_eq())
    }
}

impl Constraint {
    /// Parse an expression such as `>= 1.2.3`, `~1.3`, `^2 || ^3` or `1.2 - 1.4`
    pub fn parse(expression: &str) -> Result<Self> {
        if expression.trim().is_empty() {
            return Err(ImageError::constraint_syntax(expression, "empty expression"));
        }

        let alternatives = expression
            .split("||")
            .map(|alt| parse_conjunction(alt).map_err(|e| ImageError::constraint_syntax(expression, e)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { alternatives })
    }

    /// Whether the version satisfies any alternative
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|c| c.matches(version))
    }
}

impl std::str::FromStr for Constraint {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_conjunction(alternative: &str) -> std::result::Result<Conjunction, String> {
    if alternative.trim().is_empty() {
        return Err("empty alternative".to_string());
    }

    let mut comparators = Vec::new();
    let mut excluded = Vec::new();

    for group in alternative.split(',') {
        if let Some(caps) = HYPHEN_RANGE_RE.captures(group) {
            comparators.push(format!(">={}", strip_v(&caps[1])));
            comparators.push(format!("<={}", strip_v(&caps[2])));
            continue;
        }

        let tokens = tokenize(group)?;
        if tokens.is_empty() {
            return Err("empty comparator".to_string());
        }

        for token in tokens {
            if let Some(rest) = token.strip_prefix("!=") {
                let version = parse_tag_version(rest.trim())
                    .ok_or_else(|| format!("'{}' is not a version", rest.trim()))?;
                excluded.push(version);
            } else {
                comparators.push(token);
            }
        }
    }

    let comparators = if comparators.is_empty() {
        Vec::new()
    } else {
        VersionReq::parse(&comparators.join(", "))
            .map_err(|e| e.to_string())?
            .comparators
    };

    Ok(Conjunction {
        comparators,
        excluded,
    })
}

/// Whether `ver` falls in the range of `cmp`, pre-release tags compared by precedence
fn comparator_matches(cmp: &Comparator, ver: &Version) -> bool {
    match cmp.op {
        Op::Exact | Op::Wildcard => matches_exact(cmp, ver),
        Op::Greater => matches_greater(cmp, ver),
        Op::GreaterEq => matches_exact(cmp, ver) || matches_greater(cmp, ver),
        Op::Less => matches_less(cmp, ver),
        Op::LessEq => matches_exact(cmp, ver) || matches_less(cmp, ver),
        Op::Tilde => matches_tilde(cmp, ver),
        Op::Caret => matches_caret(cmp, ver),
        _ => false,
    }
}

fn matches_exact(cmp: &Comparator, ver: &Version) -> bool {
    ver.major == cmp.major
        && cmp.minor.map_or(true, |minor| ver.minor == minor)
        && cmp.patch.map_or(true, |patch| ver.patch == patch)
        && ver.pre == cmp.pre
}

fn matches_greater(cmp: &Comparator, ver: &Version) -> bool {
    if ver.major != cmp.major {
        return ver.major > cmp.major;
    }
    let Some(minor) = cmp.minor else {
        return false;
    };
    if ver.minor != minor {
        return ver.minor > minor;
    }
    let Some(patch) = cmp.patch else {
        return false;
    };
    if ver.patch != patch {
        return ver.patch > patch;
    }
    ver.pre > cmp.pre
}

fn matches_less(cmp: &Comparator, ver: &Version) -> bool {
    if ver.major != cmp.major {
        return ver.major < cmp.major;
    }
    let Some(minor) = cmp.minor else {
        return false;
    };
    if ver.minor != minor {
        return ver.minor < minor;
    }
    let Some(patch) = cmp.patch else {
        return false;
    };
    if ver.patch != patch {
        return ver.patch < patch;
    }
    ver.pre < cmp.pre
}

fn matches_tilde(cmp: &Comparator, ver: &Version) -> bool {
    if ver.major != cmp.major {
        return false;
    }
    if cmp.minor.is_some_and(|minor| ver.minor != minor) {
        return false;
    }
    match cmp.patch {
        Some(patch) if ver.patch != patch => ver.patch > patch,
        _ => ver.pre >= cmp.pre,
    }
}

fn matches_caret(cmp: &Comparator, ver: &Version) -> bool {
    if ver.major != cmp.major {
        return false;
    }
    let Some(minor) = cmp.minor else {
        return true;
    };
    let Some(patch) = cmp.patch else {
        return if cmp.major > 0 {
            ver.minor >= minor
        } else {
            ver.minor == minor
        };
    };

    if cmp.major > 0 {
        if ver.minor != minor {
            return ver.minor > minor;
        }
        if ver.patch != patch {
            return ver.patch > patch;
        }
    } else if minor > 0 {
        if ver.minor != minor {
            return false;
        }
        if ver.patch != patch {
            return ver.patch > patch;
        }
    } else if ver.minor != minor || ver.patch != patch {
        return false;
    }
    ver.pre >= cmp.pre
}

/// Split a comparator group on whitespace, re-attaching operators written
/// apart from their version (`>= 1.2.3`).
fn tokenize(group: &str) -> std::result::Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut pending_op: Option<&str> = None;

    for word in group.split_whitespace() {
        let op_len = word
            .find(|c: char| !matches!(c, '<' | '>' | '=' | '~' | '^' | '!'))
            .unwrap_or(word.len());
        let (op, version) = word.split_at(op_len);

        match (pending_op.take(), op.is_empty(), version.is_empty()) {
            (Some(prev), true, false) => tokens.push(comparator(prev, version)),
            (Some(prev), _, _) => return Err(format!("operator '{}' has no version", prev)),
            (None, false, true) => pending_op = Some(op),
            (None, _, _) => tokens.push(comparator(op, version)),
        }
    }

    if let Some(op) = pending_op {
        return Err(format!("operator '{}' has no version", op));
    }

    Ok(tokens)
}

/// A bare full or partial version means "this version", not semver's implicit caret.
fn comparator(op: &str, version: &str) -> String {
    let version = strip_v(version);
    let is_plain_version = version.starts_with(|c: char| c.is_ascii_digit())
        && !version.contains(|c: char| matches!(c, '*' | 'x' | 'X'));

    if op.is_empty() && is_plain_version {
        format!("={}", version)
    } else {
        format!("{}{}", op, version)
    }
}

fn strip_v(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_tag_version_lenient_forms() {
        assert_eq!(parse_tag_version("1.2.3"), Some(v("1.2.3")));
        assert_eq!(parse_tag_version("v1.2.3"), Some(v("1.2.3")));
        assert_eq!(parse_tag_version("1.25"), Some(v("1.25.0")));
        assert_eq!(parse_tag_version("3"), Some(v("3.0.0")));
        assert_eq!(parse_tag_version("01.02.03"), Some(v("1.2.3")));
        assert_eq!(parse_tag_version("2.0.0-rc1"), Some(v("2.0.0-rc1")));
        assert_eq!(parse_tag_version("1.0.0+build.7"), Some(v("1.0.0+build.7")));
    }

    #[test]
    fn test_parse_tag_version_rejects_non_versions() {
        for tag in ["latest", "stable", "bogus", "1.2.3.4", "1.2.3-", "1.0.0-01", "sha256-abc", ""] {
            assert_eq!(parse_tag_version(tag), None, "tag {}", tag);
        }
    }

    #[test]
    fn test_constraint_comma_and_space_conjunction() {
        let comma = Constraint::parse(">=1.1.0,<2.0.0").unwrap();
        let spaced = Constraint::parse(">= 1.1.0 < 2.0.0").unwrap();

        for c in [&comma, &spaced] {
            assert!(c.matches(&v("1.2.0")));
            assert!(!c.matches(&v("1.0.0")));
            assert!(!c.matches(&v("2.0.0")));
        }
    }

    #[test]
    fn test_constraint_tilde_and_caret() {
        let tilde = Constraint::parse("~1.3").unwrap();
        assert!(tilde.matches(&v("1.3.9")));
        assert!(!tilde.matches(&v("1.4.0")));

        let caret = Constraint::parse("^v2.1").unwrap();
        assert!(caret.matches(&v("2.9.0")));
        assert!(!caret.matches(&v("3.0.0")));
    }

    #[test]
    fn test_constraint_bare_version_is_exact() {
        let full = Constraint::parse("1.2.3").unwrap();
        assert!(full.matches(&v("1.2.3")));
        assert!(!full.matches(&v("1.2.4")));

        let partial = Constraint::parse("v1.2").unwrap();
        assert!(partial.matches(&v("1.2.7")));
        assert!(!partial.matches(&v("1.3.0")));

        let wildcard = Constraint::parse("1.x").unwrap();
        assert!(wildcard.matches(&v("1.9.0")));
        assert!(!wildcard.matches(&v("2.0.0")));
    }

    #[test]
    fn test_constraint_alternatives() {
        let c = Constraint::parse("^1.2 || >=3.0.0").unwrap();
        assert!(c.matches(&v("1.5.0")));
        assert!(c.matches(&v("3.1.0")));
        assert!(!c.matches(&v("2.0.0")));
    }

    #[test]
    fn test_constraint_hyphen_range() {
        let c = Constraint::parse("1.2 - 1.4.5").unwrap();
        assert!(c.matches(&v("1.2.0")));
        assert!(c.matches(&v("1.4.5")));
        assert!(!c.matches(&v("1.4.6")));
    }

    #[test]
    fn test_constraint_exclusion() {
        let c = Constraint::parse(">=1.0.0, != 1.2.0").unwrap();
        assert!(c.matches(&v("1.1.0")));
        assert!(!c.matches(&v("1.2.0")));

        let only_exclusion = Constraint::parse("!=1.0.0").unwrap();
        assert!(only_exclusion.matches(&v("2.0.0")));
        assert!(!only_exclusion.matches(&v("1.0.0")));
    }

    #[test]
    fn test_constraint_prerelease_needs_explicit_opt_in() {
        let c = Constraint::parse(">=1.0.0").unwrap();
        assert!(!c.matches(&v("2.0.0-rc1")));

        let opted_in = Constraint::parse(">=2.0.0-rc0").unwrap();
        assert!(opted_in.matches(&v("2.0.0-rc1")));
        assert!(!opted_in.matches(&v("2.0.0-beta")));
    }

    #[test]
    fn test_constraint_prerelease_opt_in_spans_versions() {
        let c = Constraint::parse(">=1.0.0-0").unwrap();
        assert!(c.matches(&v("2.0.0-rc1")));
        assert!(c.matches(&v("1.5.0")));
        assert!(!c.matches(&v("0.9.0-rc1")));

        // Every comparator in the alternative has to opt in
        let bounded = Constraint::parse(">=1.0.0-0, <3.0.0").unwrap();
        assert!(!bounded.matches(&v("2.0.0-rc1")));
        assert!(bounded.matches(&v("2.5.0")));
    }

    #[test]
    fn test_constraint_wildcard_and_exclusion_skip_prereleases() {
        assert!(!Constraint::parse("*").unwrap().matches(&v("1.0.0-rc1")));
        assert!(Constraint::parse("*").unwrap().matches(&v("1.0.0")));
        assert!(!Constraint::parse("!=2.0.0").unwrap().matches(&v("1.0.0-rc1")));
    }

    #[test]
    fn test_constraint_syntax_errors() {
        for expr in ["not a valid constraint !!", "", "   ", ">=", "1.0 ||", ">=1.0,,<2", "=> 1.0"] {
            assert!(
                matches!(Constraint::parse(expr), Err(ImageError::ConstraintSyntax { .. })),
                "expected syntax error for {:?}",
                expr
            );
        }
    }
}
