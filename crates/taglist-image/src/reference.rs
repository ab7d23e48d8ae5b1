//! Repository references: normalization and registry addressing

use crate::error::{ImageError, Result};
use idna::uts46::{AsciiDenyList, DnsLength, Hyphens, Uts46};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Registry host used when a reference names none
pub const DOCKER_HUB: &str = "docker.io";

/// Namespace Docker Hub uses for official images
pub const DOCKER_HUB_LIBRARY: &str = "library";

/// Host that actually serves the Docker Hub registry API
const DOCKER_HUB_API_HOST: &str = "registry-1.docker.io";

/// Host names that all refer to Docker Hub
const DOCKER_HUB_ALIASES: &[&str] = &[
    DOCKER_HUB,
    "index.docker.io",
    DOCKER_HUB_API_HOST,
    "registry.hub.docker.com",
];

static REGISTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9](?:[A-Za-z0-9.-]*[A-Za-z0-9])?|\[[0-9A-Fa-f:.]+\])(?::[0-9]+)?$")
        .expect("registry regex is valid")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w[\w.-]{0,127}$").expect("tag regex is valid"));

static DIGEST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:[.+_-][a-z0-9]+)*:[a-zA-Z0-9=_-]+$").expect("digest regex is valid")
});

static PATH_COMPONENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*$").expect("path component regex is valid")
});

/// Whether a host segment is one of Docker Hub's names
pub fn is_docker_hub(segment: &str) -> bool {
    DOCKER_HUB_ALIASES.contains(&segment)
}

/// Whether a segment converts cleanly to an ASCII hostname under IDNA lookup rules.
///
/// Label and domain lengths are not checked.
fn is_hostname(segment: &str) -> bool {
    Uts46::new()
        .to_ascii(
            segment.as_bytes(),
            AsciiDenyList::STD3,
            Hyphens::Check,
            DnsLength::Ignore,
        )
        .is_ok()
}

/// Normalize a user-supplied repository into `registry/namespace/name` form.
///
/// The rules apply in order and the first match wins:
/// 1. three or more segments are already qualified
/// 2. a dotted reference whose first segment is a non-Docker-Hub hostname is kept
/// 3. two segments gain `docker.io/` (or `docker.io/library/` for a Docker Hub alias)
/// 4. a single segment becomes `docker.io/library/<name>`
/// 5. anything else is returned as given
pub fn normalize(raw: &str) -> String {
    let parts: Vec<&str> = raw.split('/').collect();

    if parts.len() >= 3 {
        return raw.to_string();
    }

    if raw.contains('.') && !is_docker_hub(parts[0]) && is_hostname(parts[0]) {
        return raw.to_string();
    }

    match parts.as_slice() {
        [first, rest @ ..] if parts.len() == 2 => {
            if is_docker_hub(first) {
                format!("{}/{}/{}", DOCKER_HUB, DOCKER_HUB_LIBRARY, rest.join("/"))
            } else {
                format!("{}/{}", DOCKER_HUB, raw)
            }
        }
        [name] => format!("{}/{}/{}", DOCKER_HUB, DOCKER_HUB_LIBRARY, name),
        _ => raw.to_string(),
    }
}

/// A canonical reference split into registry host and repository path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryAddress {
    /// Registry host, optionally with a port (e.g., "docker.io", "localhost:5000")
    pub registry: String,
    /// Repository path inside the registry (e.g., "library/nginx")
    pub repository: String,
}

impl RepositoryAddress {
    /// Parse a canonical `registry/path` string as produced by [`normalize`].
    ///
    /// A trailing `@digest` and `:tag` on the path are accepted and dropped;
    /// tags are always listed for the whole repository.
    pub fn parse(canonical: &str) -> Result<Self> {
        let (registry, path) = canonical.split_once('/').ok_or_else(|| {
            ImageError::repository_open(canonical, "missing repository path after registry host")
        })?;
        let repository = strip_reference(canonical, path)?;

        if !REGISTRY_RE.is_match(registry) {
            return Err(ImageError::repository_open(
                canonical,
                format!("invalid registry host '{}'", registry),
            ));
        }

        if let Some(bad) = repository
            .split('/')
            .find(|component| !PATH_COMPONENT_RE.is_match(component))
        {
            return Err(ImageError::repository_open(
                canonical,
                format!("invalid repository path component '{}'", bad),
            ));
        }

        Ok(Self {
            registry: registry.to_string(),
            repository: repository.to_string(),
        })
    }

    /// Normalize raw input and parse the result
    pub fn from_user_input(raw: &str) -> Result<Self> {
        Self::parse(&normalize(raw))
    }

    /// Host that serves the registry API for this address
    pub fn api_host(&self) -> &str {
        if is_docker_hub(&self.registry) {
            DOCKER_HUB_API_HOST
        } else {
            &self.registry
        }
    }
}

/// Drop a trailing `@digest` and then a `:tag` from a repository path
fn strip_reference<'a>(canonical: &str, path: &'a str) -> Result<&'a str> {
    let path = match path.split_once('@') {
        Some((rest, digest)) => {
            if !DIGEST_RE.is_match(digest) {
                return Err(ImageError::repository_open(
                    canonical,
                    format!("invalid digest '{}'", digest),
                ));
            }
            rest
        }
        None => path,
    };

    match path.split_once(':') {
        Some((repository, tag)) => {
            if !TAG_RE.is_match(tag) {
                return Err(ImageError::repository_open(
                    canonical,
                    format!("invalid tag '{}'", tag),
                ));
            }
            Ok(repository)
        }
        None => Ok(path),
    }
}

impl FromStr for RepositoryAddress {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RepositoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.repository)
    }
}
