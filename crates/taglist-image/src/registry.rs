use crate::error::{ImageError, Result};
use crate::reference::RepositoryAddress;
use reqwest::header::{HeaderValue, ACCEPT, LINK, WWW_AUTHENTICATE};
use reqwest::{Response, StatusCode, Url};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, trace};

/// Page size requested from `/tags/list`
const PAGE_SIZE: u32 = 1000;

/// Source of the raw tag list for a repository
pub trait TagLister {
    /// Every tag published under `address`, in registry order
    fn list_tags<'a>(
        &'a self,
        address: &'a RepositoryAddress,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>>;
}

/// Connection settings for [`RegistryClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Use `http://` instead of `https://`
    pub plain_http: bool,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            plain_http: false,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Client for listing tags on OCI distribution registries (Docker Hub, GHCR, ...)
///
/// Access is anonymous. Registries that answer `401` with a bearer challenge
/// get a pull-scoped token from the advertised realm, which is then cached
/// for the lifetime of the client.
pub struct RegistryClient {
    client: reqwest::Client,
    plain_http: bool,
    /// Bearer tokens keyed by `realm|service|scope`
    bearer_tokens: RwLock<HashMap<String, String>>,
    /// Token sent up front on later requests (e.g., following pages)
    active_token: RwLock<Option<String>>,
}

impl RegistryClient {
    /// Create a new registry client
    pub fn new(options: ClientOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("taglist/", env!("CARGO_PKG_VERSION")))
            .timeout(options.timeout)
            .build()
            .map_err(|e| {
                ImageError::tag_listing("*", format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            plain_http: options.plain_http,
            bearer_tokens: RwLock::new(HashMap::new()),
            active_token: RwLock::new(None),
        })
    }

    fn base_url(&self, address: &RepositoryAddress) -> String {
        let scheme = if self.plain_http { "http" } else { "https" };
        format!("{}://{}", scheme, address.api_host())
    }

    /// List all tags for a repository (handles pagination)
    pub async fn list_tags(&self, address: &RepositoryAddress) -> Result<Vec<String>> {
        let base = self.base_url(address);
        let mut all_tags = Vec::new();
        let mut visited = HashSet::new();
        let mut url = format!(
            "{}/v2/{}/tags/list?n={}",
            base, address.repository, PAGE_SIZE
        );

        loop {
            debug!("Listing tags from: {}", url);

            let response = self.get_authorized(&url, address).await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(ImageError::tag_listing(
                    address.to_string(),
                    format!(
                        "registry returned {} for {}: {}",
                        status,
                        url,
                        if body.is_empty() {
                            "(no response body)".to_string()
                        } else {
                            body
                        }
                    ),
                ));
            }

            // Check for Link header for pagination
            let next_url = response
                .headers()
                .get(LINK)
                .and_then(|h| h.to_str().ok())
                .and_then(|link| parse_link_header(link, &base));

            let tags_response: TagsResponse = response.json().await.map_err(|e| {
                ImageError::tag_listing(
                    address.to_string(),
                    format!("failed to parse tags response: {}", e),
                )
            })?;

            all_tags.extend(tags_response.tags.unwrap_or_default());

            visited.insert(url);

            // Continue to next page if available
            match next_url {
                Some(next) if visited.contains(&next) => {
                    debug!("Registry links back to an already listed page: {}", next);
                    break;
                }
                Some(next) => url = next,
                None => break,
            }
        }

        trace!("Found {} tags total", all_tags.len());
        Ok(all_tags)
    }

    /// GET `url`, answering a bearer challenge once if the registry asks for one
    async fn get_authorized(&self, url: &str, address: &RepositoryAddress) -> Result<Response> {
        let active = self.active_token.read().await.clone();
        let response = self.send(url, active.as_deref(), address).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let Some(challenge) = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|h| h.to_str().ok())
            .and_then(BearerChallenge::parse)
        else {
            return Ok(response);
        };

        let token = self.bearer_token(&challenge, address).await?;
        *self.active_token.write().await = Some(token.clone());
        self.send(url, Some(&token), address).await
    }

    async fn send(
        &self,
        url: &str,
        token: Option<&str>,
        address: &RepositoryAddress,
    ) -> Result<Response> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        request.send().await.map_err(|e| {
            ImageError::tag_listing(
                address.to_string(),
                format!("failed to connect to registry at {}: {}", url, e),
            )
        })
    }

    /// Get an anonymous pull token from the challenge realm
    async fn bearer_token(
        &self,
        challenge: &BearerChallenge,
        address: &RepositoryAddress,
    ) -> Result<String> {
        let scope = challenge
            .scope
            .clone()
            .unwrap_or_else(|| format!("repository:{}:pull", address.repository));
        let cache_key = format!(
            "{}|{}|{}",
            challenge.realm,
            challenge.service.as_deref().unwrap_or_default(),
            scope
        );

        // Check cache first
        if let Some(token) = self.bearer_tokens.read().await.get(&cache_key) {
            return Ok(token.clone());
        }

        let mut params = vec![("scope", scope.as_str())];
        if let Some(service) = challenge.service.as_deref() {
            params.push(("service", service));
        }
        let token_url = Url::parse_with_params(&challenge.realm, &params).map_err(|e| {
            ImageError::tag_listing(
                address.to_string(),
                format!("invalid token realm '{}': {}", challenge.realm, e),
            )
        })?;

        debug!("Requesting registry token from: {}", token_url);

        let response = self
            .client
            .get(token_url.clone())
            .send()
            .await
            .map_err(|e| {
                ImageError::tag_listing(
                    address.to_string(),
                    format!("failed to request token from {}: {}", token_url, e),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ImageError::tag_listing(
                address.to_string(),
                format!("token request failed ({}): {}", status, body),
            ));
        }

        let token_response: TokenResponse = response.json().await.map_err(|e| {
            ImageError::tag_listing(
                address.to_string(),
                format!("failed to parse token response: {}", e),
            )
        })?;

        let token = token_response
            .token
            .or(token_response.access_token)
            .ok_or_else(|| {
                ImageError::tag_listing(address.to_string(), "token response carried no token")
            })?;

        // Cache the token
        self.bearer_tokens
            .write()
            .await
            .insert(cache_key, token.clone());

        Ok(token)
    }
}

impl TagLister for RegistryClient {
    fn list_tags<'a>(
        &'a self,
        address: &'a RepositoryAddress,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>> {
        Box::pin(RegistryClient::list_tags(self, address))
    }
}

/// Parameters of a `WWW-Authenticate: Bearer ...` challenge
#[derive(Debug, Clone, PartialEq, Eq)]
struct BearerChallenge {
    realm: String,
    service: Option<String>,
    scope: Option<String>,
}

impl BearerChallenge {
    /// Format: Bearer realm="https://auth.docker.io/token",service="registry.docker.io",scope="repository:library/nginx:pull"
    fn parse(header: &str) -> Option<Self> {
        let (scheme, params) = header.trim().split_once(char::is_whitespace)?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }

        let mut values = HashMap::new();
        let mut rest = params.trim();
        while !rest.is_empty() {
            let (key, after_key) = rest.split_once('=')?;
            let key = key.trim().trim_start_matches(',').trim().to_ascii_lowercase();

            let (value, remainder) = if let Some(quoted) = after_key.strip_prefix('"') {
                let end = quoted.find('"')?;
                (&quoted[..end], &quoted[end + 1..])
            } else {
                let end = after_key.find(',').unwrap_or(after_key.len());
                (&after_key[..end], &after_key[end..])
            };

            values.insert(key, value.to_string());
            rest = remainder.trim_start().trim_start_matches(',').trim_start();
        }

        Some(Self {
            realm: values.remove("realm")?,
            service: values.remove("service"),
            scope: values.remove("scope"),
        })
    }
}

/// Parse Link header for pagination
/// Format: </v2/library/nginx/tags/list?n=1000&last=tag>; rel="next"
fn parse_link_header(link: &str, base_url: &str) -> Option<String> {
    for part in link.split(',') {
        let part = part.trim();
        if part.contains("rel=\"next\"") {
            // Extract URL from <...>
            if let (Some(start), Some(end)) = (part.find('<'), part.find('>')) {
                let url = &part[start + 1..end];
                // URL might be relative, make it absolute
                if url.starts_with('/') {
                    return Some(format!("{}{}", base_url, url));
                }
                return Some(url.to_string());
            }
        }
    }
    None
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}
