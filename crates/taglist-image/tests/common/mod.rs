//! Shared helpers for taglist-image integration tests

#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use taglist_image::{ImageError, RepositoryAddress, TagLister};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// In-memory [`TagLister`] that records every address it is asked about
pub struct StaticLister {
    tags: Vec<String>,
    fail: bool,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl StaticLister {
    pub fn new(tags: &[&str]) -> Self {
        Self {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            fail: false,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl TagLister for StaticLister {
    fn list_tags<'a>(
        &'a self,
        address: &'a RepositoryAddress,
    ) -> Pin<Box<dyn Future<Output = taglist_image::Result<Vec<String>>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(address.to_string());
            if self.fail {
                Err(ImageError::tag_listing(address.to_string(), "connection refused"))
            } else {
                Ok(self.tags.clone())
            }
        })
    }
}

/// Address of `repository` on the mock registry
pub fn mock_address(server: &MockServer, repository: &str) -> RepositoryAddress {
    RepositoryAddress::parse(&format!("{}/{}", server.address(), repository))
        .expect("mock address is valid")
}

/// Serve a single, unpaginated tag list for `repository`
pub async fn mock_tag_list(server: &MockServer, repository: &str, tags: &[&str]) {
    Mock::given(method("GET"))
        .and(path(format!("/v2/{}/tags/list", repository)))
        .and(query_param("n", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": repository,
            "tags": tags,
        })))
        .mount(server)
        .await;
}
