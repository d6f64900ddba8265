//! Resource classification.
//!
//! Every intercepted request is assigned exactly one handling class, or is
//! left to pass straight through to the network. Classification is a pure
//! function of request metadata and is recomputed per request.

use serde::Serialize;
use url::Url;

use crate::request::{Destination, Request};

/// Handling class of a cacheable request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    ThirdParty,
    Image,
    Api,
    Page,
}

impl ResourceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClass::ThirdParty => "third_party",
            ResourceClass::Image => "image",
            ResourceClass::Api => "api",
            ResourceClass::Page => "page",
        }
    }
}

/// Outcome of classifying a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Non-GET request; never intercepted.
    Ineligible,
    /// Cross-origin request outside the third-party allowlist.
    PassThrough,
    Class(ResourceClass),
}

impl Classification {
    /// The handling class, if the request is intercepted at all.
    pub fn class(self) -> Option<ResourceClass> {
        match self {
            Classification::Class(class) => Some(class),
            Classification::Ineligible | Classification::PassThrough => None,
        }
    }
}

/// Classifier configured with the application origin, the third-party
/// domain allowlist and the API path marker.
#[derive(Debug, Clone)]
pub struct Classifier {
    origin: Url,
    third_party_domains: Vec<String>,
    api_path_marker: String,
}

impl Classifier {
    pub fn new(origin: Url, third_party_domains: &[String], api_path_marker: &str) -> Self {
        Self {
            origin,
            third_party_domains: third_party_domains
                .iter()
                .map(|d| d.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
            api_path_marker: api_path_marker.to_string(),
        }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Classify a request; first matching rule wins.
    pub fn classify(&self, request: &Request) -> Classification {
        if !request.is_get() {
            return Classification::Ineligible;
        }

        if self.is_third_party(&request.url) {
            return Classification::Class(ResourceClass::ThirdParty);
        }

        if request.url.origin() != self.origin.origin() {
            return Classification::PassThrough;
        }

        if request.destination == Destination::Image {
            return Classification::Class(ResourceClass::Image);
        }

        if !self.api_path_marker.is_empty() && request.url.path().contains(&self.api_path_marker) {
            return Classification::Class(ResourceClass::Api);
        }

        Classification::Class(ResourceClass::Page)
    }

    /// Host equals an allowlisted domain or is one of its subdomains.
    pub fn is_third_party(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        self.third_party_domains
            .iter()
            .any(|domain| host == domain || host.strip_suffix(domain.as_str()).is_some_and(|rest| rest.ends_with('.')))
    }
}
