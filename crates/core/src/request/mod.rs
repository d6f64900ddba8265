//! Request model and request identities.
//!
//! A [`Request`] carries just enough metadata to classify and fetch a
//! resource: method, canonical URL, declared destination, headers and an
//! optional body for pass-through requests.

pub mod url;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub use self::url::{UrlError, canonicalize, resolve};
use crate::cache::hash::compute_cache_key;

/// Declared destination of a request, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Document,
    Image,
    Style,
    Script,
    Font,
    Manifest,
    #[default]
    #[serde(other)]
    Empty,
}

impl Destination {
    /// Parse a destination string leniently; unknown values become `Empty`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "document" => Self::Document,
            "image" => Self::Image,
            "style" => Self::Style,
            "script" => Self::Script,
            "font" => Self::Font,
            "manifest" => Self::Manifest,
            _ => Self::Empty,
        }
    }
}

/// An intercepted resource request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: ::url::Url,
    pub destination: Destination,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Request {
    /// Build a request from a method and an absolute URL string.
    pub fn new(method: &str, url: &str, destination: Destination) -> Result<Self, UrlError> {
        Ok(Self::from_url(method, canonicalize(url)?, destination))
    }

    /// Build a request from an already parsed URL; the URL is canonicalized
    /// the same way as [`Request::new`].
    pub fn from_url(method: &str, url: ::url::Url, destination: Destination) -> Self {
        let mut url = url;
        url.set_fragment(None);
        Self {
            method: method.trim().to_ascii_uppercase(),
            url,
            destination,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Shorthand for a GET request with no declared destination.
    pub fn get(url: &str) -> Result<Self, UrlError> {
        Self::new("GET", url, Destination::Empty)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// The cache identity of this request.
    pub fn identity(&self) -> RequestIdentity {
        RequestIdentity { method: self.method.clone(), url: self.url.to_string() }
    }
}

/// Normalized cache key for a request: method plus canonical URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestIdentity {
    pub method: String,
    pub url: String,
}

impl RequestIdentity {
    /// Content-addressed storage key (hex SHA-256).
    pub fn key(&self) -> String {
        compute_cache_key(&self.method, &self.url)
    }
}

impl std::fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ignores_fragment_and_host_case() {
        let a = Request::get("https://Example.com/page#one").unwrap();
        let b = Request::get("https://example.com/page#two").unwrap();
        assert_eq!(a.identity(), b.identity());
        assert_eq!(a.identity().key(), b.identity().key());
    }

    #[test]
    fn test_method_normalized() {
        let req = Request::new("post", "https://example.com/api/items", Destination::Empty).unwrap();
        assert_eq!(req.method, "POST");
        assert!(!req.is_get());
    }

    #[test]
    fn test_identity_differs_by_method() {
        let get = Request::get("https://example.com/a").unwrap();
        let head = Request::new("HEAD", "https://example.com/a", Destination::Empty).unwrap();
        assert_ne!(get.identity().key(), head.identity().key());
    }

    #[test]
    fn test_destination_parse() {
        assert_eq!(Destination::parse("IMAGE"), Destination::Image);
        assert_eq!(Destination::parse("style"), Destination::Style);
        assert_eq!(Destination::parse("audioworklet"), Destination::Empty);
        assert_eq!(Destination::parse(""), Destination::Empty);
    }

    #[test]
    fn test_identity_display() {
        let req = Request::get("https://example.com/a").unwrap();
        assert_eq!(req.identity().to_string(), "GET https://example.com/a");
    }
}
