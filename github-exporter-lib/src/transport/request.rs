use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use reqwest::{Method, Url};

/// An outgoing HTTP request as seen by the transport layers.
///
/// Requests are cheap to clone; a layer that needs to add headers works on a
/// derived copy so the caller's request is never mutated.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    #[must_use]
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    #[must_use]
    pub fn with_header(mut self, name: impl IntoHeaderName, value: HeaderValue) -> Self {
        let _ = self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub const fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Whether responses to this request may be stored by the cache layer.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.method == Method::GET || self.method == Method::HEAD
    }

    /// The key under which responses to this request are cached.
    ///
    /// `GET` and `HEAD` share the plain URL; other methods are prefixed with the
    /// method name so they can never alias a cacheable entry.
    #[must_use]
    pub fn cache_key(&self) -> String {
        if self.is_cacheable() {
            self.url.to_string()
        } else {
            format!("{} {}", self.method, self.url)
        }
    }
}
