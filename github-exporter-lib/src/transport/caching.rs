use super::{Request, Response, Service, Transport, X_CACHE, X_CACHE_AGE, X_REVALIDATED, wire};
use crate::Result;
use crate::cache::Cache;
use reqwest::{Method, StatusCode};
use reqwest::header::{ETAG, HeaderValue, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use std::sync::Arc;

const LOG_TARGET: &str = "     cache";

/// Outermost layer: stores successful responses and reuses them.
///
/// For a `GET` or `HEAD` request with a stored entry, the request forwarded to the
/// next layer carries `If-None-Match`/`If-Modified-Since` validators from the stored
/// response, `X-Cache: 1` and `X-Cache-Age` (whole seconds). The stored response is
/// returned in place of the origin's answer when the origin
///
/// - confirms it with `304` (a real origin `304` also resets the entry's age, a
///   synthetic one from the revalidation layer does not),
/// - fails outright, or
/// - answers a `GET` with a server error (stale fallback).
///
/// Otherwise a `200` replaces the stored entry and any other status evicts it. A
/// `200` whose body cannot be read counts as a failure.
#[derive(Debug)]
pub struct CacheTransport<T> {
    next: T,
    cache: Arc<dyn Cache>,
}

impl<T: Transport> CacheTransport<T> {
    pub fn new(next: T, cache: Arc<dyn Cache>) -> Self {
        Self { next, cache }
    }
}

impl<T: Transport> Service<Request> for CacheTransport<T> {
    type Out = Result<Response>;

    async fn execute(&self, request: Request) -> Self::Out {
        let key = request.cache_key();
        let cacheable = request.is_cacheable();
        let is_get = *request.method() == Method::GET;
        let mut forwarded = request;
        let mut stored = None;

        if cacheable
            && let Some(entry) = self.cache.get(&key)
        {
            match wire::decode(entry.bytes()) {
                Ok(prior) => {
                    forwarded = with_validators(forwarded, &prior, entry.age().as_secs());
                    stored = Some(prior);
                }
                Err(e) => {
                    log::debug!(target: LOG_TARGET, "Discarding unreadable entry for '{key}': {e}");
                    self.cache.delete(&key);
                }
            }
        }

        let result = match self.next.execute(forwarded).await {
            Ok(mut response) if cacheable && response.status() == StatusCode::OK => {
                response.buffer().await.map(|_| response)
            }
            other => other,
        };

        if let Some(prior) = stored {
            match &result {
                Ok(response) if response.status() == StatusCode::NOT_MODIFIED => {
                    if response.headers().contains_key(X_REVALIDATED) {
                        log::debug!(target: LOG_TARGET, "Serving '{key}' from cache, still fresh");
                    } else {
                        log::debug!(target: LOG_TARGET, "Serving '{key}' from cache, confirmed by origin");
                        self.cache.refresh(&key);
                    }
                    return Ok(prior);
                }
                Ok(response) if is_get && response.status().is_server_error() => {
                    log::warn!(target: LOG_TARGET, "Origin answered '{key}' with {}, serving stale copy", response.status());
                    return Ok(prior);
                }
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Request for '{key}' failed, serving stale copy: {e}");
                    return Ok(prior);
                }
                Ok(_) => {}
            }
        }

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.cache.delete(&key);
                return Err(e);
            }
        };

        if response.status() != StatusCode::OK {
            self.cache.delete(&key);
            return Ok(response);
        }

        if cacheable {
            let body = response.body().as_bytes().cloned().unwrap_or_default();
            self.cache.set(&key, wire::encode(response.status(), response.headers(), &body));
            log::debug!(target: LOG_TARGET, "Stored response for '{key}'");
        }

        Ok(response)
    }
}

fn with_validators(mut request: Request, prior: &Response, age_secs: u64) -> Request {
    let headers = request.headers_mut();
    if let Some(etag) = prior.headers().get(ETAG) {
        let _ = headers.insert(IF_NONE_MATCH, etag.clone());
    }
    if let Some(last_modified) = prior.headers().get(LAST_MODIFIED) {
        let _ = headers.insert(IF_MODIFIED_SINCE, last_modified.clone());
    }
    let _ = headers.insert(X_CACHE, HeaderValue::from_static("1"));
    let _ = headers.insert(X_CACHE_AGE, HeaderValue::from(age_secs));
    request
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::transport::Body;
    use crate::transport::testing::{ScriptedTransport, ok, status};
    use bytes::Bytes;
    use core::time::Duration;
    use futures_util::stream;
    use ohno::app_err;
    use reqwest::Url;

    const URL: &str = "https://api.github.com/orgs/acme/repos";

    fn request() -> Request {
        Request::get(Url::parse(URL).unwrap())
    }

    fn tagged_ok(body: &'static str) -> Result<Response> {
        ok(body).map(|r| r.with_header(ETAG, HeaderValue::from_static("\"v1\"")))
    }

    fn setup(script: Vec<Result<Response>>) -> (CacheTransport<ScriptedTransport>, ScriptedTransport, Arc<MemoryCache>) {
        let next = ScriptedTransport::new(script);
        let cache = Arc::new(MemoryCache::new());
        (CacheTransport::new(next.clone(), Arc::<MemoryCache>::clone(&cache) as Arc<dyn Cache>), next, cache)
    }

    fn broken_ok() -> Result<Response> {
        let chunks = stream::iter([Ok(Bytes::from_static(b"par")), Err(app_err!("connection reset"))]);
        Ok(Response::new(StatusCode::OK).with_body(Body::from_stream(chunks)))
    }

    #[tokio::test(start_paused = true)]
    async fn ok_response_is_stored_and_returned() {
        let (transport, next, cache) = setup(vec![tagged_ok("payload")]);

        let response = transport.execute(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.bytes().await.unwrap().as_ref(), b"payload");

        assert!(!next.requests()[0].headers().contains_key(X_CACHE));
        let entry = cache.get(URL).unwrap();
        assert!(entry.bytes().starts_with(b"HTTP/1.1 200 OK\r\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn repeat_request_carries_validators_and_age() {
        let (transport, next, cache) = setup(vec![tagged_ok("payload"), status(304)]);
        let _ = transport.execute(request()).await.unwrap();

        tokio::time::advance(Duration::from_secs(7)).await;
        let response = transport.execute(request()).await.unwrap();

        let forwarded = &next.requests()[1];
        assert_eq!(forwarded.headers().get(IF_NONE_MATCH).unwrap(), "\"v1\"");
        assert_eq!(forwarded.headers().get(X_CACHE).unwrap(), "1");
        assert_eq!(forwarded.headers().get(X_CACHE_AGE).unwrap(), "7");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.bytes().await.unwrap().as_ref(), b"payload");
        assert_eq!(cache.get(URL).unwrap().age(), Duration::ZERO, "origin 304 refreshes the entry");
    }

    #[tokio::test(start_paused = true)]
    async fn caller_request_is_not_mutated() {
        let (transport, _next, _cache) = setup(vec![tagged_ok("payload"), status(304)]);
        let _ = transport.execute(request()).await.unwrap();

        let original = request();
        let _ = transport.execute(original.clone()).await.unwrap();
        assert!(original.headers().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn synthetic_not_modified_does_not_refresh() {
        let synthetic = status(304).map(|r| r.with_header(X_REVALIDATED, HeaderValue::from_static("1")));
        let (transport, _next, cache) = setup(vec![tagged_ok("payload"), synthetic]);
        let _ = transport.execute(request()).await.unwrap();

        tokio::time::advance(Duration::from_secs(3)).await;
        let response = transport.execute(request()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(cache.get(URL).unwrap().age(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_serves_stale_copy() {
        let (transport, _next, cache) = setup(vec![tagged_ok("payload"), status(502)]);
        let _ = transport.execute(request()).await.unwrap();

        let response = transport.execute(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.bytes().await.unwrap().as_ref(), b"payload");
        assert!(cache.get(URL).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_serves_stale_copy() {
        let (transport, _next, _cache) = setup(vec![tagged_ok("payload"), Err(app_err!("connection refused"))]);
        let _ = transport.execute(request()).await.unwrap();

        let response = transport.execute(request()).await.unwrap();
        assert_eq!(response.bytes().await.unwrap().as_ref(), b"payload");
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_without_entry_is_an_error() {
        let (transport, _next, cache) = setup(vec![Err(app_err!("connection refused"))]);
        let err = transport.execute(request()).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn client_error_evicts_entry() {
        let (transport, _next, cache) = setup(vec![tagged_ok("payload"), status(404)]);
        let _ = transport.execute(request()).await.unwrap();

        let response = transport.execute(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(cache.get(URL).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn not_modified_without_entry_passes_through() {
        let (transport, _next, cache) = setup(vec![status(304)]);
        let response = transport.execute(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn other_methods_are_not_cached() {
        let (transport, next, cache) = setup(vec![ok("created"), ok("created")]);
        let post = Request::new(Method::POST, Url::parse(URL).unwrap());

        let _ = transport.execute(post.clone()).await.unwrap();
        let _ = transport.execute(post).await.unwrap();

        assert!(cache.is_empty());
        assert!(!next.requests()[1].headers().contains_key(X_CACHE));
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_entry_is_discarded() {
        let (transport, next, cache) = setup(vec![tagged_ok("fresh")]);
        cache.set(URL, bytes::Bytes::from_static(b"garbage"));

        let response = transport.execute(request()).await.unwrap();
        assert_eq!(response.bytes().await.unwrap().as_ref(), b"fresh");
        assert!(!next.requests()[0].headers().contains_key(X_CACHE));
        assert!(cache.get(URL).unwrap().bytes().starts_with(b"HTTP/1.1 200"));
    }

    #[tokio::test(start_paused = true)]
    async fn head_not_modified_serves_stored_copy() {
        let (transport, next, cache) = setup(vec![tagged_ok(""), status(304)]);
        let head = Request::new(Method::HEAD, Url::parse(URL).unwrap());
        let _ = transport.execute(head.clone()).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        let response = transport.execute(head).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(ETAG).unwrap(), "\"v1\"");
        assert_eq!(next.requests()[1].headers().get(IF_NONE_MATCH).unwrap(), "\"v1\"");
        assert_eq!(cache.get(URL).unwrap().age(), Duration::ZERO, "origin 304 refreshes the entry");
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_body_without_entry_is_an_error() {
        let (transport, _next, cache) = setup(vec![broken_ok()]);

        let err = transport.execute(request()).await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_body_serves_stale_copy() {
        let (transport, _next, cache) = setup(vec![tagged_ok("payload"), broken_ok()]);
        let _ = transport.execute(request()).await.unwrap();

        let response = transport.execute(request()).await.unwrap();
        assert_eq!(response.bytes().await.unwrap().as_ref(), b"payload");
        assert!(cache.get(URL).is_some());
    }
}
