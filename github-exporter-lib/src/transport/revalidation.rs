use super::{Request, Response, Service, Transport, X_CACHE_AGE, X_REVALIDATED};
use crate::Result;
use crate::validators::Validator;
use core::time::Duration;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use std::sync::Arc;

const LOG_TARGET: &str = "revalidate";

/// Answers repeat requests locally while the cached copy is fresh.
///
/// A request carrying `X-Cache-Age` has a cached copy upstream. When the validator
/// accepts that age for the request URL, this layer returns an empty `304` marked
/// with `X-Revalidated: 1` without touching the network. Everything else is
/// forwarded unchanged.
#[derive(Debug)]
pub struct RevalidationTransport<T> {
    next: T,
    validator: Arc<dyn Validator>,
}

impl<T: Transport> RevalidationTransport<T> {
    pub fn new(next: T, validator: Arc<dyn Validator>) -> Self {
        Self { next, validator }
    }
}

impl<T: Transport> Service<Request> for RevalidationTransport<T> {
    type Out = Result<Response>;

    async fn execute(&self, request: Request) -> Self::Out {
        if let Some(age) = declared_age(request.headers())
            && self.validator.valid(request.url(), age)
        {
            log::debug!(target: LOG_TARGET, "Cached copy of '{}' is fresh ({}s old)", request.url(), age.as_secs());
            return Ok(Response::new(StatusCode::NOT_MODIFIED).with_header(X_REVALIDATED, HeaderValue::from_static("1")));
        }

        self.next.execute(request).await
    }
}

fn declared_age(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(X_CACHE_AGE)?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
