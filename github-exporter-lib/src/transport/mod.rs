//! Layered HTTP transport pipeline.
//!
//! Every layer is a [`layered::Service`] over [`Request`] (see [`Transport`]): it
//! receives a request, optionally executes it on the next layer, and returns a
//! response or an error. Layers are stacked outermost to
//! innermost as
//!
//! ```text
//! CacheTransport -> RevalidationTransport -> ThrottleTransport -> RateLimitTransport -> network
//! ```
//!
//! - [`CacheTransport`] stores `200` responses, adds conditional headers and the
//!   cache age to repeat requests, and serves stored responses when the origin
//!   confirms them (`304`) or fails.
//! - [`RevalidationTransport`] answers repeat requests locally with a synthetic
//!   `304` when a [`Validator`](crate::validators::Validator) deems the cached copy
//!   fresh enough.
//! - [`ThrottleTransport`] paces requests that actually head to the network.
//! - [`RateLimitTransport`] recognizes GitHub's primary and secondary rate limit
//!   responses, waits as instructed and retries.
//!
//! Layers talk to each other only through request and response headers, so any
//! layer can be left out. [`build_pipeline`] composes them from
//! [`PipelineOptions`].

mod body;
mod caching;
mod network;
mod pipeline;
mod rate_limit;
mod request;
mod response;
mod revalidation;
mod throttle;
pub mod wire;

pub use body::Body;
pub use caching::CacheTransport;
pub use network::ReqwestTransport;
pub use pipeline::{DEFAULT_REQUESTS_PER_SECOND, PipelineOptions, build_pipeline};
pub use rate_limit::{DEFAULT_SECONDARY_WAIT, RateLimitSignal, RateLimitTransport, classify};
pub use request::Request;
pub use response::Response;
pub use revalidation::RevalidationTransport;
pub use throttle::ThrottleTransport;

use crate::Result;
use core::fmt::{Debug, Formatter};
use futures::future::BoxFuture;
use std::sync::Arc;

pub use layered::Service;

/// Marks a request that carries a cached copy (`1`).
pub const X_CACHE: &str = "x-cache";

/// Age of the cached copy in whole seconds, set on requests by the cache layer.
pub const X_CACHE_AGE: &str = "x-cache-age";

/// Marks a `304` synthesized locally by the revalidation layer (`1`).
pub const X_REVALIDATED: &str = "x-revalidated";

/// One stage of the request pipeline: a [`Service`] from [`Request`] to response.
///
/// Implemented automatically for every matching service, so a layer only implements
/// [`Service<Request>`].
pub trait Transport: Service<Request, Out = Result<Response>> + Send + Sync {}

impl<S> Transport for S where S: Service<Request, Out = Result<Response>> + Send + Sync {}

/// Object-safe form of [`Transport`], implemented for every transport.
pub trait DynTransport: Send + Sync {
    fn execute_boxed(&self, request: Request) -> BoxFuture<'_, Result<Response>>;
}

impl<T: Transport> DynTransport for T {
    fn execute_boxed(&self, request: Request) -> BoxFuture<'_, Result<Response>> {
        Box::pin(self.execute(request))
    }
}

/// A type-erased, cheaply cloneable transport.
#[derive(Clone)]
pub struct SharedTransport(Arc<dyn DynTransport>);

impl SharedTransport {
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self(Arc::new(transport))
    }
}

impl Debug for SharedTransport {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedTransport").finish_non_exhaustive()
    }
}

impl Service<Request> for SharedTransport {
    type Out = Result<Response>;

    async fn execute(&self, request: Request) -> Self::Out {
        self.0.execute_boxed(request).await
    }
}

#[cfg(test)]
pub(crate) mod testing;
