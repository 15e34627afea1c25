use super::{Request, Response, Service, Transport};
use crate::Result;
use crate::throttler::Throttler;
use std::sync::Arc;

/// Admits requests to the next layer at a fixed rate.
///
/// Only requests that reach this layer are counted, so responses served by the
/// cache or revalidation layers never consume throttle capacity.
#[derive(Debug)]
pub struct ThrottleTransport<T> {
    next: T,
    throttler: Arc<Throttler>,
}

impl<T: Transport> ThrottleTransport<T> {
    pub const fn new(next: T, throttler: Arc<Throttler>) -> Self {
        Self { next, throttler }
    }
}

impl<T: Transport> Service<Request> for ThrottleTransport<T> {
    type Out = Result<Response>;

    async fn execute(&self, request: Request) -> Self::Out {
        self.throttler.acquire().await;
        self.next.execute(request).await
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::transport::testing::{ScriptedTransport, ok};
    use core::num::NonZeroU32;
    use core::time::Duration;
    use reqwest::Url;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn requests_are_spaced_by_the_rate() {
        let next = ScriptedTransport::new([ok("a"), ok("b"), ok("c")]);
        let transport = ThrottleTransport::new(next.clone(), Throttler::new(NonZeroU32::new(2).unwrap()));
        let url = Url::parse("https://api.github.com/rate_limit").unwrap();

        let start = Instant::now();
        for _ in 0..3 {
            let _ = transport.execute(Request::get(url.clone())).await.unwrap();
        }

        assert_eq!(start.elapsed(), Duration::from_secs(1));
        assert_eq!(next.calls(), 3);
    }
}
