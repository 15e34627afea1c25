use super::{CacheTransport, RateLimitTransport, RevalidationTransport, SharedTransport, ThrottleTransport, Transport};
use crate::cache::{Cache, MemoryCache};
use crate::throttler::Throttler;
use crate::validators::{AlwaysValid, Validator};
use core::num::NonZeroU32;
use std::sync::Arc;

const LOG_TARGET: &str = "  pipeline";

/// Default throttle rate in requests per second.
pub const DEFAULT_REQUESTS_PER_SECOND: NonZeroU32 = NonZeroU32::new(100).expect("non-zero literal");

/// Selects and configures the layers stacked on top of the network transport.
#[derive(Debug, Clone)]
#[expect(clippy::struct_excessive_bools, reason = "one switch per pipeline layer")]
pub struct PipelineOptions {
    pub cache_enabled: bool,
    pub revalidation_enabled: bool,
    pub throttle_enabled: bool,
    pub rate_limit_enabled: bool,
    pub requests_per_second: NonZeroU32,
    pub cache: Arc<dyn Cache>,
    pub validator: Arc<dyn Validator>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            revalidation_enabled: true,
            throttle_enabled: true,
            rate_limit_enabled: true,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            cache: Arc::new(MemoryCache::new()),
            validator: Arc::new(AlwaysValid),
        }
    }
}

/// Stacks the enabled layers on top of `network`, innermost first.
pub fn build_pipeline<T: Transport + 'static>(network: T, options: PipelineOptions) -> SharedTransport {
    let mut transport = SharedTransport::new(network);
    let mut layers = Vec::new();

    if options.rate_limit_enabled {
        transport = SharedTransport::new(RateLimitTransport::new(transport));
        layers.push("rate-limit");
    }

    if options.throttle_enabled {
        transport = SharedTransport::new(ThrottleTransport::new(transport, Throttler::new(options.requests_per_second)));
        layers.push("throttle");
    }

    if options.revalidation_enabled {
        transport = SharedTransport::new(RevalidationTransport::new(transport, options.validator));
        layers.push("revalidation");
    }

    if options.cache_enabled {
        transport = SharedTransport::new(CacheTransport::new(transport, options.cache));
        layers.push("cache");
    }

    layers.reverse();
    log::debug!(target: LOG_TARGET, "Transport pipeline: {} -> network", layers.join(" -> "));
    transport
}
