use super::{Request, Response, Service, SharedTransport, Transport};
use crate::Result;
use chrono::{DateTime, Utc};
use core::time::Duration;
use layered::{Execute, Stack};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use seatbelt::retry::Retry;
use seatbelt::{RecoveryInfo, ResilienceContext};
use serde::Deserialize;
use tick::Clock;

const LOG_TARGET: &str = " ratelimit";

const HEADER_RATE_REMAINING: &str = "x-ratelimit-remaining";
const HEADER_RATE_RESET: &str = "x-ratelimit-reset";

/// Marks a documentation URL that points at GitHub's secondary rate limit section.
const SECONDARY_LIMIT_MARKER: &str = "secondary-rate-limits";

/// Older form of the secondary rate limit documentation anchor.
const ABUSE_LIMIT_ANCHOR: &str = "#abuse-rate-limits";

/// Retry cap for rate-limited requests, high enough to never be reached in practice.
const MAX_RETRY_ATTEMPTS: u32 = 1 << 30;

/// Wait applied to a secondary rate limit that carries no `Retry-After`.
pub const DEFAULT_SECONDARY_WAIT: Duration = Duration::from_mins(1);

/// Upper bound on a single wait for a primary rate limit reset.
const MAX_PRIMARY_WAIT: Duration = Duration::from_hours(1);

/// What a response says about GitHub's rate limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitSignal {
    /// The response is not a rate limit rejection.
    Clear,

    /// Secondary ("abuse") limit: retry after the given delay.
    Secondary { retry_after: Duration },

    /// Primary limit exhausted: retry once the quota resets.
    Primary { reset_at: DateTime<Utc> },
}

impl RateLimitSignal {
    /// How long to wait before retrying, measured from `now`.
    #[must_use]
    pub fn wait(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self {
            Self::Clear => None,
            Self::Secondary { retry_after } => Some(*retry_after),
            Self::Primary { reset_at } => Some((*reset_at - now).to_std().unwrap_or(Duration::ZERO).min(MAX_PRIMARY_WAIT)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    documentation_url: Option<String>,
}

/// Classifies a response from its status, headers and body.
///
/// Only `403` and `429` responses can signal a limit. A primary limit needs
/// `X-RateLimit-Remaining: 0` and a readable `X-RateLimit-Reset`. A secondary limit
/// is recognized from the documentation URL in the JSON error body, or from a
/// readable `Retry-After` header. Anything that fails to parse is treated as no limit.
#[must_use]
pub fn classify(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> RateLimitSignal {
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return RateLimitSignal::Clear;
    }

    if header_str(headers, HEADER_RATE_REMAINING) == Some("0") {
        return header_str(headers, HEADER_RATE_RESET)
            .and_then(|reset| reset.parse::<i64>().ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map_or(RateLimitSignal::Clear, |reset_at| RateLimitSignal::Primary { reset_at });
    }

    let retry_after = header_str(headers, RETRY_AFTER.as_str())
        .and_then(|secs| secs.parse::<u64>().ok())
        .map(Duration::from_secs);

    let envelope: ErrorEnvelope = serde_json::from_slice(body).unwrap_or_default();
    let documented = envelope
        .documentation_url
        .is_some_and(|url| url.contains(SECONDARY_LIMIT_MARKER) || url.ends_with(ABUSE_LIMIT_ANCHOR));

    match retry_after {
        Some(retry_after) => RateLimitSignal::Secondary { retry_after },
        None if documented => RateLimitSignal::Secondary {
            retry_after: DEFAULT_SECONDARY_WAIT,
        },
        None => RateLimitSignal::Clear,
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

/// Innermost layer: waits out GitHub rate limits and retries.
///
/// Every response body is buffered so it can be inspected; the response handed
/// back up the pipeline still carries the full body. A rate-limited request is
/// retried after the indicated wait, as many times as the origin keeps limiting
/// it. The wait blocks only the request that hit the limit. Transport errors are
/// returned as they are.
#[derive(Debug, Clone)]
pub struct RateLimitTransport {
    inner: SharedTransport,
}

impl RateLimitTransport {
    pub fn new<T: Transport + 'static>(next: T) -> Self {
        Self::with_clock(next, &Clock::new_tokio())
    }

    pub fn with_clock<T: Transport + 'static>(next: T, clock: &Clock) -> Self {
        let next = SharedTransport::new(next);
        let context = ResilienceContext::new(clock).name("github");

        let service = (
            Retry::layer("rate_limit", &context)
                .clone_input()
                .recovery_with(|result: &Result<Response>, _| recovery(result))
                .max_retry_attempts(MAX_RETRY_ATTEMPTS)
                .on_retry(|_output, args| {
                    log::debug!(
                        target: LOG_TARGET,
                        "Retrying rate-limited request (attempt {}, delay {}s)",
                        args.attempt().index() + 1,
                        args.retry_delay().as_secs()
                    );
                }),
            Execute::new(move |request: Request| {
                let next = next.clone();
                async move { execute_buffered(&next, request).await }
            }),
        )
            .into_service();

        Self {
            inner: SharedTransport::new(service),
        }
    }
}

impl Service<Request> for RateLimitTransport {
    type Out = Result<Response>;

    async fn execute(&self, request: Request) -> Self::Out {
        self.inner.execute(request).await
    }
}

async fn execute_buffered(next: &SharedTransport, request: Request) -> Result<Response> {
    let mut response = next.execute(request).await?;
    let _ = response.buffer().await?;
    Ok(response)
}

fn recovery(result: &Result<Response>) -> RecoveryInfo {
    let Ok(response) = result else {
        return RecoveryInfo::never();
    };

    let body = response.body().as_bytes().map_or(&[][..], |bytes| bytes.as_ref());
    let signal = classify(response.status(), response.headers(), body);
    let Some(wait) = signal.wait(Utc::now()) else {
        return RecoveryInfo::never();
    };

    match signal {
        RateLimitSignal::Primary { reset_at } => {
            log::warn!(target: LOG_TARGET, "Primary rate limit hit, waiting {}s until {reset_at}", wait.as_secs());
        }
        _ => log::warn!(target: LOG_TARGET, "Secondary rate limit hit, waiting {}s", wait.as_secs()),
    }

    RecoveryInfo::retry().delay(wait)
}
