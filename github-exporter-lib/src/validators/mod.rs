//! Freshness policies for cached responses.
//!
//! A [`Validator`] decides, from a request URL and the age a cached entry declares,
//! whether the entry can be served without asking the origin.

mod always_valid;
mod regex_validator;

pub use always_valid::AlwaysValid;
pub use regex_validator::{RegexValidator, Rule};

use core::fmt::Debug;
use core::time::Duration;
use url::Url;

/// Decides whether a cached response of a given age is still usable.
pub trait Validator: Send + Sync + Debug {
    /// Returns `true` when a cached response for `url` that is `age` old can be used as-is.
    fn valid(&self, url: &Url, age: Duration) -> bool;
}
