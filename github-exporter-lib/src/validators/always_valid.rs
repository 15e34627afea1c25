use super::Validator;
use core::time::Duration;
use url::Url;

/// A validator that considers every cached response fresh.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysValid;

impl Validator for AlwaysValid {
    fn valid(&self, _url: &Url, _age: Duration) -> bool {
        true
    }
}
