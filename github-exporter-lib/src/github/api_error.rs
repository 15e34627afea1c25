use core::fmt::{Display, Formatter};
use reqwest::StatusCode;
use serde::Deserialize;

/// A non-success answer from the GitHub API.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub url: String,
    pub status: StatusCode,
    pub message: Option<String>,
    pub documentation_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
    documentation_url: Option<String>,
}

impl ApiError {
    /// Builds an error from a response status and its (possibly non-JSON) body.
    #[must_use]
    pub fn from_response(url: impl Into<String>, status: StatusCode, body: &[u8]) -> Self {
        let envelope: ErrorEnvelope = serde_json::from_slice(body).unwrap_or_default();
        Self {
            url: url.into(),
            status,
            message: envelope.message,
            documentation_url: envelope.documentation_url,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "GET {}: {}", self.url, self.status)?;
        if let Some(message) = &self.message {
            write!(f, " {message}")?;
        }
        if let Some(doc) = &self.documentation_url {
            write!(f, " ({doc})")?;
        }
        Ok(())
    }
}

impl core::error::Error for ApiError {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn message_and_docs_are_included() {
        let body = br#"{"message":"Not Found","documentation_url":"https://docs.github.com/rest"}"#;
        let err = ApiError::from_response("https://api.github.com/orgs/x", StatusCode::NOT_FOUND, body);
        assert_eq!(
            err.to_string(),
            "GET https://api.github.com/orgs/x: 404 Not Found Not Found (https://docs.github.com/rest)"
        );
    }

    #[test]
    fn non_json_body_is_tolerated() {
        let err = ApiError::from_response("https://api.github.com/", StatusCode::BAD_GATEWAY, b"<html>");
        assert!(err.message.is_none());
        assert_eq!(err.to_string(), "GET https://api.github.com/: 502 Bad Gateway");
    }
}
