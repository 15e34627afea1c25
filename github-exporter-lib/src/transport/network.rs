use super::{Body, Request, Response, Service};
use crate::Result;
use futures_util::TryStreamExt;
use ohno::IntoAppError;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};

const LOG_TARGET: &str = "   network";

const USER_AGENT: &str = concat!("github-exporter/", env!("CARGO_PKG_VERSION"));
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// The bottom of the pipeline: sends requests over the network with `reqwest`.
///
/// Credentials live here. When a token is supplied, every request carries
/// `Authorization: token ...` marked as sensitive so it never shows up in logs.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with optional authentication token.
    pub fn new(token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("token {t}"))?;
            auth_val.set_sensitive(true);
            let _ = headers.insert(AUTHORIZATION, auth_val);
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .into_app_err("building HTTP client")?;

        Ok(Self { client })
    }

    /// Wrap an already configured client.
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Service<Request> for ReqwestTransport {
    type Out = Result<Response>;

    async fn execute(&self, request: Request) -> Self::Out {
        log::trace!(target: LOG_TARGET, "{} {}", request.method(), request.url());

        let mut builder = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone());
        if !request.body().is_empty() {
            builder = builder.body(request.body().clone());
        }

        let resp = builder
            .send()
            .await
            .into_app_err_with(|| format!("sending {} request to '{}'", request.method(), request.url()))?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let body = Body::from_stream(resp.bytes_stream().map_err(ohno::AppError::from));

        log::trace!(target: LOG_TARGET, "{} {} -> {status}", request.method(), request.url());
        Ok(Response::from_parts(status, headers, body))
    }
}
