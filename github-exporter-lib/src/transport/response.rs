use super::Body;
use crate::Result;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};

/// An HTTP response flowing back up the transport layers.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
}

impl Response {
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Body::empty(),
        }
    }

    #[must_use]
    pub const fn from_parts(status: StatusCode, headers: HeaderMap, body: Body) -> Self {
        Self { status, headers, body }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl IntoHeaderName, value: HeaderValue) -> Self {
        let _ = self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub const fn body(&self) -> &Body {
        &self.body
    }

    #[must_use]
    pub const fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Reads the body into memory and keeps a copy in the response.
    ///
    /// The returned bytes and the body left in the response are independent views
    /// of the same content, so both the caller and whoever receives the response
    /// can read it in full.
    pub async fn buffer(&mut self) -> Result<Bytes> {
        let bytes = core::mem::take(&mut self.body).collect().await?;
        self.body = Body::from(bytes.clone());
        Ok(bytes)
    }

    /// Consumes the response and reads its body.
    pub async fn bytes(self) -> Result<Bytes> {
        self.body.collect().await
    }

    #[must_use]
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Body) {
        (self.status, self.headers, self.body)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use futures_util::stream;

    #[tokio::test]
    async fn buffer_leaves_a_readable_body_behind() {
        let chunks = vec![Ok(Bytes::from_static(b"{\"a\":")), Ok(Bytes::from_static(b"1}"))];
        let mut response = Response::new(StatusCode::OK).with_body(Body::from_stream(stream::iter(chunks)));

        let seen = response.buffer().await.unwrap();
        assert_eq!(seen.as_ref(), b"{\"a\":1}");
        assert_eq!(response.bytes().await.unwrap().as_ref(), b"{\"a\":1}");
    }
}
