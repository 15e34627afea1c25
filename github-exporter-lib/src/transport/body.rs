use crate::Result;
use bytes::Bytes;
use core::fmt::{Debug, Formatter};
use futures_util::stream::{BoxStream, Stream, StreamExt};

/// A response body that can be read once.
///
/// Bodies arrive from the network as a stream of chunks. A layer that needs to look
/// at the content collects it with [`Body::collect`] and, if the response continues
/// up the pipeline, puts the buffered bytes back with `Body::from`.
#[derive(Default)]
pub struct Body {
    inner: Inner,
}

#[derive(Default)]
enum Inner {
    #[default]
    Empty,
    Full(Bytes),
    Stream(BoxStream<'static, Result<Bytes>>),
}

impl Body {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps a stream of chunks.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self {
            inner: Inner::Stream(stream.boxed()),
        }
    }

    /// Returns the body content if it is already in memory.
    #[must_use]
    pub const fn as_bytes(&self) -> Option<&Bytes> {
        match &self.inner {
            Inner::Full(bytes) => Some(bytes),
            Inner::Empty | Inner::Stream(_) => None,
        }
    }

    /// Reads the whole body into memory.
    pub async fn collect(self) -> Result<Bytes> {
        match self.inner {
            Inner::Empty => Ok(Bytes::new()),
            Inner::Full(bytes) => Ok(bytes),
            Inner::Stream(mut stream) => {
                let mut buf = Vec::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(Bytes::from(buf))
            }
        }
    }
}

impl Debug for Body {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match &self.inner {
            Inner::Empty => f.write_str("Body(empty)"),
            Inner::Full(bytes) => write!(f, "Body({} bytes)", bytes.len()),
            Inner::Stream(_) => f.write_str("Body(stream)"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self {
            inner: Inner::Full(bytes),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes::from(bytes).into()
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Bytes::from(text).into()
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Bytes::from_static(text.as_bytes()).into()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use futures_util::stream;

    #[tokio::test]
    async fn empty_body_collects_to_nothing() {
        assert!(Body::empty().collect().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stream_chunks_are_concatenated() {
        let chunks = vec![Ok(Bytes::from_static(b"hel")), Ok(Bytes::from_static(b"lo"))];
        let body = Body::from_stream(stream::iter(chunks));
        assert!(body.as_bytes().is_none());
        assert_eq!(body.collect().await.unwrap().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn stream_error_is_propagated() {
        let chunks = vec![Ok(Bytes::from_static(b"partial")), Err(ohno::app_err!("connection reset"))];
        let body = Body::from_stream(stream::iter(chunks));
        let err = body.collect().await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn debug_does_not_dump_content() {
        assert_eq!(format!("{:?}", Body::from("secret")), "Body(6 bytes)");
    }
}
