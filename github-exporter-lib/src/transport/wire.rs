//! HTTP/1.1 wire form of responses, used as the cache storage format.

use super::{Body, Response};
use crate::Result;
use bytes::Bytes;
use ohno::{IntoAppError, bail};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

const CRLF: &[u8] = b"\r\n";
const HEAD_END: &[u8] = b"\r\n\r\n";

/// Serializes a response as a status line, header lines, a blank line and the body.
#[must_use]
pub fn encode(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> Bytes {
    let mut out = Vec::with_capacity(body.len() + 256);
    out.extend_from_slice(b"HTTP/1.1 ");
    out.extend_from_slice(status.as_str().as_bytes());
    if let Some(reason) = status.canonical_reason() {
        out.push(b' ');
        out.extend_from_slice(reason.as_bytes());
    }
    out.extend_from_slice(CRLF);

    for (name, value) in headers {
        out.extend_from_slice(name.as_str().as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(CRLF);
    }

    out.extend_from_slice(CRLF);
    out.extend_from_slice(body);
    Bytes::from(out)
}

/// Reconstructs a response from the form produced by [`encode`].
pub fn decode(bytes: &Bytes) -> Result<Response> {
    let Some(head_len) = bytes.windows(HEAD_END.len()).position(|w| w == HEAD_END) else {
        bail!("cached response has no header terminator");
    };

    let body = bytes.slice(head_len + HEAD_END.len()..);
    let (head, _) = bytes.split_at(head_len);
    let mut lines = head.split(|&b| b == b'\n').map(|line| line.strip_suffix(b"\r").unwrap_or(line));

    let status_line = lines.next().unwrap_or_default();
    let status = parse_status_line(status_line)?;

    let mut headers = HeaderMap::new();
    for line in lines {
        let Some(colon) = line.iter().position(|&b| b == b':') else {
            bail!("malformed header line in cached response");
        };
        let (name, value) = line.split_at(colon);
        let value = value.get(1..).unwrap_or_default().trim_ascii();

        let name = HeaderName::from_bytes(name).into_app_err("invalid header name in cached response")?;
        let value = HeaderValue::from_bytes(value).into_app_err("invalid header value in cached response")?;
        let _ = headers.append(name, value);
    }

    Ok(Response::from_parts(status, headers, Body::from(body)))
}

fn parse_status_line(line: &[u8]) -> Result<StatusCode> {
    let mut parts = line.split(|&b| b == b' ');
    match (parts.next(), parts.next()) {
        (Some(version), Some(code)) if version.starts_with(b"HTTP/") => {
            StatusCode::from_bytes(code).into_app_err("invalid status code in cached response")
        }
        _ => bail!("malformed status line in cached response"),
    }
}
