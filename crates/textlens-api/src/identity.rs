//! Request identity: subject header extraction and client IP.

use std::net::IpAddr;

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, HeaderMap};
use textlens_core::AppError;

use crate::error::HttpAppError;

pub const SUBJECT_HEADER: &str = "x-subject-id";

/// Owner identity for every non-health route, taken from the
/// `X-Subject-Id` header. Requests without one are rejected.
#[derive(Debug, Clone)]
pub struct SubjectId(pub String);

impl<S> FromRequestParts<S> for SubjectId
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let subject = parts
            .headers
            .get(SUBJECT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "Missing X-Subject-Id header".to_string(),
                ))
            })?;
        Ok(SubjectId(subject.to_string()))
    }
}

/// Client IP for rate-limit keys: first hop of X-Forwarded-For if it is a
/// valid address, then the socket peer, then a shared fallback bucket.
pub fn extract_client_ip(headers: &HeaderMap, socket_addr: Option<&std::net::SocketAddr>) -> String {
    if let Some(forwarded_for) = headers.get("x-forwarded-for") {
        if let Ok(value) = forwarded_for.to_str() {
            if let Some(first) = value.split(',').next() {
                let candidate = first.trim();
                if candidate.parse::<IpAddr>().is_ok() {
                    return candidate.to_string();
                }
            }
        }
    }

    if let Some(addr) = socket_addr {
        return addr.ip().to_string();
    }

    "anon".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_for_first_hop_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(extract_client_ip(&headers, None), "203.0.113.7");
    }

    #[test]
    fn invalid_forwarded_for_falls_back_to_socket() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        let addr: std::net::SocketAddr = "192.0.2.1:5000".parse().unwrap();
        assert_eq!(extract_client_ip(&headers, Some(&addr)), "192.0.2.1");
    }

    #[test]
    fn missing_everything_is_anon() {
        assert_eq!(extract_client_ip(&HeaderMap::new(), None), "anon");
    }
}
