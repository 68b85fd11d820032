// requester.rs

use crate::cancel::CancelSignal;
use crate::error::ArkimeError;
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use std::collections::HashMap;
use url::Url;

type Result<T> = std::result::Result<T, ArkimeError>;

/// A fully normalized outgoing request, ready for the transport
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    /// Absolute URL with the query string already applied
    pub url: Url,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
    pub signal: Option<CancelSignal>,
}

/// Trait for different transport implementations (reqwest, in-memory, etc.)
#[async_trait]
pub trait Requester: Send + Sync {
    /// Send one request and return the raw response without judging its status.
    ///
    /// Implementations must honor `request.signal` and fail with
    /// [`ArkimeError::Cancelled`] when it fires before the response arrives.
    async fn send(&self, request: PreparedRequest) -> Result<http::Response<Bytes>>;
}
