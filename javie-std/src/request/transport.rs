//! Transport seam for executing requests.

use futures::{FutureExt, future::BoxFuture};
use javie_core::BoxError;
use std::{fmt, future::Future};

/// HTTP method accepted by [`Request::to`](super::Request::to).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    /// `GET`
    #[default]
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Parse an uppercase method name. Anything else is not a method.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }

    /// The uppercase method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a transport needs to perform one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    /// HTTP method.
    pub method: Method,
    /// Target URI.
    pub uri: String,
    /// Form-encoded body (or query string for `GET`).
    pub data: String,
    /// Expected response format, e.g. `json`.
    pub data_type: String,
}

/// What a transport hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl TransportResponse {
    /// Build a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Executes requests on behalf of [`Request`](super::Request).
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Transport`",
    label = "missing `Transport` implementation",
    note = "Transports must implement `send` to deliver a `RequestSpec`."
)]
pub trait Transport: Send + Sync {
    /// Deliver the request and return the raw response.
    fn send(
        &self,
        spec: &RequestSpec,
    ) -> impl Future<Output = Result<TransportResponse, BoxError>> + Send;
}

/// Dynamic object-safe version of [`Transport`].
pub trait DynTransport: Send + Sync {
    /// Deliver the request (dynamic dispatch version).
    fn send_dyn<'a>(
        &'a self,
        spec: &'a RequestSpec,
    ) -> BoxFuture<'a, Result<TransportResponse, BoxError>>;
}

impl<T: Transport> DynTransport for T {
    fn send_dyn<'a>(
        &'a self,
        spec: &'a RequestSpec,
    ) -> BoxFuture<'a, Result<TransportResponse, BoxError>> {
        self.send(spec).boxed()
    }
}

// Allow Box<dyn DynTransport> to be used where Transport is expected.
impl Transport for Box<dyn DynTransport> {
    async fn send(&self, spec: &RequestSpec) -> Result<TransportResponse, BoxError> {
        (**self).send_dyn(spec).await
    }
}
