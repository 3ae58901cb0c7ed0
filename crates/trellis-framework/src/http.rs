//! Request, response and action-result types.
//!
//! The framework does not define its own HTTP value objects; it works on the
//! `http` crate types with a [`Bytes`] body so any transport can hand requests
//! in and take responses out without conversion.

use bytes::Bytes;
use http::{HeaderValue, StatusCode, header};
use serde_json::Value;

/// An incoming request.
pub type Request = http::Request<Bytes>;

/// An outgoing response.
pub type Response = http::Response<Bytes>;

/// Content type used for serialized [`ActionResult::Value`] results.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// The value a controller or listener produces for a request.
///
/// A [`Response`](ActionResult::Response) is complete and is sent as-is; a
/// [`Value`](ActionResult::Value) is structured data that is serialized when
/// the response is emitted.
#[derive(Debug)]
pub enum ActionResult {
    /// A complete response; short-circuits dispatch when returned by a
    /// `dispatch` listener.
    Response(Response),
    /// Structured data for the view layer.
    Value(Value),
}

impl ActionResult {
    /// Returns `true` for a complete response.
    pub fn is_response(&self) -> bool {
        matches!(self, Self::Response(_))
    }

    /// Returns the structured value, if this is one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Response(_) => None,
        }
    }

    /// Returns the response, if this is one.
    pub fn as_response(&self) -> Option<&Response> {
        match self {
            Self::Response(response) => Some(response),
            Self::Value(_) => None,
        }
    }

    /// Folds this result into `response`.
    ///
    /// A complete response replaces `response` (status, headers and body). A
    /// value is written as the JSON body, keeping the status already set on
    /// `response`.
    pub fn render_into(&self, response: &mut Response) {
        match self {
            Self::Response(source) => {
                *response.status_mut() = source.status();
                *response.version_mut() = source.version();
                *response.headers_mut() = source.headers().clone();
                *response.body_mut() = source.body().clone();
            }
            Self::Value(value) => {
                *response.body_mut() = Bytes::from(value.to_string());
                response.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(JSON_CONTENT_TYPE),
                );
            }
        }
    }
}

impl From<Response> for ActionResult {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

impl From<Value> for ActionResult {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Builds an empty `200 OK` response.
pub fn empty_response() -> Response {
    Response::new(Bytes::new())
}

/// Builds a response with the given status and a plain-text body.
pub fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
