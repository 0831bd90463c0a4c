use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use axum::extract::rejection::BytesRejection;
use axum::extract::{FromRequest, Request};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use mime::Mime;
use serde::{Deserialize, Serialize};

use crate::response::ErrorResponse;

/// A JSON request/response body.
///
/// This type implements [`FromRequest`] and [`IntoResponse`], so it can be used as an [extractor]
/// and return value from [handlers].
///
/// [extractor]: axum::extract
/// [handlers]: axum::handler
#[derive(Debug)]
pub struct Json<T>(pub T);

pub struct JsonRejection<T> {
    reason: Reason,
    _marker: PhantomData<T>,
}

#[derive(Debug, Display, Error)]
enum Reason {
    #[display("missing `Content-Type: application/json` header")]
    MissingContentType,

    #[display("request body too large")]
    BufferBody(BytesRejection),

    #[display("{_0}")]
    Deserialize(serde_json::Error),
}

impl<S, T> FromRequest<S> for Json<T>
where
    S: Send + Sync,
    T: for<'de> Deserialize<'de>,
{
    type Rejection = JsonRejection<T>;

    #[tracing::instrument(level = "trace", skip_all, err(level = "debug"))]
    async fn from_request(request: Request, _state: &S) -> Result<Self, Self::Rejection> {
        if !has_json_content_type(request.headers()) {
            return Err(JsonRejection::new(Reason::MissingContentType));
        }

        let bytes = Bytes::from_request(request, &())
            .await
            .map_err(|rejection| JsonRejection::new(Reason::BufferBody(rejection)))?;

        serde_json::from_slice(&bytes[..])
            .map(Self)
            .map_err(|error| JsonRejection::new(Reason::Deserialize(error)))
    }
}

impl<T> IntoResponse for Json<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        let bytes = match serde_json::to_vec(&self.0) {
            Ok(bytes) => Bytes::from(bytes),
            Err(error) => return ErrorResponse::internal_server_error(error).into_response(),
        };

        let mut response = bytes.into_response();

        response.headers_mut().insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static(mime::APPLICATION_JSON.as_ref()),
        );

        response
    }
}

#[tracing::instrument(level = "trace", skip_all, ret)]
fn has_json_content_type(headers: &http::HeaderMap) -> bool {
    let Some(content_type) = headers.get(http::header::CONTENT_TYPE) else {
        debug!("request headers do not contain a `Content-Type` header");
        return false;
    };

    let Some(mime) = content_type
        .to_str()
        .ok()
        .and_then(|content_type| content_type.parse::<Mime>().ok())
    else {
        debug!("`Content-Type` header is not a valid mime type");
        return false;
    };

    mime.type_() == mime::APPLICATION
        && (mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON))
}

impl<T> JsonRejection<T> {
    fn new(reason: Reason) -> Self {
        Self { reason, _marker: PhantomData }
    }
}

impl<T> fmt::Debug for JsonRejection<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("JsonRejection")
            .field("reason", &self.reason)
            .finish()
    }
}

impl<T> fmt::Display for JsonRejection<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "failed to deserialize request body")?;

        if cfg!(not(feature = "production")) {
            write!(fmt, " of type `{}`", type_name::<T>())?;
        }

        write!(fmt, ": {}", self.reason)
    }
}

impl<T> std::error::Error for JsonRejection<T> {}

impl<T> IntoResponse for JsonRejection<T> {
    fn into_response(self) -> Response {
        #[derive(serde::Serialize)]
        struct JsonError {
            #[serde(rename = "type")]
            kind: &'static str,
            line: usize,
            column: usize,
            detail: String,
        }

        match self.reason {
            Reason::MissingContentType => ErrorResponse::missing_header::<headers::ContentType>(),
            Reason::BufferBody(_) => ErrorResponse::failed_to_buffer_body(),
            Reason::Deserialize(error) => ErrorResponse::invalid_request_body(|details| {
                details.add_extension("json_error", &JsonError {
                    kind: match error.classify() {
                        serde_json::error::Category::Io | serde_json::error::Category::Eof => "eof",
                        serde_json::error::Category::Syntax => "syntax",
                        serde_json::error::Category::Data => "data",
                    },
                    line: error.line(),
                    column: error.column(),
                    detail: error.to_string(),
                });
            }),
        }
        .into_response()
    }
}
