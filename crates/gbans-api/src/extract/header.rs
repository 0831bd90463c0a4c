use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use axum::extract::FromRequestParts;
use axum::response::{IntoResponse, Response};
use headers::{Header as IsHeader, HeaderMapExt};

use crate::response::ErrorResponse;

/// An [extractor] for typed [request headers].
///
/// [extractor]: axum::extract
/// [request headers]: http::Request::headers
#[derive(Debug)]
pub struct Header<H: IsHeader>(pub H);

pub struct HeaderRejection<H: IsHeader> {
    reason: Reason,
    _marker: PhantomData<H>,
}

#[derive(Debug)]
enum Reason {
    Missing,
    Parse(headers::Error),
}

impl<S, H> FromRequestParts<S> for Header<H>
where
    S: Send + Sync,
    H: IsHeader,
{
    type Rejection = HeaderRejection<H>;

    #[tracing::instrument(level = "trace", skip_all, err(level = "debug"))]
    async fn from_request_parts(
        request: &mut http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        match request.headers.typed_try_get::<H>() {
            Ok(Some(header)) => Ok(Self(header)),
            Ok(None) => Err(HeaderRejection::new(Reason::Missing)),
            Err(error) => Err(HeaderRejection::new(Reason::Parse(error))),
        }
    }
}

impl<H: IsHeader> HeaderRejection<H> {
    fn new(reason: Reason) -> Self {
        Self { reason, _marker: PhantomData }
    }
}

impl<H: IsHeader> fmt::Debug for HeaderRejection<H> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("HeaderRejection")
            .field("header", H::name())
            .field("reason", &self.reason)
            .finish()
    }
}

impl<H: IsHeader> fmt::Display for HeaderRejection<H> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            Reason::Missing => write!(fmt, "missing `{}` header", H::name()),
            Reason::Parse(_) => write!(fmt, "failed to parse `{}` header", H::name()),
        }
    }
}

impl<H: IsHeader> std::error::Error for HeaderRejection<H> {}

impl<H: IsHeader> IntoResponse for HeaderRejection<H> {
    fn into_response(self) -> Response {
        // Credentials are never described back to the client.
        if type_name::<H>().contains("Authorization<") {
            return ErrorResponse::unauthorized().into_response();
        }

        match self.reason {
            Reason::Missing => ErrorResponse::missing_header::<H>(),
            Reason::Parse(error) => ErrorResponse::invalid_header::<H>(error),
        }
        .into_response()
    }
}
