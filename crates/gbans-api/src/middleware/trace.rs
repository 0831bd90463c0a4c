use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use axum::body::HttpBody;
use axum::extract::ConnectInfo;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::request_id::RequestId;
use tower_http::trace::{
    HttpMakeClassifier,
    MakeSpan,
    OnBodyChunk,
    OnEos,
    OnFailure,
    OnRequest,
    OnResponse,
    TraceLayer,
};

/// Returns a [`tower::Layer`] for emitting [`tracing`] events as requests are processed.
pub fn layer<RequestBody, ResponseBody>() -> TraceLayer<
    HttpMakeClassifier,
    impl MakeSpan<RequestBody> + Clone,
    impl OnRequest<RequestBody> + Clone,
    impl OnResponse<ResponseBody> + Clone,
    impl OnBodyChunk<ResponseBody::Data> + Clone,
    impl OnEos + Clone,
    impl OnFailure<ServerErrorsFailureClass> + Clone,
>
where
    RequestBody: HttpBody,
    ResponseBody: HttpBody<Error: fmt::Display + 'static>,
{
    TraceLayer::new_for_http()
        .make_span_with(make_span::<RequestBody>)
        .on_request(on_request::<RequestBody>)
        .on_response(on_response::<ResponseBody>)
        .on_body_chunk(on_body_chunk::<ResponseBody>)
        .on_eos(on_eos)
        .on_failure(on_failure)
}

/// Called at the start of each request cycle. This function generates the [`tracing::Span`] that
/// is passed to the other functions later on.
fn make_span<B>(request: &http::Request<B>) -> tracing::Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(RequestId::header_value);

    info_span! {
        target: "gbans_api::http",
        "request",
        client_addr = ?client_addr(request),
        request.id = ?request_id,
        request.method = tracing::field::Empty,
        request.uri = tracing::field::Empty,
        request.version = tracing::field::Empty,
        response.status = tracing::field::Empty,
    }
}

/// The peer's address, with IPv4-mapped IPv6 addresses turned back into IPv4.
fn client_addr<B>(request: &http::Request<B>) -> Option<IpAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_canonical())
}

fn on_request<B>(request: &http::Request<B>, span: &tracing::Span) {
    span.record("request.method", tracing::field::debug(request.method()));
    span.record("request.uri", tracing::field::debug(request.uri()));
    span.record("request.version", tracing::field::debug(request.version()));

    // Headers carry bearer tokens, so they are only logged at trace level with those removed.
    trace!(target: "gbans_api::http::request", headers = ?redacted_headers(request.headers()));
    info!(target: "gbans_api::http::request", "starting to process request");
}

fn on_response<B>(response: &http::Response<B>, latency: Duration, span: &tracing::Span) {
    span.record("response.status", response.status().as_u16());

    info!(target: "gbans_api::http::response", ?latency, "finished processing request");
}

fn on_body_chunk<B: HttpBody>(chunk: &B::Data, latency: Duration, _span: &tracing::Span) {
    use bytes::Buf;

    trace!(target: "gbans_api::http::response::body::chunk", size = chunk.remaining(), ?latency);
}

fn on_eos(trailers: Option<&http::HeaderMap>, stream_duration: Duration, _span: &tracing::Span) {
    debug!(target: "gbans_api::http::response", ?trailers, ?stream_duration);
}

fn on_failure(failure_class: ServerErrorsFailureClass, latency: Duration, span: &tracing::Span) {
    match failure_class {
        ServerErrorsFailureClass::StatusCode(status) => {
            span.record("response.status", status.as_u16());
            error!(target: "gbans_api::http", status = status.as_u16(), ?latency, "failed to handle request");
        },
        ServerErrorsFailureClass::Error(error) => {
            error!(target: "gbans_api::http", %error, "failed to handle request");
        },
    }
}

fn redacted_headers(headers: &http::HeaderMap) -> http::HeaderMap {
    let mut headers = headers.clone();

    if let Some(authorization) = headers.get_mut(http::header::AUTHORIZATION) {
        *authorization = http::HeaderValue::from_static("<redacted>");
    }

    headers
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn client_addr_is_canonical() {
        let mut request = http::Request::new(());

        assert_eq!(client_addr(&request), None);

        request
            .extensions_mut()
            .insert(ConnectInfo("[::ffff:10.0.0.2]:27015".parse::<SocketAddr>().unwrap()));

        assert_eq!(client_addr(&request), Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2))));
    }
}
