use std::sync::Arc;

use http::{header, HeaderValue, Uri, request};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

const LOCAL_HOSTS: &[&str] = &["0.0.0.0", "127.0.0.1", "::", "::1", "localhost"];

/// Returns a [`tower::Layer`] answering CORS preflight requests.
///
/// Browsers may call the API from any of `allowed_origins`. Outside of production builds,
/// localhost origins are always allowed. Credentials are never allowed; clients authenticate
/// with bearer tokens.
pub fn layer(allowed_origins: &[String]) -> CorsLayer {
    let allowed_origins = Arc::<[String]>::from(allowed_origins);

    CorsLayer::new()
        .allow_headers(AllowHeaders::list([header::AUTHORIZATION, header::CONTENT_TYPE]))
        .allow_methods(AllowMethods::any())
        .allow_origin(AllowOrigin::predicate(move |origin, request| {
            allow_origin(&allowed_origins, origin, request)
        }))
}

fn allow_origin(allowed_origins: &[String], origin: &HeaderValue, _: &request::Parts) -> bool {
    let Ok(origin) = origin.to_str() else {
        return false;
    };

    if allowed_origins.iter().any(|allowed| allowed == origin) {
        return true;
    }

    if cfg!(feature = "production") {
        return false;
    }

    origin
        .parse::<Uri>()
        .is_ok_and(|uri| uri.host().is_some_and(|host| LOCAL_HOSTS.contains(&host)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts() -> request::Parts {
        http::Request::new(()).into_parts().0
    }

    #[test]
    fn allows_configured_origins() {
        let allowed = [String::from("https://gbans.example.com")];

        assert!(allow_origin(
            &allowed,
            &HeaderValue::from_static("https://gbans.example.com"),
            &parts(),
        ));

        assert!(!allow_origin(
            &allowed,
            &HeaderValue::from_static("https://evil.example.com"),
            &parts(),
        ));
    }
}
