//! Helpers for driving the router in tests.

use std::sync::Arc;

use axum::body::Body;
use axum::response::Response;
use axum::Router;
use gbans::servers::{Server, ServerId};
use gbans::testing::Fakes;
use gbans::Context;
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;

use crate::config::{AccessKeys, ServerAccessKey, ServerConfig};

pub(crate) const ADMIN_KEY: &str = "admin-key";
pub(crate) const SERVER_KEY: &str = "server-key";

/// A router with one configured server (`us-1`, ID 1) and in-memory collaborators.
pub(crate) fn app() -> (Router, Context, Fakes) {
    let mut config = gbans::Config::default();

    config.servers.push(Server {
        id: ServerId::new(1),
        short_name: String::from("us-1"),
        address: String::from("10.0.0.1:27015"),
        seed_role_ids: vec![String::from("123")],
    });

    let (cx, fakes) = gbans::testing::context_with_config(config);

    let access_keys = AccessKeys {
        admin: Some(String::from(ADMIN_KEY)),
        servers: vec![ServerAccessKey { server_id: ServerId::new(1), key: String::from(SERVER_KEY) }],
    };

    let router = crate::router(cx.clone(), Arc::new(ServerConfig::default()), &access_keys);

    (router, cx, fakes)
}

pub(crate) fn get(uri: &str, key: &str) -> http::Request<Body> {
    http::Request::get(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {key}"))
        .body(Body::empty())
        .unwrap()
}

pub(crate) fn delete(uri: &str, key: &str) -> http::Request<Body> {
    http::Request::delete(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {key}"))
        .body(Body::empty())
        .unwrap()
}

pub(crate) fn send_json(
    method: http::Method,
    uri: &str,
    key: &str,
    body: serde_json::Value,
) -> http::Request<Body> {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {key}"))
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub(crate) fn post(uri: &str, key: &str, body: serde_json::Value) -> http::Request<Body> {
    send_json(http::Method::POST, uri, key, body)
}

pub(crate) async fn json<T: DeserializeOwned>(response: Response) -> T {
    let bytes = response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes();

    serde_json::from_slice(&bytes).unwrap()
}
