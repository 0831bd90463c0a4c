/* Copyright (C) 2024  AlphaKeks <alphakeks@dawn.sh>
 *
 * This library is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This library is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this repository.  If not, see <https://www.gnu.org/licenses/>.
 */

//! The HTTP API in front of [`gbans`].
//!
//! Game server plugins talk to the routes under `/api/sm`, moderation tooling to the ones under
//! `/api/smadmin`. [`run()`] wires both up behind the usual middleware and serves them until the
//! process receives a shutdown signal.

#[macro_use]
extern crate derive_more;

#[macro_use(trace, debug, info, info_span, warn, error)]
extern crate tracing;

#[macro_use(select)]
extern crate tokio;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, ServiceExt};
use futures_util::FutureExt as _;
use futures_util::future;
use gbans::Context;
use tokio::sync::oneshot;
use tokio::task;
use tokio_util::time::FutureExt as _;
use tower::ServiceBuilder;
use tower_http::ServiceBuilderExt;

pub mod config;
pub use config::Config;

pub mod runtime;
pub mod openapi;

pub mod sm;
pub mod smadmin;

mod extract;
mod middleware;
mod problem_details;
mod response;

#[cfg(test)]
mod testing;

use config::{AccessKeys, ServerConfig};

#[derive(Debug, Display, Error, From)]
pub enum Error {
    #[display("failed to initialize runtime: {_0}")]
    #[from(ignore)]
    InitializeRuntime(io::Error),

    #[display("{_0}")]
    InitializeContext(gbans::context::InitializeContextError),

    #[display("failed to run server: {_0}")]
    #[from(ignore)]
    RunServer(io::Error),
}

/// Builds the router serving every endpoint.
///
/// This does not include the outer middleware (tracing, request IDs, CORS, ...) [`run()`] adds.
pub fn router(cx: Context, server_config: Arc<ServerConfig>, access_keys: &AccessKeys) -> Router {
    Router::new()
        .nest("/docs", openapi::router(server_config))
        .nest("/api/sm", sm::router(cx.clone(), access_keys))
        .nest("/api/smadmin", smadmin::router(access_keys))
        .with_state(cx)
}

/// Run the API.
///
/// This function will initialize its own [`tokio`] runtime and **block** until the server shuts
/// down.
pub fn run(config: Config) -> Result<(), Error> {
    runtime::build(&config.runtime)
        .map_err(Error::InitializeRuntime)?
        .block_on(async {
            let cx = Context::new(config.gbans).await?;
            let server_config = Arc::new(config.server);

            if config.access_keys.admin.is_none() {
                warn!("no admin access key configured; moderation endpoints will reject everything");
            }

            if config.access_keys.servers.is_empty() {
                warn!("no server access keys configured; plugin endpoints will reject everything");
            }

            let router = router(cx.clone(), Arc::clone(&server_config), &config.access_keys);

            let api_service = ServiceBuilder::new()
                .map_response_body(axum::body::Body::new)
                .set_x_request_id(middleware::request_id::make_request_id())
                .propagate_x_request_id()
                .layer(middleware::trace::layer())
                .layer(middleware::cors::layer(&server_config.cors_origins))
                .layer(middleware::catch_panic::layer())
                .service(router.into_service())
                .into_make_service_with_connect_info::<SocketAddr>();

            let socket = tokio::net::TcpListener::bind(server_config.socket_addr())
                .await
                .map_err(Error::RunServer)?;

            let addr = socket.local_addr().map_err(Error::RunServer)?;

            info!("Listening on {addr}");

            let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
            let mut server = task::spawn(async move {
                axum::serve(socket, api_service)
                    .with_graceful_shutdown(shutdown_rx.map(drop))
                    .await
            });

            let early_exit = select! {
                biased;

                result = &mut server => Some(result),
                () = runtime::signal::shutdown() => None,
            };

            let serve_result = match early_exit {
                Some(result) => {
                    cx.cleanup().await;
                    result
                },
                None => {
                    let _ = shutdown_tx.send(());

                    match future::join(server, cx.cleanup())
                        .timeout(Duration::from_secs(15))
                        .await
                    {
                        Ok((result, ())) => result,
                        Err(_) => {
                            warn!("server did not shut down within timeout");
                            return Ok(());
                        },
                    }
                },
            };

            match serve_result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(error)) => {
                    error!(%error, "failed to run server");
                    Err(Error::RunServer(error))
                },
                Err(error) => {
                    error!(%error, "server task failed");
                    Err(Error::RunServer(io::Error::other(error)))
                },
            }
        })
}
