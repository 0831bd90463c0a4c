//! The OpenAPI schema and the SwaggerUI serving it.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, LazyLock, OnceLock};

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{routing, Router};
use utoipa::openapi::{OpenApi, ServerBuilder};

use crate::config::ServerConfig;
use crate::extract::{Json, Path};

static SCHEMA: OnceLock<OpenApi> = OnceLock::new();
static SWAGGER_UI_CONFIG: LazyLock<Arc<utoipa_swagger_ui::Config<'static>>> =
    LazyLock::new(|| {
        let config = utoipa_swagger_ui::Config::from("/docs/openapi.json")
            .display_operation_id(true)
            .use_base_layout()
            .display_request_duration(true)
            .filter(true)
            .persist_authorization(true);

        Arc::new(config)
    });

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "gbans",
        description = "Admin catalogs and ban checks for SourceMod game servers.",
        license(name = "GPL-3.0", url = "https://www.gnu.org/licenses/gpl-3.0.en.html"),
    ),
    modifiers(&BearerAuth),
    security(("access_key" = [])),
    tags(
        (name = "SourceMod Plugin", description = "polled by game servers; requires a server access key"),
        (name = "SourceMod Admins", description = "requires the admin access key"),
        (name = "SourceMod Groups", description = "requires the admin access key"),
        (name = "SourceMod Overrides", description = "requires the admin access key"),
    ),
    paths(
        crate::sm::check_player,
        crate::sm::get_groups,
        crate::sm::get_overrides,
        crate::sm::get_users,
        crate::sm::request_seed,

        crate::smadmin::groups::get_groups,
        crate::smadmin::groups::create_group,
        crate::smadmin::groups::update_group,
        crate::smadmin::groups::delete_group,
        crate::smadmin::groups::get_group_overrides,
        crate::smadmin::groups::create_group_override,
        crate::smadmin::groups::update_group_override,
        crate::smadmin::groups::delete_group_override,

        crate::smadmin::admins::get_admins,
        crate::smadmin::admins::create_admin,
        crate::smadmin::admins::update_admin,
        crate::smadmin::admins::delete_admin,
        crate::smadmin::admins::add_admin_group,
        crate::smadmin::admins::remove_admin_group,
        crate::smadmin::admins::set_admin_groups,
        crate::smadmin::admins::get_admin_permissions,

        crate::smadmin::overrides::get_overrides,
        crate::smadmin::overrides::create_override,
        crate::smadmin::overrides::update_override,
        crate::smadmin::overrides::delete_override,

        crate::smadmin::immunities::get_group_immunities,
        crate::smadmin::immunities::create_group_immunity,
        crate::smadmin::immunities::delete_group_immunity,

        crate::smadmin::search::search_admins,
        crate::smadmin::search::search_groups,
    ),
)]
pub struct Schema;

struct BearerAuth;

impl utoipa::Modify for BearerAuth {
    fn modify(&self, openapi: &mut OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        openapi
            .components
            .get_or_insert_with(Default::default)
            .add_security_scheme(
                "access_key",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
    }
}

pub fn schema() -> OpenApi {
    <Schema as utoipa::OpenApi>::openapi()
}

pub(crate) fn router<S>(server_config: Arc<ServerConfig>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let router = Router::new()
        .route("/openapi.json", routing::get(serve_openapi_json).with_state(server_config));

    if cfg!(feature = "production") {
        return router;
    }

    router
        .route("/swagger-ui", routing::get(|| async { Redirect::permanent("/docs/swagger-ui/") }))
        .route("/swagger-ui/", routing::get(serve_swagger_ui))
        .route("/swagger-ui/{*rest}", routing::get(serve_swagger_ui))
}

async fn serve_openapi_json(State(config): State<Arc<ServerConfig>>) -> Response {
    let schema = SCHEMA.get_or_init(|| {
        let mut schema = self::schema();

        let server = match config.public_url {
            Some(ref public_url) => ServerBuilder::new().url(public_url.as_str()).build(),
            None => {
                let mut local_addr = config.socket_addr();

                local_addr.set_ip(match local_addr.ip() {
                    IpAddr::V4(ipv4) if ipv4.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
                    IpAddr::V6(ipv6) if ipv6.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
                    ip => ip,
                });

                ServerBuilder::new()
                    .url(format!("http://{local_addr}"))
                    .description(Some("local dev server"))
                    .build()
            },
        };

        schema.servers.get_or_insert_with(Vec::new).push(server);
        schema
    });

    Json(schema).into_response()
}

#[tracing::instrument(ret(level = "debug"))]
async fn serve_swagger_ui(path: Option<Path<String>>) -> Response {
    let tail = match path {
        None => "",
        Some(Path(ref path)) => path.as_str(),
    };

    match utoipa_swagger_ui::serve(tail, Arc::clone(&*SWAGGER_UI_CONFIG)) {
        Ok(None) => http::StatusCode::NOT_FOUND.into_response(),
        Ok(Some(file)) => {
            ([(http::header::CONTENT_TYPE, file.content_type)], file.bytes.into_owned())
                .into_response()
        },
        Err(error) => {
            error!(%error, "failed to serve SwaggerUI file");
            http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_lists_plugin_and_moderation_routes() {
        let schema = schema();

        assert!(schema.paths.paths.contains_key("/api/sm/check"));
        assert!(schema.paths.paths.contains_key("/api/smadmin/groups/{group_id}"));
        assert!(schema.paths.paths.contains_key("/api/smadmin/admins/search"));
    }
}
