//! Moderation endpoints for managing the admin catalogs.
//!
//! Every route in here requires the admin access key.

use axum::extract::FromRef;
use axum::routing::Router;
use gbans::Context;

use crate::config::AccessKeys;
use crate::middleware::auth::{admin_key, AdminKeyState};

pub mod groups;
pub mod admins;
pub mod overrides;
pub mod immunities;
pub mod search;

pub fn router<S>(access_keys: &AccessKeys) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    Context: FromRef<S>,
{
    let is_admin = axum::middleware::from_fn_with_state(
        AdminKeyState::new(access_keys.admin.as_deref()),
        admin_key,
    );

    Router::new()
        .merge(search::router())
        .merge(groups::router())
        .merge(admins::router())
        .merge(overrides::router())
        .merge(immunities::router())
        .route_layer(is_admin)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::testing::{self, ADMIN_KEY, SERVER_KEY};

    fn problem_type(problem: &Value) -> &str {
        problem["type"].as_str().unwrap_or_default()
    }

    async fn create_group(app: &axum::Router, name: &str) -> u64 {
        let response = app
            .clone()
            .oneshot(testing::post(
                "/api/smadmin/groups",
                ADMIN_KEY,
                json!({ "name": name, "flags": "bc", "immunity": 50 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), http::StatusCode::CREATED);

        testing::json::<Value>(response).await["group_id"]
            .as_u64()
            .unwrap()
    }

    #[tokio::test]
    async fn requires_the_admin_key() {
        let (app, ..) = testing::app();

        for key in ["wrong", SERVER_KEY] {
            let response = app
                .clone()
                .oneshot(testing::get("/api/smadmin/groups", key))
                .await
                .unwrap();

            assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);
        }

        let response = app
            .oneshot(testing::get("/api/smadmin/groups", ADMIN_KEY))
            .await
            .unwrap();

        assert_eq!(response.status(), http::StatusCode::OK);
    }

    #[tokio::test]
    async fn group_lifecycle() {
        let (app, ..) = testing::app();
        let group_id = create_group(&app, "mods").await;

        let duplicate = app
            .clone()
            .oneshot(testing::post("/api/smadmin/groups", ADMIN_KEY, json!({ "name": "mods" })))
            .await
            .unwrap();

        assert_eq!(duplicate.status(), http::StatusCode::CONFLICT);
        assert!(problem_type(&testing::json(duplicate).await).ends_with("#group-name-taken"));

        let invalid = app
            .clone()
            .oneshot(testing::post(
                "/api/smadmin/groups",
                ADMIN_KEY,
                json!({ "name": "vips", "flags": "a!" }),
            ))
            .await
            .unwrap();

        assert_eq!(invalid.status(), http::StatusCode::BAD_REQUEST);
        assert!(problem_type(&testing::json(invalid).await).ends_with("#invalid-flags"));

        let uri = format!("/api/smadmin/groups/{group_id}");

        let deleted = app
            .clone()
            .oneshot(testing::delete(&uri, ADMIN_KEY))
            .await
            .unwrap();

        assert_eq!(deleted.status(), http::StatusCode::NO_CONTENT);

        let gone = app.oneshot(testing::delete(&uri, ADMIN_KEY)).await.unwrap();

        assert_eq!(gone.status(), http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn membership_conflicts() {
        let (app, ..) = testing::app();
        let group_id = create_group(&app, "mods").await;

        let admin = app
            .clone()
            .oneshot(testing::post(
                "/api/smadmin/admins",
                ADMIN_KEY,
                json!({
                    "auth_type": "name",
                    "identity": "alpha",
                    "password": "hunter2",
                    "name": "alpha",
                }),
            ))
            .await
            .unwrap();

        assert_eq!(admin.status(), http::StatusCode::OK);

        let admin_id = testing::json::<Value>(admin).await["admin_id"]
            .as_u64()
            .unwrap();

        let uri = format!("/api/smadmin/admins/{admin_id}/groups");

        let added = app
            .clone()
            .oneshot(testing::post(&uri, ADMIN_KEY, json!({ "group_id": group_id })))
            .await
            .unwrap();

        assert_eq!(added.status(), http::StatusCode::OK);
        assert_eq!(testing::json::<Value>(added).await["groups"][0]["name"], "mods");

        let again = app
            .clone()
            .oneshot(testing::post(&uri, ADMIN_KEY, json!({ "group_id": group_id })))
            .await
            .unwrap();

        assert_eq!(again.status(), http::StatusCode::CONFLICT);
        assert!(problem_type(&testing::json(again).await).ends_with("#already-in-group"));

        let remove_uri = format!("/api/smadmin/admins/{admin_id}/groups/{group_id}");

        let removed = app
            .clone()
            .oneshot(testing::delete(&remove_uri, ADMIN_KEY))
            .await
            .unwrap();

        assert_eq!(removed.status(), http::StatusCode::OK);

        let not_member = app
            .oneshot(testing::delete(&remove_uri, ADMIN_KEY))
            .await
            .unwrap();

        assert_eq!(not_member.status(), http::StatusCode::CONFLICT);
        assert!(problem_type(&testing::json(not_member).await).ends_with("#not-in-group"));
    }

    #[tokio::test]
    async fn groups_cannot_be_immune_to_themselves() {
        let (app, ..) = testing::app();
        let group_id = create_group(&app, "mods").await;

        let response = app
            .oneshot(testing::post(
                "/api/smadmin/group_immunity",
                ADMIN_KEY,
                json!({ "group_id": group_id, "other_id": group_id }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), http::StatusCode::BAD_REQUEST);
        assert!(problem_type(&testing::json(response).await).ends_with("#self-immunity"));
    }

    #[tokio::test]
    async fn searches_groups() {
        let (app, ..) = testing::app();

        create_group(&app, "Moderators").await;
        create_group(&app, "vips").await;

        let response = app
            .oneshot(testing::get("/api/smadmin/groups/search?q=mod", ADMIN_KEY))
            .await
            .unwrap();

        assert_eq!(response.status(), http::StatusCode::OK);

        let groups = testing::json::<Vec<Value>>(response).await;

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0]["name"], "Moderators");
    }
}
