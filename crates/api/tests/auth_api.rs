//! HTTP-level integration tests for login, the current-account endpoint,
//! and role enforcement on admin routes.

mod common;

use axum::http::StatusCode;
use beatstore_core::roles::{ROLE_ADMIN, ROLE_CUSTOMER};
use beatstore_core::cache_keys;
use common::{
    body_json, create_user, get, get_auth, post_json, put_json_auth, token_for, TEST_PASSWORD,
};
use sqlx::PgPool;

fn login_body(email: &str, password: &str) -> serde_json::Value {
    serde_json::json!({ "email": email, "password": password })
}

/// Successful login returns a bearer token and the account summary.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_success(pool: PgPool) {
    let user = create_user(&pool, "producer@beatstore.test", ROLE_ADMIN).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app.router(),
        "/api/v1/auth/login",
        login_body("producer@beatstore.test", TEST_PASSWORD),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["access_token"].is_string());
    assert_eq!(json["token_type"], "Bearer");
    assert_eq!(json["expires_in"], 3600);
    assert_eq!(json["user"]["id"], user.id);
    assert_eq!(json["user"]["email"], "producer@beatstore.test");
    assert_eq!(json["user"]["role"], "admin");
    assert!(json["user"]["password_hash"].is_null());
}

/// Email lookup ignores case.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_email_is_case_insensitive(pool: PgPool) {
    create_user(&pool, "producer@beatstore.test", ROLE_ADMIN).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app.router(),
        "/api/v1/auth/login",
        login_body("Producer@BeatStore.test", TEST_PASSWORD),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_wrong_password(pool: PgPool) {
    create_user(&pool, "producer@beatstore.test", ROLE_ADMIN).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app.router(),
        "/api/v1/auth/login",
        login_body("producer@beatstore.test", "not-the-password"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert_eq!(json["error"], "Invalid email or password");
}

/// An unknown email gets the same answer as a wrong password.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_unknown_email(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.router(),
        "/api/v1/auth/login",
        login_body("ghost@beatstore.test", TEST_PASSWORD),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid email or password");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_deactivated_account(pool: PgPool) {
    let user = create_user(&pool, "former@beatstore.test", ROLE_ADMIN).await;
    sqlx::query("UPDATE users SET is_active = false WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();
    let app = common::build_test_app(pool);

    let response = post_json(
        app.router(),
        "/api/v1/auth/login",
        login_body("former@beatstore.test", TEST_PASSWORD),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_rejects_malformed_email(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.router(),
        "/api/v1/auth/login",
        login_body("not-an-email", TEST_PASSWORD),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_me_returns_current_account(pool: PgPool) {
    let user = create_user(&pool, "fan@beatstore.test", ROLE_CUSTOMER).await;
    let token = token_for(&user);
    let app = common::build_test_app(pool);

    let response = get_auth(app.router(), "/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], user.id);
    assert_eq!(json["data"]["role"], "customer");
}

/// Changing the password drops the cached profile and swaps the login
/// credential.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_change_password(pool: PgPool) {
    let user = create_user(&pool, "fan@beatstore.test", ROLE_CUSTOMER).await;
    let token = token_for(&user);
    let app = common::build_test_app(pool);
    let profile_key = cache_keys::user_profile(user.id);

    let response = get_auth(app.router(), "/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cached: Option<serde_json::Value> = app.state.cache.get_json(&profile_key).await.unwrap();
    assert!(cached.is_some());

    let change = |current: &str, new: &str| {
        serde_json::json!({ "current_password": current, "new_password": new })
    };

    let response = put_json_auth(
        app.router(),
        "/api/v1/auth/password",
        change("not-the-password", "a-brand-new-passphrase"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = put_json_auth(
        app.router(),
        "/api/v1/auth/password",
        change(TEST_PASSWORD, "short"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = put_json_auth(
        app.router(),
        "/api/v1/auth/password",
        change(TEST_PASSWORD, "a-brand-new-passphrase"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cached: Option<serde_json::Value> = app.state.cache.get_json(&profile_key).await.unwrap();
    assert!(cached.is_none());

    let response = post_json(
        app.router(),
        "/api/v1/auth/login",
        login_body("fan@beatstore.test", TEST_PASSWORD),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_json(
        app.router(),
        "/api/v1/auth/login",
        login_body("fan@beatstore.test", "a-brand-new-passphrase"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_me_without_token_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app.router(), "/api/v1/auth/me").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_garbage_token_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get_auth(app.router(), "/api/v1/admin/beats", "not.a.jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// A customer token cannot reach admin routes.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_customer_token_on_admin_route_is_forbidden(pool: PgPool) {
    let token = common::customer_token(&pool).await;
    let app = common::build_test_app(pool);

    let response = get_auth(app.router(), "/api/v1/admin/beats", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Admin role required");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_token_reaches_admin_route(pool: PgPool) {
    let token = common::admin_token(&pool).await;
    let app = common::build_test_app(pool);

    let response = get_auth(app.router(), "/api/v1/admin/beats", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
}
