//! Integration tests for signed download redirects: anonymous previews,
//! purchase-verified customer downloads, and admin downloads.

mod common;

use std::sync::atomic::Ordering;

use axum::http::{header, StatusCode};
use beatstore_core::roles::ROLE_CUSTOMER;
use common::{
    admin_token, beat_input, body_json, create_user, get, get_auth, header_str, seed_beat,
    seed_order, token_for,
};
use sqlx::PgPool;

const BUYER: &str = "buyer@beatstore.test";

fn download_uri(beat_id: i64, query: &str) -> String {
    format!("/api/v1/downloads/{beat_id}?{query}")
}

// ---------------------------------------------------------------------------
// Previews
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn preview_redirects_to_short_lived_cdn_link(pool: PgPool) {
    let beat = seed_beat(&pool, beat_input("Night Drive")).await;
    let app = common::build_test_app(pool);

    let response = get(app.router(), &download_uri(beat.id, "asset=preview")).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        header_str(&response, header::LOCATION),
        "https://cdn.test/video/beats/previews/night-drive?expires=30&attachment=false"
    );
    assert_eq!(header_str(&response, header::CACHE_CONTROL), "private, max-age=30");
    assert_eq!(header_str(&response, header::CONTENT_TYPE), "audio/mpeg");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn preview_of_hidden_beat_is_not_found(pool: PgPool) {
    let mut input = beat_input("Unreleased");
    input.is_active = Some(false);
    let beat = seed_beat(&pool, input).await;
    let app = common::build_test_app(pool);

    let response = get(app.router(), &download_uri(beat.id, "asset=preview")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_asset_type_is_rejected(pool: PgPool) {
    let beat = seed_beat(&pool, beat_input("Night Drive")).await;
    let app = common::build_test_app(pool);

    let response = get(app.router(), &download_uri(beat.id, "asset=artwork")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Customer downloads
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn paid_asset_requires_order_and_email(pool: PgPool) {
    let beat = seed_beat(&pool, beat_input("Night Drive")).await;
    let app = common::build_test_app(pool);

    for query in ["asset=master", "asset=master&order_id=1", "asset=master&order_id=1&email=%20"] {
        let response = get(app.router(), &download_uri(beat.id, query)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "query: {query}");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn master_is_presigned_on_object_storage(pool: PgPool) {
    let beat = seed_beat(&pool, beat_input("Night Drive")).await;
    let order = seed_order(&pool, BUYER, beat.id, "basic", "paid").await;
    let app = common::build_test_app(pool);

    let query = format!("asset=master&order_id={}&email={BUYER}", order.order.id);
    let response = get(app.router(), &download_uri(beat.id, &query)).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        header_str(&response, header::LOCATION),
        "https://storage.test/masters/night-drive.wav?expires=1800"
    );
    assert_eq!(header_str(&response, header::CONTENT_TYPE), "audio/wav");
    assert_eq!(
        header_str(&response, header::CONTENT_DISPOSITION),
        "attachment; filename=\"Night Drive.wav\"; filename*=UTF-8''Night%20Drive.wav"
    );
    assert_eq!(header_str(&response, header::CACHE_CONTROL), "private, max-age=1800");
}

/// Email matching ignores case.
#[sqlx::test(migrations = "../../db/migrations")]
async fn purchase_email_is_case_insensitive(pool: PgPool) {
    let beat = seed_beat(&pool, beat_input("Night Drive")).await;
    let order = seed_order(&pool, BUYER, beat.id, "basic", "completed").await;
    let app = common::build_test_app(pool);

    let query = format!("asset=master&order_id={}&email=Buyer@BeatStore.test", order.order.id);
    let response = get(app.router(), &download_uri(beat.id, &query)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn basic_license_cannot_download_stems(pool: PgPool) {
    let beat = seed_beat(&pool, beat_input("Night Drive")).await;
    let order = seed_order(&pool, BUYER, beat.id, "basic", "paid").await;
    let app = common::build_test_app(pool);

    let query = format!("asset=stems&order_id={}&email={BUYER}", order.order.id);
    let response = get(app.router(), &download_uri(beat.id, &query)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn trackout_license_downloads_stems(pool: PgPool) {
    let beat = seed_beat(&pool, beat_input("Night Drive")).await;
    let order = seed_order(&pool, BUYER, beat.id, "trackout", "paid").await;
    let app = common::build_test_app(pool);

    let query = format!("asset=stems&order_id={}&email={BUYER}", order.order.id);
    let response = get(app.router(), &download_uri(beat.id, &query)).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        header_str(&response, header::LOCATION),
        "https://storage.test/stems/night-drive.zip?expires=1800"
    );
    assert_eq!(header_str(&response, header::CONTENT_TYPE), "application/zip");
    assert!(header_str(&response, header::CONTENT_DISPOSITION)
        .starts_with("attachment; filename=\"Night Drive (Stems).zip\""));
}

/// When object storage cannot presign, the legacy CDN copy is served with
/// an ASCII fallback filename.
#[sqlx::test(migrations = "../../db/migrations")]
async fn master_falls_back_to_cdn_copy(pool: PgPool) {
    let beat = seed_beat(&pool, beat_input("Été électrique")).await;
    let order = seed_order(&pool, BUYER, beat.id, "unlimited", "paid").await;
    let app = common::build_test_app(pool);
    app.storage.fail_presign.store(true, Ordering::SeqCst);

    let query = format!("asset=master&order_id={}&email={BUYER}", order.order.id);
    let response = get(app.router(), &download_uri(beat.id, &query)).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        header_str(&response, header::LOCATION),
        "https://cdn.test/video/beats/masters/ete-electrique?expires=1800&attachment=true"
    );
    let disposition = header_str(&response, header::CONTENT_DISPOSITION);
    assert!(disposition.contains("filename=\"Ete electrique.wav\""), "{disposition}");
    assert!(disposition.contains("filename*=UTF-8''%C3%89t%C3%A9%20%C3%A9lectrique.wav"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stems_have_no_cdn_fallback(pool: PgPool) {
    let beat = seed_beat(&pool, beat_input("Night Drive")).await;
    let order = seed_order(&pool, BUYER, beat.id, "unlimited", "paid").await;
    let app = common::build_test_app(pool);
    app.storage.fail_presign.store(true, Ordering::SeqCst);

    let query = format!("asset=stems&order_id={}&email={BUYER}", order.order.id);
    let response = get(app.router(), &download_uri(beat.id, &query)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INTERNAL_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unpaid_order_is_forbidden(pool: PgPool) {
    let beat = seed_beat(&pool, beat_input("Night Drive")).await;
    let order = seed_order(&pool, BUYER, beat.id, "basic", "pending").await;
    let app = common::build_test_app(pool);

    let query = format!("asset=master&order_id={}&email={BUYER}", order.order.id);
    let response = get(app.router(), &download_uri(beat.id, &query)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn email_mismatch_is_not_found(pool: PgPool) {
    let beat = seed_beat(&pool, beat_input("Night Drive")).await;
    let order = seed_order(&pool, BUYER, beat.id, "basic", "paid").await;
    let app = common::build_test_app(pool);

    let query = format!("asset=master&order_id={}&email=someone@else.test", order.order.id);
    let response = get(app.router(), &download_uri(beat.id, &query)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn order_for_a_different_beat_is_not_found(pool: PgPool) {
    let bought = seed_beat(&pool, beat_input("Night Drive")).await;
    let other = seed_beat(&pool, beat_input("Day Trip")).await;
    let order = seed_order(&pool, BUYER, bought.id, "unlimited", "paid").await;
    let app = common::build_test_app(pool);

    let query = format!("asset=master&order_id={}&email={BUYER}", order.order.id);
    let response = get(app.router(), &download_uri(other.id, &query)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Buyers keep access after a beat is taken off the storefront.
#[sqlx::test(migrations = "../../db/migrations")]
async fn purchase_survives_beat_being_hidden(pool: PgPool) {
    let beat = seed_beat(&pool, beat_input("Night Drive")).await;
    let order = seed_order(&pool, BUYER, beat.id, "basic", "paid").await;
    sqlx::query("UPDATE beats SET is_active = false WHERE id = $1")
        .bind(beat.id)
        .execute(&pool)
        .await
        .unwrap();
    let app = common::build_test_app(pool);

    let query = format!("asset=master&order_id={}&email={BUYER}", order.order.id);
    let response = get(app.router(), &download_uri(beat.id, &query)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
}

// ---------------------------------------------------------------------------
// Admin downloads
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_downloads_inactive_beat_without_purchase(pool: PgPool) {
    let mut input = beat_input("Draft Beat");
    input.is_active = Some(false);
    let beat = seed_beat(&pool, input).await;
    let token = admin_token(&pool).await;
    let app = common::build_test_app(pool);

    let response = get_auth(app.router(), &download_uri(beat.id, "asset=stems&admin=true"), &token).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        header_str(&response, header::LOCATION),
        "https://storage.test/stems/draft-beat.zip?expires=1800"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_mode_without_token_is_unauthorized(pool: PgPool) {
    let beat = seed_beat(&pool, beat_input("Night Drive")).await;
    let app = common::build_test_app(pool);

    let response = get(app.router(), &download_uri(beat.id, "asset=master&admin=true")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_mode_with_customer_token_is_forbidden(pool: PgPool) {
    let beat = seed_beat(&pool, beat_input("Night Drive")).await;
    let customer = create_user(&pool, "fan@beatstore.test", ROLE_CUSTOMER).await;
    let app = common::build_test_app(pool);

    let response = get_auth(
        app.router(),
        &download_uri(beat.id, "asset=master&admin=true"),
        &token_for(&customer),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_download_of_missing_beat_is_not_found(pool: PgPool) {
    let token = admin_token(&pool).await;
    let app = common::build_test_app(pool);

    let response = get_auth(app.router(), &download_uri(999_999, "asset=master&admin=true"), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
