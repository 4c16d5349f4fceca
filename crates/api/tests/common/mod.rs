#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use beatstore_api::auth::jwt::{generate_access_token, JwtConfig};
use beatstore_api::auth::password::hash_password;
use beatstore_api::config::ServerConfig;
use beatstore_api::router::build_app_router;
use beatstore_api::state::AppState;
use beatstore_cache::Cache;
use beatstore_cloud::{CloudError, MediaCdn, MediaUpload, ObjectStorage, UploadedMedia};
use beatstore_core::delivery::{MediaRef, extension_of};
use beatstore_core::roles::{ROLE_ADMIN, ROLE_CUSTOMER};
use beatstore_core::types::DbId;
use beatstore_db::models::beat::{Beat, CreateBeat};
use beatstore_db::models::order::{CreateOrder, CreateOrderItem, OrderWithItems};
use beatstore_db::models::user::{CreateUser, User};
use beatstore_db::repositories::{BeatRepo, OrderRepo, UserRepo};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

pub const TEST_CRON_SECRET: &str = "test-cron-secret";
pub const TEST_PASSWORD: &str = "correct-horse-battery";

// ---------------------------------------------------------------------------
// Fake remote backends
// ---------------------------------------------------------------------------

/// Object storage that records calls and can be told to fail.
#[derive(Default)]
pub struct FakeStorage {
    pub fail_presign: AtomicBool,
    pub fail_put: AtomicBool,
    pub puts: Mutex<Vec<String>>,
    pub deletes: Mutex<Vec<String>>,
}

impl FakeStorage {
    pub fn puts(&self) -> Vec<String> {
        self.puts.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn put(&self, key: &str, _data: Vec<u8>, _content_type: &str) -> Result<(), CloudError> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(CloudError::Storage("bucket unavailable".into()));
        }
        self.puts.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CloudError> {
        self.deletes.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn presign_get(
        &self,
        key: &str,
        ttl: Duration,
        _content_disposition: &str,
        _content_type: &str,
    ) -> Result<String, CloudError> {
        if self.fail_presign.load(Ordering::SeqCst) {
            return Err(CloudError::Storage("access denied".into()));
        }
        Ok(format!("https://storage.test/{key}?expires={}", ttl.as_secs()))
    }
}

/// Media CDN that records calls. Uploads succeed unless `fail_upload` is set.
#[derive(Default)]
pub struct FakeCdn {
    pub fail_upload: AtomicBool,
    pub uploads: Mutex<Vec<String>>,
    pub destroyed: Mutex<Vec<String>>,
}

impl FakeCdn {
    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn destroyed(&self) -> Vec<String> {
        self.destroyed.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaCdn for FakeCdn {
    fn signed_download_url(
        &self,
        media: &MediaRef,
        ttl: Duration,
        attachment: bool,
    ) -> Result<String, CloudError> {
        Ok(format!(
            "https://cdn.test/{}/{}?expires={}&attachment={attachment}",
            media.resource_type,
            media.public_id,
            ttl.as_secs()
        ))
    }

    async fn upload(&self, upload: MediaUpload) -> Result<UploadedMedia, CloudError> {
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(CloudError::Media("upload rejected".into()));
        }
        let stem = upload
            .filename
            .rsplit_once('.')
            .map_or(upload.filename.as_str(), |(stem, _)| stem);
        let public_id = format!("{}/{stem}", upload.folder);
        let format = extension_of(&upload.filename).map(str::to_string);
        self.uploads.lock().unwrap().push(public_id.clone());
        Ok(UploadedMedia {
            secure_url: format!(
                "https://res.cloudinary.com/test/{}/upload/v1/{public_id}.{}",
                upload.resource_type,
                format.as_deref().unwrap_or("bin")
            ),
            public_id,
            resource_type: upload.resource_type,
            format,
        })
    }

    async fn destroy(&self, public_id: &str, _resource_type: &str) -> Result<(), CloudError> {
        self.destroyed.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub storage: Arc<FakeStorage>,
    pub media: Arc<FakeCdn>,
}

impl TestApp {
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "beatstore-integration-test-secret".to_string(),
        access_token_expiry_mins: 60,
    }
}

/// Build a test `ServerConfig` with safe defaults and a known cron secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        cron_secret: Some(TEST_CRON_SECRET.to_string()),
        log_json: false,
        jwt: test_jwt_config(),
    }
}

/// Build the production router over fake remote backends and an in-memory
/// cache.
pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> TestApp {
    let storage = Arc::new(FakeStorage::default());
    let media = Arc::new(FakeCdn::default());
    let state = AppState::new(
        pool,
        config.clone(),
        Cache::in_memory(16),
        Arc::clone(&storage) as Arc<dyn ObjectStorage>,
        Arc::clone(&media) as Arc<dyn MediaCdn>,
    );
    let router = build_app_router(state.clone(), &config);
    TestApp {
        router,
        state,
        storage,
        media,
    }
}

pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with(pool, test_config())
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("request should complete")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// GET with a raw `Authorization` header value.
pub async fn get_with_authorization(app: Router, uri: &str, value: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, value)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

fn json_request(method: Method, uri: &str, body: serde_json::Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, body, None)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request(Method::POST, uri, body, Some(token))).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request(Method::PUT, uri, body, Some(token))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// One part of a multipart form: `(field name, filename, content type, contents)`.
/// A `None` filename makes a plain text field.
pub type FormPart<'a> = (&'a str, Option<&'a str>, &'a str, &'a str);

pub const BOUNDARY: &str = "beatstore-test-boundary";

pub fn multipart_body(parts: &[FormPart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content_type, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(data.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart_auth(
    app: Router,
    uri: &str,
    parts: &[FormPart<'_>],
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

pub fn header_str<'a>(response: &'a Response<Body>, name: header::HeaderName) -> &'a str {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

pub async fn create_user(pool: &PgPool, email: &str, role: &str) -> User {
    let password_hash = hash_password(TEST_PASSWORD).expect("hashing should succeed");
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            password_hash,
            role: role.to_string(),
        },
    )
    .await
    .expect("user creation should succeed")
}

pub fn token_for(user: &User) -> String {
    generate_access_token(user.id, &user.role, &test_jwt_config()).expect("token should encode")
}

pub async fn admin_token(pool: &PgPool) -> String {
    let admin = create_user(pool, "admin@beatstore.test", ROLE_ADMIN).await;
    token_for(&admin)
}

pub async fn customer_token(pool: &PgPool) -> String {
    let customer = create_user(pool, "fan@beatstore.test", ROLE_CUSTOMER).await;
    token_for(&customer)
}

/// A live beat with every asset attached.
pub fn beat_input(title: &str) -> CreateBeat {
    let slug = beatstore_core::beat::slugify(title);
    CreateBeat {
        title: title.to_string(),
        slug: slug.clone(),
        description: Some(format!("{title} description")),
        genre: Some("trap".to_string()),
        bpm: Some(140),
        musical_key: Some("A minor".to_string()),
        tags: Some(vec!["dark".to_string()]),
        price_basic_cents: 2999,
        price_trackout_cents: 7999,
        price_unlimited_cents: 19999,
        preview_public_id: Some(format!("beats/previews/{slug}")),
        artwork_url: None,
        master_key: Some(format!("masters/{slug}.wav")),
        master_legacy_url: Some(format!(
            "https://res.cloudinary.com/test/video/upload/v1700000000/beats/masters/{slug}.wav"
        )),
        stems_key: Some(format!("stems/{slug}.zip")),
        is_active: Some(true),
        featured: Some(false),
        scheduled_release_at: None,
        created_by: None,
    }
}

pub async fn seed_beat(pool: &PgPool, input: CreateBeat) -> Beat {
    BeatRepo::create(pool, &input)
        .await
        .expect("beat creation should succeed")
}

pub async fn seed_order(
    pool: &PgPool,
    email: &str,
    beat_id: DbId,
    tier: &str,
    status: &str,
) -> OrderWithItems {
    OrderRepo::create(
        pool,
        &CreateOrder {
            customer_email: email.to_string(),
            customer_name: Some("Test Customer".to_string()),
            status: Some(status.to_string()),
            payment_reference: None,
            items: vec![CreateOrderItem {
                beat_id,
                license_tier: tier.to_string(),
                price_cents: 2999,
            }],
        },
    )
    .await
    .expect("order creation should succeed")
}
