//! Admin beat management, including multipart asset upload.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use beatstore_cloud::media::{AUDIO_RESOURCE_TYPE, IMAGE_RESOURCE_TYPE};
use beatstore_cloud::MediaUpload;
use beatstore_core::beat::{slugify, validate_prices, validate_title};
use beatstore_core::cache_keys::InvalidationEvent;
use beatstore_core::catalog::{clamp_limit, clamp_offset, validate_bpm, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use beatstore_core::delivery::{content_type_for_extension, extension_of, parse_media_url};
use beatstore_core::error::CoreError;
use beatstore_core::types::DbId;
use beatstore_db::models::beat::{AdminBeat, Beat, CreateBeat, UpdateBeat};
use beatstore_db::repositories::BeatRepo;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body ceiling for the upload route.
pub const MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

const MASTER_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "aiff", "aif"];
const STEMS_EXTENSIONS: &[&str] = &["zip", "rar"];
const PREVIEW_EXTENSIONS: &[&str] = &["mp3", "wav"];
const ARTWORK_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

const PREVIEW_FOLDER: &str = "beats/previews";
const ARTWORK_FOLDER: &str = "beats/artwork";

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

async fn ensure_beat_exists(pool: &sqlx::PgPool, id: DbId) -> AppResult<Beat> {
    BeatRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Beat", id }))
}

fn validate_new_beat(input: &CreateBeat) -> Result<(), CoreError> {
    validate_title(&input.title)?;
    validate_prices(
        input.price_basic_cents,
        input.price_trackout_cents,
        input.price_unlimited_cents,
    )?;
    if let Some(bpm) = input.bpm {
        validate_bpm(bpm)?;
    }
    Ok(())
}

/// Slugify the given slug, or the title when the slug is blank.
fn normalize_slug(slug: &str, title: &str) -> Result<String, CoreError> {
    let source = if slug.trim().is_empty() { title } else { slug };
    let slug = slugify(source);
    if slug.is_empty() {
        return Err(CoreError::Validation(
            "Slug must contain at least one letter or digit".into(),
        ));
    }
    Ok(slug)
}

fn validate_update(existing: &Beat, input: &UpdateBeat) -> Result<(), CoreError> {
    if let Some(title) = &input.title {
        validate_title(title)?;
    }
    if let Some(bpm) = input.bpm {
        validate_bpm(bpm)?;
    }
    validate_prices(
        input.price_basic_cents.unwrap_or(existing.price_basic_cents),
        input.price_trackout_cents.unwrap_or(existing.price_trackout_cents),
        input.price_unlimited_cents.unwrap_or(existing.price_unlimited_cents),
    )
}

/// Lower-cased extension of `filename`, if it is one of `allowed`.
fn checked_extension(part: &str, filename: &str, allowed: &[&str]) -> AppResult<String> {
    let ext = extension_of(filename)
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if allowed.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(AppError::BadRequest(format!(
            "Unsupported {part} file '{filename}'. Supported: {}",
            allowed.join(", ")
        )))
    }
}

// ---------------------------------------------------------------------------
// Upload bookkeeping
// ---------------------------------------------------------------------------

struct UploadedFile {
    filename: String,
    extension: String,
    content_type: String,
    data: Vec<u8>,
}

#[derive(Default)]
struct UploadForm {
    metadata: Option<CreateBeat>,
    preview: Option<UploadedFile>,
    master: Option<UploadedFile>,
    stems: Option<UploadedFile>,
    artwork: Option<UploadedFile>,
}

/// Remote assets written during one request, removed again if the request
/// fails later.
#[derive(Default)]
struct UploadedAssets {
    object_keys: Vec<String>,
    media: Vec<(String, &'static str)>,
}

impl UploadedAssets {
    async fn rollback(self, state: &AppState) {
        for key in &self.object_keys {
            if let Err(e) = state.storage.delete(key).await {
                tracing::warn!(key = %key, error = %e, "Failed to remove uploaded object during rollback");
            }
        }
        for (public_id, resource_type) in &self.media {
            if let Err(e) = state.media.destroy(public_id, resource_type).await {
                tracing::warn!(public_id = %public_id, error = %e, "Failed to remove uploaded media during rollback");
            }
        }
    }
}

async fn read_form(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "metadata" {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            let metadata: CreateBeat = serde_json::from_str(&text)
                .map_err(|e| AppError::BadRequest(format!("Invalid metadata JSON: {e}")))?;
            form.metadata = Some(metadata);
            continue;
        }

        let allowed = match name.as_str() {
            "preview" => PREVIEW_EXTENSIONS,
            "master" => MASTER_EXTENSIONS,
            "stems" => STEMS_EXTENSIONS,
            "artwork" => ARTWORK_EXTENSIONS,
            other => {
                return Err(AppError::BadRequest(format!(
                    "Unexpected multipart field '{other}'"
                )))
            }
        };
        let filename = field.file_name().unwrap_or("").to_string();
        let extension = checked_extension(&name, &filename, allowed)?;
        let content_type = field
            .content_type()
            .filter(|ct| *ct != "application/octet-stream")
            .map(str::to_string)
            .unwrap_or_else(|| content_type_for_extension(&extension).to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
            .to_vec();
        if data.is_empty() {
            return Err(AppError::BadRequest(format!("The {name} file is empty")));
        }

        let file = Some(UploadedFile {
            filename,
            extension,
            content_type,
            data,
        });
        match name.as_str() {
            "preview" => form.preview = file,
            "master" => form.master = file,
            "stems" => form.stems = file,
            _ => form.artwork = file,
        }
    }

    Ok(form)
}

/// Upload every file in `form`, recording each one in `uploaded` as soon as
/// it lands and writing its reference into `input`.
async fn upload_assets(
    state: &AppState,
    form: UploadForm,
    input: &mut CreateBeat,
    uploaded: &mut UploadedAssets,
) -> AppResult<()> {
    for (prefix, file, slot) in [
        ("masters", form.master, &mut input.master_key),
        ("stems", form.stems, &mut input.stems_key),
    ] {
        let Some(file) = file else { continue };
        let key = format!("{prefix}/{}.{}", Uuid::new_v4(), file.extension);
        state.storage.put(&key, file.data, &file.content_type).await?;
        uploaded.object_keys.push(key.clone());
        *slot = Some(key);
    }

    if let Some(file) = form.preview {
        let media = state
            .media
            .upload(MediaUpload {
                folder: PREVIEW_FOLDER.to_string(),
                filename: file.filename,
                resource_type: AUDIO_RESOURCE_TYPE.to_string(),
                content_type: file.content_type,
                data: file.data,
            })
            .await?;
        uploaded.media.push((media.public_id.clone(), AUDIO_RESOURCE_TYPE));
        input.preview_public_id = Some(media.public_id);
    }

    if let Some(file) = form.artwork {
        let media = state
            .media
            .upload(MediaUpload {
                folder: ARTWORK_FOLDER.to_string(),
                filename: file.filename,
                resource_type: IMAGE_RESOURCE_TYPE.to_string(),
                content_type: file.content_type,
                data: file.data,
            })
            .await?;
        uploaded.media.push((media.public_id.clone(), IMAGE_RESOURCE_TYPE));
        input.artwork_url = Some(media.secure_url);
    }

    Ok(())
}

/// Best-effort removal of a deleted beat's remote files.
async fn remove_remote_assets(state: &AppState, beat: &Beat) {
    for key in [&beat.master_key, &beat.stems_key].into_iter().flatten() {
        if let Err(e) = state.storage.delete(key).await {
            tracing::warn!(beat_id = beat.id, key = %key, error = %e, "Failed to delete stored object");
        }
    }

    if let Some(public_id) = &beat.preview_public_id {
        if let Err(e) = state.media.destroy(public_id, AUDIO_RESOURCE_TYPE).await {
            tracing::warn!(beat_id = beat.id, public_id = %public_id, error = %e, "Failed to delete preview");
        }
    }

    for url in [&beat.artwork_url, &beat.master_legacy_url].into_iter().flatten() {
        let Ok(media) = parse_media_url(url) else {
            continue;
        };
        if let Err(e) = state.media.destroy(&media.public_id, &media.resource_type).await {
            tracing::warn!(beat_id = beat.id, url = %url, error = %e, "Failed to delete media asset");
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/beats
///
/// All beats regardless of visibility, with release diagnostics.
pub async fn list_beats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<AdminBeat>>>> {
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let offset = clamp_offset(params.offset);
    let now = Utc::now();
    let beats = BeatRepo::list_all(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse {
        data: beats.into_iter().map(|b| AdminBeat::at(b, now)).collect(),
    }))
}

/// GET /api/v1/admin/beats/scheduled
pub async fn list_scheduled(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<AdminBeat>>>> {
    let now = Utc::now();
    let beats = BeatRepo::list_scheduled(&state.pool, now).await?;
    Ok(Json(DataResponse {
        data: beats.into_iter().map(|b| AdminBeat::at(b, now)).collect(),
    }))
}

/// GET /api/v1/admin/beats/{id}
pub async fn get_beat(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<AdminBeat>>> {
    let beat = ensure_beat_exists(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: AdminBeat::at(beat, Utc::now()),
    }))
}

/// POST /api/v1/admin/beats
///
/// Create a beat whose assets are already uploaded.
pub async fn create_beat(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(mut input): Json<CreateBeat>,
) -> AppResult<impl IntoResponse> {
    validate_new_beat(&input)?;
    input.slug = normalize_slug(&input.slug, &input.title)?;
    input.created_by = Some(admin.user_id);

    let beat = BeatRepo::create(&state.pool, &input).await?;
    state.cache.invalidate(&InvalidationEvent::BeatChanged).await;

    tracing::info!(beat_id = beat.id, slug = %beat.slug, user_id = admin.user_id, "Beat created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: AdminBeat::at(beat, Utc::now()),
        }),
    ))
}

/// POST /api/v1/admin/beats/upload
///
/// Multipart form: a `metadata` JSON part plus optional `preview`, `master`,
/// `stems`, and `artwork` files. If anything fails after the first upload,
/// every file uploaded by this request is deleted again.
pub async fn upload_beat(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut form = read_form(multipart).await?;
    let mut input = form
        .metadata
        .take()
        .ok_or_else(|| AppError::BadRequest("Missing required 'metadata' field".into()))?;
    validate_new_beat(&input)?;
    input.slug = normalize_slug(&input.slug, &input.title)?;
    input.created_by = Some(admin.user_id);

    let mut uploaded = UploadedAssets::default();
    if let Err(e) = upload_assets(&state, form, &mut input, &mut uploaded).await {
        uploaded.rollback(&state).await;
        return Err(e);
    }

    let beat = match BeatRepo::create(&state.pool, &input).await {
        Ok(beat) => beat,
        Err(e) => {
            tracing::warn!(slug = %input.slug, error = %e, "Beat insert failed, removing uploaded files");
            uploaded.rollback(&state).await;
            return Err(e.into());
        }
    };
    state.cache.invalidate(&InvalidationEvent::BeatChanged).await;

    tracing::info!(
        beat_id = beat.id,
        slug = %beat.slug,
        files = uploaded.object_keys.len() + uploaded.media.len(),
        user_id = admin.user_id,
        "Beat uploaded"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: AdminBeat::at(beat, Utc::now()),
        }),
    ))
}

/// PUT /api/v1/admin/beats/{id}
pub async fn update_beat(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateBeat>,
) -> AppResult<Json<DataResponse<AdminBeat>>> {
    let existing = ensure_beat_exists(&state.pool, id).await?;
    validate_update(&existing, &input)?;
    if let Some(slug) = &input.slug {
        input.slug = Some(normalize_slug(slug, &existing.title)?);
    }

    let beat = BeatRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Beat", id }))?;
    state.cache.invalidate(&InvalidationEvent::BeatChanged).await;

    tracing::info!(beat_id = id, user_id = admin.user_id, "Beat updated");
    Ok(Json(DataResponse {
        data: AdminBeat::at(beat, Utc::now()),
    }))
}

/// DELETE /api/v1/admin/beats/{id}
///
/// Beats referenced by an order cannot be deleted (409).
pub async fn delete_beat(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let beat = BeatRepo::delete(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Beat", id }))?;
    state.cache.invalidate(&InvalidationEvent::BeatChanged).await;

    remove_remote_assets(&state, &beat).await;

    tracing::info!(beat_id = id, user_id = admin.user_id, "Beat deleted");
    Ok(StatusCode::NO_CONTENT)
}
