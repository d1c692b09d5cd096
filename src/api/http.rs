//! HTTP API Server
//!
//! Upload, list, create-folder and delete behind the shared-secret gate.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        rejection::BytesRejection,
        DefaultBodyLimit, Multipart, Query, State,
    },
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use bytes::BytesMut;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::auth::gate;
use crate::config::WolfMediaConfig;
use crate::error::{Error, Result};
use crate::media::{
    self, folder_marker_key, object_key, sanitize_filename, timestamp_millis, Category, ListScope,
    MediaListing, LIST_LIMIT, MAX_FILE_SIZE,
};
use crate::storage::{ListQuery, Metadata, ObjectStore};

/// Request body cap: the largest accepted file plus multipart framing
pub const UPLOAD_BODY_LIMIT: usize = MAX_FILE_SIZE as usize + 1024 * 1024;

/// Content type stored on folder marker objects
const FOLDER_CONTENT_TYPE: &str = "application/x-directory";

/// Shared application state
pub struct AppState {
    /// Bucket behind the gateway
    pub store: Arc<dyn ObjectStore>,
    /// Shared bearer token
    pub api_key: String,
    /// Public base URL without trailing slash
    pub public_url: String,
}

impl AppState {
    /// Public URL of an object
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}

/// HTTP API server
pub struct HttpServer {
    bind_address: String,
    state: Arc<AppState>,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(config: &WolfMediaConfig, store: Arc<dyn ObjectStore>) -> Self {
        let state = Arc::new(AppState {
            store,
            api_key: config.auth.api_key.clone(),
            public_url: config.public_url().to_string(),
        });

        Self {
            bind_address: config.server.bind_address.clone(),
            state,
        }
    }

    /// Create the router
    pub fn router(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/upload", post(handle_upload).fallback(handle_not_found))
            .route("/list", get(handle_list).fallback(handle_not_found))
            .route("/create-folder", post(handle_create_folder).fallback(handle_not_found))
            .route("/delete", delete(handle_delete).fallback(handle_not_found))
            .fallback(handle_not_found)
            .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
            .layer(middleware::from_fn_with_state(Arc::clone(&state), gate))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Start the HTTP server and run until Ctrl+C
    pub async fn start(&self) -> Result<()> {
        let app = Self::router(Arc::clone(&self.state));

        let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;
        info!("Media gateway listening on {}", self.bind_address);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Network(format!("HTTP server error: {}", e)))?;

        info!("Media gateway stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

// ============ Request/Response Types ============

/// Upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub key: String,
    pub filename: String,
    pub category: Category,
    pub size: u64,
}

/// List query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub folder: Option<String>,
}

/// Create-folder request
#[derive(Debug, Deserialize)]
pub struct CreateFolderRequest {
    pub category: Option<String>,
    pub folder: Option<String>,
}

/// Create-folder response
#[derive(Debug, Serialize)]
pub struct CreateFolderResponse {
    pub success: bool,
    pub category: Category,
    pub folder: String,
}

/// Delete request
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub key: Option<String>,
}

/// Delete response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub key: String,
}

/// File part of an upload form
struct UploadedFile {
    filename: String,
    content_type: String,
    data: Bytes,
}

/// Parsed upload form
#[derive(Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    category: Option<String>,
    folder: Option<String>,
}

// ============ Handlers ============

async fn handle_upload(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let mut multipart = multipart
        .map_err(|e| Error::Validation(format!("Invalid multipart body: {}", e.body_text())))?;
    let form = read_upload_form(&mut multipart).await?;

    // Validation order matters: the first violated constraint is reported
    let file = form
        .file
        .ok_or_else(|| Error::Validation("No file provided".into()))?;
    let size = file.data.len() as u64;
    media::check_size(size)?;
    media::check_content_type(&file.content_type)?;
    let category = Category::from_form(form.category.as_deref())?;
    let folder = form.folder.filter(|f| !f.is_empty());
    if let Some(folder) = &folder {
        media::check_folder(folder)?;
    }

    let filename = sanitize_filename(&file.filename);
    let key = object_key(category, folder.as_deref(), timestamp_millis(), &filename);

    let mut metadata = Metadata::new();
    metadata.insert("originalName".to_string(), file.filename);
    metadata.insert("category".to_string(), category.to_string());

    state
        .store
        .put(&key, file.data, &file.content_type, &metadata)
        .await?;
    info!("Uploaded {} ({} bytes, {})", key, size, file.content_type);

    Ok(Json(UploadResponse {
        url: state.object_url(&key),
        key,
        filename,
        category,
        size,
    }))
}

async fn handle_list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<MediaListing>> {
    let scope = ListScope::resolve(params.category.as_deref(), params.folder.as_deref());

    let listing = state
        .store
        .list(ListQuery {
            prefix: scope.prefix(),
            delimiter: scope.delimiter(),
            limit: LIST_LIMIT,
        })
        .await?;

    Ok(Json(MediaListing::build(&scope, listing, &state.public_url)))
}

async fn handle_create_folder(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<CreateFolderResponse>> {
    let req: CreateFolderRequest = parse_json(body)?;

    let category: Category = req.category.as_deref().unwrap_or_default().parse()?;
    let folder = req.folder.unwrap_or_default();
    media::check_folder(&folder)?;

    let key = folder_marker_key(category, &folder);
    let mut metadata = Metadata::new();
    metadata.insert("category".to_string(), category.to_string());

    state
        .store
        .put(&key, Bytes::new(), FOLDER_CONTENT_TYPE, &metadata)
        .await?;
    info!("Created folder {}/{}", category, folder);

    Ok(Json(CreateFolderResponse {
        success: true,
        category,
        folder,
    }))
}

async fn handle_delete(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<DeleteResponse>> {
    let req: DeleteRequest = parse_json(body)?;

    let key = req
        .key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| Error::Validation("No key provided".into()))?;

    state.store.delete(&key).await?;
    info!("Deleted {}", key);

    Ok(Json(DeleteResponse { success: true, key }))
}

async fn handle_not_found() -> Error {
    Error::NotFound
}

// ============ Helpers ============

/// Parse a JSON body regardless of its declared content type
fn parse_json<T: DeserializeOwned>(body: std::result::Result<Bytes, BytesRejection>) -> Result<T> {
    let body = body.map_err(|e| Error::Validation(e.body_text()))?;
    serde_json::from_slice(&body).map_err(|_| Error::Validation("Invalid JSON body".into()))
}

async fn read_upload_form(multipart: &mut Multipart) -> Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = read_file_part(field).await?;
                form.file = Some(UploadedFile {
                    filename,
                    content_type,
                    data,
                });
            }
            "category" => form.category = Some(field.text().await.map_err(multipart_error)?),
            "folder" => form.folder = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    Ok(form)
}

/// Stream the file part, giving up as soon as it passes the size limit
async fn read_file_part(mut field: Field<'_>) -> Result<Bytes> {
    let mut data = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(file_part_error)? {
        media::check_size((data.len() + chunk.len()) as u64)?;
        data.extend_from_slice(&chunk);
    }
    Ok(data.freeze())
}

fn multipart_error(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::Validation("Request body too large".into())
    } else {
        Error::Validation(format!("Invalid multipart body: {}", e.body_text()))
    }
}

/// Hitting the body cap while streaming the file means the file itself is oversized
fn file_part_error(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        media::file_too_large()
    } else {
        multipart_error(e)
    }
}
