use std::path::Path;

use axum::{
    body::Body,
    extract::{Path as UrlPath, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::archive::ArchiveDescriptor;
use crate::error::BoarError;
use crate::render;
use crate::target::{Target, TargetKind};
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub mode: &'static str,
    pub name: String,
}

/// Keep quotes and control characters out of the Content-Disposition header.
fn safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' => '\'',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Stream a file from disk as an attachment.
async fn stream_attachment(
    path: &Path,
    name: &str,
    content_type: String,
) -> Result<Response, BoarError> {
    let file = fs::File::open(path).await?;
    // Length comes from the open handle so it matches what is streamed
    let size = file.metadata().await?.len();
    let body = Body::from_stream(ReaderStream::new(file));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, size.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", safe_filename(name)),
            ),
        ],
        body,
    )
        .into_response())
}

async fn stream_archive(archive: &ArchiveDescriptor) -> Result<Response, BoarError> {
    debug!("Streaming archive: {}", archive.path.display());
    stream_attachment(&archive.path, &archive.name, "application/zip".to_string()).await
}

/// GET / (and any unmatched path) - listing or download page
pub async fn page(State(state): State<AppState>) -> Result<Html<String>, BoarError> {
    debug!("Rendering page for {}", state.target.name());
    let html = render::render(&state.target)?;
    Ok(Html(html))
}

/// GET /files/:id - stream one listed file
pub async fn get_file(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<usize>,
) -> Result<Response, BoarError> {
    let file = state.target.file(id).ok_or(BoarError::UnknownFile(id))?;
    info!("Download: {}", file.name);

    let mime = mime_guess::from_path(&file.path)
        .first_or_octet_stream()
        .to_string();
    stream_attachment(&file.path, &file.name, mime).await
}

/// GET /archive - stream the archive of the whole directory
pub async fn get_archive(State(state): State<AppState>) -> Result<Response, BoarError> {
    let Target::Directory(dir) = state.target.as_ref() else {
        return Err(BoarError::ArchiveDisabled);
    };
    let archive = dir.archive.as_ref().ok_or(BoarError::ArchiveDisabled)?;
    info!("Download: {}", archive.name);
    stream_archive(archive).await
}

/// GET /archive/:id - stream the archive of one subdirectory
pub async fn get_child_archive(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<usize>,
) -> Result<Response, BoarError> {
    let Target::Directory(dir) = state.target.as_ref() else {
        return Err(BoarError::ArchiveDisabled);
    };
    let child = dir.children.get(id).ok_or(BoarError::UnknownFile(id))?;
    info!("Download: {}", child.archive.name);
    stream_archive(&child.archive).await
}

/// GET /health - Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let mode = match state.target.kind() {
        TargetKind::Directory => "directory",
        TargetKind::File => "file",
    };
    Json(HealthResponse {
        status: "ok",
        mode,
        name: state.target.name().to_string(),
    })
}
