use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::render::RenderError;

#[derive(Error, Debug)]
pub enum BoarError {
    #[error("No directory nor file provided")]
    EmptyPath,

    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to stat {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to archive directory: {0}")]
    Archive(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("No file with id {0}")]
    UnknownFile(usize),

    #[error("Archive download is not available")]
    ArchiveDisabled,

    #[error("Failed to render page: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = BoarError> = std::result::Result<T, E>;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl BoarError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            BoarError::UnknownFile(_) => (StatusCode::NOT_FOUND, "UNKNOWN_FILE"),
            BoarError::ArchiveDisabled => (StatusCode::NOT_FOUND, "ARCHIVE_DISABLED"),
            BoarError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            BoarError::Io(err) if err.kind() == std::io::ErrorKind::NotFound => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            BoarError::Render(_) => (StatusCode::INTERNAL_SERVER_ERROR, "RENDER_FAILED"),
            BoarError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            BoarError::EmptyPath
            | BoarError::Stat { .. }
            | BoarError::ReadDir { .. }
            | BoarError::Archive(_)
            | BoarError::Config(_)
            | BoarError::Bind { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }
}

impl IntoResponse for BoarError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code,
        };

        (status, Json(body)).into_response()
    }
}
