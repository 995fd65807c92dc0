//! Embedded UI assets
//!
//! In development, falls back to serving from the filesystem.

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::Embed;
use std::path::{Component, Path as FsPath, PathBuf};

#[derive(Embed)]
#[folder = "ui"]
struct Assets;

/// Serve embedded static files, with filesystem fallback for development
pub async fn serve_static(Path(path): Path<String>) -> Response {
    match load(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref().to_string())], content).into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Get the index.html content (embedded or from filesystem)
pub fn get_index_html() -> Option<String> {
    load("index.html").and_then(|bytes| String::from_utf8(bytes).ok())
}

fn load(path: &str) -> Option<Vec<u8>> {
    // Plain relative paths only; a leading `/` would make `join` replace the base
    let relative = FsPath::new(path);
    if path.is_empty()
        || !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
    {
        return None;
    }

    if let Some(content) = Assets::get(path) {
        return Some(content.data.into_owned());
    }

    std::fs::read(PathBuf::from("ui").join(path)).ok()
}
