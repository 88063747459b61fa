//! Photo attachments, stored inline on the task as data URIs.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{AppError, Result};

/// Reads and encodes every file, or none of them.
pub fn encode_files(paths: &[PathBuf]) -> Result<Vec<String>> {
    paths.iter().map(|path| encode_file(path)).collect()
}

pub fn encode_file(path: &Path) -> Result<String> {
    let data = fs::read(path).map_err(|source| AppError::Photo {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Encoding photo {:?} ({} bytes)", path, data.len());
    Ok(data_uri(mime_type(path), &data))
}

pub fn data_uri(mime: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(data))
}

fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("heic") => "image/heic",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Payload size in bytes of a data URI, for display.
pub fn decoded_len(uri: &str) -> usize {
    let payload = uri.split_once(";base64,").map_or("", |(_, p)| p);
    let padding = payload.bytes().rev().take_while(|b| *b == b'=').count();
    (payload.len() / 4 * 3).saturating_sub(padding)
}
