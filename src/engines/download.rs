//! Model and training data cache, shared by the engines.

use crate::error::ScanError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Cache directory for downloaded engine data, created if missing
pub fn cache_dir(subdir: Option<&str>) -> Result<PathBuf, ScanError> {
    let mut dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("whiteboard-ocr");
    if let Some(sub) = subdir {
        dir = dir.join(sub);
    }

    std::fs::create_dir_all(&dir).map_err(|e| {
        ScanError::InitializationError(format!("Failed to create cache directory {:?}: {}", dir, e))
    })?;
    Ok(dir)
}

/// Return the cached copy of `url` under `dir/filename`, downloading it first
/// if it is not there yet
pub fn ensure_cached(url: &str, dir: &Path, filename: &str) -> Result<PathBuf, ScanError> {
    let path = dir.join(filename);

    if !path.exists() {
        tracing::info!("Downloading {} (this may take a moment)...", filename);
        download_file(url, &path)?;
        tracing::info!("Downloaded {} to {:?}", filename, path);
    } else {
        tracing::info!("Using cached {} from {:?}", filename, path);
    }

    Ok(path)
}

/// Download a file from URL to path using ureq
fn download_file(url: &str, path: &Path) -> Result<(), ScanError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| ScanError::InitializationError(format!("Failed to download {}: {}", url, e)))?;

    let buffer = response.into_body().read_to_vec().map_err(|e| {
        ScanError::InitializationError(format!("Failed to read response body: {}", e))
    })?;

    // Write next to the target first so an interrupted download never looks cached
    let partial = path.with_extension("part");
    let mut file = File::create(&partial).map_err(|e| {
        ScanError::InitializationError(format!("Failed to create {:?}: {}", partial, e))
    })?;
    file.write_all(&buffer)
        .map_err(|e| ScanError::InitializationError(format!("Failed to write {:?}: {}", partial, e)))?;
    std::fs::rename(&partial, path)
        .map_err(|e| ScanError::InitializationError(format!("Failed to move {:?}: {}", partial, e)))?;

    Ok(())
}
