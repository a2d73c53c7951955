//! File helpers for the demo tools.
//!
//! - `load_rgb_image`: read a PNG/JPEG frame into an owned RGB buffer.
//! - `write_json_file`: pretty-print a serializable value to disk.
//! - `create_output_file`: open a fresh output file under a possibly new directory.
use image::RgbImage;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Load an image from disk and convert to 8-bit RGB.
pub fn load_rgb_image(path: &Path) -> Result<RgbImage, String> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?
        .into_rgb8();
    Ok(img)
}

/// Serialize `value` as pretty JSON, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Cannot encode JSON for {}: {e}", path.display()))?;
    create_output_file(path)
        .and_then(|mut file| file.write_all(json.as_bytes()))
        .map_err(|e| format!("Cannot write {}: {e}", path.display()))
}

/// Create (or truncate) an output file, creating missing parent directories.
pub(crate) fn create_output_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    File::create(path)
}
