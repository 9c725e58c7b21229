// Input validation for submissions

use crate::error::{AppError, Result};
use std::path::Path;

/// File extensions the backend accepts
pub const SUPPORTED_FORMATS: &[&str] = &[
    "png", "jpeg", "jpg", "bmp", "pnm", "gif", "tiff", "webp", "pdf",
];

/// Longest accepted language code (`eng+deu+fra` style combinations included)
pub const MAX_LANGUAGE_LEN: usize = 32;

/// Validate a local document before it is sent anywhere
///
/// Accepts files whose extension is in [`SUPPORTED_FORMATS`] and whose
/// guessed MIME type is an image or a PDF.
pub fn validate_document(filename: &str, bytes: &[u8]) -> Result<()> {
    if filename.trim().is_empty() {
        return Err(AppError::Validation("Filename cannot be empty".to_string()));
    }
    if bytes.is_empty() {
        return Err(AppError::Validation(format!("File {} is empty", filename)));
    }

    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_FORMATS.contains(&extension.as_str()) {
        return Err(AppError::UnsupportedInput(format!(
            "Unsupported file format: {} (supported: {})",
            filename,
            SUPPORTED_FORMATS.join(", ")
        )));
    }

    let acceptable = mime_guess::from_path(filename).iter().any(|mime| {
        mime.type_() == mime_guess::mime::IMAGE || mime.essence_str() == "application/pdf"
    });
    if !acceptable {
        return Err(AppError::UnsupportedInput(format!(
            "{} is neither an image nor a PDF",
            filename
        )));
    }

    Ok(())
}

/// Validate a language code (`en`, `eng`, `chi_sim`, `eng+deu`)
pub fn validate_language(language: &str) -> Result<()> {
    if language.is_empty() {
        return Err(AppError::Validation("Language cannot be empty".to_string()));
    }
    if language.len() > MAX_LANGUAGE_LEN {
        return Err(AppError::Validation(format!(
            "Language too long (max {} characters)",
            MAX_LANGUAGE_LEN
        )));
    }
    if !language
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '+' || c == '-')
    {
        return Err(AppError::Validation(
            "Language must be alphanumeric (plus '_', '-', '+')".to_string(),
        ));
    }
    Ok(())
}

/// Validate a remote document URL
pub fn validate_url(url: &str) -> Result<()> {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));
    match rest {
        Some(host_and_path) if !host_and_path.is_empty() => Ok(()),
        _ => Err(AppError::Validation(format!(
            "Invalid URL (http/https only): {}",
            url
        ))),
    }
}

/// A batch needs at least one input
pub fn validate_batch_size(count: usize) -> Result<()> {
    if count == 0 {
        return Err(AppError::Validation("No files provided".to_string()));
    }
    Ok(())
}
