use std::path::Path;

use crate::models::listing::{InstrumentCategory, ListingStatus};

use super::{ApiError, PostPayload};

pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Validate a listing payload before it touches the store. Rules run in
/// a fixed order and the first violation wins. Returns the parsed price
/// so handlers never re-parse it.
pub fn validate_post_input(payload: &PostPayload, upload_dir: &Path) -> Result<f64, ApiError> {
    let title = payload.title.as_deref().unwrap_or("");
    if title.chars().count() < 5 {
        return Err(ApiError::validation(
            "Title must be at least 5 characters long.",
        ));
    }

    if let Some(description) = payload.description.as_deref()
        && !description.is_empty()
        && description.chars().count() < 10
    {
        return Err(ApiError::validation(
            "Description must be at least 10 characters long.",
        ));
    }

    let price = parse_price(payload.price.as_ref())
        .ok_or_else(|| ApiError::validation("Price must be a valid number."))?;
    if price <= 0.0 {
        return Err(ApiError::validation("Price must be a valid number."));
    }

    let phone = payload.phone_number.as_deref().unwrap_or("");
    if phone.is_empty() || !phone.chars().all(|c| c.is_ascii_digit()) || phone.len() < 8 {
        return Err(ApiError::validation(
            "Phone number must be at least 8 digits long and contain only digits.",
        ));
    }

    let status = payload.status.as_deref().unwrap_or("");
    if ListingStatus::parse(status).is_none() {
        return Err(ApiError::validation(
            "Status must be 'for rental' or 'for sale'.",
        ));
    }

    if let Some(image) = payload.image.as_deref()
        && !image.is_empty()
    {
        validate_image(image, upload_dir)?;
    }

    let instrument_type = payload.instrument_type.as_deref().unwrap_or("");
    if InstrumentCategory::parse(instrument_type).is_none() {
        let valid = InstrumentCategory::ALL.map(|c| c.to_string()).join(", ");
        return Err(ApiError::validation(format!(
            "Instrument type must be one of: {valid}."
        )));
    }

    let brand = payload.brand.as_deref().unwrap_or("");
    if brand.chars().count() < 3 {
        return Err(ApiError::validation(
            "Brand must be at least 3 characters long.",
        ));
    }

    let location = payload.location.as_deref().unwrap_or("");
    if location.is_empty() {
        return Err(ApiError::validation("Location is required"));
    }

    Ok(price)
}

/// An image reference is either a URL ending in an allowed extension or
/// the name of a file already sitting in the upload directory.
fn validate_image(image: &str, upload_dir: &Path) -> Result<(), ApiError> {
    if image.starts_with("http://") || image.starts_with("https://") {
        if !has_allowed_extension(image) {
            return Err(ApiError::validation(
                "Image URL must point to a valid image format (png, jpg, jpeg).",
            ));
        }
    } else if upload_dir.join(sanitize_filename(image)).is_file() {
        if !has_allowed_extension(image) {
            return Err(ApiError::validation(
                "Local image must be in png, jpg or jpeg format.",
            ));
        }
    } else {
        return Err(ApiError::validation(
            "Image must be a valid URL or a valid local file in the uploads folder.",
        ));
    }

    Ok(())
}

fn parse_price(value: Option<&serde_json::Value>) -> Option<f64> {
    match value? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Extension check on whatever follows the last dot, case-insensitive.
pub fn has_allowed_extension(reference: &str) -> bool {
    reference.rsplit_once('.').is_some_and(|(_, ext)| {
        ALLOWED_IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
    })
}

/// Flatten a client-supplied filename to a safe basename: non-ascii is
/// dropped, path separators and whitespace runs become underscores, and
/// anything outside `[A-Za-z0-9_.-]` is removed. Can return an empty
/// string for hostile input, callers must treat that as no filename.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let ascii: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .filter(char::is_ascii)
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    cleaned
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}
