// src/models/mod.rs

pub mod facility;
pub mod hotel;

use crate::error::SanitizeError;
use crate::sanitize::HtmlSanitizer;

/// Builds the sanitize plan of every payload type up front, so a misapplied
/// marker fails at startup instead of on the first request.
pub fn register_schemas(sanitizer: &HtmlSanitizer) -> Result<(), SanitizeError> {
    for schema in [
        &hotel::HOTEL_SCHEMA,
        &hotel::HOTEL_INPUT_SCHEMA,
        &facility::FACILITY_SCHEMA,
        &facility::FACILITY_INPUT_SCHEMA,
    ] {
        sanitizer.register(schema)?;
    }
    Ok(())
}
