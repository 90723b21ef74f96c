// src/handlers/hotels.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::hotel::{Hotel, HotelInput, HotelSummary},
    sanitize::{CallSite, SanitizeHook, SanitizedJson},
    store::HotelStore,
};

/// Call site of a handler in this module, attached to its route.
pub const fn call_site(handler: &'static str) -> CallSite {
    CallSite::new(module_path!(), handler)
}

/// List all hotels.
pub async fn list_hotels(
    State(store): State<HotelStore>,
    hook: SanitizeHook,
) -> Result<impl IntoResponse, AppError> {
    hook.respond(store.list())
}

/// Create a hotel. HTML fields are sanitized before validation.
pub async fn create_hotel(
    State(store): State<HotelStore>,
    hook: SanitizeHook,
    SanitizedJson(payload): SanitizedJson<HotelInput>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hotel = Hotel::from_input(Uuid::new_v4(), payload, Utc::now());
    store.insert(hotel.clone());
    tracing::info!(id = %hotel.id, "hotel created");

    Ok((StatusCode::CREATED, hook.respond(hotel)?))
}

/// Get a single hotel by ID.
pub async fn get_hotel(
    State(store): State<HotelStore>,
    hook: SanitizeHook,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let hotel = store
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Hotel {id} not found")))?;

    hook.respond(hotel)
}

/// Replace a hotel. Facilities are replaced wholesale.
pub async fn update_hotel(
    State(store): State<HotelStore>,
    hook: SanitizeHook,
    Path(id): Path<Uuid>,
    SanitizedJson(payload): SanitizedJson<HotelInput>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let existing = store
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Hotel {id} not found")))?;

    let mut hotel = Hotel::from_input(id, payload, Utc::now());
    hotel.created_at = existing.created_at;

    if !store.replace(hotel.clone()) {
        return Err(AppError::NotFound(format!("Hotel {id} not found")));
    }
    tracing::info!(id = %id, "hotel updated");

    hook.respond(hotel)
}

/// Delete a hotel.
pub async fn delete_hotel(
    State(store): State<HotelStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    match store.remove(id) {
        Some(_) => {
            tracing::info!(id = %id, "hotel deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(AppError::NotFound(format!("Hotel {id} not found"))),
    }
}

/// Compact hotel list. Names go through field-level sanitization when the
/// response is serialized, no payload walk happens here.
pub async fn list_summaries(
    State(store): State<HotelStore>,
) -> Result<impl IntoResponse, AppError> {
    let summaries: Vec<HotelSummary> = store.list().iter().map(HotelSummary::from).collect();
    Ok(Json(summaries))
}
