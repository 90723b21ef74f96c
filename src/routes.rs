// src/routes.rs

use axum::{
    Extension, Router,
    handler::Handler,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers::hotels, state::AppState};

/// Assembles the main application router.
///
/// * Every hotel handler gets its call site as a request extension, which is
///   what the sanitize hooks match the scope pattern against.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store, config, sanitizer).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let hotel_routes = Router::new()
        .route(
            "/",
            get(hotels::list_hotels.layer(Extension(hotels::call_site("list_hotels"))))
                .post(hotels::create_hotel.layer(Extension(hotels::call_site("create_hotel")))),
        )
        .route("/summaries", get(hotels::list_summaries))
        .route(
            "/{id}",
            get(hotels::get_hotel.layer(Extension(hotels::call_site("get_hotel"))))
                .put(hotels::update_hotel.layer(Extension(hotels::call_site("update_hotel"))))
                .delete(hotels::delete_hotel),
        );

    Router::new()
        .nest("/api/v1/hotels", hotel_routes)
        // Global Middleware (applied from top to bottom)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
