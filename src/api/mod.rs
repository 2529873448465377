//! HTTP surface of the submission service.

mod metadata_routes;

pub use metadata_routes::{create_metadata_router, ErrorResponse, MetadataState, FILE_FIELD};

use axum::Router;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Full application router with request tracing and permissive CORS.
pub fn build_router(state: MetadataState) -> Router {
    create_metadata_router(state).layer(
        ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        ),
    )
}
