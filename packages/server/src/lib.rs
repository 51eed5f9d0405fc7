pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod seed;
pub mod state;
pub mod utils;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use common::storage::filesystem::FilesystemObjectStore;
use common::storage::s3::{S3ObjectStore, S3Settings};
use common::storage::{ObjectStore, StorageError};
use tower_http::cors::CorsLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{CorsConfig, StorageBackend, StorageConfig};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Event Portal API",
        version = "1.0.0",
        description = "Registration, submission and review API for student competitions and hackathons"
    ),
    tags(
        (name = "Auth", description = "Accounts, sessions and role checks"),
        (name = "Profiles", description = "Student and organizer profiles"),
        (name = "Events", description = "Event catalog and organizer event management"),
        (name = "Registrations", description = "Team registration for events"),
        (name = "Submissions", description = "Project submissions by registered teams"),
        (name = "Evaluation", description = "Rating submissions and publishing results"),
        (name = "Admin", description = "Event approval and platform statistics"),
        (name = "Engagement", description = "Wishlist, recently viewed and the home feed"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// CORS for the configured browser origins. `None` when no origin is configured,
/// in which case the API is same-origin only.
fn cors_layer(cors: &CorsConfig) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = cors
        .allow_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }

    // Credentials are allowed for the session cookie, which rules out wildcards.
    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true)
            .max_age(Duration::from_secs(cors.max_age)),
    )
}

/// Open the object store selected by `storage.backend`.
pub async fn build_storage(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>, StorageError> {
    match config.backend {
        StorageBackend::Filesystem => {
            let store = FilesystemObjectStore::new(
                PathBuf::from(&config.root_dir),
                config.public_base_url.clone(),
                config.max_upload_size,
            )
            .await?;
            Ok(Arc::new(store))
        }
        StorageBackend::S3 => {
            let s3 = config.s3.clone().ok_or_else(|| {
                StorageError::Backend("storage.backend is s3 but storage.s3 is not set".into())
            })?;
            let store = S3ObjectStore::new(S3Settings {
                bucket: s3.bucket,
                region: s3.region,
                endpoint: s3.endpoint,
                access_key: s3.access_key,
                secret_key: s3.secret_key,
                public_base_url: config.public_base_url.clone(),
                max_size: config.max_upload_size,
            })?;
            Ok(Arc::new(store))
        }
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", routes::api_routes(&state.config))
        .split_for_parts();

    let cors = cors_layer(&state.config.server.cors);
    let router = router
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api));

    match cors {
        Some(layer) => router.layer(layer),
        None => router,
    }
}
