use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod collections;
pub mod config;
pub mod error;
pub mod fonts;
pub mod forms;
pub mod handlers;
pub mod localize;
pub mod models;
pub mod repository;
pub mod storage;
pub mod translation;

// Public, authenticated and admin routers.
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{LocalDiskStorage, MockStorageService, S3StorageClient, StorageState};
pub use translation::{GoogleTranslator, MockTranslator, TranslatorState};

/// ApiDoc
///
/// OpenAPI document for the whole API, served at `/api-docs/openapi.json` and
/// rendered by Swagger UI at `/swagger-ui`. Content documents are schemaless, so
/// their endpoints are listed without body schemas.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::content::api_root, handlers::content::list_services, handlers::content::get_service,
        handlers::content::list_cases, handlers::content::get_case, handlers::content::list_events,
        handlers::content::get_event, handlers::content::list_projects, handlers::content::get_project,
        handlers::content::list_partners, handlers::content::get_partner,
        handlers::content::list_articles, handlers::content::get_article,
        handlers::content::list_team, handlers::content::get_page,
        handlers::content::list_dynamic_pages, handlers::content::get_dynamic_page,
        handlers::content::get_form, handlers::content::submit_form,
        handlers::content::submit_contact, handlers::content::get_settings,
        handlers::content::list_fonts,
        handlers::auth::login, handlers::auth::get_me, handlers::auth::change_password,
        handlers::admin::list_documents, handlers::admin::create_document,
        handlers::admin::update_document, handlers::admin::delete_document,
        handlers::admin::list_contacts, handlers::admin::list_form_submissions,
        handlers::admin::update_settings, handlers::admin::list_users,
        handlers::admin::create_user, handlers::admin::delete_user,
        handlers::media::upload_file, handlers::media::list_media, handlers::media::delete_media,
    ),
    components(
        schemas(
            models::Role, models::UserProfile, models::LoginRequest, models::TokenResponse,
            models::ChangePasswordRequest, models::CreateUserRequest, models::ContactFormData,
            models::ContactSubmission, models::FormSubmission, models::MediaRecord,
            models::FontEntry, models::MessageResponse, models::SiteSettings, models::Theme,
            models::MenuItem,
        )
    ),
    tags(
        (name = "aichin", description = "AICHIN GROUP site API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The shared container of services and configuration, cloned into every
/// request. Handlers pull individual parts through the `FromRef` impls below.
#[derive(Clone)]
pub struct AppState {
    /// Document store holding all collections.
    pub repo: RepositoryState,
    /// Blob store for uploaded files.
    pub storage: StorageState,
    /// Machine translator used for `lang=en` reads.
    pub translator: TranslatorState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for TranslatorState {
    fn from_ref(app_state: &AppState) -> TranslatorState {
        app_state.translator.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards the authenticated and admin routers. Extracting `AuthUser` rejects the
/// request with 401 before any handler runs; the resolved user is kept in the
/// request extensions so handlers reuse it instead of hitting the store again.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// create_router
///
/// Assembles the `/api` routers, the static file mounts and the observability
/// layers, and binds the application state.
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();
    let x_request_id = HeaderName::from_static("x-request-id");

    let api = Router::new()
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .nest(
            "/admin",
            admin::admin_routes(config.upload_max_bytes).route_layer(
                middleware::from_fn_with_state(state.clone(), auth_middleware),
            ),
        );

    let mut router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(|| async { "ok" }))
        .route("/api/", get(handlers::content::api_root))
        .nest("/api", api)
        .nest_service("/fonts", ServeDir::new(&config.fonts_dir));

    // Locally stored uploads are served by the API itself; S3 objects are
    // reachable at their own public URL.
    if config.storage == config::StorageBackend::Local && config.public_upload_base.starts_with('/')
    {
        router = router.nest_service(&config.public_upload_base, ServeDir::new(&config.upload_dir));
    }

    router
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors_layer(&config.cors_origins))
}

/// trace_span_logger
///
/// Span for `TraceLayer` carrying the method, URI and `x-request-id`, so every
/// log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
