use crate::{
    AppState,
    handlers::{admin, media},
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};

/// Slack on top of the file size limit for multipart boundaries and headers.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Admin Router Module
///
/// Content editing for every signed-in account, plus user management that the
/// handlers restrict to the `superadmin` role.
///
/// Static segments (`/contacts`, `/settings`, `/media`, `/users`, `/forms/...`)
/// take priority over the generic `/{collection}` routes.
pub fn admin_routes(upload_max_bytes: usize) -> Router<AppState> {
    Router::new()
        // --- Inbox ---
        .route("/contacts", get(admin::list_contacts))
        .route("/forms", get(admin::list_forms).post(admin::create_form))
        .route("/forms/{id}/submissions", get(admin::list_form_submissions))
        .route(
            "/forms/{id}",
            put(admin::update_form).delete(admin::delete_form),
        )
        // --- Site settings ---
        .route("/settings", put(admin::update_settings))
        // --- Media ---
        // POST /upload
        // Multipart `file` field. The body limit is raised just for this route.
        .route(
            "/upload",
            post(media::upload_file)
                .layer(DefaultBodyLimit::max(upload_max_bytes + MULTIPART_OVERHEAD)),
        )
        .route("/media", get(media::list_media))
        .route("/media/{id}", delete(media::delete_media))
        // --- Users (superadmin only) ---
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route("/users/{id}", delete(admin::delete_user))
        // --- Content collections ---
        // /{collection} is a URL segment such as `services` or `pages-dynamic`.
        // Unknown segments answer 404.
        .route(
            "/{collection}",
            get(admin::list_documents).post(admin::create_document),
        )
        .route(
            "/{collection}/{id}",
            put(admin::update_document).delete(admin::delete_document),
        )
}
