use crate::{
    AppState,
    handlers::{auth, content},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Everything the marketing site reads without a token, plus the three write
/// endpoints visitors use: the contact form, dynamic form submissions and login.
///
/// Every read accepts `?lang=en`, which fills missing English fields on the way
/// out without touching the store.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(content::api_root))
        // --- Content collections ---
        .route("/services", get(content::list_services))
        .route("/services/{slug}", get(content::get_service))
        // GET /cases?category=...
        .route("/cases", get(content::list_cases))
        .route("/cases/{slug}", get(content::get_case))
        .route("/events", get(content::list_events))
        .route("/events/{slug}", get(content::get_event))
        // GET /projects?stage=...&industry=...
        .route("/projects", get(content::list_projects))
        .route("/projects/{slug}", get(content::get_project))
        // GET /partners?category=... matches against the partner's category list.
        .route("/partners", get(content::list_partners))
        .route("/partners/{slug}", get(content::get_partner))
        .route("/articles", get(content::list_articles))
        .route("/articles/{slug}", get(content::get_article))
        .route("/team", get(content::list_team))
        // --- Pages ---
        .route("/pages/{slug}", get(content::get_page))
        .route("/pages-dynamic", get(content::list_dynamic_pages))
        .route("/pages-dynamic/{slug}", get(content::get_dynamic_page))
        // --- Forms & contact ---
        .route("/forms/{slug}", get(content::get_form))
        .route("/forms/{slug}/submit", post(content::submit_form))
        .route("/contact", post(content::submit_contact))
        // --- Site chrome ---
        .route("/settings", get(content::get_settings))
        .route("/fonts", get(content::list_fonts))
        // POST /auth/login
        // The only way to obtain a token; accounts are created by a superadmin.
        .route("/auth/login", post(auth::login))
}
