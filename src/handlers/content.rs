use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

use super::{LIST_LIMIT, localize_documents, localize_with, now, to_document};
use crate::{
    AppState,
    collections::{CONTACT_FORMS, Collection, FORM_SUBMISSIONS, SETTINGS, SETTINGS_ID},
    error::{ApiError, ApiResult},
    fonts,
    forms::clean_submission,
    localize,
    models::{
        CategoryQuery, ContactFormData, ContactSubmission, FontEntry, Form, FormSubmission,
        LangQuery, MessageResponse, ProjectQuery, SiteSettings,
    },
    repository::{Document, Filter, FindOptions},
};

// --- Shared read paths ---

async fn list_documents(
    state: &AppState,
    collection: Collection,
    filter: Filter,
    lang: Option<&str>,
) -> ApiResult<Json<Vec<Document>>> {
    let mut docs = state
        .repo
        .find(collection.store_name(), &filter, FindOptions::limit(LIST_LIMIT))
        .await?;
    localize_documents(state, lang, collection, &mut docs).await;
    Ok(Json(docs))
}

async fn document_by_slug(
    state: &AppState,
    collection: Collection,
    slug: &str,
    lang: Option<&str>,
) -> ApiResult<Json<Document>> {
    let doc = state
        .repo
        .find_one(collection.store_name(), &Filter::by_slug(slug))
        .await?
        .ok_or_else(|| ApiError::NotFound(collection.not_found_message().to_string()))?;

    let mut docs = [doc];
    localize_documents(state, lang, collection, &mut docs).await;
    let [doc] = docs;
    Ok(Json(doc))
}

// --- Handlers ---

#[utoipa::path(
    get,
    path = "/api/",
    responses((status = 200, description = "API banner", body = MessageResponse))
)]
pub async fn api_root() -> Json<MessageResponse> {
    Json(MessageResponse::new("AICHIN GROUP API"))
}

/// list_services
///
/// [Public Route] All services in insertion order.
#[utoipa::path(
    get,
    path = "/api/services",
    params(LangQuery),
    responses((status = 200, description = "Services"))
)]
pub async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    list_documents(&state, Collection::Services, Filter::new(), query.lang.as_deref()).await
}

#[utoipa::path(
    get,
    path = "/api/services/{slug}",
    params(("slug" = String, Path, description = "Service slug"), LangQuery),
    responses(
        (status = 200, description = "Service"),
        (status = 404, description = "Service not found")
    )
)]
pub async fn get_service(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<LangQuery>,
) -> ApiResult<Json<Document>> {
    document_by_slug(&state, Collection::Services, &slug, query.lang.as_deref()).await
}

/// list_cases
///
/// [Public Route] Case studies, optionally narrowed to one `category`.
#[utoipa::path(
    get,
    path = "/api/cases",
    params(CategoryQuery),
    responses((status = 200, description = "Case studies"))
)]
pub async fn list_cases(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    let filter = Filter::new().eq_opt("category", query.category.as_deref());
    list_documents(&state, Collection::Cases, filter, query.lang.as_deref()).await
}

#[utoipa::path(
    get,
    path = "/api/cases/{slug}",
    params(("slug" = String, Path, description = "Case slug"), LangQuery),
    responses(
        (status = 200, description = "Case study"),
        (status = 404, description = "Case not found")
    )
)]
pub async fn get_case(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<LangQuery>,
) -> ApiResult<Json<Document>> {
    document_by_slug(&state, Collection::Cases, &slug, query.lang.as_deref()).await
}

#[utoipa::path(
    get,
    path = "/api/events",
    params(LangQuery),
    responses((status = 200, description = "Events"))
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    list_documents(&state, Collection::Events, Filter::new(), query.lang.as_deref()).await
}

#[utoipa::path(
    get,
    path = "/api/events/{slug}",
    params(("slug" = String, Path, description = "Event slug"), LangQuery),
    responses(
        (status = 200, description = "Event"),
        (status = 404, description = "Event not found")
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<LangQuery>,
) -> ApiResult<Json<Document>> {
    document_by_slug(&state, Collection::Events, &slug, query.lang.as_deref()).await
}

/// list_projects
///
/// [Public Route] Investment projects. `stage` and `industry` combine when both
/// are given.
#[utoipa::path(
    get,
    path = "/api/projects",
    params(ProjectQuery),
    responses((status = 200, description = "Investment projects"))
)]
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    let filter = Filter::new()
        .eq_opt("stage", query.stage.as_deref())
        .eq_opt("industry", query.industry.as_deref());
    list_documents(&state, Collection::Projects, filter, query.lang.as_deref()).await
}

#[utoipa::path(
    get,
    path = "/api/projects/{slug}",
    params(("slug" = String, Path, description = "Project slug"), LangQuery),
    responses(
        (status = 200, description = "Investment project"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn get_project(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<LangQuery>,
) -> ApiResult<Json<Document>> {
    document_by_slug(&state, Collection::Projects, &slug, query.lang.as_deref()).await
}

/// list_partners
///
/// [Public Route] Partners. `category` matches any entry of the partner's
/// `categories` list.
#[utoipa::path(
    get,
    path = "/api/partners",
    params(CategoryQuery),
    responses((status = 200, description = "Partners"))
)]
pub async fn list_partners(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    let filter = Filter::new().contains_opt("categories", query.category.as_deref());
    list_documents(&state, Collection::Partners, filter, query.lang.as_deref()).await
}

#[utoipa::path(
    get,
    path = "/api/partners/{slug}",
    params(("slug" = String, Path, description = "Partner slug"), LangQuery),
    responses(
        (status = 200, description = "Partner"),
        (status = 404, description = "Partner not found")
    )
)]
pub async fn get_partner(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<LangQuery>,
) -> ApiResult<Json<Document>> {
    document_by_slug(&state, Collection::Partners, &slug, query.lang.as_deref()).await
}

#[utoipa::path(
    get,
    path = "/api/articles",
    params(CategoryQuery),
    responses((status = 200, description = "Articles"))
)]
pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    let filter = Filter::new().eq_opt("category", query.category.as_deref());
    list_documents(&state, Collection::Articles, filter, query.lang.as_deref()).await
}

#[utoipa::path(
    get,
    path = "/api/articles/{slug}",
    params(("slug" = String, Path, description = "Article slug"), LangQuery),
    responses(
        (status = 200, description = "Article"),
        (status = 404, description = "Article not found")
    )
)]
pub async fn get_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<LangQuery>,
) -> ApiResult<Json<Document>> {
    document_by_slug(&state, Collection::Articles, &slug, query.lang.as_deref()).await
}

#[utoipa::path(
    get,
    path = "/api/team",
    params(LangQuery),
    responses((status = 200, description = "Team members"))
)]
pub async fn list_team(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    list_documents(&state, Collection::Team, Filter::new(), query.lang.as_deref()).await
}

/// get_page
///
/// [Public Route] A static HTML page (privacy, terms, nda, download).
#[utoipa::path(
    get,
    path = "/api/pages/{slug}",
    params(("slug" = String, Path, description = "Page slug"), LangQuery),
    responses(
        (status = 200, description = "Static page"),
        (status = 404, description = "Page not found")
    )
)]
pub async fn get_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<LangQuery>,
) -> ApiResult<Json<Document>> {
    document_by_slug(&state, Collection::Pages, &slug, query.lang.as_deref()).await
}

/// list_dynamic_pages
///
/// [Public Route] Index of block-built pages: slug and titles only, for menus
/// and the admin page picker.
#[utoipa::path(
    get,
    path = "/api/pages-dynamic",
    params(LangQuery),
    responses((status = 200, description = "Dynamic page index"))
)]
pub async fn list_dynamic_pages(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    let docs = state
        .repo
        .find(
            Collection::DynamicPages.store_name(),
            &Filter::new(),
            FindOptions::limit(LIST_LIMIT),
        )
        .await?;

    let mut index: Vec<Document> = docs
        .into_iter()
        .map(|doc| {
            doc.into_iter()
                .filter(|(key, _)| matches!(key.as_str(), "id" | "slug" | "title" | "title_en"))
                .collect()
        })
        .collect();
    for doc in index.iter_mut() {
        localize_with(
            &state,
            query.lang.as_deref(),
            &localize::DYNAMIC_PAGE_SCHEMA,
            doc,
        )
        .await;
    }
    Ok(Json(index))
}

/// get_dynamic_page
///
/// [Public Route] A full dynamic page with its blocks. With `lang=en` every
/// block gets its English fields filled according to its type.
#[utoipa::path(
    get,
    path = "/api/pages-dynamic/{slug}",
    params(("slug" = String, Path, description = "Page slug"), LangQuery),
    responses(
        (status = 200, description = "Dynamic page"),
        (status = 404, description = "Page not found")
    )
)]
pub async fn get_dynamic_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<LangQuery>,
) -> ApiResult<Json<Document>> {
    document_by_slug(&state, Collection::DynamicPages, &slug, query.lang.as_deref()).await
}

#[utoipa::path(
    get,
    path = "/api/forms/{slug}",
    params(("slug" = String, Path, description = "Form slug"), LangQuery),
    responses(
        (status = 200, description = "Form definition"),
        (status = 404, description = "Form not found")
    )
)]
pub async fn get_form(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<LangQuery>,
) -> ApiResult<Json<Document>> {
    document_by_slug(&state, Collection::Forms, &slug, query.lang.as_deref()).await
}

/// submit_form
///
/// [Public Route] Validates a submission against the form definition and stores
/// the accepted values in `form_submissions`.
#[utoipa::path(
    post,
    path = "/api/forms/{slug}/submit",
    params(("slug" = String, Path, description = "Form slug")),
    responses(
        (status = 201, description = "Submission stored", body = FormSubmission),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Form not found")
    )
)]
pub async fn submit_form(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<Map<String, Value>>,
) -> ApiResult<(StatusCode, Json<FormSubmission>)> {
    let doc = state
        .repo
        .find_one(Collection::Forms.store_name(), &Filter::by_slug(&slug))
        .await?
        .ok_or_else(|| ApiError::NotFound(Collection::Forms.not_found_message().to_string()))?;
    let form: Form = serde_json::from_value(Value::Object(doc))
        .map_err(|e| ApiError::Internal(format!("stored form '{slug}' is malformed: {e}")))?;

    let submission = FormSubmission {
        id: Uuid::new_v4().to_string(),
        form_slug: slug,
        data: clean_submission(&form, &payload)?,
        created_at: now(),
    };
    state
        .repo
        .insert(FORM_SUBMISSIONS, to_document(&submission)?)
        .await?;

    tracing::info!(form = %submission.form_slug, "form submission stored");
    Ok((StatusCode::CREATED, Json(submission)))
}

/// submit_contact
///
/// [Public Route] Stores a contact request from the site's contact form.
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactFormData,
    responses(
        (status = 200, description = "Contact request stored", body = ContactSubmission),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactFormData>,
) -> ApiResult<Json<ContactSubmission>> {
    payload.validate()?;

    let contact = ContactSubmission {
        id: Uuid::new_v4().to_string(),
        name: payload.name,
        email: payload.email,
        company: payload.company,
        phone: payload.phone,
        service: payload.service,
        message: payload.message,
        created_at: now(),
    };
    state.repo.insert(CONTACT_FORMS, to_document(&contact)?).await?;

    tracing::info!(contact_id = %contact.id, "contact request stored");
    Ok(Json(contact))
}

/// get_settings
///
/// [Public Route] Site theme, menu and footer. Falls back to the built-in
/// defaults until an admin saves settings.
#[utoipa::path(
    get,
    path = "/api/settings",
    params(LangQuery),
    responses((status = 200, description = "Site settings", body = SiteSettings))
)]
pub async fn get_settings(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
) -> ApiResult<Json<Document>> {
    let mut doc = match state.repo.find_one(SETTINGS, &Filter::by_id(SETTINGS_ID)).await? {
        Some(mut doc) => {
            doc.remove("id");
            doc
        }
        None => to_document(&SiteSettings::default())?,
    };
    localize_with(&state, query.lang.as_deref(), &localize::SETTINGS_SCHEMA, &mut doc).await;
    Ok(Json(doc))
}

/// list_fonts
///
/// [Public Route] Web fonts available to the theme editor.
#[utoipa::path(
    get,
    path = "/api/fonts",
    responses((status = 200, description = "Font catalog", body = [FontEntry]))
)]
pub async fn list_fonts(State(state): State<AppState>) -> Json<Vec<FontEntry>> {
    Json(fonts::scan_fonts(&state.config.fonts_dir).await)
}
