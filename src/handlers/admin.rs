use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use super::now;
use crate::{
    AppState,
    auth::{AuthUser, find_user, hash_password, store_user, user_from_document},
    collections::{
        CONTACT_FORMS, Collection, FORM_SUBMISSIONS, SETTINGS, SETTINGS_ID, USERS,
        check_translation_pairs, clear_stale_translations,
    },
    error::{ApiError, ApiResult},
    models::{CreateUserRequest, MessageResponse, SiteSettings, User, UserProfile},
    repository::{Document, Filter, FindOptions, RepoError},
};

fn into_object(body: Value) -> ApiResult<Document> {
    match body {
        Value::Object(doc) => Ok(doc),
        _ => Err(ApiError::BadRequest("request body must be a JSON object".to_string())),
    }
}

fn has_id(doc: &Document) -> bool {
    matches!(doc.get("id"), Some(Value::String(id)) if !id.is_empty())
}

// --- Content CRUD ---

async fn create_in(
    state: &AppState,
    user: &AuthUser,
    collection: Collection,
    body: Value,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let mut doc = into_object(body)?;
    collection.validate(&doc)?;

    if !has_id(&doc) {
        doc.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
    }
    let stamp = Value::String(now());
    doc.entry("created_at").or_insert_with(|| stamp.clone());
    doc.insert("updated_at".to_string(), stamp);

    let stored = state.repo.insert(collection.store_name(), doc).await?;
    tracing::info!(
        collection = collection.store_name(),
        id = ?stored.get("id"),
        by = %user.username,
        "document created"
    );
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn update_in(
    state: &AppState,
    user: &AuthUser,
    collection: Collection,
    id: &str,
    body: Value,
) -> ApiResult<Json<Document>> {
    let mut patch = into_object(body)?;
    collection.validate(&patch)?;

    patch.remove("id");
    patch.remove("created_at");

    let filter = Filter::by_id(id);
    let stored = state
        .repo
        .find_one(collection.store_name(), &filter)
        .await?
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;
    clear_stale_translations(&mut patch, &stored);
    patch.insert("updated_at".to_string(), Value::String(now()));

    let updated = state
        .repo
        .update(collection.store_name(), &filter, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    tracing::info!(
        collection = collection.store_name(),
        id,
        by = %user.username,
        "document updated"
    );
    Ok(Json(updated))
}

async fn delete_in(
    state: &AppState,
    user: &AuthUser,
    collection: Collection,
    id: &str,
) -> ApiResult<Json<MessageResponse>> {
    let deleted = state
        .repo
        .delete(collection.store_name(), &Filter::by_id(id))
        .await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Document not found".to_string()));
    }

    tracing::info!(
        collection = collection.store_name(),
        id,
        by = %user.username,
        "document deleted"
    );
    Ok(Json(MessageResponse::new("Deleted")))
}

/// list_documents
///
/// [Admin Route] Every document of a collection, untranslated and unpaged.
#[utoipa::path(
    get,
    path = "/api/admin/{collection}",
    params(("collection" = String, Path, description = "Collection segment, e.g. services or pages-dynamic")),
    responses(
        (status = 200, description = "Documents"),
        (status = 404, description = "Unknown collection")
    )
)]
pub async fn list_documents(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(segment): Path<String>,
) -> ApiResult<Json<Vec<Document>>> {
    let collection: Collection = segment.parse()?;
    let docs = state
        .repo
        .find(collection.store_name(), &Filter::new(), FindOptions::default())
        .await?;
    Ok(Json(docs))
}

/// create_document
///
/// [Admin Route] Validates and inserts a content document. A missing `id` is
/// generated.
#[utoipa::path(
    post,
    path = "/api/admin/{collection}",
    params(("collection" = String, Path, description = "Collection segment")),
    responses(
        (status = 201, description = "Created"),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Unknown collection"),
        (status = 409, description = "Duplicate id or slug")
    )
)]
pub async fn create_document(
    user: AuthUser,
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let collection: Collection = segment.parse()?;
    create_in(&state, &user, collection, body).await
}

/// update_document
///
/// [Admin Route] Validates the full document and merges it into the stored one.
/// The stored `id` never changes.
#[utoipa::path(
    put,
    path = "/api/admin/{collection}/{id}",
    params(
        ("collection" = String, Path, description = "Collection segment"),
        ("id" = String, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Slug already taken")
    )
)]
pub async fn update_document(
    user: AuthUser,
    State(state): State<AppState>,
    Path((segment, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Document>> {
    let collection: Collection = segment.parse()?;
    update_in(&state, &user, collection, &id, body).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/{collection}/{id}",
    params(
        ("collection" = String, Path, description = "Collection segment"),
        ("id" = String, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_document(
    user: AuthUser,
    State(state): State<AppState>,
    Path((segment, id)): Path<(String, String)>,
) -> ApiResult<Json<MessageResponse>> {
    let collection: Collection = segment.parse()?;
    delete_in(&state, &user, collection, &id).await
}

// Forms share their URL prefix with `/admin/forms/{id}/submissions`, so they get
// explicit routes instead of the generic `/{collection}` ones.

pub async fn list_forms(
    user: AuthUser,
    state: State<AppState>,
) -> ApiResult<Json<Vec<Document>>> {
    list_documents(user, state, Path(Collection::Forms.segment().to_string())).await
}

pub async fn create_form(
    user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    create_in(&state, &user, Collection::Forms, body).await
}

pub async fn update_form(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Document>> {
    update_in(&state, &user, Collection::Forms, &id, body).await
}

pub async fn delete_form(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    delete_in(&state, &user, Collection::Forms, &id).await
}

// --- Inbox ---

/// list_contacts
///
/// [Admin Route] Contact requests, newest first.
#[utoipa::path(
    get,
    path = "/api/admin/contacts",
    responses((status = 200, description = "Contact requests", body = [crate::models::ContactSubmission]))
)]
pub async fn list_contacts(
    _user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Document>>> {
    let contacts = state
        .repo
        .find(CONTACT_FORMS, &Filter::new(), FindOptions::default().newest_first())
        .await?;
    Ok(Json(contacts))
}

#[utoipa::path(
    get,
    path = "/api/admin/forms/{slug}/submissions",
    params(("slug" = String, Path, description = "Form slug")),
    responses((status = 200, description = "Submissions", body = [crate::models::FormSubmission]))
)]
pub async fn list_form_submissions(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Vec<Document>>> {
    let submissions = state
        .repo
        .find(
            FORM_SUBMISSIONS,
            &Filter::new().eq("form_slug", slug.as_str()),
            FindOptions::default().newest_first(),
        )
        .await?;
    Ok(Json(submissions))
}

// --- Settings ---

/// update_settings
///
/// [Admin Route] Replaces the site settings document.
#[utoipa::path(
    put,
    path = "/api/admin/settings",
    request_body = SiteSettings,
    responses(
        (status = 200, description = "Saved settings", body = SiteSettings),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn update_settings(
    user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Document>> {
    let doc = into_object(body)?;
    check_translation_pairs(&doc, "")?;
    let settings: SiteSettings = serde_json::from_value(Value::Object(doc.clone()))
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    settings.validate()?;

    let mut stored = state.repo.upsert(SETTINGS, SETTINGS_ID, doc).await?;
    stored.remove("id");

    tracing::info!(by = %user.username, "site settings updated");
    Ok(Json(stored))
}

// --- Users (superadmin only) ---

#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "Users", body = [UserProfile]),
        (status = 403, description = "Not a superadmin")
    )
)]
pub async fn list_users(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<UserProfile>>> {
    user.require_superadmin()?;

    let users = state
        .repo
        .find(USERS, &Filter::new(), FindOptions::default())
        .await?
        .into_iter()
        .filter_map(user_from_document)
        .map(UserProfile::from)
        .collect();
    Ok(Json(users))
}

/// create_user
///
/// [Superadmin Route] Adds an admin or superadmin account.
#[utoipa::path(
    post,
    path = "/api/admin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserProfile),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not a superadmin"),
        (status = 409, description = "Username taken")
    )
)]
pub async fn create_user(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    user.require_superadmin()?;
    payload.validate()?;

    let username = payload.username.trim().to_string();
    if find_user(&state.repo, &Filter::new().eq("username", username.as_str()))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }

    let new_user = User {
        id: Uuid::new_v4().to_string(),
        username,
        password_hash: hash_password(&payload.password)?,
        role: payload.role,
        created_at: now(),
    };
    match store_user(&state.repo, &new_user).await {
        Err(ApiError::Repository(RepoError::Conflict(_))) => {
            return Err(ApiError::Conflict("Username already exists".to_string()));
        }
        other => other?,
    }

    tracing::info!(
        user_id = %new_user.id,
        role = new_user.role.as_str(),
        by = %user.username,
        "user created"
    );
    Ok((StatusCode::CREATED, Json(new_user.into())))
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 400, description = "Cannot delete yourself"),
        (status = 403, description = "Not a superadmin"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    user.require_superadmin()?;
    if user.id == id {
        return Err(ApiError::BadRequest("You cannot delete yourself".to_string()));
    }

    if state.repo.delete(USERS, &Filter::by_id(&id)).await? == 0 {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %id, by = %user.username, "user deleted");
    Ok(Json(MessageResponse::new("Deleted")))
}
