//! HTTP handlers, grouped by audience: public site content, authentication,
//! admin editing, and media uploads.

pub mod admin;
pub mod auth;
pub mod content;
pub mod media;

use serde::Serialize;
use serde_json::Value;

use crate::{
    AppState,
    collections::Collection,
    error::{ApiError, ApiResult},
    localize::{DocSchema, Localizer},
    repository::Document,
};

/// Upper bound for public list endpoints.
pub const LIST_LIMIT: usize = 100;

pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub(crate) fn to_document<T: Serialize>(value: &T) -> ApiResult<Document> {
    match serde_json::to_value(value) {
        Ok(Value::Object(doc)) => Ok(doc),
        Ok(_) => Err(ApiError::Internal("value did not encode to an object".to_string())),
        Err(e) => Err(ApiError::Internal(format!("failed to encode document: {e}"))),
    }
}

/// Whether the request asked for English and translation is switched on.
fn wants_english(state: &AppState, lang: Option<&str>) -> bool {
    state.config.translate_enabled && lang == Some("en")
}

/// localize_documents
///
/// Fills missing English fields on documents of `collection` when the request
/// asked for `lang=en`. A no-op otherwise.
pub(crate) async fn localize_documents(
    state: &AppState,
    lang: Option<&str>,
    collection: Collection,
    docs: &mut [Document],
) {
    if !wants_english(state, lang) {
        return;
    }
    let localizer = Localizer::new(state.translator.as_ref());
    for doc in docs.iter_mut() {
        match collection {
            Collection::DynamicPages => localizer.localize_dynamic_page(doc).await,
            other => localizer.localize(doc, other.schema()).await,
        }
    }
}

pub(crate) async fn localize_with(
    state: &AppState,
    lang: Option<&str>,
    schema: &DocSchema,
    doc: &mut Document,
) {
    if wants_english(state, lang) {
        Localizer::new(state.translator.as_ref())
            .localize(doc, schema)
            .await;
    }
}
