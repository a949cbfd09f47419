use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{collections::HashSet, str::FromStr};
use validator::Validate;

use crate::{
    error::{ApiError, ApiResult},
    localize::{self, DocSchema},
    models::{
        Article, Block, CaseStudy, DynamicPage, Event, Form, InvestmentProject, Partner, Service,
        StaticPage, TeamMember,
    },
    repository::Document,
};

// Store names of the non-content collections.
pub const CONTACT_FORMS: &str = "contact_forms";
pub const FORM_SUBMISSIONS: &str = "form_submissions";
pub const MEDIA: &str = "media";
pub const SETTINGS: &str = "settings";
pub const USERS: &str = "users";

/// Id of the single document in `settings`.
pub const SETTINGS_ID: &str = "site";

/// Collection
///
/// The editable content collections. Each maps to a store name, a URL segment
/// under `/api/admin`, a write-validation shape and a translation schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Services,
    Cases,
    Events,
    Projects,
    Partners,
    Articles,
    Team,
    Pages,
    DynamicPages,
    Forms,
}

impl Collection {
    pub const ALL: [Collection; 10] = [
        Collection::Services,
        Collection::Cases,
        Collection::Events,
        Collection::Projects,
        Collection::Partners,
        Collection::Articles,
        Collection::Team,
        Collection::Pages,
        Collection::DynamicPages,
        Collection::Forms,
    ];

    pub fn store_name(&self) -> &'static str {
        match self {
            Collection::Services => "services",
            Collection::Cases => "cases",
            Collection::Events => "events",
            Collection::Projects => "projects",
            Collection::Partners => "partners",
            Collection::Articles => "articles",
            Collection::Team => "team",
            Collection::Pages => "pages",
            Collection::DynamicPages => "pages_dynamic",
            Collection::Forms => "forms",
        }
    }

    pub fn segment(&self) -> &'static str {
        match self {
            Collection::DynamicPages => "pages-dynamic",
            other => other.store_name(),
        }
    }

    /// Detail text of the 404 returned by the public slug lookup.
    pub fn not_found_message(&self) -> &'static str {
        match self {
            Collection::Services => "Service not found",
            Collection::Cases => "Case not found",
            Collection::Events => "Event not found",
            Collection::Projects => "Project not found",
            Collection::Partners => "Partner not found",
            Collection::Articles => "Article not found",
            Collection::Team => "Team member not found",
            Collection::Pages | Collection::DynamicPages => "Page not found",
            Collection::Forms => "Form not found",
        }
    }

    /// Collections a dynamic page may embed through a `collection` block: the
    /// ones with a public list endpoint.
    pub fn is_embeddable(&self) -> bool {
        !matches!(
            self,
            Collection::Pages | Collection::DynamicPages | Collection::Forms
        )
    }

    /// Translation schema for the collection. Dynamic pages additionally walk
    /// their blocks, see `Localizer::localize_dynamic_page`.
    pub fn schema(&self) -> &'static DocSchema {
        match self {
            Collection::Services => &localize::SERVICE_SCHEMA,
            Collection::Cases => &localize::CASE_SCHEMA,
            Collection::Events => &localize::EVENT_SCHEMA,
            Collection::Projects => &localize::PROJECT_SCHEMA,
            Collection::Partners => &localize::PARTNER_SCHEMA,
            Collection::Articles => &localize::ARTICLE_SCHEMA,
            Collection::Team => &localize::TEAM_SCHEMA,
            Collection::Pages => &localize::PAGE_SCHEMA,
            Collection::DynamicPages => &localize::DYNAMIC_PAGE_SCHEMA,
            Collection::Forms => &localize::FORM_SCHEMA,
        }
    }

    /// validate
    ///
    /// Checks an admin write against the collection's shape. The document is
    /// stored as sent; this only decides whether it is accepted.
    pub fn validate(&self, doc: &Document) -> ApiResult<()> {
        check_translation_pairs(doc, "")?;

        match self {
            Collection::Services => check_shape::<Service>(doc),
            Collection::Cases => check_shape::<CaseStudy>(doc),
            Collection::Events => check_shape::<Event>(doc),
            Collection::Projects => check_shape::<InvestmentProject>(doc),
            Collection::Partners => check_shape::<Partner>(doc),
            Collection::Articles => check_shape::<Article>(doc),
            Collection::Team => check_shape::<TeamMember>(doc),
            Collection::Pages => check_shape::<StaticPage>(doc),
            Collection::DynamicPages => {
                let page: DynamicPage = parse(doc)?;
                page.validate()?;
                page.blocks.iter().try_for_each(check_block)
            }
            Collection::Forms => {
                let form: Form = parse(doc)?;
                form.validate()?;
                let mut seen = HashSet::new();
                for field in &form.fields {
                    if !seen.insert(field.id.as_str()) {
                        return Err(ApiError::BadRequest(format!(
                            "duplicate form field id '{}'",
                            field.id
                        )));
                    }
                }
                Ok(())
            }
        }
    }
}

impl FromStr for Collection {
    type Err = ApiError;

    fn from_str(segment: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.segment() == segment || c.store_name() == segment)
            .ok_or_else(|| ApiError::NotFound("Collection not found".to_string()))
    }
}

fn parse<T: DeserializeOwned>(doc: &Document) -> ApiResult<T> {
    serde_json::from_value(Value::Object(doc.clone()))
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

fn check_shape<T: DeserializeOwned + Validate>(doc: &Document) -> ApiResult<()> {
    parse::<T>(doc)?.validate()?;
    Ok(())
}

fn check_block(block: &Block) -> ApiResult<()> {
    match block {
        Block::Collection(b) => {
            let target = b.collection.parse::<Collection>().ok();
            if !target.is_some_and(|c| c.is_embeddable()) {
                return Err(ApiError::BadRequest(format!(
                    "collection block references unknown collection '{}'",
                    b.collection
                )));
            }
        }
        Block::Text(b) if b.body.trim().is_empty() => {
            return Err(ApiError::BadRequest("text block body is required".to_string()));
        }
        Block::Image(b) if b.url.trim().is_empty() => {
            return Err(ApiError::BadRequest("image block url is required".to_string()));
        }
        Block::Form(b) if b.form_slug.trim().is_empty() => {
            return Err(ApiError::BadRequest("form block form_slug is required".to_string()));
        }
        Block::List(b) => {
            if let Some(items_en) = &b.items_en {
                if !items_en.is_empty() && items_en.len() != b.items.len() {
                    return Err(ApiError::BadRequest(
                        "list block items_en must match items".to_string(),
                    ));
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// check_translation_pairs
///
/// An English field `x_en` is only meaningful next to its source field `x`.
/// Walks the whole document, including blocks, cards and form fields.
pub fn check_translation_pairs(doc: &Document, path: &str) -> ApiResult<()> {
    for key in doc.keys() {
        let Some(base) = key.strip_suffix("_en") else {
            continue;
        };
        if !base.is_empty() && !doc.contains_key(base) {
            return Err(ApiError::BadRequest(format!(
                "'{path}{key}' has no source field '{base}'"
            )));
        }
    }

    for (key, value) in doc {
        match value {
            Value::Object(inner) => check_translation_pairs(inner, &format!("{path}{key}."))?,
            Value::Array(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if let Value::Object(inner) = item {
                        check_translation_pairs(inner, &format!("{path}{key}[{idx}]."))?;
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// clear_stale_translations
///
/// For every base field the patch changes without sending its `_en` partner,
/// sets the stored partner to null so the next English read translates the new
/// text instead of serving the old translation.
pub fn clear_stale_translations(patch: &mut Document, stored: &Document) {
    let stale: Vec<String> = patch
        .iter()
        .filter(|(key, value)| {
            !key.ends_with("_en") && stored.get(key.as_str()) != Some(*value)
        })
        .map(|(key, _)| format!("{key}_en"))
        .filter(|en| !patch.contains_key(en) && stored.get(en).is_some_and(|v| !v.is_null()))
        .collect();
    for key in stale {
        patch.insert(key, Value::Null);
    }
}
