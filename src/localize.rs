use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{repository::Document, translation::Translator};

/// Nested
///
/// An array of objects inside a document whose items carry their own
/// translatable fields (event program entries, cards, form fields).
#[derive(Debug)]
pub struct Nested {
    pub field: &'static str,
    pub fields: &'static [&'static str],
    pub lists: &'static [&'static str],
}

/// DocSchema
///
/// Which fields of a document get an English counterpart: plain strings
/// (`fields`), string arrays (`lists`) and arrays of objects (`nested`).
#[derive(Debug)]
pub struct DocSchema {
    pub fields: &'static [&'static str],
    pub lists: &'static [&'static str],
    pub nested: &'static [Nested],
}

impl DocSchema {
    pub const fn scalars(fields: &'static [&'static str]) -> Self {
        Self {
            fields,
            lists: &[],
            nested: &[],
        }
    }
}

pub static SERVICE_SCHEMA: DocSchema = DocSchema {
    fields: &["name", "description"],
    lists: &["features"],
    nested: &[],
};

pub static CASE_SCHEMA: DocSchema = DocSchema {
    fields: &["title", "description", "challenge", "solution"],
    lists: &["results"],
    nested: &[],
};

pub static EVENT_SCHEMA: DocSchema = DocSchema {
    fields: &["title", "location", "description"],
    lists: &[],
    nested: &[Nested {
        field: "program",
        fields: &["title", "description"],
        lists: &[],
    }],
};

pub static PROJECT_SCHEMA: DocSchema = DocSchema::scalars(&["title", "description", "timeline"]);
pub static PARTNER_SCHEMA: DocSchema = DocSchema::scalars(&["name", "description", "country"]);
pub static ARTICLE_SCHEMA: DocSchema = DocSchema::scalars(&["title", "excerpt", "content"]);
pub static TEAM_SCHEMA: DocSchema = DocSchema::scalars(&["name", "position", "bio"]);
pub static PAGE_SCHEMA: DocSchema = DocSchema::scalars(&["title", "content"]);
pub static DYNAMIC_PAGE_SCHEMA: DocSchema = DocSchema::scalars(&["title"]);

pub static FORM_SCHEMA: DocSchema = DocSchema {
    fields: &["title", "submit_message"],
    lists: &[],
    nested: &[Nested {
        field: "fields",
        fields: &["label", "placeholder"],
        lists: &["options"],
    }],
};

pub static SETTINGS_SCHEMA: DocSchema = DocSchema {
    fields: &["footer_text"],
    lists: &[],
    nested: &[Nested {
        field: "menu",
        fields: &["label"],
        lists: &[],
    }],
};

static HERO_BLOCK: DocSchema = DocSchema::scalars(&["title", "subtitle", "cta_label"]);
static TEXT_BLOCK: DocSchema = DocSchema::scalars(&["heading", "body"]);
static IMAGE_BLOCK: DocSchema = DocSchema::scalars(&["caption", "alt"]);
static CARDS_BLOCK: DocSchema = DocSchema {
    fields: &["title"],
    lists: &[],
    nested: &[Nested {
        field: "items",
        fields: &["title", "description"],
        lists: &[],
    }],
};
static STATS_BLOCK: DocSchema = DocSchema {
    fields: &["title"],
    lists: &[],
    nested: &[Nested {
        field: "items",
        fields: &["label"],
        lists: &[],
    }],
};
static LIST_BLOCK: DocSchema = DocSchema {
    fields: &["title"],
    lists: &["items"],
    nested: &[],
};
static CTA_BLOCK: DocSchema = DocSchema::scalars(&["title", "body", "button_label"]);
static COLLECTION_BLOCK: DocSchema = DocSchema::scalars(&["title"]);
static HTML_BLOCK: DocSchema = DocSchema::scalars(&["html"]);
static VIDEO_BLOCK: DocSchema = DocSchema::scalars(&["title", "caption"]);
static NO_TEXT: DocSchema = DocSchema::scalars(&[]);

/// block_schema
///
/// Translatable fields for a dynamic-page block type. `None` for unknown types,
/// which are passed through untouched.
pub fn block_schema(block_type: &str) -> Option<&'static DocSchema> {
    let schema = match block_type {
        "hero" => &HERO_BLOCK,
        "text" => &TEXT_BLOCK,
        "image" => &IMAGE_BLOCK,
        "cards" => &CARDS_BLOCK,
        "stats" => &STATS_BLOCK,
        "list" => &LIST_BLOCK,
        "cta" => &CTA_BLOCK,
        "collection" => &COLLECTION_BLOCK,
        "html" => &HTML_BLOCK,
        "video" => &VIDEO_BLOCK,
        "gallery" | "form" | "logo_grid" | "marquee" | "spacer" => &NO_TEXT,
        _ => return None,
    };
    Some(schema)
}

fn en_key(field: &str) -> String {
    format!("{field}_en")
}

fn has_text(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if !s.trim().is_empty())
}

fn has_items(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Array(items)) if !items.is_empty())
}

/// Localizer
///
/// Fills missing `<field>_en` values on a document read from the store, using a
/// ru → en translator. Existing English values are never overwritten and a failed
/// translation falls back to the original text, so a read never fails because the
/// translation service is down.
///
/// One localizer serves one request. After the first failed call it stops asking
/// the translator and copies source text for the rest of the request.
pub struct Localizer<'a> {
    translator: &'a dyn Translator,
    failed: AtomicBool,
}

impl<'a> Localizer<'a> {
    pub fn new(translator: &'a dyn Translator) -> Self {
        Self {
            translator,
            failed: AtomicBool::new(false),
        }
    }

    pub async fn localize(&self, doc: &mut Document, schema: &DocSchema) {
        for field in schema.fields {
            self.fill_scalar(doc, field).await;
        }
        for field in schema.lists {
            self.fill_list(doc, field).await;
        }
        for nested in schema.nested {
            let Some(Value::Array(items)) = doc.get_mut(nested.field) else {
                continue;
            };
            for item in items.iter_mut() {
                let Value::Object(obj) = item else {
                    continue;
                };
                for field in nested.fields {
                    self.fill_scalar(obj, field).await;
                }
                for field in nested.lists {
                    self.fill_list(obj, field).await;
                }
            }
        }
    }

    /// Page-level fields first, then every block by its `type`.
    pub async fn localize_dynamic_page(&self, doc: &mut Document) {
        self.localize(doc, &DYNAMIC_PAGE_SCHEMA).await;

        let Some(Value::Array(blocks)) = doc.get_mut("blocks") else {
            return;
        };
        for block in blocks.iter_mut() {
            let Value::Object(block) = block else {
                continue;
            };
            let schema = block
                .get("type")
                .and_then(Value::as_str)
                .and_then(block_schema);
            if let Some(schema) = schema {
                self.localize(block, schema).await;
            }
        }
    }

    async fn fill_scalar(&self, obj: &mut Document, field: &str) {
        let key = en_key(field);
        if has_text(obj.get(&key)) {
            return;
        }
        let Some(source) = obj.get(field).and_then(Value::as_str) else {
            return;
        };
        if source.trim().is_empty() {
            return;
        }
        let source = source.to_string();
        let translated = self.text(&source).await;
        obj.insert(key, Value::String(translated));
    }

    async fn fill_list(&self, obj: &mut Document, field: &str) {
        let key = en_key(field);
        if has_items(obj.get(&key)) {
            return;
        }
        let Some(Value::Array(items)) = obj.get(field) else {
            return;
        };
        if items.is_empty() {
            return;
        }
        let items = items.clone();

        let mut translated = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::String(s) => translated.push(Value::String(self.text(&s).await)),
                other => translated.push(other),
            }
        }
        obj.insert(key, Value::Array(translated));
    }

    async fn text(&self, source: &str) -> String {
        if source.trim().is_empty() || self.failed.load(Ordering::Relaxed) {
            return source.to_string();
        }
        match self.translator.translate(source, "ru", "en").await {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!("translation failed, keeping original text for this request: {}", e);
                self.failed.store(true, Ordering::Relaxed);
                source.to_string()
            }
        }
    }
}
