use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

// --- Users & Auth ---

/// Role
///
/// `superadmin` can do everything `admin` can, plus manage users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    Admin,
    Superadmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        }
    }
}

/// User
///
/// The stored account record in the `users` collection. Never returned directly;
/// responses use `UserProfile`, which has no password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub created_at: String,
}

/// UserProfile
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub created_at: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema)]
#[ts(export)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub new_password: String,
}

/// CreateUserRequest
///
/// Superadmin-only payload for creating another account.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema)]
#[ts(export)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 64, message = "username must be 3-64 characters"))]
    pub username: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

// --- Contact & Forms ---

/// ContactFormData
///
/// Payload of the public contact form (POST /api/contact).
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema)]
#[ts(export)]
pub struct ContactFormData {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    #[validate(length(min = 1, message = "message is required"))]
    pub message: String,
}

/// ContactSubmission
///
/// A stored contact request, as returned to the sender and to admins.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ContactSubmission {
    pub id: String,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub message: String,
    pub created_at: String,
}

/// FormSubmission
///
/// One submission of a dynamic form, keyed by field id.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FormSubmission {
    pub id: String,
    pub form_slug: String,
    #[ts(type = "Record<string, unknown>")]
    #[schema(value_type = Object)]
    pub data: Map<String, Value>,
    pub created_at: String,
}

// --- Media & Fonts ---

/// MediaRecord
///
/// Metadata recorded for every uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MediaRecord {
    pub id: String,
    /// The client-side file name, as uploaded.
    pub filename: String,
    /// Object key inside the blob store.
    pub key: String,
    pub url: String,
    pub content_type: String,
    pub size: u64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct FontEntry {
    pub family: String,
    pub weight: u16,
    pub style: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// --- Site settings ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct Theme {
    #[validate(length(min = 1))]
    pub primary_color: String,
    #[validate(length(min = 1))]
    pub accent_color: String,
    #[validate(length(min = 1))]
    pub background_color: String,
    pub heading_font: String,
    pub body_font: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_color: "#E11D2E".to_string(),
            accent_color: "#ea6d57".to_string(),
            background_color: "#09090b".to_string(),
            heading_font: "Montserrat".to_string(),
            body_font: "Inter".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct MenuItem {
    #[validate(length(min = 1, message = "menu label is required"))]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_en: Option<String>,
    #[validate(length(min = 1, message = "menu href is required"))]
    pub href: String,
}

/// SiteSettings
///
/// Site-wide theme, navigation menu and footer, stored as the single `site`
/// document of the `settings` collection.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct SiteSettings {
    #[validate(length(min = 1))]
    pub site_name: String,
    #[validate(nested)]
    #[serde(default)]
    pub theme: Theme,
    #[validate(nested)]
    #[serde(default)]
    pub menu: Vec<MenuItem>,
    #[serde(default)]
    pub footer_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer_text_en: Option<String>,
    #[serde(default)]
    #[ts(type = "Record<string, unknown>")]
    #[schema(value_type = Object)]
    pub contacts: Map<String, Value>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        let item = |label: &str, label_en: &str, href: &str| MenuItem {
            label: label.to_string(),
            label_en: Some(label_en.to_string()),
            href: href.to_string(),
        };
        Self {
            site_name: "AICHIN GROUP".to_string(),
            theme: Theme::default(),
            menu: vec![
                item("Главная", "Home", "/"),
                item("О нас", "About", "/about"),
                item("Услуги", "Services", "/services"),
                item("Кейсы", "Cases", "/cases"),
                item("Мероприятия", "Events", "/events"),
                item("Инвестиции", "Invest", "/invest"),
                item("Партнеры", "Partners", "/partners"),
                item("Контакты", "Contact", "/contact"),
            ],
            footer_text: String::new(),
            footer_text_en: None,
            contacts: Map::new(),
        }
    }
}

// --- Query parameters ---

/// LangQuery
///
/// `?lang=en` asks the read path to fill in missing English fields.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct LangQuery {
    /// `ru` (default) or `en`.
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct CategoryQuery {
    pub lang: Option<String>,
    /// Exact category to filter on.
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ProjectQuery {
    pub lang: Option<String>,
    pub stage: Option<String>,
    pub industry: Option<String>,
}

// --- Content shapes (admin write validation) ---
//
// Stored documents stay schemaless; these shapes only gate what admins may write.
// Unknown fields, including `_en` counterparts, pass through untouched.

#[derive(Debug, Deserialize, Validate)]
pub struct Service {
    #[validate(length(min = 1))]
    pub slug: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CaseStudy {
    #[validate(length(min = 1))]
    pub slug: String,
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub client: String,
    #[validate(length(min = 1))]
    pub category: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1))]
    pub challenge: String,
    #[validate(length(min = 1))]
    pub solution: String,
    #[serde(default)]
    pub results: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct Event {
    #[validate(length(min = 1))]
    pub slug: String,
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub date: String,
    #[validate(length(min = 1))]
    pub location: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub event_type: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[serde(default)]
    pub program: Vec<Map<String, Value>>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InvestmentProject {
    #[validate(length(min = 1))]
    pub slug: String,
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1))]
    pub stage: String,
    #[validate(length(min = 1))]
    pub industry: String,
    #[validate(length(min = 1))]
    pub country: String,
    #[validate(length(min = 1))]
    pub capital_required: String,
    #[validate(length(min = 1))]
    pub timeline: String,
    #[validate(length(min = 1))]
    pub status: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct Partner {
    #[validate(length(min = 1))]
    pub slug: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1))]
    pub country: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct Article {
    #[validate(length(min = 1))]
    pub slug: String,
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub excerpt: String,
    #[validate(length(min = 1))]
    pub content: String,
    #[validate(length(min = 1))]
    pub author: String,
    #[validate(length(min = 1))]
    pub published_at: String,
    #[validate(length(min = 1))]
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TeamMember {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub position: String,
    #[validate(length(min = 1))]
    pub bio: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
}

/// StaticPage
///
/// A legal or download page with HTML content (privacy, terms, nda, download).
#[derive(Debug, Deserialize, Validate)]
pub struct StaticPage {
    #[validate(length(min = 1))]
    pub slug: String,
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DynamicPage {
    #[validate(length(min = 1))]
    pub slug: String,
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    pub hide_title: bool,
    #[serde(default)]
    pub full_width: bool,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

/// Block
///
/// One content block of a dynamic page, tagged by `type`. Only the fields that
/// need checking are modeled; presentation flags pass through.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Hero(HeroBlock),
    Text(TextBlock),
    Image(ImageBlock),
    Cards(ItemsBlock),
    Stats(ItemsBlock),
    List(ListBlock),
    Cta(CtaBlock),
    Collection(CollectionBlock),
    Html(HtmlBlock),
    Gallery(MediaListBlock),
    Video(VideoBlock),
    Form(FormBlock),
    LogoGrid(MediaListBlock),
    Marquee(MediaListBlock),
    Spacer(SpacerBlock),
}

#[derive(Debug, Deserialize)]
pub struct HeroBlock {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub cta_label: Option<String>,
    #[serde(default)]
    pub cta_href: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub heading: Option<String>,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageBlock {
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
}

/// Shared by `cards` and `stats`: a titled list of objects.
#[derive(Debug, Deserialize)]
pub struct ItemsBlock {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub items: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub struct ListBlock {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub items_en: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CtaBlock {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub button_label: Option<String>,
    #[serde(default)]
    pub button_href: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionBlock {
    #[serde(default)]
    pub title: Option<String>,
    pub collection: String,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub detail_prefix: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HtmlBlock {
    pub html: String,
}

#[derive(Debug, Deserialize)]
pub struct MediaListBlock {
    #[serde(default)]
    pub items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct VideoBlock {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FormBlock {
    pub form_slug: String,
}

#[derive(Debug, Deserialize)]
pub struct SpacerBlock {
    #[serde(default)]
    pub size: Option<Value>,
}

/// FormFieldType
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FormFieldType {
    #[default]
    Text,
    Email,
    Tel,
    Textarea,
    Select,
    Number,
    Checkbox,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct FormField {
    #[validate(length(min = 1, message = "field id is required"))]
    pub id: String,
    #[serde(rename = "type", default)]
    pub field_type: FormFieldType,
    #[validate(length(min = 1, message = "field label is required"))]
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub options_en: Vec<String>,
}

/// Form
///
/// A site form definition rendered by the front end and validated on submit.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct Form {
    #[validate(length(min = 1))]
    pub slug: String,
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    pub submit_message: Option<String>,
    #[validate(nested)]
    #[serde(default)]
    pub fields: Vec<FormField>,
}
