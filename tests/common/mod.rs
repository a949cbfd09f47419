#![allow(dead_code)]

use aichin_backend::{
    AppConfig, AppState, InMemoryRepository, MockStorageService, MockTranslator,
    auth::{hash_password, issue_token, store_user},
    create_router,
    models::{Role, User},
    repository::{Document, RepositoryState},
    storage::StorageState,
    translation::TranslatorState,
};
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "correct-horse-battery";

/// TestApp
///
/// An application wired to the in-memory store and the mock blob store and
/// translator. The mocks are kept so tests can inspect them after a request.
pub struct TestApp {
    pub state: AppState,
    pub storage: MockStorageService,
    pub translator: Arc<MockTranslator>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(MockStorageService::new(), MockTranslator::new())
    }

    pub fn with_storage(storage: MockStorageService) -> Self {
        Self::build(storage, MockTranslator::new())
    }

    pub fn with_translator(translator: MockTranslator) -> Self {
        Self::build(MockStorageService::new(), translator)
    }

    fn build(storage: MockStorageService, translator: MockTranslator) -> Self {
        let translator = Arc::new(translator);
        let config = AppConfig {
            translate_enabled: true,
            fonts_dir: std::env::temp_dir()
                .join(format!("aichin-no-fonts-{}", Uuid::new_v4()))
                .to_string_lossy()
                .into_owned(),
            ..AppConfig::default()
        };

        let state = AppState {
            repo: Arc::new(InMemoryRepository::new()) as RepositoryState,
            storage: Arc::new(storage.clone()) as StorageState,
            translator: translator.clone() as TranslatorState,
            config,
        };
        Self {
            state,
            storage,
            translator,
        }
    }

    pub fn repo(&self) -> &RepositoryState {
        &self.state.repo
    }

    pub async fn seed_user(&self, username: &str, role: Role) -> User {
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: hash_password(PASSWORD).unwrap(),
            role,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        store_user(&self.state.repo, &user).await.unwrap();
        user
    }

    pub fn token_for(&self, user: &User) -> String {
        issue_token(user, &self.state.config).unwrap()
    }

    pub async fn admin_token(&self) -> String {
        let user = self.seed_user("editor", Role::Admin).await;
        self.token_for(&user)
    }

    pub async fn superadmin_token(&self) -> (User, String) {
        let user = self.seed_user("root", Role::Superadmin).await;
        let token = self.token_for(&user);
        (user, token)
    }

    /// Inserts a document directly into a collection, bypassing validation.
    pub async fn seed(&self, collection: &str, value: Value) -> Document {
        let doc = value.as_object().cloned().expect("seed value must be an object");
        self.state.repo.insert(collection, doc).await.unwrap()
    }

    /// Sends one request through a fresh router and decodes the body as JSON.
    /// Non-JSON bodies come back as a JSON string.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let app = create_router(self.state.clone());
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get_as(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn delete_as(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

pub fn detail(body: &Value) -> &str {
    body["detail"].as_str().unwrap_or_default()
}
