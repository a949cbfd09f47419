mod common;

use aichin_backend::{
    AppState,
    auth::{AuthUser, Claims, ensure_bootstrap_admin, verify_password},
    collections::USERS,
    models::Role,
    repository::Filter,
};
use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use common::{PASSWORD, TestApp, detail};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;

// --- Helpers ---

fn get_request_parts(token: Option<&str>) -> Parts {
    let mut builder = Request::builder()
        .method(Method::GET)
        .uri(Uri::from_static("/api/auth/me"));
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let (parts, _) = builder.body(()).unwrap().into_parts();
    parts
}

fn create_token(sub: &str, secret: &str, exp_offset_secs: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: sub.to_string(),
        role: Role::Admin,
        iat: now as usize,
        exp: (now + exp_offset_secs) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

async fn extract(state: &AppState, token: Option<&str>) -> Result<AuthUser, StatusCode> {
    let mut parts = get_request_parts(token);
    AuthUser::from_request_parts(&mut parts, state).await
}

// --- AuthUser extractor ---

#[tokio::test]
async fn extractor_accepts_valid_token() {
    let app = TestApp::new();
    let user = app.seed_user("editor", Role::Admin).await;
    let token = app.token_for(&user);

    let auth = extract(&app.state, Some(&token)).await.unwrap();
    assert_eq!(auth.id, user.id);
    assert_eq!(auth.username, "editor");
    assert_eq!(auth.role, Role::Admin);
}

#[tokio::test]
async fn extractor_rejects_missing_header() {
    let app = TestApp::new();
    assert_eq!(
        extract(&app.state, None).await.unwrap_err(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn extractor_rejects_expired_token() {
    let app = TestApp::new();
    let user = app.seed_user("editor", Role::Admin).await;
    let token = create_token(&user.id, &app.state.config.jwt_secret, -5);

    assert_eq!(
        extract(&app.state, Some(&token)).await.unwrap_err(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn extractor_rejects_foreign_signature() {
    let app = TestApp::new();
    let user = app.seed_user("editor", Role::Admin).await;
    let token = create_token(&user.id, "some-other-secret-entirely", 600);

    assert_eq!(
        extract(&app.state, Some(&token)).await.unwrap_err(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn extractor_rejects_token_of_deleted_user() {
    let app = TestApp::new();
    let user = app.seed_user("editor", Role::Admin).await;
    let token = app.token_for(&user);
    app.repo().delete(USERS, &Filter::by_id(&user.id)).await.unwrap();

    assert_eq!(
        extract(&app.state, Some(&token)).await.unwrap_err(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn extractor_reads_role_from_store() {
    let app = TestApp::new();
    let user = app.seed_user("editor", Role::Admin).await;
    let token = app.token_for(&user);

    let mut patch = serde_json::Map::new();
    patch.insert("role".to_string(), json!("superadmin"));
    app.repo()
        .update(USERS, &Filter::by_id(&user.id), patch)
        .await
        .unwrap();

    let auth = extract(&app.state, Some(&token)).await.unwrap();
    assert_eq!(auth.role, Role::Superadmin);
}

// --- Login ---

#[tokio::test]
async fn login_issues_bearer_token() {
    let app = TestApp::new();
    app.seed_user("editor", Role::Admin).await;

    let (status, body) = app
        .json(
            "POST",
            "/api/auth/login",
            None,
            json!({"username": "editor", "password": PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");

    let token = body["access_token"].as_str().unwrap();
    let (status, me) = app.get_as("/api/auth/me", token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "editor");
    assert_eq!(me["role"], "admin");
    assert!(me.get("password_hash").is_none());
}

#[tokio::test]
async fn login_rejects_bad_credentials_uniformly() {
    let app = TestApp::new();
    app.seed_user("editor", Role::Admin).await;

    for (username, password) in [("editor", "wrong-password"), ("ghost", PASSWORD)] {
        let (status, body) = app
            .json(
                "POST",
                "/api/auth/login",
                None,
                json!({"username": username, "password": password}),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(detail(&body), "Incorrect username or password");
    }
}

#[tokio::test]
async fn me_requires_token() {
    let app = TestApp::new();

    let (status, _) = app.get("/api/auth/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get_as("/api/auth/me", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// --- Change password ---

#[tokio::test]
async fn change_password_replaces_hash() {
    let app = TestApp::new();
    let user = app.seed_user("editor", Role::Admin).await;
    let token = app.token_for(&user);

    let (status, body) = app
        .json(
            "POST",
            "/api/auth/change-password",
            Some(&token),
            json!({"current_password": PASSWORD, "new_password": "brand-new-secret"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password updated");

    let stored = app
        .repo()
        .find_one(USERS, &Filter::by_id(&user.id))
        .await
        .unwrap()
        .unwrap();
    let hash = stored["password_hash"].as_str().unwrap();
    assert!(verify_password("brand-new-secret", hash));
    assert!(!verify_password(PASSWORD, hash));
}

#[tokio::test]
async fn change_password_checks_current_password() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let (status, body) = app
        .json(
            "POST",
            "/api/auth/change-password",
            Some(&token),
            json!({"current_password": "not-it-at-all", "new_password": "brand-new-secret"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail(&body), "Current password is incorrect");
}

#[tokio::test]
async fn change_password_rejects_short_password() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let (status, _) = app
        .json(
            "POST",
            "/api/auth/change-password",
            Some(&token),
            json!({"current_password": PASSWORD, "new_password": "short"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// --- Bootstrap ---

#[tokio::test]
async fn bootstrap_creates_superadmin_once() {
    let mut app = TestApp::new();
    app.state.config.admin_username = Some("owner".to_string());
    app.state.config.admin_password = Some("owner-password".to_string());

    assert!(ensure_bootstrap_admin(app.repo(), &app.state.config).await.unwrap());
    assert!(!ensure_bootstrap_admin(app.repo(), &app.state.config).await.unwrap());

    let (status, body) = app
        .json(
            "POST",
            "/api/auth/login",
            None,
            json!({"username": "owner", "password": "owner-password"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, me) = app
        .get_as("/api/auth/me", body["access_token"].as_str().unwrap())
        .await;
    assert_eq!(me["role"], "superadmin");
}

#[tokio::test]
async fn bootstrap_skips_without_credentials() {
    let app = TestApp::new();
    assert!(!ensure_bootstrap_admin(app.repo(), &app.state.config).await.unwrap());
    assert_eq!(app.repo().count(USERS, &Filter::new()).await.unwrap(), 0);
}
