mod common;

use aichin_backend::{
    collections::{CONTACT_FORMS, USERS},
    repository::Filter,
};
use axum::http::StatusCode;
use common::{TestApp, detail};
use serde_json::{Value, json};

fn service(slug: &str) -> Value {
    json!({
        "slug": slug,
        "name": "Логистика",
        "description": "Доставка грузов",
        "features": ["Склад"]
    })
}

// --- Access ---

#[tokio::test]
async fn admin_routes_require_token() {
    let app = TestApp::new();

    let (status, _) = app
        .json("POST", "/api/admin/services", None, service("logistics"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/admin/contacts").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get_as("/api/admin/media", "garbage").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// --- Content CRUD ---

#[tokio::test]
async fn create_update_delete_service() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let (status, created) = app
        .json("POST", "/api/admin/services", Some(&token), service("logistics"))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert!(created["created_at"].is_string());
    assert!(created["updated_at"].is_string());

    let (_, public) = app.get("/api/services/logistics").await;
    assert_eq!(public["id"], id.as_str());

    let mut changed = service("logistics");
    changed["name"] = json!("Логистика и склад");
    changed["name_en"] = json!("Logistics");
    changed["id"] = json!("attempted-rename");
    let (status, updated) = app
        .json("PUT", &format!("/api/admin/services/{id}"), Some(&token), changed)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], id.as_str());
    assert_eq!(updated["name"], "Логистика и склад");
    assert_eq!(updated["created_at"], created["created_at"]);

    let (status, body) = app
        .delete_as(&format!("/api/admin/services/{id}"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Deleted");

    let (status, _) = app.get("/api/services/logistics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn changing_a_field_drops_its_stale_translation() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let mut body = service("logistics");
    body["name_en"] = json!("Logistics");
    body["description_en"] = json!("Cargo delivery");
    let (_, created) = app
        .json("POST", "/api/admin/services", Some(&token), body)
        .await;
    let id = created["id"].as_str().unwrap();

    let mut changed = service("logistics");
    changed["name"] = json!("Таможенное оформление");
    let (status, updated) = app
        .json("PUT", &format!("/api/admin/services/{id}"), Some(&token), changed)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name_en"], Value::Null);
    assert_eq!(updated["description_en"], "Cargo delivery");

    let (_, english) = app.get("/api/services/logistics?lang=en").await;
    assert_eq!(english["name_en"], "[en] Таможенное оформление");
    assert_eq!(english["description_en"], "Cargo delivery");
}

#[tokio::test]
async fn client_supplied_id_is_kept() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let mut body = service("logistics");
    body["id"] = json!("svc-logistics");
    let (status, created) = app
        .json("POST", "/api/admin/services", Some(&token), body)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], "svc-logistics");
}

#[tokio::test]
async fn duplicate_slug_conflicts() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let (status, _) = app
        .json("POST", "/api/admin/services", Some(&token), service("logistics"))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .json("POST", "/api/admin/services", Some(&token), service("logistics"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn update_cannot_take_another_slug() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    app.json("POST", "/api/admin/services", Some(&token), service("a"))
        .await;
    let (_, second) = app
        .json("POST", "/api/admin/services", Some(&token), service("b"))
        .await;

    let (status, _) = app
        .json(
            "PUT",
            &format!("/api/admin/services/{}", second["id"].as_str().unwrap()),
            Some(&token),
            service("a"),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn missing_documents_are_not_found() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let (status, body) = app
        .json("PUT", "/api/admin/services/nope", Some(&token), service("x"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(detail(&body), "Document not found");

    let (status, _) = app.delete_as("/api/admin/services/nope", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_collection_is_not_found() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let (status, body) = app
        .json("POST", "/api/admin/widgets", Some(&token), json!({"slug": "x"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(detail(&body), "Collection not found");
}

#[tokio::test]
async fn validation_errors_are_bad_requests() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let mut missing = service("logistics");
    missing.as_object_mut().unwrap().remove("description");
    let (status, _) = app
        .json("POST", "/api/admin/services", Some(&token), missing)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut orphan = service("logistics");
    orphan["tagline_en"] = json!("Fast");
    let (status, body) = app
        .json("POST", "/api/admin/services", Some(&token), orphan)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(detail(&body).contains("tagline_en"));

    let (status, _) = app
        .json("POST", "/api/admin/services", Some(&token), json!(["not", "an", "object"]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_list_returns_all_documents() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    for slug in ["a", "b", "c"] {
        app.json("POST", "/api/admin/services", Some(&token), service(slug))
            .await;
    }

    let (status, body) = app.get_as("/api/admin/services", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
}

// --- Dynamic pages ---

#[tokio::test]
async fn dynamic_pages_validate_blocks() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let page = json!({
        "slug": "home",
        "title": "Главная",
        "blocks": [
            {"type": "hero", "title": "AICHIN"},
            {"type": "collection", "collection": "services", "limit": 3},
            {"type": "list", "items": ["Один"], "items_en": ["One"]}
        ]
    });
    let (status, _) = app
        .json("POST", "/api/admin/pages-dynamic", Some(&token), page)
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.get("/api/pages-dynamic/home").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["blocks"].as_array().unwrap().len(), 3);

    let bad_blocks = [
        json!({"type": "carousel"}),
        json!({"type": "collection", "collection": "users"}),
        json!({"type": "text", "body": "  "}),
        json!({"type": "list", "items": ["Один", "Два"], "items_en": ["One"]}),
        json!({"type": "cards", "items": [{"title": "A", "description_en": "B"}]}),
    ];
    for (i, block) in bad_blocks.into_iter().enumerate() {
        let page = json!({"slug": format!("bad-{i}"), "title": "Плохо", "blocks": [block]});
        let (status, _) = app
            .json("POST", "/api/admin/pages-dynamic", Some(&token), page)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "block {i}");
    }
}

// --- Forms ---

fn request_form() -> Value {
    json!({
        "slug": "request",
        "title": "Заявка",
        "fields": [
            {"id": "name", "type": "text", "label": "Имя", "required": true},
            {"id": "email", "type": "email", "label": "Email", "required": true}
        ]
    })
}

#[tokio::test]
async fn forms_crud_and_submissions() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let (status, form) = app
        .json("POST", "/api/admin/forms", Some(&token), request_form())
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = form["id"].as_str().unwrap().to_string();

    let (_, forms) = app.get_as("/api/admin/forms", &token).await;
    assert_eq!(forms.as_array().unwrap().len(), 1);

    let (status, _) = app
        .json(
            "POST",
            "/api/forms/request/submit",
            None,
            json!({"name": "Иван", "email": "ivan@example.com"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, submissions) = app
        .get_as("/api/admin/forms/request/submissions", &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submissions.as_array().unwrap().len(), 1);
    assert_eq!(submissions[0]["data"]["name"], "Иван");

    let mut renamed = request_form();
    renamed["title"] = json!("Заявка на консультацию");
    let (status, updated) = app
        .json("PUT", &format!("/api/admin/forms/{id}"), Some(&token), renamed)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Заявка на консультацию");

    let (status, _) = app.delete_as(&format!("/api/admin/forms/{id}"), &token).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get("/api/forms/request").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn forms_reject_duplicate_field_ids() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let mut form = request_form();
    form["fields"][1]["id"] = json!("name");
    let (status, body) = app
        .json("POST", "/api/admin/forms", Some(&token), form)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(detail(&body).contains("duplicate"));
}

// --- Inbox ---

#[tokio::test]
async fn contacts_are_listed_newest_first() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    for name in ["first", "second"] {
        let (status, _) = app
            .json(
                "POST",
                "/api/contact",
                None,
                json!({"name": name, "email": "a@example.com", "message": "Здравствуйте"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app.get_as("/api/admin/contacts", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "second");
    assert_eq!(body[1]["name"], "first");
    assert_eq!(app.repo().count(CONTACT_FORMS, &Filter::new()).await.unwrap(), 2);
}

// --- Settings ---

#[tokio::test]
async fn settings_update_round_trips() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let (_, mut settings) = app.get("/api/settings").await;
    settings["site_name"] = json!("AICHIN GROUP LLC");
    settings["theme"]["primary_color"] = json!("#112233");

    let (status, saved) = app
        .json("PUT", "/api/admin/settings", Some(&token), settings)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(saved.get("id").is_none());

    let (_, reread) = app.get("/api/settings").await;
    assert_eq!(reread["site_name"], "AICHIN GROUP LLC");
    assert_eq!(reread["theme"]["primary_color"], "#112233");
}

#[tokio::test]
async fn settings_reject_invalid_menu() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let (_, mut settings) = app.get("/api/settings").await;
    settings["menu"] = json!([{"label": "", "href": "/"}]);
    let (status, _) = app
        .json("PUT", "/api/admin/settings", Some(&token), settings)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// --- Users ---

#[tokio::test]
async fn user_management_is_superadmin_only() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let (status, body) = app.get_as("/api/admin/users", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(detail(&body), "Only superadmin can manage users");

    let (status, _) = app
        .json(
            "POST",
            "/api/admin/users",
            Some(&token),
            json!({"username": "intruder", "password": "long-enough-pass"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn concurrent_creates_of_one_username_yield_one_user() {
    let app = TestApp::new();
    let (_, token) = app.superadmin_token().await;
    let payload = json!({"username": "twin", "password": "long-enough-pass"});

    let (first, second) = tokio::join!(
        app.json("POST", "/api/admin/users", Some(&token), payload.clone()),
        app.json("POST", "/api/admin/users", Some(&token), payload.clone()),
    );

    let mut statuses = vec![first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);
    assert_eq!(
        app.repo()
            .count(USERS, &Filter::new().eq("username", "twin"))
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn superadmin_creates_and_deletes_users() {
    let app = TestApp::new();
    let (_, token) = app.superadmin_token().await;

    let (status, created) = app
        .json(
            "POST",
            "/api/admin/users",
            Some(&token),
            json!({"username": "editor2", "password": "long-enough-pass"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["role"], "admin");
    assert!(created.get("password_hash").is_none());

    let (status, body) = app
        .json(
            "POST",
            "/api/admin/users",
            Some(&token),
            json!({"username": "editor2", "password": "another-pass-1"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(detail(&body), "Username already exists");

    let (_, users) = app.get_as("/api/admin/users", &token).await;
    assert_eq!(users.as_array().unwrap().len(), 2);

    let id = created["id"].as_str().unwrap();
    let (status, _) = app.delete_as(&format!("/api/admin/users/{id}"), &token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.delete_as(&format!("/api/admin/users/{id}"), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(detail(&body), "User not found");
}

#[tokio::test]
async fn new_user_can_log_in() {
    let app = TestApp::new();
    let (_, token) = app.superadmin_token().await;

    app.json(
        "POST",
        "/api/admin/users",
        Some(&token),
        json!({"username": "chief", "password": "long-enough-pass", "role": "superadmin"}),
    )
    .await;

    let (status, body) = app
        .json(
            "POST",
            "/api/auth/login",
            None,
            json!({"username": "chief", "password": "long-enough-pass"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, me) = app
        .get_as("/api/auth/me", body["access_token"].as_str().unwrap())
        .await;
    assert_eq!(me["role"], "superadmin");
}

#[tokio::test]
async fn superadmin_cannot_delete_self() {
    let app = TestApp::new();
    let (root, token) = app.superadmin_token().await;

    let (status, body) = app
        .delete_as(&format!("/api/admin/users/{}", root.id), &token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail(&body), "You cannot delete yourself");
}

#[tokio::test]
async fn short_passwords_are_rejected_for_new_users() {
    let app = TestApp::new();
    let (_, token) = app.superadmin_token().await;

    let (status, _) = app
        .json(
            "POST",
            "/api/admin/users",
            Some(&token),
            json!({"username": "editor2", "password": "short"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
