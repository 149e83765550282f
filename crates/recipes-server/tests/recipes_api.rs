//! Router-level tests over in-memory collaborators.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE, WWW_AUTHENTICATE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use recipes_auth::password::hash_password;
use recipes_auth::storage::{InMemorySessionStorage, InMemoryUserStorage, SessionStorage, UserStorage};
use recipes_auth::{SessionConfig, SessionManager, User};
use recipes_db_memory::InMemoryStorage;
use recipes_server::config::ServerConfig;
use recipes_server::{AppState, CacheBackend, build_router};
use recipes_storage::RecipeStorage;
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    storage: Arc<InMemoryStorage>,
    sessions: Arc<InMemorySessionStorage>,
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

async fn test_app() -> TestApp {
    let users = Arc::new(InMemoryUserStorage::new());
    users
        .upsert(&User::new("admin", hash_password("s3cret").unwrap()))
        .await
        .unwrap();
    let sessions = Arc::new(InMemorySessionStorage::new());
    let manager = SessionManager::new(sessions.clone(), users, SessionConfig::default()).unwrap();

    let storage = Arc::new(InMemoryStorage::new());
    let state = AppState::new(storage.clone(), CacheBackend::new_local(), Arc::new(manager));

    TestApp {
        router: build_router(state, &ServerConfig::default()),
        storage,
        sessions,
    }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.request(builder.body(body).unwrap()).await
    }

    async fn request(&self, req: Request<Body>) -> Reply {
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply {
            status,
            headers,
            body,
        }
    }

    async fn sign_in(&self) -> String {
        let reply = self
            .send(
                Method::POST,
                "/signin",
                None,
                Some(json!({"username": "admin", "password": "s3cret"})),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK);
        reply.body["token"].as_str().unwrap().to_string()
    }

    async fn create(&self, token: &str, recipe: Value) -> Value {
        let reply = self.send(Method::POST, "/recipes", Some(token), Some(recipe)).await;
        assert_eq!(reply.status, StatusCode::OK, "create failed: {}", reply.body);
        reply.body
    }

    async fn list(&self) -> Vec<Value> {
        let reply = self.send(Method::GET, "/recipes", None, None).await;
        assert_eq!(reply.status, StatusCode::OK);
        reply.body.as_array().unwrap().clone()
    }
}

fn tea() -> Value {
    json!({
        "name": "Tea",
        "tags": ["drink"],
        "ingredients": ["water", "tea leaves"],
        "instructions": ["boil water", "steep for three minutes"]
    })
}

#[tokio::test]
async fn test_create_list_delete_tea() {
    let app = test_app().await;
    let token = app.sign_in().await;

    let created = app.create(&token, tea()).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["name"], "Tea");
    assert!(created["publishedAt"].is_string());

    let listed = app.list().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], id.as_str());

    let fetched = app.send(Method::GET, &format!("/recipes/{id}"), None, None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body, created);

    let deleted = app
        .send(Method::DELETE, &format!("/recipes/{id}"), Some(&token), None)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Recipe deleted successfully");

    assert!(app.list().await.is_empty());
    let gone = app.send(Method::GET, &format!("/recipes/{id}"), None, None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert!(gone.body["error"].is_string());
}

#[tokio::test]
async fn test_search_by_tag_is_case_insensitive() {
    let app = test_app().await;
    let token = app.sign_in().await;

    let lemonade = app
        .create(&token, json!({"name": "Lemonade", "tags": ["Drink"]}))
        .await;
    app.create(&token, json!({"name": "Cake", "tags": ["Dessert"]}))
        .await;

    let reply = app.send(Method::GET, "/recipes/search?tag=drink", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!([lemonade]));

    let none = app.send(Method::GET, "/recipes/search?tag=soup", None, None).await;
    assert_eq!(none.body, json!([]));

    for uri in ["/recipes/search", "/recipes/search?tag=", "/recipes/search?tag=%20"] {
        let reply = app.send(Method::GET, uri, None, None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_writes_require_session() {
    let app = test_app().await;
    let token = app.sign_in().await;
    let existing = app.create(&token, tea()).await;
    let path = format!("/recipes/{}", existing["id"].as_str().unwrap());

    for token in [None, Some("not-a-session")] {
        let create = app.send(Method::POST, "/recipes", token, Some(tea())).await;
        let update = app.send(Method::PUT, &path, token, Some(tea())).await;
        let delete = app.send(Method::DELETE, &path, token, None).await;
        for reply in [create, update, delete] {
            assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
            assert!(reply.headers.contains_key(WWW_AUTHENTICATE));
        }
    }

    assert_eq!(app.storage.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_reads_are_public() {
    let app = test_app().await;
    assert_eq!(app.send(Method::GET, "/recipes", None, None).await.status, StatusCode::OK);
    assert_eq!(
        app.send(Method::GET, "/recipes/search?tag=x", None, None).await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_wrong_credentials_rejected_without_session() {
    let app = test_app().await;

    for body in [
        json!({"username": "admin", "password": "nope"}),
        json!({"username": "admin", "password": "still wrong"}),
        json!({"username": "nobody", "password": "s3cret"}),
    ] {
        let reply = app.send(Method::POST, "/signin", None, Some(body)).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body["error"], "invalid username or password");
        assert!(!reply.headers.contains_key(SET_COOKIE));
    }

    assert_eq!(app.sessions.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_refresh_rotates_token() {
    let app = test_app().await;
    let old = app.sign_in().await;

    let reply = app
        .send(Method::POST, "/refresh", None, Some(json!({"token": old})))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    let new = reply.body["token"].as_str().unwrap().to_string();
    assert_ne!(old, new);
    assert!(reply.body["expiresAt"].is_string());

    let rejected = app.send(Method::POST, "/recipes", Some(&old), Some(tea())).await;
    assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);
    app.create(&new, tea()).await;

    let replay = app
        .send(Method::POST, "/refresh", None, Some(json!({"token": old})))
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);

    let missing = app.send(Method::POST, "/refresh", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_accepts_bearer_header() {
    let app = test_app().await;
    let old = app.sign_in().await;

    let reply = app.send(Method::POST, "/refresh", Some(&old), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_ne!(reply.body["token"].as_str().unwrap(), old);
}

#[tokio::test]
async fn test_sign_out_is_idempotent() {
    let app = test_app().await;
    let token = app.sign_in().await;

    for _ in 0..2 {
        let reply = app.send(Method::POST, "/signout", Some(&token), None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["message"], "Signed out");
    }

    let anonymous = app.send(Method::POST, "/signout", None, None).await;
    assert_eq!(anonymous.status, StatusCode::OK);

    let rejected = app.send(Method::POST, "/recipes", Some(&token), Some(tea())).await;
    assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_new_sign_in_ends_previous_session() {
    let app = test_app().await;
    let first = app.sign_in().await;
    let second = app.sign_in().await;

    let rejected = app.send(Method::POST, "/recipes", Some(&first), Some(tea())).await;
    assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);
    app.create(&second, tea()).await;

    // Signing out the current session leaves no token that passes the gate.
    app.send(Method::POST, "/signout", Some(&second), None).await;
    for token in [&first, &second] {
        let reply = app.send(Method::POST, "/recipes", Some(token.as_str()), Some(tea())).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    }
    assert_eq!(app.list().await.len(), 1);
}

#[tokio::test]
async fn test_session_cookie_authorizes_writes() {
    let app = test_app().await;
    let reply = app
        .send(
            Method::POST,
            "/signin",
            None,
            Some(json!({"username": "admin", "password": "s3cret"})),
        )
        .await;
    let set_cookie = reply.headers[SET_COOKIE].to_str().unwrap().to_string();
    assert!(set_cookie.starts_with("recipes_session="));
    assert!(set_cookie.contains("HttpOnly"));

    let cookie = set_cookie.split(';').next().unwrap().to_string();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/recipes")
        .header(CONTENT_TYPE, "application/json")
        .header(COOKIE, cookie)
        .body(Body::from(tea().to_string()))
        .unwrap();
    assert_eq!(app.request(req).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_replaces_fields_and_keeps_identity() {
    let app = test_app().await;
    let token = app.sign_in().await;
    let created = app.create(&token, tea()).await;
    let id = created["id"].as_str().unwrap();

    let reply = app
        .send(
            Method::PUT,
            &format!("/recipes/{id}"),
            Some(&token),
            Some(json!({
                "id": "00000000-0000-0000-0000-000000000000",
                "name": "Green tea",
                "tags": ["drink", "green"],
                "publishedAt": "1999-01-01T00:00:00Z"
            })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["message"], "Recipe has been updated");

    let fetched = app.send(Method::GET, &format!("/recipes/{id}"), None, None).await;
    assert_eq!(fetched.body["id"], id);
    assert_eq!(fetched.body["name"], "Green tea");
    assert_eq!(fetched.body["tags"], json!(["drink", "green"]));
    assert_eq!(fetched.body["ingredients"], json!([]));
    assert_eq!(fetched.body["publishedAt"], created["publishedAt"]);

    let listed = app.list().await;
    assert_eq!(listed[0]["name"], "Green tea");
}

#[tokio::test]
async fn test_user_errors() {
    let app = test_app().await;
    let token = app.sign_in().await;
    let unknown = "/recipes/7c1f2a52-5d8e-4c8e-9a57-3f0f2b3c4d5e";

    let bad_id = app.send(Method::GET, "/recipes/not-a-uuid", None, None).await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);

    let bad_id_write = app
        .send(Method::DELETE, "/recipes/not-a-uuid", Some(&token), None)
        .await;
    assert_eq!(bad_id_write.status, StatusCode::BAD_REQUEST);

    let blank_name = app
        .send(Method::POST, "/recipes", Some(&token), Some(json!({"name": "  "})))
        .await;
    assert_eq!(blank_name.status, StatusCode::BAD_REQUEST);
    assert_eq!(blank_name.body["error"], "name must not be empty");

    let malformed = Request::builder()
        .method(Method::POST)
        .uri("/recipes")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    assert_eq!(app.request(malformed).await.status, StatusCode::BAD_REQUEST);

    let update_missing = app.send(Method::PUT, unknown, Some(&token), Some(tea())).await;
    assert_eq!(update_missing.status, StatusCode::NOT_FOUND);

    let delete_missing = app.send(Method::DELETE, unknown, Some(&token), None).await;
    assert_eq!(delete_missing.status, StatusCode::NOT_FOUND);

    assert_eq!(app.storage.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_service_endpoints() {
    let app = test_app().await;

    let root = app.send(Method::GET, "/", None, None).await;
    assert_eq!(root.body["service"], "recipes-server");

    let health = app.send(Method::GET, "/healthz", None, None).await;
    assert_eq!(health.body["status"], "ok");

    let ready = app.send(Method::GET, "/readyz", None, None).await;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.body["status"], "ready");
    assert_eq!(ready.body["checks"]["cache"], "ok");

    assert!(root.headers.contains_key("x-request-id"));
}
