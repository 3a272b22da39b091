//! Shared helpers for router-level integration tests
//!
//! Every test builds its own app over the in-memory backend, so no database
//! or network services are needed.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use tower::ServiceExt;

use snippets_server::{
    api::{create_router, AppState},
    audit::{AuditConfig, AuditRecorder},
    auth::hash_password,
    config::CorsConfig,
    db::Storage,
    models::{NewUser, User, UserChanges},
    store::EntityStore,
};

pub const PASSWORD: &str = "correct horse";

pub struct TestApp {
    pub router: Router,
    pub store: EntityStore,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_audit(AuditConfig::default())
    }

    pub fn with_audit(audit: AuditConfig) -> Self {
        let storage = Storage::memory();
        let recorder = AuditRecorder::new(storage.audit.clone(), audit);
        let store = EntityStore::new(storage, recorder);
        let cors = CorsConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            allow_credentials: true,
        };
        let router = create_router(AppState::new(store.clone()), &cors);
        Self { router, store }
    }

    /// Create an account directly in the store, outside any request
    pub async fn seed_user(&self, username: &str, is_admin: bool) -> User {
        self.store
            .create_user(
                NewUser {
                    username: username.to_string(),
                    password_hash: hash_password(PASSWORD).await.unwrap(),
                    is_admin,
                },
                None,
            )
            .await
            .unwrap()
    }

    pub async fn deactivate(&self, user: &User) {
        let changes = UserChanges {
            is_active: Some(false),
            ..Default::default()
        };
        self.store.update_user(user.id, &changes, None).await.unwrap();
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(username) = user {
            builder = builder.header(header::AUTHORIZATION, basic_auth(username, PASSWORD));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    pub async fn get(&self, uri: &str, user: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, user, None).await
    }
}

pub fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

/// `data` of a list response as `(field value)` strings
pub fn field_values(body: &Value, field: &str) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| match &item[field] {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect()
}
