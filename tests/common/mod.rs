#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::extract::connect_info::ConnectInfo;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use time::OffsetDateTime;
use tower::ServiceExt;

use eldercare::domain::notification::{DEFAULT_NOTIFICATION_END, DEFAULT_NOTIFICATION_START};
use eldercare::domain::user::{Role, User};
use eldercare::infra::memory::MemoryStore;
use eldercare::AppState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const ACTOR_ID: i64 = 9001;
pub const ACTOR_ID_HEADER: &str = "9001";
pub const PEER_IP: &str = "127.0.0.1";
const BODY_LIMIT_BYTES: usize = 64 * 1024;

// Ids are unique across every test in a binary so scenarios never share rows.
static NEXT_ID: AtomicI64 = AtomicI64::new(1000);

pub fn next_id() -> i64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

// ---------------------------------------------------------------------------
// TestApp: one fresh router and store per test
// ---------------------------------------------------------------------------

pub struct TestApp {
    router: Router,
    pub store: MemoryStore,
}

pub struct TestResponse {
    pub status: StatusCode,
    body_bytes: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body_bytes).unwrap_or(Value::Null)
    }

    pub fn detail(&self) -> Value {
        self.json()["detail"].clone()
    }

    pub fn detail_message(&self) -> String {
        self.detail().as_str().unwrap_or("").to_string()
    }

    /// Field names listed in a `detail` array.
    pub fn invalid_fields(&self) -> Vec<String> {
        self.detail()
            .as_array()
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|err| err["loc"][1].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub fn app() -> TestApp {
    TestApp::setup()
}

impl TestApp {
    fn setup() -> Self {
        let store = MemoryStore::new();
        let state = AppState {
            store: Arc::new(store.clone()),
            body_limit_bytes: BODY_LIMIT_BYTES,
        };
        let router = eldercare::http::router(state);

        TestApp { router, store }
    }

    pub fn fixture(&self) -> Fixture<'_> {
        Fixture { store: &self.store }
    }

    // ------------------------------------------------------------------
    // Low-level request helper
    // ------------------------------------------------------------------
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost");

        for &(key, value) in headers {
            builder = builder.header(key, value);
        }

        let request = if let Some(body) = body {
            builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap()
        } else {
            builder.body(Body::empty()).unwrap()
        };

        self.send(request).await
    }

    /// Send a raw body, for payloads that are not valid JSON objects.
    pub async fn request_raw(&self, method: Method, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost")
            .header("content-type", "application/json")
            .header("x-user-id", ACTOR_ID_HEADER)
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    async fn send(&self, mut request: Request<Body>) -> TestResponse {
        // Inject ConnectInfo so the audit stamp can pick up the peer address.
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 0))));

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot failed");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to collect body")
            .to_bytes();

        TestResponse { status, body_bytes }
    }

    // ------------------------------------------------------------------
    // Convenience HTTP helpers
    // ------------------------------------------------------------------
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Method::GET, path, None, &[]).await
    }

    pub async fn post_json(&self, path: &str, body: Value) -> TestResponse {
        self.request(Method::POST, path, Some(body), &[]).await
    }

    /// PUT as the default test actor.
    pub async fn put_json(&self, path: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, path, Some(body), &[("x-user-id", ACTOR_ID_HEADER)])
            .await
    }

    /// PATCH as the default test actor.
    pub async fn patch_json(&self, path: &str, body: Value) -> TestResponse {
        self.request(Method::PATCH, path, Some(body), &[("x-user-id", ACTOR_ID_HEADER)])
            .await
    }

    /// PUT without an `x-user-id` header.
    pub async fn put_json_anonymous(&self, path: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, path, Some(body), &[]).await
    }
}

// ---------------------------------------------------------------------------
// Fixture: per-scenario seeded rows
// ---------------------------------------------------------------------------

pub struct Fixture<'a> {
    store: &'a MemoryStore,
}

/// A record in its default state: 08:00-22:00 window, not paused.
pub fn base_user(id: i64, role: Role) -> User {
    User {
        id,
        name: format!("Test User {}", id),
        email: Some(format!("user{}@example.com", id)),
        phone: format!("+55119{:08}", id),
        receipt_type: Some(1),
        role,
        active: true,
        notification_start_time: DEFAULT_NOTIFICATION_START,
        notification_end_time: DEFAULT_NOTIFICATION_END,
        paused_until: None,
    }
}

impl Fixture<'_> {
    pub fn user(&self, role: Role) -> User {
        let user = base_user(next_id(), role);
        self.store.insert_user(user.clone());
        user
    }

    /// Insert a caller-shaped record under a fresh id.
    pub fn user_with(&self, role: Role, shape: impl FnOnce(&mut User)) -> User {
        let mut user = base_user(next_id(), role);
        shape(&mut user);
        self.store.insert_user(user.clone());
        user
    }

    pub fn subscriber(&self) -> User {
        self.user(Role::Subscriber)
    }

    pub fn contact(&self) -> User {
        self.user(Role::Contact)
    }

    pub fn attendant(&self) -> User {
        let attendant = self.user(Role::Attendant);
        self.store.insert_attendant_profile(attendant.id);
        attendant
    }

    /// An assisted user with a client profile on `team_id`.
    pub fn client(&self, cpf: &str, team_id: Option<i64>) -> User {
        let client = self.user(Role::Assisted);
        self.store.insert_client_profile(client.id, cpf, team_id);
        client
    }

    pub fn link(&self, client: &User, contact: &User, at: Option<OffsetDateTime>) {
        self.store.link_contact(client.id, contact.id, at, at);
    }

    pub fn team(&self, attendant: &User) -> i64 {
        let team_id = next_id();
        self.store.assign_team(attendant.id, team_id);
        team_id
    }
}
