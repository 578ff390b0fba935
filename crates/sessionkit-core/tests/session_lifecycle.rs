//! End-to-end session lifecycle against an in-process fake backend.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use sessionkit_core::api::{ApiRequest, ApiResponse, Transport, TransportError};
use sessionkit_core::{ApiError, AuthenticatedClient, Credential, SessionStore, UserProfile};

const ALICE_TOKEN: &str = "x.eyJ1c2VybmFtZSI6ImFsaWNlIn0.z";

/// Minimal stand-in for the auth backend.
///
/// `/auth/login` hands out `token`; `/profile` answers 401 unless the
/// request carries `Bearer <valid>`.
struct FakeBackend {
    token: String,
    valid: Mutex<String>,
    authorizations: Mutex<Vec<Option<String>>>,
}

impl FakeBackend {
    fn new(token: &str) -> Arc<Self> {
        Arc::new(Self {
            token: token.to_string(),
            valid: Mutex::new(token.to_string()),
            authorizations: Mutex::new(Vec::new()),
        })
    }

    /// Server-side expiry: the current token stops being accepted
    fn expire(&self) {
        *self.valid.lock().unwrap() = "revoked".to_string();
    }

    fn last_authorization(&self) -> Option<String> {
        self.authorizations.lock().unwrap().last().cloned().flatten()
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let authorization = request
            .headers
            .get(AUTHORIZATION)
            .map(|v| v.to_str().unwrap().to_string());
        self.authorizations.lock().unwrap().push(authorization.clone());
        // let other in-flight operations run before answering
        tokio::task::yield_now().await;

        let response = match (request.method.clone(), request.path.as_str()) {
            (Method::POST, "/auth/login") => {
                ApiResponse::new(StatusCode::OK, json!({ "token": self.token }))
            }
            (Method::PUT, "/auth/users") => {
                ApiResponse::new(StatusCode::OK, request.body.clone().unwrap_or(Value::Null))
            }
            (Method::GET, "/profile") => {
                let expected = format!("Bearer {}", self.valid.lock().unwrap());
                if authorization.as_deref() == Some(expected.as_str()) {
                    ApiResponse::new(StatusCode::OK, json!({ "ok": true }))
                } else {
                    ApiResponse::new(StatusCode::UNAUTHORIZED, Value::from("expired"))
                }
            }
            _ => ApiResponse::new(StatusCode::NOT_FOUND, Value::Null),
        };
        Ok(response)
    }
}

fn client_with(backend: Arc<FakeBackend>) -> AuthenticatedClient {
    AuthenticatedClient::builder()
        .store(SessionStore::in_memory())
        .transport(backend)
        .build()
        .expect("client builds")
}

fn assert_lockstep(client: &AuthenticatedClient) {
    let (credential, profile) = client.session_store().get_session().unwrap();
    assert_eq!(
        credential.is_some(),
        profile.is_some(),
        "credential and profile must be present together"
    );
}

#[tokio::test]
async fn test_full_session_lifecycle() {
    let backend = FakeBackend::new(ALICE_TOKEN);
    let client = client_with(backend.clone());
    assert_lockstep(&client);

    let profile = client.login("a@b.com", "pw").await.unwrap();
    assert_eq!(profile, UserProfile::new("a@b.com", "alice"));
    assert_eq!(backend.last_authorization(), None);
    assert_lockstep(&client);

    client.get("/profile").await.unwrap();
    assert_eq!(
        backend.last_authorization(),
        Some(format!("Bearer {}", ALICE_TOKEN))
    );

    client.update_profile("alicia", "a@b.com").await.unwrap();
    assert_eq!(client.current_profile().unwrap().unwrap().name, "alicia");
    assert_lockstep(&client);

    client.logout();
    assert_lockstep(&client);
    client.logout();
    assert!(!client.is_authenticated());
    assert_lockstep(&client);

    client.get("/profile").await.unwrap_err();
    assert_eq!(backend.last_authorization(), None);
}

#[tokio::test]
async fn test_expired_session_is_torn_down() {
    let backend = FakeBackend::new(ALICE_TOKEN);
    let client = client_with(backend.clone());

    client.login("a@b.com", "pw").await.unwrap();
    assert!(client.is_authenticated());

    backend.expire();
    let err = client.get("/profile").await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized(_)));
    assert!(!client.is_authenticated());
    assert_eq!(client.current_profile().unwrap(), None);
    assert_lockstep(&client);
}

#[tokio::test]
async fn test_malformed_claims_login() {
    let backend = FakeBackend::new("x.bm90LWpzb24.z");
    let client = client_with(backend);

    let profile = client.login("a@b.com", "pw").await.unwrap();
    assert_eq!(profile, UserProfile::new("a@b.com", "unknown user"));
    assert_eq!(
        client.credential().unwrap(),
        Some(Credential::new("x.bm90LWpzb24.z"))
    );
}

#[tokio::test]
async fn test_update_profile_without_prior_session() {
    let client = client_with(FakeBackend::new(ALICE_TOKEN));

    let body = client.update_profile("bob", "b@c.com").await.unwrap();
    assert_eq!(body, json!({ "username": "bob", "email": "b@c.com" }));
    assert_eq!(client.current_profile().unwrap(), None);
    assert!(!client.is_authenticated());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_login_and_logout_keep_lockstep() {
    let client = client_with(FakeBackend::new(ALICE_TOKEN));

    let mut tasks = Vec::new();
    for i in 0..64 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..8 {
                if i % 2 == 0 {
                    client.login("a@b.com", "pw").await?;
                } else {
                    tokio::task::yield_now().await;
                    client.logout();
                }
                assert_lockstep(&client);
            }
            Ok::<_, ApiError>(())
        }));
    }

    // observe the store while the tasks are still running
    while tasks.iter().any(|task| !task.is_finished()) {
        assert_lockstep(&client);
        tokio::task::yield_now().await;
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    assert_lockstep(&client);
}
