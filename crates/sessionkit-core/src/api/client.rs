//! Authenticated client for the backend's auth endpoints.
//!
//! This module provides the `AuthenticatedClient`, which runs every call
//! through the interceptor pipeline and keeps the `SessionStore` in sync
//! with login, logout and profile updates.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::claims::{decode_claims, DEFAULT_DISPLAY_NAME};
use crate::config::{Config, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::models::{Credential, UserProfile};
use crate::store::SessionStore;

use super::{
    ApiError, ApiRequest, BearerAuth, HttpTransport, InvalidateOnUnauthorized, Pipeline,
    RequestInterceptor, ResponseInterceptor, Transport,
};

// ============================================================================
// Constants
// ============================================================================

/// Login endpoint, answers `{token}`
const LOGIN_PATH: &str = "/auth/login";

/// User resource: POST creates an account, PUT updates the profile
const USERS_PATH: &str = "/auth/users";

// ============================================================================
// Builder
// ============================================================================

/// Assembles an `AuthenticatedClient`.
///
/// The credential interceptor always runs first among request interceptors
/// and the 401 interceptor first among response interceptors; extra
/// interceptors follow in the order they were added.
pub struct ClientBuilder {
    base_url: String,
    timeout: Duration,
    store: Option<Arc<SessionStore>>,
    transport: Option<Arc<dyn Transport>>,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            store: None,
            transport: None,
            request_interceptors: Vec::new(),
            response_interceptors: Vec::new(),
        }
    }
}

impl ClientBuilder {
    /// Take base URL and timeout from a `Config`
    pub fn config(mut self, config: &Config) -> Self {
        self.base_url = config.base_url();
        self.timeout = config.request_timeout();
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn store(mut self, store: SessionStore) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn shared_store(mut self, store: Arc<SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a custom transport instead of the reqwest one. Base URL and
    /// timeout are then the transport's business.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn request_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.request_interceptors.push(interceptor);
        self
    }

    pub fn response_interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.response_interceptors.push(interceptor);
        self
    }

    pub fn build(self) -> Result<AuthenticatedClient, ApiError> {
        let store = self.store.unwrap_or_default();
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.base_url, self.timeout)?),
        };

        let mut pipeline = Pipeline::new()
            .with_request(Arc::new(BearerAuth::new(store.clone())))
            .with_response(Arc::new(InvalidateOnUnauthorized::new(store.clone())));
        for interceptor in self.request_interceptors {
            pipeline = pipeline.with_request(interceptor);
        }
        for interceptor in self.response_interceptors {
            pipeline = pipeline.with_response(interceptor);
        }

        Ok(AuthenticatedClient {
            transport,
            pipeline: Arc::new(pipeline),
            store,
        })
    }
}

// ============================================================================
// Client
// ============================================================================

/// API client that authenticates every request from the session store.
/// Clone is cheap - all state is shared.
#[derive(Clone)]
pub struct AuthenticatedClient {
    transport: Arc<dyn Transport>,
    pipeline: Arc<Pipeline>,
    store: Arc<SessionStore>,
}

impl AuthenticatedClient {
    /// Create a reqwest-backed client for the configured backend
    pub fn new(config: &Config, store: SessionStore) -> Result<Self, ApiError> {
        Self::builder().config(config).store(store).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn session_store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    // ===== Requests =====

    /// Send a request through the pipeline and return the response body.
    ///
    /// Non-success statuses become errors; a 401 has already cleared the
    /// session by the time it is returned.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let mut request = ApiRequest::new(method, path);
        request.body = body;

        let response = self.pipeline.execute(self.transport.as_ref(), request).await?;
        if response.status.is_success() {
            Ok(response.body)
        } else {
            debug!(path, status = response.status.as_u16(), "Request rejected");
            Err(ApiError::from_status(response.status, &response.body))
        }
    }

    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.send(Method::PUT, path, Some(body)).await
    }

    // ===== Session operations =====

    /// Log in and start a session.
    ///
    /// The display name comes from the credential's `username` claim and
    /// falls back to `"unknown user"` when the claims cannot be read. A
    /// response without a `token` string is `ApiError::InvalidLoginResponse`.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        require("email", email)?;
        require_password(password)?;

        let body = self
            .post(LOGIN_PATH, json!({ "email": email, "password": password }))
            .await?;

        let token = body
            .get("token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::InvalidLoginResponse)?;
        let credential = Credential::new(token);

        let name = match credential.claims() {
            Some(claims) => claims.display_name().to_string(),
            None => {
                warn!("Credential payload could not be decoded, using default display name");
                DEFAULT_DISPLAY_NAME.to_string()
            }
        };
        let profile = UserProfile::new(email, name);

        self.store.start_session(&credential, &profile)?;
        info!(email, "Logged in");
        Ok(profile)
    }

    /// Create an account. Does not log in.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Value, ApiError> {
        require("username", username)?;
        require("email", email)?;
        require_password(password)?;

        let body = self
            .post(
                USERS_PATH,
                json!({ "username": username, "email": email, "password": password }),
            )
            .await?;
        info!(email, "Account registered");
        Ok(body)
    }

    /// Update the profile on the server, then rename the cached profile.
    /// Without a cached profile only the server is updated.
    pub async fn update_profile(&self, username: &str, email: &str) -> Result<Value, ApiError> {
        require("username", username)?;
        require("email", email)?;

        let body = self
            .put(USERS_PATH, json!({ "username": username, "email": email }))
            .await?;

        if self.store.rename_profile(username)?.is_none() {
            debug!("Profile updated on server, no local profile to update");
        }
        Ok(body)
    }

    /// Clear the session. Never fails; storage errors are logged.
    pub fn logout(&self) {
        match self.store.invalidate() {
            Ok(()) => info!("Logged out"),
            Err(e) => warn!(error = %e, "Failed to fully clear session on logout"),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    pub fn current_profile(&self) -> Result<Option<UserProfile>, ApiError> {
        Ok(self.store.get_profile()?)
    }

    pub fn credential(&self) -> Result<Option<Credential>, ApiError> {
        Ok(self.store.get_credential()?)
    }

    /// Whether the stored credential's `exp` claim has passed. The server
    /// still decides; this only lets a caller skip a doomed request.
    pub fn credential_expired(&self) -> Result<bool, ApiError> {
        Ok(self
            .credential()?
            .and_then(|credential| decode_claims(credential.as_str()))
            .map(|claims| claims.is_expired())
            .unwrap_or(false))
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::EmptyField(field))
    } else {
        Ok(())
    }
}

/// Passwords are sent as typed; only an empty one is rejected
fn require_password(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        Err(ApiError::EmptyField("password"))
    } else {
        Ok(())
    }
}
