use std::sync::Arc;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::store::SessionStore;

use super::{ApiRequest, ApiResponse, Transport, TransportError};

/// Runs on every outgoing request before it reaches the transport.
///
/// Interceptors cannot fail a request; problems are logged and the request
/// continues.
pub trait RequestInterceptor: Send + Sync {
    fn on_request(&self, request: &mut ApiRequest);
}

/// Runs on every response the transport produced, before the caller sees it.
/// Not called when the transport itself failed.
pub trait ResponseInterceptor: Send + Sync {
    fn on_response(&self, request: &ApiRequest, response: &ApiResponse);
}

/// Ordered interceptor chains around a transport call.
///
/// `execute` is the only way through: every request interceptor runs, in
/// order, before the send, and every response interceptor runs, in order,
/// after it.
#[derive(Clone, Default)]
pub struct Pipeline {
    request: Vec<Arc<dyn RequestInterceptor>>,
    response: Vec<Arc<dyn ResponseInterceptor>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.request.push(interceptor);
        self
    }

    pub fn with_response(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.response.push(interceptor);
        self
    }

    pub async fn execute(
        &self,
        transport: &dyn Transport,
        mut request: ApiRequest,
    ) -> Result<ApiResponse, TransportError> {
        for interceptor in &self.request {
            interceptor.on_request(&mut request);
        }

        let response = transport.send(&request).await?;

        for interceptor in &self.response {
            interceptor.on_response(&request, &response);
        }
        Ok(response)
    }
}

// ============================================================================
// Built-in interceptors
// ============================================================================

/// Attaches the stored credential as `Authorization: Bearer <credential>`.
/// Requests go out unmodified when no credential is stored.
pub struct BearerAuth {
    store: Arc<SessionStore>,
}

impl BearerAuth {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }
}

impl RequestInterceptor for BearerAuth {
    fn on_request(&self, request: &mut ApiRequest) {
        let credential = match self.store.get_credential() {
            Ok(Some(credential)) => credential,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, path = %request.path, "Failed to read credential, sending request without it");
                return;
            }
        };

        match HeaderValue::from_str(&credential.bearer_value()) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers.insert(AUTHORIZATION, value);
            }
            Err(_) => {
                warn!(path = %request.path, "Stored credential is not a valid header value, sending request without it");
            }
        }
    }
}

/// Clears the session whenever the backend answers 401. The response itself
/// still reaches the caller.
pub struct InvalidateOnUnauthorized {
    store: Arc<SessionStore>,
}

impl InvalidateOnUnauthorized {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }
}

impl ResponseInterceptor for InvalidateOnUnauthorized {
    fn on_response(&self, request: &ApiRequest, response: &ApiResponse) {
        if response.status != StatusCode::UNAUTHORIZED {
            return;
        }

        info!(method = %request.method, path = %request.path, "Authorization denied, clearing session");
        if let Err(e) = self.store.invalidate() {
            warn!(error = %e, "Failed to clear session after 401");
        } else {
            debug!("Session cleared after 401");
        }
    }
}
