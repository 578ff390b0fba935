//! Authenticated REST client for the backend.
//!
//! This module provides the `AuthenticatedClient` and the pieces it is
//! assembled from:
//! - `Transport`: sends one `ApiRequest` and returns an `ApiResponse`
//! - `Pipeline`: ordered request and response interceptors around the transport
//! - `BearerAuth` / `InvalidateOnUnauthorized`: the built-in interceptors
//!
//! Requests carry `Authorization: Bearer <credential>` whenever a credential
//! is stored, and any 401 response clears the local session.

pub mod client;
pub mod error;
pub mod interceptor;
pub mod transport;

pub use client::{AuthenticatedClient, ClientBuilder};
pub use error::ApiError;
pub use interceptor::{BearerAuth, InvalidateOnUnauthorized, Pipeline, RequestInterceptor, ResponseInterceptor};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport, TransportError};
