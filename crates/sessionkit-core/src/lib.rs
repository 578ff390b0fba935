//! sessionkit core library.
//!
//! Client-side session and authentication layer for a mobile backend:
//!
//! - `store`: key/value backends and the `SessionStore` holding the live
//!   credential and cached user profile
//! - `api`: the `AuthenticatedClient`, its interceptor pipeline and transport
//! - `claims`: best-effort decoding of the credential's embedded payload
//! - `config`: base URL, timeout and storage backend selection

pub mod api;
pub mod claims;
pub mod config;
pub mod models;
pub mod store;

pub use api::{ApiError, AuthenticatedClient};
pub use claims::{decode_claims, Claims};
pub use config::{Config, ConfigError, StoreBackend};
pub use models::{Credential, UserProfile};
pub use store::{SessionStore, StoreError};
