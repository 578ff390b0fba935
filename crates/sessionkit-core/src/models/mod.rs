//! Session data models.
//!
//! - `Credential`: the opaque bearer token returned by a successful login
//! - `UserProfile`: the locally cached `{email, name}` pair

pub mod credential;
pub mod profile;

pub use credential::Credential;
pub use profile::UserProfile;
