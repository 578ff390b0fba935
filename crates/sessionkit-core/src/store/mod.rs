//! Persistence for the live session.
//!
//! This module provides:
//! - `KeyValueStore`: the injected storage capability (`get`/`set`/`remove`)
//! - `MemoryStore`, `FileStore`, `KeyringStore`: backends for it
//! - `SessionStore`: credential and profile access on top of a backend
//!
//! Session state lives under two fixed keys, `userToken` and `userData`.

pub mod error;
pub mod file;
pub mod keychain;
pub mod memory;
pub mod session;

pub use error::StoreError;
pub use file::FileStore;
pub use keychain::KeyringStore;
pub use memory::MemoryStore;
pub use session::SessionStore;

/// Key holding the bearer credential
pub const TOKEN_KEY: &str = "userToken";

/// Key holding the JSON-serialized `UserProfile`
pub const PROFILE_KEY: &str = "userData";

/// Durable string key/value storage.
///
/// Removing a key that is not present is not an error.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}
