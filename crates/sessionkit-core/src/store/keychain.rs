use std::cell::RefCell;
use std::collections::hash_map::Entry as Slot;
use std::collections::HashMap;

use keyring::Entry;
use tracing::debug;

use super::{KeyValueStore, StoreError};

/// Default keychain service name
pub const SERVICE_NAME: &str = "sessionkit";

/// Stores each key as its own OS keychain entry under one service name.
///
/// Entries are created once per key and reused, so platforms whose
/// credentials live in the `Entry` itself (keyring's mock store) still read
/// back what was written.
#[derive(Debug)]
pub struct KeyringStore {
    service: String,
    entries: RefCell<HashMap<String, Entry>>,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entries: RefCell::new(HashMap::new()),
        }
    }

    fn with_entry<T>(
        &self,
        key: &str,
        f: impl FnOnce(&Entry) -> keyring::Result<T>,
    ) -> Result<keyring::Result<T>, StoreError> {
        let mut entries = self.entries.borrow_mut();
        let entry = match entries.entry(key.to_string()) {
            Slot::Occupied(slot) => slot.into_mut(),
            Slot::Vacant(slot) => slot.insert(Entry::new(&self.service, key)?),
        };
        Ok(f(entry))
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.with_entry(key, |entry| entry.get_password())? {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.with_entry(key, |entry| entry.set_password(value))??;
        debug!(service = %self.service, key, "Stored keychain entry");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match self.with_entry(key, |entry| entry.delete_credential())? {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Credential, UserProfile};
    use crate::store::{SessionStore, TOKEN_KEY};

    fn use_mock_keyring() {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
    }

    #[test]
    fn test_written_values_read_back() {
        use_mock_keyring();
        let mut store = KeyringStore::with_service("sessionkit-test");
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);

        store.set(TOKEN_KEY, "abc").unwrap();
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("abc"));

        store.remove(TOKEN_KEY).unwrap();
        store.remove(TOKEN_KEY).unwrap();
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_session_over_keyring() {
        use_mock_keyring();
        let store = SessionStore::new(KeyringStore::with_service("sessionkit-test-session"));
        let profile = UserProfile::new("a@b.com", "alice");

        store.start_session(&Credential::new("tok"), &profile).unwrap();
        assert!(store.is_authenticated());
        assert_eq!(store.get_profile().unwrap(), Some(profile));

        store.invalidate().unwrap();
        assert!(!store.is_authenticated());
        assert_eq!(store.get_profile().unwrap(), None);
    }
}
