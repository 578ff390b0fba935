use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::config::StoreBackend;
use crate::models::{Credential, UserProfile};

use super::{
    FileStore, KeyValueStore, KeyringStore, MemoryStore, StoreError, PROFILE_KEY, TOKEN_KEY,
};

/// Credential and profile persistence over an injected `KeyValueStore`.
///
/// All access goes through one mutex. The paired operations
/// (`start_session`, `invalidate`, `rename_profile`) hold it for their whole
/// read/write sequence, so the credential and profile are always observed
/// together.
pub struct SessionStore {
    backend: Mutex<Box<dyn KeyValueStore>>,
}

impl SessionStore {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self::from_boxed(Box::new(backend))
    }

    pub fn from_boxed(backend: Box<dyn KeyValueStore>) -> Self {
        Self {
            backend: Mutex::new(backend),
        }
    }

    /// Session store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Session store over the selected backend. `data_dir` is only used by
    /// the file backend.
    pub fn for_backend(backend: StoreBackend, data_dir: &Path) -> Self {
        match backend {
            StoreBackend::File => Self::new(FileStore::in_dir(data_dir)),
            StoreBackend::Keyring => Self::new(KeyringStore::new()),
            StoreBackend::Memory => Self::in_memory(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn KeyValueStore>> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Credential =====

    /// Stored credential. An empty stored value reads as absent.
    pub fn get_credential(&self) -> Result<Option<Credential>, StoreError> {
        let backend = self.lock();
        read_credential(&**backend)
    }

    pub fn set_credential(&self, credential: &Credential) -> Result<(), StoreError> {
        self.lock().set(TOKEN_KEY, credential.as_str())
    }

    pub fn clear_credential(&self) -> Result<(), StoreError> {
        self.lock().remove(TOKEN_KEY)
    }

    // ===== Profile =====

    /// Stored profile. Data that no longer decodes is logged and treated as
    /// absent.
    pub fn get_profile(&self) -> Result<Option<UserProfile>, StoreError> {
        let backend = self.lock();
        read_profile(&**backend)
    }

    pub fn set_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let json = serde_json::to_string(profile)?;
        self.lock().set(PROFILE_KEY, &json)
    }

    pub fn clear_profile(&self) -> Result<(), StoreError> {
        self.lock().remove(PROFILE_KEY)
    }

    // ===== Session =====

    /// Whether a non-empty credential is stored. Backend failures count as
    /// not authenticated.
    pub fn is_authenticated(&self) -> bool {
        match self.get_credential() {
            Ok(credential) => credential.is_some(),
            Err(e) => {
                warn!(error = %e, "Failed to read credential, treating session as absent");
                false
            }
        }
    }

    /// Credential and profile read under a single lock acquisition
    pub fn get_session(&self) -> Result<(Option<Credential>, Option<UserProfile>), StoreError> {
        let backend = self.lock();
        Ok((read_credential(&**backend)?, read_profile(&**backend)?))
    }

    /// Store a credential and its profile together.
    ///
    /// If either write fails both keys are removed, so a previous session's
    /// profile cannot outlive its credential.
    pub fn start_session(
        &self,
        credential: &Credential,
        profile: &UserProfile,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(profile)?;
        let mut backend = self.lock();

        let written = backend
            .set(TOKEN_KEY, credential.as_str())
            .and_then(|()| backend.set(PROFILE_KEY, &json));
        if let Err(e) = written {
            for key in [TOKEN_KEY, PROFILE_KEY] {
                if let Err(rollback) = backend.remove(key) {
                    warn!(error = %rollback, key, "Failed to roll back session after write error");
                }
            }
            return Err(e);
        }

        debug!(email = %profile.email, "Session started");
        Ok(())
    }

    /// Remove both the credential and the profile.
    ///
    /// Both removals are attempted; the first error is returned.
    pub fn invalidate(&self) -> Result<(), StoreError> {
        let mut backend = self.lock();
        let token = backend.remove(TOKEN_KEY);
        let profile = backend.remove(PROFILE_KEY);
        debug!("Session invalidated");
        token.and(profile)
    }

    /// Overwrite the stored profile's display name.
    ///
    /// Returns the updated profile, or `None` without writing anything when
    /// no profile is stored.
    pub fn rename_profile(&self, name: &str) -> Result<Option<UserProfile>, StoreError> {
        let mut backend = self.lock();
        let Some(mut profile) = read_profile(&**backend)? else {
            debug!("No stored profile to rename");
            return Ok(None);
        };

        profile.name = name.to_string();
        backend.set(PROFILE_KEY, &serde_json::to_string(&profile)?)?;
        Ok(Some(profile))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn read_credential(backend: &dyn KeyValueStore) -> Result<Option<Credential>, StoreError> {
    Ok(backend
        .get(TOKEN_KEY)?
        .filter(|token| !token.is_empty())
        .map(Credential::from))
}

fn read_profile(backend: &dyn KeyValueStore) -> Result<Option<UserProfile>, StoreError> {
    let Some(json) = backend.get(PROFILE_KEY)? else {
        return Ok(None);
    };

    match serde_json::from_str(&json) {
        Ok(profile) => Ok(Some(profile)),
        Err(e) => {
            warn!(error = %e, "Stored profile could not be decoded, ignoring it");
            Ok(None)
        }
    }
}
