//! Credential slot of one bank connection.
//!
//! Exactly one credential per connection. A new exchange overwrites the
//! slot wholesale; readers holding the old `Arc` keep a complete value.
//! The store does no network or disk I/O itself; persistence goes through
//! the [`CredentialStore`] seam.

pub mod file_store;

pub use file_store::JsonFileCredentialStore;

use crate::error::credential_store::CredentialStoreError;

use models::{Credential, CredentialState, TokenStatus};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use log::{debug, info};

/// Where credentials survive restarts.
pub trait CredentialStore: Send + Sync {
    fn get(&self, connection: &str) -> Result<Option<Credential>, CredentialStoreError>;

    /// Overwrite the connection's blob. Must be all-or-nothing.
    fn set(&self, connection: &str, credential: &Credential) -> Result<(), CredentialStoreError>;
}

/// Process-local store, for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slots: Mutex<HashMap<String, Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, connection: &str) -> Result<Option<Credential>, CredentialStoreError> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(connection).cloned())
    }

    fn set(&self, connection: &str, credential: &Credential) -> Result<(), CredentialStoreError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.insert(connection.to_string(), credential.clone());
        Ok(())
    }
}

pub struct TokenStore {
    connection: String,
    slot: RwLock<Option<Arc<Credential>>>,
    /// Serializes `replace` so disk and slot agree on the last writer.
    writer: Mutex<()>,
    persistence: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("connection", &self.connection)
            .field("slot", &self.current())
            .finish()
    }
}

impl TokenStore {
    /// Empty slot, persisting through `persistence`.
    pub fn new(connection: impl Into<String>, persistence: Arc<dyn CredentialStore>) -> Self {
        Self {
            connection: connection.into(),
            slot: RwLock::new(None),
            writer: Mutex::new(()),
            persistence,
        }
    }

    /// Slot primed from whatever `persistence` already holds for `connection`.
    pub fn load(
        connection: impl Into<String>,
        persistence: Arc<dyn CredentialStore>,
    ) -> Result<Self, CredentialStoreError> {
        let connection = connection.into();
        let existing = persistence.get(&connection)?;

        match existing {
            Some(ref credential) => info!(
                "Loaded stored credential for '{}' (expires {})",
                connection, credential.expires_at
            ),
            None => debug!("No stored credential for '{}'", connection),
        }

        Ok(Self {
            connection,
            slot: RwLock::new(existing.map(Arc::new)),
            writer: Mutex::new(()),
            persistence,
        })
    }

    pub fn connection(&self) -> &str {
        &self.connection
    }

    pub fn current(&self) -> Option<Arc<Credential>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Atomically overwrite the slot.
    ///
    /// The credential is persisted first; on a persistence failure the
    /// in-memory slot keeps its previous value. Readers are not blocked
    /// while the blob is written, only for the swap itself.
    pub fn replace(&self, credential: Credential) -> Result<Arc<Credential>, CredentialStoreError> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        self.persistence.set(&self.connection, &credential)?;

        let credential = Arc::new(credential);
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&credential));

        info!(
            "Stored new credential for '{}' (expires {}, {} scope(s))",
            self.connection,
            credential.expires_at,
            credential.scope.len()
        );
        Ok(credential)
    }

    pub fn is_valid(credential: &Credential, now: DateTime<Utc>) -> bool {
        credential.is_valid_at(now)
    }

    /// Current credential if it is still valid at `now`.
    pub fn valid_at(&self, now: DateTime<Utc>) -> Option<Arc<Credential>> {
        self.current().filter(|c| Self::is_valid(c, now))
    }

    pub fn status(&self, now: DateTime<Utc>) -> TokenStatus {
        self.current()
            .map(|c| c.status_at(now))
            .unwrap_or_else(TokenStatus::absent)
    }

    pub fn state(&self, now: DateTime<Utc>) -> CredentialState {
        CredentialState::of(self.current().as_deref(), now)
    }
}
