use crate::config::is_valid_connection_name;
use crate::error::credential_store::CredentialStoreError;
use crate::token_store::CredentialStore;

use models::Credential;

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use log::debug;

const CREDENTIAL_EXTENSION: &str = "json";

/// One `<connection>.json` blob per connection under `dir`.
///
/// Writes go to a temp file first and are renamed into place, so a crash
/// never leaves a half-written credential behind.
#[derive(Debug, Clone)]
pub struct JsonFileCredentialStore {
    dir: PathBuf,
}

impl JsonFileCredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, connection: &str) -> Result<PathBuf, CredentialStoreError> {
        if !is_valid_connection_name(connection) {
            return Err(CredentialStoreError::invalid_key(connection));
        }

        Ok(self
            .dir
            .join(format!("{connection}.{CREDENTIAL_EXTENSION}")))
    }
}

impl CredentialStore for JsonFileCredentialStore {
    fn get(&self, connection: &str) -> Result<Option<Credential>, CredentialStoreError> {
        let path = self.path_for(connection)?;

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CredentialStoreError::read(&path, e)),
        };

        let credential = serde_json::from_str(&contents)
            .map_err(|e| CredentialStoreError::parse(&path, e.to_string()))?;

        debug!("Read credential blob {}", path.display());
        Ok(Some(credential))
    }

    fn set(&self, connection: &str, credential: &Credential) -> Result<(), CredentialStoreError> {
        let path = self.path_for(connection)?;
        let temp_path = self
            .dir
            .join(format!("{connection}.{CREDENTIAL_EXTENSION}.tmp"));

        std::fs::create_dir_all(&self.dir)
            .map_err(|e| CredentialStoreError::write(&self.dir, e))?;

        let json = serde_json::to_string_pretty(credential)
            .map_err(|e| CredentialStoreError::serialize(e.to_string()))?;

        std::fs::write(&temp_path, json).map_err(|e| CredentialStoreError::write(&temp_path, e))?;

        std::fs::rename(&temp_path, &path).map_err(|e| CredentialStoreError::write(&path, e))?;

        debug!("Wrote credential blob {}", path.display());
        Ok(())
    }
}
