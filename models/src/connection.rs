use common::RedactedSecret;

use serde::{Deserialize, Serialize};

/// Banks the connector knows how to talk to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BankProvider {
    #[default]
    HellenicBank,
}

impl BankProvider {
    pub fn display_name(&self) -> &'static str {
        match self {
            BankProvider::HellenicBank => "Hellenic Bank",
        }
    }
}

/// One configured bank entity with its own OAuth2 client credentials.
///
/// The credential slot is not part of this struct; it lives in the
/// connector's token store, keyed by [`BankConnection::name`].
#[derive(Debug, Clone)]
pub struct BankConnection {
    /// Identity key; also the last segment of the redirect URI.
    pub name: String,
    pub title: String,
    pub provider: BankProvider,
    pub is_sandbox: bool,
    pub client_id: String,
    /// Write-once secret. Never serialized, zeroized on drop.
    pub client_secret: RedactedSecret,
    /// Opaque accounting linkage owned by the ERP.
    pub parent_account: Option<String>,
}

impl BankConnection {
    pub fn has_client_id(&self) -> bool {
        !self.client_id.trim().is_empty()
    }

    pub fn has_client_secret(&self) -> bool {
        !self.client_secret.is_empty()
    }
}
