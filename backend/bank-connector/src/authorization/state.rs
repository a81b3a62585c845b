use chrono::{DateTime, Utc};
use url::Url;
use uuid::Uuid;

/// An authorize URL handed out and not yet answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAuthorization {
    pub state_token: String,
    pub redirect_uri: Url,
    pub issued_at: DateTime<Utc>,
}

/// Ephemeral anti-forgery state of one connection.
///
/// At most one request is outstanding; issuing a new one supersedes the
/// previous token.
#[derive(Debug, Default)]
pub struct AuthorizationState {
    pending: Option<PendingAuthorization>,
}

impl AuthorizationState {
    pub fn issue(&mut self, redirect_uri: Url, now: DateTime<Utc>) -> &PendingAuthorization {
        self.pending.insert(PendingAuthorization {
            state_token: Uuid::new_v4().simple().to_string(),
            redirect_uri,
            issued_at: now,
        })
    }

    pub fn pending(&self) -> Option<&PendingAuthorization> {
        self.pending.as_ref()
    }

    pub fn matches(&self, state_token: &str) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| !state_token.is_empty() && p.state_token == state_token)
    }

    /// Consume the outstanding request if `state_token` is the one issued.
    ///
    /// A mismatch leaves the outstanding request in place.
    pub fn take_matching(&mut self, state_token: &str) -> Option<PendingAuthorization> {
        if self.matches(state_token) {
            self.pending.take()
        } else {
            None
        }
    }
}
