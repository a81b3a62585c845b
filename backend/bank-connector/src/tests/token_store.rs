use crate::error::CredentialStoreError;
use crate::token_store::{CredentialStore, JsonFileCredentialStore, MemoryCredentialStore, TokenStore};

use models::{Credential, CredentialState};

use common::RedactedSecret;

use std::sync::mpsc::channel;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::thread;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn credential(code: &str, issued: DateTime<Utc>) -> Credential {
    Credential::issue(
        RedactedSecret::new(format!("token-{code}")),
        code,
        issued,
        Duration::hours(1),
        vec!["b2b.account.list".to_string()],
    )
}

/// Persistence that always fails, to prove the slot is untouched.
struct FailingStore;

impl CredentialStore for FailingStore {
    fn get(&self, _connection: &str) -> Result<Option<Credential>, CredentialStoreError> {
        Ok(None)
    }

    fn set(&self, connection: &str, _credential: &Credential) -> Result<(), CredentialStoreError> {
        Err(CredentialStoreError::invalid_key(connection))
    }
}

/// Persistence that reads the owning slot while writing, recording what it saw.
#[derive(Default)]
struct ReadingStore {
    owner: OnceLock<Weak<TokenStore>>,
    seen_during_set: Mutex<Vec<Option<String>>>,
}

impl CredentialStore for ReadingStore {
    fn get(&self, _connection: &str) -> Result<Option<Credential>, CredentialStoreError> {
        Ok(None)
    }

    fn set(&self, _connection: &str, _credential: &Credential) -> Result<(), CredentialStoreError> {
        let seen = self
            .owner
            .get()
            .and_then(Weak::upgrade)
            .and_then(|owner| owner.current())
            .map(|c| c.authorization_code.clone());
        self.seen_during_set.lock().expect("seen lock").push(seen);
        Ok(())
    }
}

/// **VALUE**: Validity is exactly `now < expires_at`.
///
/// **WHY THIS MATTERS**: Using a token at its expiry instant gets a 401 from
/// the bank; an off-by-one here turns every boundary call into an
/// AuthorizationExpired error.
///
/// **BUG THIS CATCHES**: Would catch `<=` instead of `<`.
#[test]
fn given_credential_when_checked_at_boundaries_then_valid_only_before_expiry() {
    // GIVEN: A credential issued at 10:00 with a one hour TTL
    let c = credential("code-1", at(10));

    // WHEN / THEN
    assert!(TokenStore::is_valid(&c, at(10)));
    assert!(TokenStore::is_valid(&c, at(11) - Duration::seconds(1)));
    assert!(!TokenStore::is_valid(&c, at(11)), "Expiry instant is already invalid");
    assert!(!TokenStore::is_valid(&c, at(12)));
}

/// **VALUE**: Replace overwrites the slot wholesale.
///
/// **WHY THIS MATTERS**: Merging an old token with new scopes would send a
/// stale bearer token that the bank has already revoked.
///
/// **BUG THIS CATCHES**: Would catch a merge or a no-op replace.
#[test]
fn given_existing_credential_when_replaced_then_new_one_fully_visible() {
    // GIVEN: A store holding code-1
    let store = TokenStore::new("hb", Arc::new(MemoryCredentialStore::new()));
    store.replace(credential("code-1", at(8))).expect("first replace");
    let old = store.current().expect("first credential");

    // WHEN: Replacing with code-2
    store.replace(credential("code-2", at(10))).expect("second replace");

    // THEN: Readers see code-2 in full; the old Arc is still intact
    let current = store.current().expect("second credential");
    assert_eq!(current.authorization_code, "code-2");
    assert_eq!(current.access_token.as_str(), "token-code-2");
    assert_eq!(old.authorization_code, "code-1");
}

/// **VALUE**: A persistence failure leaves the in-memory slot unchanged.
///
/// **WHY THIS MATTERS**: A credential that exists only in memory is lost on
/// restart, and the state machine would report Valid for a token no one
/// can recover.
///
/// **BUG THIS CATCHES**: Would catch swapping the slot before persisting.
#[test]
fn given_failing_persistence_when_replaced_then_slot_unchanged() {
    // GIVEN: A store backed by failing persistence
    let store = TokenStore::new("hb", Arc::new(FailingStore));

    // WHEN
    let result = store.replace(credential("code-1", at(10)));

    // THEN
    assert!(result.is_err());
    assert!(store.current().is_none());
}

/// **VALUE**: Readers are not blocked while a credential is persisted.
///
/// **WHY THIS MATTERS**: Persisting writes a file; statement syncs reading
/// the current token must not stall behind that disk write, and a store
/// that reads back during `set` must not deadlock.
///
/// **BUG THIS CATCHES**: Would catch holding the slot's write lock across
/// the persistence call.
#[test]
fn given_store_reading_slot_during_set_when_replaced_then_sees_previous_credential() {
    // GIVEN: A slot holding code-1, persisted by a store that reads it back
    let persistence = Arc::new(ReadingStore::default());
    let store = Arc::new(TokenStore::new(
        "hb",
        Arc::clone(&persistence) as Arc<dyn CredentialStore>,
    ));
    persistence
        .owner
        .set(Arc::downgrade(&store))
        .expect("owner set once");
    store.replace(credential("code-1", at(8))).expect("first replace");

    // WHEN: Replacing on another thread, bounded so a deadlock fails fast
    let (done_tx, done_rx) = channel();
    let writer = Arc::clone(&store);
    thread::spawn(move || {
        let result = writer.replace(credential("code-2", at(10)));
        let _ = done_tx.send(result.is_ok());
    });
    let replaced = done_rx
        .recv_timeout(StdDuration::from_secs(5))
        .expect("Replace finished without deadlocking");

    // THEN: The read inside set saw the old value; the slot now holds code-2
    assert!(replaced);
    let seen = persistence.seen_during_set.lock().expect("seen lock").clone();
    assert_eq!(seen, vec![None, Some("code-1".to_string())]);
    assert_eq!(
        store.current().expect("credential").authorization_code,
        "code-2"
    );
}

/// **VALUE**: The state machine follows the stored credential.
///
/// **WHY THIS MATTERS**: The gateway shows users whether they must
/// re-authorize; a wrong state hides an expired connection.
///
/// **BUG THIS CATCHES**: Would catch `state()` ignoring expiry.
#[test]
fn given_lifecycle_when_state_read_then_transitions_follow() {
    // GIVEN: An empty store
    let store = TokenStore::new("hb", Arc::new(MemoryCredentialStore::new()));
    assert_eq!(store.state(at(9)), CredentialState::NoCredential);
    assert!(!store.status(at(9)).valid);

    // WHEN: A credential is stored at 10:00
    store.replace(credential("code-1", at(10))).expect("replace");

    // THEN: Valid until 11:00, Expired after
    assert_eq!(store.state(at(10)), CredentialState::Valid);
    assert_eq!(store.state(at(12)), CredentialState::Expired);
    assert!(store.valid_at(at(12)).is_none());
    assert_eq!(store.status(at(10)).scopes, vec!["b2b.account.list".to_string()]);
}

/// **VALUE**: The JSON file store round-trips a credential.
///
/// **WHY THIS MATTERS**: A connector restart must not force every bank
/// connection back through human consent.
///
/// **BUG THIS CATCHES**: Would catch the access token being dropped by the
/// redacted serializer or a wrong file path.
#[test]
fn given_file_store_when_credential_set_then_loaded_back_by_new_store() {
    // GIVEN: A temp credential directory
    let dir = tempfile::tempdir().expect("temp dir");
    let persistence: Arc<dyn CredentialStore> = Arc::new(JsonFileCredentialStore::new(dir.path()));
    let store = TokenStore::new("hellenic", Arc::clone(&persistence));

    // WHEN: Replacing, then loading a fresh store from the same directory
    store.replace(credential("code-1", at(10))).expect("replace");
    let reloaded = TokenStore::load("hellenic", persistence).expect("load");

    // THEN: Same credential, no temp file left behind
    assert_eq!(
        reloaded.current().as_deref(),
        Some(&credential("code-1", at(10)))
    );
    assert!(dir.path().join("hellenic.json").exists());
    assert!(!dir.path().join("hellenic.json.tmp").exists());
}

#[test]
fn given_unsafe_connection_name_when_file_store_used_then_invalid_key() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = JsonFileCredentialStore::new(dir.path());

    let result = store.set("../escape", &credential("code-1", at(10)));

    assert!(matches!(result, Err(CredentialStoreError::InvalidKey { .. })));
}

#[test]
fn given_corrupt_blob_when_file_store_read_then_parse_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join("hb.json"), "{not json").expect("write");
    let store = JsonFileCredentialStore::new(dir.path());

    assert!(matches!(store.get("hb"), Err(CredentialStoreError::Parse { .. })));
}

#[test]
fn given_missing_blob_when_file_store_read_then_none() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = JsonFileCredentialStore::new(dir.path());

    assert!(store.get("hb").expect("read").is_none());
}
