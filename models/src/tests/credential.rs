// Unit tests for Credential validity and the credential state machine

use crate::{Credential, CredentialState, TokenStatus};

use common::RedactedSecret;

use chrono::{Duration, TimeZone, Utc};

fn credential_expiring_in(minutes: i64) -> Credential {
    let created_on = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
    Credential::issue(
        RedactedSecret::new("access-token"),
        "code-1",
        created_on,
        Duration::minutes(minutes),
        vec![String::from("b2b.account.list")],
    )
}

/// **VALUE**: Validity is exactly `now < expires_at`.
///
/// **WHY THIS MATTERS**: The API client refuses to call the bank with an invalid
/// credential. Off-by-one at the boundary would send an expired token once.
///
/// **BUG THIS CATCHES**: Would catch `<=` instead of `<`.
#[test]
fn given_credential_when_checked_around_expiry_then_boundary_is_exclusive() {
    // GIVEN: A credential valid for 60 minutes
    let credential = credential_expiring_in(60);
    let expires_at = credential.expires_at;

    // THEN: Valid just before, invalid at and after expiry
    assert!(credential.is_valid_at(expires_at - Duration::seconds(1)));
    assert!(!credential.is_valid_at(expires_at));
    assert!(!credential.is_valid_at(expires_at + Duration::seconds(1)));
}

/// **VALUE**: `created_on` has no influence on validity.
///
/// **WHY THIS MATTERS**: Validity must be a function of `expires_at` and now only.
///
/// **BUG THIS CATCHES**: Would catch validity computed as `created_on + ttl` at read time.
#[test]
fn given_created_on_in_future_when_checked_then_only_expires_at_matters() {
    // GIVEN: A credential whose created_on is after "now"
    let mut credential = credential_expiring_in(60);
    let now = credential.created_on - Duration::hours(2);
    credential.created_on = credential.expires_at + Duration::days(1);

    // THEN: Still valid because now < expires_at
    assert!(credential.is_valid_at(now));
}

#[test]
fn given_credentials_when_classified_then_state_machine_matches() {
    let credential = credential_expiring_in(30);
    let before = credential.created_on;
    let after = credential.expires_at + Duration::minutes(1);

    assert_eq!(CredentialState::of(None, before), CredentialState::NoCredential);
    assert_eq!(CredentialState::of(Some(&credential), before), CredentialState::Valid);
    assert_eq!(CredentialState::of(Some(&credential), after), CredentialState::Expired);
}

#[test]
fn given_credential_when_status_requested_then_reports_scopes_and_expiry() {
    let credential = credential_expiring_in(30);

    let status = credential.status_at(credential.created_on);

    assert!(status.valid);
    assert_eq!(status.expires_at, Some(credential.expires_at));
    assert_eq!(status.scopes, vec![String::from("b2b.account.list")]);
    assert!(!TokenStatus::absent().valid);
}

/// **VALUE**: A persisted credential round-trips including the access token.
///
/// **WHY THIS MATTERS**: Credentials are stored as JSON blobs; losing the token on
/// reload would force a re-authorization after every restart.
///
/// **BUG THIS CATCHES**: Would catch the `exposed` serde adapter being removed.
#[test]
fn given_credential_when_serialized_and_restored_then_equal() {
    let credential = credential_expiring_in(45);

    let json = serde_json::to_string(&credential).expect("credential should serialize");
    let restored: Credential = serde_json::from_str(&json).expect("credential should deserialize");

    assert_eq!(restored, credential);
    assert_eq!(restored.access_token.as_str(), "access-token");
}
