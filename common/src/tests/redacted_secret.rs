// Unit tests for RedactedSecret
// Covers redaction in Debug/Display, refused serialization and the explicit adapter

use crate::RedactedSecret;

use serde::{Deserialize, Serialize};

/// **VALUE**: Debug and Display never print the secret.
///
/// **WHY THIS MATTERS**: Connections and credentials are logged with `{:?}` in several
/// places. A leaked client secret or bearer token in a log file is a security incident.
///
/// **BUG THIS CATCHES**: Would catch a derived Debug replacing the manual impl.
#[test]
fn given_secret_when_formatted_then_value_is_redacted() {
    // GIVEN: A secret
    let secret = RedactedSecret::new("super-secret-value");

    // WHEN: Formatting with Debug and Display
    let debug = format!("{:?}", secret);
    let display = format!("{}", secret);

    // THEN: Neither contains the value
    assert!(!debug.contains("super-secret-value"));
    assert!(!display.contains("super-secret-value"));
    assert_eq!(secret.len(), 18, "Length is safe to expose");
}

/// **VALUE**: Plain serialization of a secret fails.
///
/// **WHY THIS MATTERS**: A secret embedded in a response struct must not silently end
/// up in JSON sent to a browser.
///
/// **BUG THIS CATCHES**: Would catch if someone derives Serialize on RedactedSecret.
#[test]
fn given_secret_when_serialized_directly_then_returns_error() {
    let secret = RedactedSecret::new("token");

    let result = serde_json::to_string(&secret);

    assert!(result.is_err(), "Direct serialization must be refused");
}

/// **VALUE**: The `exposed` adapter persists and restores the raw value.
///
/// **WHY THIS MATTERS**: Credentials are stored as JSON blobs. The access token must be
/// written deliberately, and only through a field that opts in.
///
/// **BUG THIS CATCHES**: Would catch if the adapter writes the redacted placeholder.
#[test]
fn given_field_with_exposed_adapter_when_round_tripped_then_value_survives() {
    #[derive(Serialize, Deserialize)]
    struct Blob {
        #[serde(with = "crate::redacted_secret::exposed")]
        token: RedactedSecret,
    }

    // GIVEN: A struct opting into exposure
    let blob = Blob {
        token: RedactedSecret::new("abc123"),
    };

    // WHEN: Serializing and reading back
    let json = serde_json::to_string(&blob).expect("adapter should serialize");
    let restored: Blob = serde_json::from_str(&json).expect("adapter should deserialize");

    // THEN: Raw value is in the JSON and survives
    assert!(json.contains("abc123"));
    assert_eq!(restored.token, RedactedSecret::new("abc123"));
}

#[test]
fn given_whitespace_secret_when_checked_then_is_empty() {
    assert!(RedactedSecret::new("   ").is_empty());
    assert!(RedactedSecret::new("").is_empty());
    assert!(!RedactedSecret::new("x").is_empty());
}
