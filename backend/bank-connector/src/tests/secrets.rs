// Env-var tests mutate process state; every test here runs #[serial].

use crate::config::{ConnectionConfig, ConnectorConfig, load_client_secrets};

use models::BankProvider;

use std::env;

use serial_test::serial;

fn config_with(connections: &[(&str, &str)]) -> ConnectorConfig {
    ConnectorConfig {
        connections: connections
            .iter()
            .map(|(name, var)| ConnectionConfig {
                name: name.to_string(),
                title: String::new(),
                provider: BankProvider::HellenicBank,
                is_sandbox: true,
                client_id: "client-123".to_string(),
                client_secret_env: var.to_string(),
                parent_account: None,
                endpoints: None,
            })
            .collect(),
        ..Default::default()
    }
}

/// **VALUE**: Secrets are read from the variable each connection names.
///
/// **WHY THIS MATTERS**: Two connections with different client registrations
/// must never end up sharing one secret.
///
/// **BUG THIS CATCHES**: Would catch the loader reading a fixed variable or
/// mixing up connection names.
#[test]
#[serial]
fn given_secret_env_vars_when_loaded_then_each_connection_gets_its_own() {
    // GIVEN
    unsafe {
        env::set_var("BANK_CONNECTOR_TEST_SECRET_A", "  secret-a  ");
        env::set_var("BANK_CONNECTOR_TEST_SECRET_B", "secret-b");
    }
    let config = config_with(&[
        ("alpha", "BANK_CONNECTOR_TEST_SECRET_A"),
        ("beta", "BANK_CONNECTOR_TEST_SECRET_B"),
    ]);

    // WHEN
    let mut loaded = load_client_secrets(&config);

    // THEN
    assert!(loaded.missing.is_empty());
    assert_eq!(loaded.take("alpha").as_str(), "secret-a");
    assert_eq!(loaded.take("beta").as_str(), "secret-b");

    unsafe {
        env::remove_var("BANK_CONNECTOR_TEST_SECRET_A");
        env::remove_var("BANK_CONNECTOR_TEST_SECRET_B");
    }
}

/// **VALUE**: Unset, blank or unconfigured variables are reported as missing
/// and yield an empty secret instead of failing startup.
///
/// **BUG THIS CATCHES**: Would catch a whitespace-only secret being sent to
/// the bank as a real one.
#[test]
#[serial]
fn given_unset_blank_and_unconfigured_vars_when_loaded_then_reported_missing() {
    // GIVEN
    unsafe {
        env::remove_var("BANK_CONNECTOR_TEST_SECRET_UNSET");
        env::set_var("BANK_CONNECTOR_TEST_SECRET_BLANK", "   ");
    }
    let config = config_with(&[
        ("unset", "BANK_CONNECTOR_TEST_SECRET_UNSET"),
        ("blank", "BANK_CONNECTOR_TEST_SECRET_BLANK"),
        ("none", ""),
    ]);

    // WHEN
    let mut loaded = load_client_secrets(&config);

    // THEN
    assert_eq!(loaded.missing, vec!["unset", "blank", "none"]);
    assert!(loaded.take("blank").is_empty());

    unsafe {
        env::remove_var("BANK_CONNECTOR_TEST_SECRET_BLANK");
    }
}
