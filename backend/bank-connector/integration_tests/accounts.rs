use crate::helpers::{api_client, fast_retry, token_store, valid_credential};

use bank_connector::accounts::AccountDirectory;

use models::BankAccount;

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// **VALUE**: The account list maps onto bank accounts.
///
/// **WHY THIS MATTERS**: Statement syncs are keyed by IBAN; a wrong field
/// mapping points reconciliation at the wrong account.
///
/// **BUG THIS CATCHES**: Would catch camelCase names not being honoured or
/// list-shaped currency codes not being handled.
#[tokio::test]
async fn given_account_list_when_listed_then_accounts_mapped() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/b2b/account/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payload": {
                "accounts": [
                    {
                        "accountName": "Operating",
                        "accountNumber": "001-123",
                        "iban": "CY17002001280000001200527600",
                        "accountCurrencyCodes": ["eur"]
                    },
                    {
                        "accountName": "USD Reserve",
                        "accountNumber": "001-456",
                        "iban": "CY21002001950000357001234567",
                        "accountCurrencyCodes": "USD"
                    }
                ]
            }
        })))
        .mount(&server)
        .await;

    let directory = AccountDirectory::new(api_client(
        &server,
        token_store(Some(valid_credential("code-1"))),
        fast_retry(),
        Duration::from_secs(5),
    ));

    // WHEN
    let accounts = directory.list_accounts().await.expect("Listing succeeds");

    // THEN
    assert_eq!(
        accounts,
        vec![
            BankAccount {
                name: "Operating".to_string(),
                number: "001-123".to_string(),
                iban: "CY17002001280000001200527600".to_string(),
                currency: "EUR".to_string(),
            },
            BankAccount {
                name: "USD Reserve".to_string(),
                number: "001-456".to_string(),
                iban: "CY21002001950000357001234567".to_string(),
                currency: "USD".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn given_no_accounts_payload_when_listed_then_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/b2b/account/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"payload": {}})))
        .mount(&server)
        .await;

    let directory = AccountDirectory::new(api_client(
        &server,
        token_store(Some(valid_credential("code-1"))),
        fast_retry(),
        Duration::from_secs(5),
    ));

    assert!(directory.list_accounts().await.expect("ok").is_empty());
}
