use crate::helpers::{IBAN, api_client, fast_retry, request_count, token_store, valid_credential};

use bank_connector::error::{BankApiError, SyncError};
use bank_connector::transaction_sync::{MAX_STATEMENT_PAGES, TransactionSync};

use models::ErrorKind;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const REPORT_PATH: &str = "/v1/b2b/account/report";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn line(id: &str, value_date: &str, amount: Value) -> Value {
    json!({
        "transactionId": id,
        "transactionValueDate": value_date,
        "transactionAmount": amount,
        "currency": "EUR",
        "customerReference": format!("REF-{id}"),
        "paymentNotes": format!("Notes {id}")
    })
}

fn page(lines: Vec<Value>, next: Option<&str>) -> ResponseTemplate {
    let mut payload = json!({ "transactions": lines });
    if let Some(token) = next {
        payload["nextPageToken"] = json!(token);
    }
    ResponseTemplate::new(200).set_body_json(json!({ "payload": payload }))
}

async fn sync_for(server: &MockServer) -> TransactionSync {
    TransactionSync::new(api_client(
        server,
        token_store(Some(valid_credential("code-1"))),
        fast_retry(),
        Duration::from_secs(5),
    ))
}

/// **VALUE**: An inverted range fails before any request.
///
/// **WHY THIS MATTERS**: The bank answers an inverted range with an empty
/// statement, which reconciliation would read as "no activity".
///
/// **BUG THIS CATCHES**: Would catch the range check running after the call.
#[tokio::test]
async fn given_from_after_to_when_fetched_then_invalid_range_without_network() {
    // GIVEN
    let server = MockServer::start().await;
    let sync = sync_for(&server).await;

    // WHEN
    let result = sync.fetch(IBAN, date(2024, 2, 1), date(2024, 1, 1)).await;

    // THEN
    assert!(matches!(result, Err(SyncError::InvalidRange { .. })));
    assert_eq!(request_count(&server).await, 0);
}

/// **VALUE**: Lines map onto signed transaction records.
///
/// **WHY THIS MATTERS**: Reconciliation books deposits and withdrawals from
/// the sign; a flipped or rounded amount produces a wrong ledger.
///
/// **BUG THIS CATCHES**: Would catch float rounding, a dropped sign, or the
/// range not formatted the way the bank expects.
#[tokio::test]
async fn given_single_page_when_fetched_then_records_mapped() {
    // GIVEN: One deposit and one withdrawal for January
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REPORT_PATH))
        .and(query_param("account", IBAN))
        .and(query_param("dateFrom", "202401010000"))
        .and(query_param("dateTo", "202401312359"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(page(
            vec![
                line("T1", "2024-01-05", json!(1500.25)),
                line("T2", "2024-01-06", json!("-42.10")),
            ],
            None,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let sync = sync_for(&server).await;

    // WHEN
    let records = sync
        .fetch(IBAN, date(2024, 1, 1), date(2024, 1, 31))
        .await
        .expect("Sync should succeed");

    // THEN
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].external_id, "T1");
    assert_eq!(records[0].value_date, date(2024, 1, 5));
    assert_eq!(records[0].amount, dec!(1500.25));
    assert!(records[0].is_deposit());
    assert_eq!(records[0].counterparty_reference.as_deref(), Some("REF-T1"));
    assert_eq!(records[0].description.as_deref(), Some("Notes T1"));
    assert_eq!(records[1].amount, dec!(-42.10));
    assert!(!records[1].is_deposit());
    assert_eq!(records[1].raw_payload["transactionId"], json!("T2"));
}

/// **VALUE**: Pages are concatenated in the order received.
///
/// **WHY THIS MATTERS**: Stopping after page one silently drops most of a
/// busy month's statement.
///
/// **BUG THIS CATCHES**: Would catch ignoring `nextPageToken` or re-sorting.
#[tokio::test]
async fn given_two_pages_when_fetched_then_concatenated_in_order() {
    // GIVEN: Page one pointing at page two
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REPORT_PATH))
        .and(query_param_is_missing("pageToken"))
        .respond_with(page(
            vec![
                line("B", "2024-01-09", json!(10)),
                line("A", "2024-01-02", json!(20)),
            ],
            Some("page-2"),
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(REPORT_PATH))
        .and(query_param("pageToken", "page-2"))
        .respond_with(page(vec![line("C", "2024-01-01", json!(30))], None))
        .expect(1)
        .mount(&server)
        .await;

    let sync = sync_for(&server).await;

    // WHEN
    let records = sync
        .fetch(IBAN, date(2024, 1, 1), date(2024, 1, 31))
        .await
        .expect("Sync should succeed");

    // THEN
    let ids: Vec<&str> = records.iter().map(|r| r.external_id.as_str()).collect();
    assert_eq!(ids, vec!["B", "A", "C"]);
}

#[tokio::test]
async fn given_no_transactions_when_fetched_then_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REPORT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"payload": {}})))
        .mount(&server)
        .await;

    let records = sync_for(&server)
        .await
        .fetch(IBAN, date(2024, 1, 1), date(2024, 1, 1))
        .await
        .expect("Empty sync succeeds");

    assert!(records.is_empty());
}

#[tokio::test]
async fn given_duplicate_ids_when_fetched_then_first_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REPORT_PATH))
        .respond_with(page(
            vec![
                line("T1", "2024-01-05", json!(1)),
                line("T1", "2024-01-05", json!(99)),
            ],
            None,
        ))
        .mount(&server)
        .await;

    let records = sync_for(&server)
        .await
        .fetch(IBAN, date(2024, 1, 1), date(2024, 1, 31))
        .await
        .expect("Sync succeeds");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].amount, dec!(1));
}

/// **VALUE**: A bank that repeats its page token cannot loop the sync forever.
///
/// **WHY THIS MATTERS**: An infinite pagination loop hangs the nightly
/// reconciliation job and floods the bank.
///
/// **BUG THIS CATCHES**: Would catch following tokens without memory.
#[tokio::test]
async fn given_repeated_page_token_when_fetched_then_pagination_stops() {
    // GIVEN: Every page points at page "loop"
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REPORT_PATH))
        .and(query_param_is_missing("pageToken"))
        .respond_with(page(vec![line("T1", "2024-01-05", json!(1))], Some("loop")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(REPORT_PATH))
        .and(query_param("pageToken", "loop"))
        .respond_with(page(vec![line("T2", "2024-01-06", json!(2))], Some("loop")))
        .mount(&server)
        .await;

    // WHEN
    let records = sync_for(&server)
        .await
        .fetch(IBAN, date(2024, 1, 1), date(2024, 1, 31))
        .await
        .expect("Sync succeeds");

    // THEN: Both pages read once, then stop
    assert_eq!(records.len(), 2);
    assert_eq!(request_count(&server).await, 2);
}

/// Hands out a fresh page token on every request.
struct EndlessPages {
    served: AtomicUsize,
}

impl Respond for EndlessPages {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.served.fetch_add(1, Ordering::SeqCst);
        page(
            vec![line(&format!("T{n}"), "2024-01-05", json!(1))],
            Some(&format!("tok-{n}")),
        )
    }
}

/// **VALUE**: A bank that never stops offering new pages is cut off at the
/// page budget with an error.
///
/// **WHY THIS MATTERS**: Distinct tokens slip past the repeated-token check;
/// without a budget the sync runs forever and floods the bank. Returning the
/// pages read so far would hand reconciliation a silently partial statement.
///
/// **BUG THIS CATCHES**: Would catch the budget being dropped, or being hit
/// and reported as success.
#[tokio::test]
async fn given_endless_distinct_tokens_when_fetched_then_page_limit_after_budget() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REPORT_PATH))
        .respond_with(EndlessPages {
            served: AtomicUsize::new(0),
        })
        .mount(&server)
        .await;
    let sync = sync_for(&server).await.with_max_pages(5);

    // WHEN
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        sync.fetch(IBAN, date(2024, 1, 1), date(2024, 1, 31)),
    )
    .await
    .expect("Sync must finish");

    // THEN
    match result {
        Err(SyncError::PageLimit { pages, .. }) => assert_eq!(pages, 5),
        other => panic!("Expected PageLimit, got {other:?}"),
    }
    assert_eq!(request_count(&server).await, 5);
}

#[tokio::test]
async fn given_default_sync_when_built_then_page_budget_bounded() {
    let server = MockServer::start().await;

    let sync = sync_for(&server).await;

    assert_eq!(sync.max_pages(), MAX_STATEMENT_PAGES);
    assert_eq!(sync.with_max_pages(0).max_pages(), 1);
}

#[tokio::test]
async fn given_expired_authorization_when_fetched_then_error_propagated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REPORT_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = sync_for(&server)
        .await
        .fetch(IBAN, date(2024, 1, 1), date(2024, 1, 31))
        .await;

    match result {
        Err(SyncError::Api(BankApiError::AuthorizationExpired { .. })) => {}
        other => panic!("Expected AuthorizationExpired, got {other:?}"),
    }
}

#[tokio::test]
async fn given_unparseable_line_when_fetched_then_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REPORT_PATH))
        .respond_with(page(vec![json!({"transactionId": "T1"})], None))
        .mount(&server)
        .await;

    let result = sync_for(&server)
        .await
        .fetch(IBAN, date(2024, 1, 1), date(2024, 1, 31))
        .await;

    assert_eq!(result.expect_err("must fail").kind(), ErrorKind::InvalidResponse);
}
