use crate::transaction_sync::parse_value_date;

use chrono::NaiveDate;

/// **VALUE**: Value dates parse in every shape the bank has been seen to send.
///
/// **WHY THIS MATTERS**: One unparseable line fails the whole sync, leaving
/// reconciliation with nothing.
///
/// **BUG THIS CATCHES**: Would catch only supporting the ISO form.
#[test]
fn given_supported_date_shapes_when_parsed_then_same_day() {
    // GIVEN
    let expected = NaiveDate::from_ymd_opt(2024, 1, 5);

    // WHEN / THEN
    assert_eq!(parse_value_date("2024-01-05"), expected);
    assert_eq!(parse_value_date("2024-01-05T10:30:00Z"), expected);
    assert_eq!(parse_value_date("20240105"), expected);
    assert_eq!(parse_value_date("202401050000"), expected);
    assert_eq!(parse_value_date(" 2024-01-05 "), expected);
}

#[test]
fn given_garbage_when_parsed_then_none() {
    assert_eq!(parse_value_date("yesterday"), None);
    assert_eq!(parse_value_date(""), None);
}
