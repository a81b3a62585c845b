// Unit tests for logger module initialization logic
// Tests focus on thread-safety and error handling

use crate::logger::{initialize, level_from_env};

use log::LevelFilter;

use std::path::PathBuf;

/// **VALUE**: Verifies that calling initialize() multiple times doesn't panic or fail.
///
/// **WHY THIS MATTERS**: The gateway binary and tests can both reach logger setup.
/// A second call must not try to install a second global logger.
///
/// **BUG THIS CATCHES**: Would catch if the Once or AtomicBool guards are removed,
/// causing fern to fail when setting a global logger twice.
#[test]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN: A valid temporary directory
    let temp_dir = std::env::temp_dir().join("bank-gateway-test-logger-1");
    std::fs::create_dir_all(&temp_dir).unwrap();

    // WHEN: Calling initialize twice
    let result1 = initialize(&temp_dir);
    let result2 = initialize(&temp_dir);

    // THEN: Second call is a no-op returning Ok
    // (the first may already be the no-op if another test got there first)
    assert!(result1.is_ok(), "First initialization should succeed");
    assert!(
        result2.is_ok(),
        "Second initialization should succeed (idempotent)"
    );

    // Cleanup
    std::fs::remove_dir_all(&temp_dir).ok();
}

/// **VALUE**: An unwritable log directory is an error, not a panic.
///
/// **WHY THIS MATTERS**: A bad config directory must stop startup with a
/// readable message instead of aborting the process.
///
/// **BUG THIS CATCHES**: Would catch if `fern::log_file()` were unwrapped.
#[test]
fn given_invalid_log_dir_when_first_initialization_then_gateway_error() {
    // GIVEN: A path that can never hold a file
    let invalid_dir = PathBuf::from("/dev/null/invalid-path");

    // WHEN: Initializing against it
    let result = initialize(&invalid_dir);

    // THEN: Either the guard already fired (Ok) or it is a Gateway error
    if let Err(err) = result {
        let err_string = format!("{:?}", err);
        assert!(
            err_string.contains("Gateway"),
            "Error should be GatewayError::Gateway variant, got {err_string}"
        );
    }
}

/// **VALUE**: Operators can raise or lower verbosity without a rebuild.
///
/// **BUG THIS CATCHES**: Would catch a typo'd level silently disabling logs
/// instead of falling back to the default.
#[test]
fn given_level_names_when_parsed_then_known_names_win_and_garbage_falls_back() {
    // GIVEN / WHEN / THEN
    assert_eq!(level_from_env(Some("trace")), LevelFilter::Trace);
    assert_eq!(level_from_env(Some(" WARN ")), LevelFilter::Warn);
    assert_eq!(level_from_env(Some("loud")), level_from_env(None));
    assert_ne!(level_from_env(None), LevelFilter::Off);
}
