use super::*;

#[test]
fn config_error_display() {
    let err = DailyStartError::Config("bad value".into());
    assert_eq!(err.to_string(), "Configuration error: bad value");
}

#[test]
fn source_error_display_and_retryable() {
    let err = DailyStartError::source_failure("backend", "timeout", true);
    assert_eq!(err.to_string(), "Source error: backend: timeout");
    assert!(err.is_retryable());
}

#[test]
fn non_retryable_source_error() {
    let err = DailyStartError::source_failure("backend", "HTTP 404", false);
    assert!(!err.is_retryable());
}

#[test]
fn validation_error_is_user_facing() {
    let err = DailyStartError::Validation("message text is required".into());
    assert!(err.is_user_facing());
    assert!(!err.is_retryable());
    assert_eq!(err.to_string(), "Invalid input: message text is required");
}

#[test]
fn storage_error_not_user_facing() {
    let err = DailyStartError::Storage("quota exceeded".into());
    assert!(!err.is_user_facing());
    assert!(!err.is_retryable());
}

#[test]
fn internal_from_anyhow() {
    let anyhow_err = anyhow::anyhow!("something broke");
    let err: DailyStartError = anyhow_err.into();
    assert!(matches!(err, DailyStartError::Internal(_)));
    assert!(err.is_retryable());
}
