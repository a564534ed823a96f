use pagepress_lib::{ErrorCategory, PagePressError};

#[test]
fn config_error_display_includes_message() {
    let err = PagePressError::Config("workers must be at least 1".to_string());

    assert_eq!(
        format!("{}", err),
        "Configuration error: workers must be at least 1"
    );
}

#[test]
fn io_error_display_wraps_source() {
    let io_err = std::io::Error::other("disk full");
    let err: PagePressError = io_err.into();
    let rendered = format!("{}", err);

    assert!(rendered.starts_with("IO error: "));
    assert!(rendered.contains("disk full"));
}

#[test]
fn navigation_helper_uses_message() {
    let err = PagePressError::navigation("http://localhost:8000/: connection refused");

    assert_eq!(
        format!("{}", err),
        "Navigation failed: http://localhost:8000/: connection refused"
    );
}

#[test]
fn timeout_helper_uses_message() {
    let err = PagePressError::timeout("navigation to http://localhost:8000/ exceeded 60s");

    assert!(format!("{}", err).starts_with("Timed out: "));
}

#[test]
fn capture_error_payload_has_capture_category() {
    let err = PagePressError::capture("renderer returned an empty document");
    let payload = err.to_payload();

    assert_eq!(payload.category, ErrorCategory::Capture);
    assert!(payload.message.contains("empty document"));
}

#[test]
fn duplicate_output_display_names_the_path() {
    let err = PagePressError::DuplicateOutput("build/intro.pdf".to_string());

    assert_eq!(
        format!("{}", err),
        "Duplicate output path: build/intro.pdf"
    );
}

#[test]
fn error_payload_serializes_with_camel_case_keys() {
    let payload = PagePressError::timeout("readiness wait").to_payload();
    let json = serde_json::to_value(&payload).unwrap();

    assert_eq!(json["category"], "timeout");
    assert!(json["message"].as_str().unwrap().contains("readiness"));
    assert!(json.get("remediation").is_some());
}
