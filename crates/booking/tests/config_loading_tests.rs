//! Table-driven tests for configuration loading and validation.

mod common;

use std::io::Write;

use booking::config::{load_config, load_config_from_str, StoreConfig};
use booking::gateway::{connect, PersistenceGateway};
use booking::service::BookingService;

struct ConfigTestCase {
    name: &'static str,
    config_json: &'static str,
    should_succeed: bool,
    expected_error: Option<&'static str>,
}

const CONFIG_TESTS: &[ConfigTestCase] = &[
    ConfigTestCase {
        name: "valid_minimal",
        config_json: r#"{ "version": "1.0" }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_memory_store",
        config_json: r#"{ "version": "1.0", "store": { "kind": "memory" } }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_hosted_store",
        config_json: r#"{
            "version": "1.0",
            "store": {
                "kind": "hosted",
                "url": "https://db.example.com",
                "keyEnvVar": "BOOKING_TEST_STORE_KEY",
                "table": "bookings"
            }
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "unsupported_version",
        config_json: r#"{ "version": "2.0" }"#,
        should_succeed: false,
        expected_error: Some("Unsupported config version"),
    },
    ConfigTestCase {
        name: "missing_version",
        config_json: r#"{ "store": { "kind": "memory" } }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "unknown_top_level_field",
        config_json: r#"{ "version": "1.0", "port": 8080 }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "hosted_without_url",
        config_json: r#"{ "version": "1.0", "store": { "kind": "hosted" } }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "hosted_non_http_url",
        config_json: r#"{
            "version": "1.0",
            "store": { "kind": "hosted", "url": "ftp://db.example.com" }
        }"#,
        should_succeed: false,
        expected_error: Some("must be http(s)"),
    },
    ConfigTestCase {
        name: "unknown_appointment_type",
        config_json: r#"{ "version": "1.0", "form": { "appointmentTypes": ["Dentist"] } }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "empty_appointment_types",
        config_json: r#"{ "version": "1.0", "form": { "appointmentTypes": [] } }"#,
        should_succeed: false,
        expected_error: Some("At least one appointment type"),
    },
    ConfigTestCase {
        name: "malformed_time_slot",
        config_json: r#"{ "version": "1.0", "form": { "timeSlots": ["10:00", "noon"] } }"#,
        should_succeed: false,
        expected_error: Some("Invalid time slot 'noon'"),
    },
    ConfigTestCase {
        name: "duplicate_time_slot",
        config_json: r#"{ "version": "1.0", "form": { "timeSlots": ["10:00", "10:00"] } }"#,
        should_succeed: false,
        expected_error: Some("Duplicate time slot"),
    },
    ConfigTestCase {
        name: "same_bucket_twice",
        config_json: r#"{ "version": "1.0", "buckets": { "primary": "files", "secondary": "files" } }"#,
        should_succeed: false,
        expected_error: Some("must differ"),
    },
    ConfigTestCase {
        name: "bucket_with_separator",
        config_json: r#"{ "version": "1.0", "buckets": { "primary": "a/b" } }"#,
        should_succeed: false,
        expected_error: Some("Invalid bucket 'a/b'"),
    },
    ConfigTestCase {
        name: "zero_store_timeout",
        config_json: r#"{ "version": "1.0", "storeTimeoutSecs": 0 }"#,
        should_succeed: false,
        expected_error: Some("storeTimeoutSecs"),
    },
    ConfigTestCase {
        name: "inverted_phone_bounds",
        config_json: r#"{ "version": "1.0", "form": { "phoneDigits": { "min": 12, "max": 10 } } }"#,
        should_succeed: false,
        expected_error: Some("Invalid phone digit bounds"),
    },
    ConfigTestCase {
        name: "bad_log_format",
        config_json: r#"{ "version": "1.0", "logging": { "format": "xml" } }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "not_json",
        config_json: "version: 1.0",
        should_succeed: false,
        expected_error: Some("Failed to parse config JSON"),
    },
];

#[test]
fn test_config_loading_table() {
    for case in CONFIG_TESTS {
        let result = load_config_from_str(case.config_json);
        match (case.should_succeed, result) {
            (true, Ok(_)) => {}
            (true, Err(e)) => panic!("{}: expected success, got {}", case.name, e),
            (false, Ok(_)) => panic!("{}: expected failure, got success", case.name),
            (false, Err(e)) => {
                if let Some(expected) = case.expected_error {
                    let message = e.to_string();
                    assert!(
                        message.contains(expected),
                        "{}: expected error containing '{}', got '{}'",
                        case.name,
                        expected,
                        message
                    );
                }
            }
        }
    }
}

#[test]
fn test_load_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "version": "1.0", "store": {{ "kind": "memory" }}, "form": {{ "leadTimeMinutes": 60 }} }}"#
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();

    assert!(matches!(config.store, StoreConfig::Memory));
    assert_eq!(config.form.lead_time_minutes, 60);
}

#[test]
fn test_load_config_missing_file() {
    let err = load_config("/nonexistent/booking/config.json").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[tokio::test]
async fn test_config_drives_a_working_service() {
    let dir = tempfile::tempdir().unwrap();
    let json = format!(
        r#"{{
            "version": "1.0",
            "store": {{
                "kind": "local",
                "databasePath": "{}",
                "blobDirectory": "{}"
            }},
            "buckets": {{ "primary": "intake", "secondary": "badges" }}
        }}"#,
        dir.path().join("booking.db").display(),
        dir.path().join("blobs").display()
    );
    let config = load_config_from_str(&json).unwrap();

    let gateway = connect(&config).unwrap();
    assert_eq!(gateway.kind(), "local");
    let service = BookingService::new(gateway, &config).unwrap();

    let prepared = service.prepare_buckets().await.unwrap();
    let names: Vec<&str> = prepared.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["intake", "badges"]);
    assert!(dir.path().join("blobs").join("intake").is_dir());
    assert!(service.check_connectivity().await.is_reachable());
}
