//! Desired-state file loading tests

use influxdb_secret_controller::config::load_desired_entries;
use influxdb_secret_controller::error::ConfigError;
use influxdb_secret_controller::model::Action;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp file");
    file
}

#[test]
fn test_load_valid_file() {
    let file = write_config(
        r"
- name: telegraf
  org: metrics
  namespace: monitoring
  permissions: write
  bucket: telegraf
- name: grafana
  org: metrics
  namespace: monitoring
  permissions: read
",
    );

    let entries = load_desired_entries(file.path()).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].token_name(), "telegraf-monitoring");
    assert_eq!(entries[0].permissions, Action::Write);
    assert_eq!(entries[0].bucket.as_deref(), Some("telegraf"));
    assert_eq!(entries[1].permissions, Action::Read);
    assert!(entries[1].bucket.is_none());
}

#[test]
fn test_empty_file_means_nothing_desired() {
    let file = write_config("");
    assert!(load_desired_entries(file.path()).unwrap().is_empty());

    let file = write_config("[]\n");
    assert!(load_desired_entries(file.path()).unwrap().is_empty());
}

#[test]
fn test_missing_file_is_read_error() {
    let err = load_desired_entries(Path::new("/nonexistent/isc/config.yml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("/nonexistent/isc/config.yml"));
}

#[test]
fn test_parse_error_names_the_file() {
    let file = write_config("- name: a\n  org: [unterminated\n");
    let err = load_desired_entries(file.path()).unwrap_err();

    match err {
        ConfigError::Parse { path, .. } => assert_eq!(path, file.path()),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_unknown_permission_is_rejected() {
    let file = write_config("- name: a\n  org: o1\n  namespace: ns1\n  permissions: admin\n");
    assert!(matches!(
        load_desired_entries(file.path()),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn test_unknown_field_is_rejected() {
    let file = write_config(
        "- name: a\n  org: o1\n  namespace: ns1\n  permissions: read\n  buckets: typo\n",
    );
    assert!(matches!(
        load_desired_entries(file.path()),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn test_invalid_entry_reports_its_index() {
    let file = write_config(
        "- name: ok\n  org: o1\n  namespace: ns1\n  permissions: read\n- name: second\n  org: o1\n  namespace: Bad_Namespace\n  permissions: read\n",
    );

    match load_desired_entries(file.path()).unwrap_err() {
        ConfigError::Invalid { index, name, reason } => {
            assert_eq!(index, 1);
            assert_eq!(name, "second");
            assert!(reason.contains("namespace"), "{reason}");
        }
        other => panic!("expected invalid entry, got {other:?}"),
    }
}
