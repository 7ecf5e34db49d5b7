//! Configuration and Stored Session Tests

use fluentdb::{ClientConfig, ConnectionData, StoredSessions, CONFIG_FILE_NAME};
use tempfile::TempDir;

#[test]
fn config_file_drives_stored_sessions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(
        &path,
        r#"
fetch_warnings = true
default_session = "local"

[sessions.local]
uri = "root:secret@localhost:33060/test"

[sessions.data]
host = "db"
user = "app"
schema = "shop"
"#,
    )
    .unwrap();

    let config = ClientConfig::from_file(&path).unwrap();
    let sessions = StoredSessions::from_config(&config).unwrap();
    assert_eq!(sessions.names(), vec!["data", "local"]);
    assert_eq!(sessions.get("local").unwrap().to_string(), "root@localhost:33060/test");

    let node = fluentdb::connect_default(&config).unwrap();
    assert_eq!(node.uri(), "root@localhost:33060/test");
    let mut sql = node.sql("SELECT 1 / 0").unwrap();
    assert_eq!(sql.execute().unwrap().warning_count(), 1);

    let shop = sessions.connect("data").unwrap();
    assert_eq!(shop.get_current_schema().unwrap().name(), "shop");
}

#[test]
fn removed_session_lookup_fails() {
    let mut sessions = StoredSessions::new();
    sessions
        .add("tmp", "user:pw@host:1234".parse::<ConnectionData>().unwrap())
        .unwrap();
    let removed = sessions.remove("tmp").unwrap();
    assert_eq!(removed.password.as_deref(), Some("pw"));
    assert!(sessions.get("tmp").is_err());
    assert!(sessions.connect("tmp").is_err());
}

#[test]
fn default_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    ClientConfig::write_default_if_missing(&path).unwrap();
    let config = ClientConfig::from_file(&path).unwrap();
    assert_eq!(config, ClientConfig::default());
    fluentdb::logging::init(&config.log_filter);
}
