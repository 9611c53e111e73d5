use imctl_core::DialectKind;
use imctl_settings::{Config, ConfigError, SettingsError};
use tempfile::TempDir;

fn sample_config() -> Config {
    let mut config = Config::new();
    config.connection.host = "192.168.0.10".to_string();
    config.connection.dialect = DialectKind::Delimiter;
    config.session.settle_delay_ms = 80;
    config.logging.filter = "imctl=debug".to_string();
    config
}

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let config = sample_config();
    config.save_to_file(&path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("dialect = \"delimiter\""));
    assert_eq!(Config::load_from_file(&path).unwrap(), config);
}

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let config = sample_config();
    config.save_to_file(&path).unwrap();
    assert_eq!(Config::load_from_file(&path).unwrap(), config);
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");

    let err = Config::new().save_to_file(&path).unwrap_err();
    assert!(matches!(
        err,
        SettingsError::Config(ConfigError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_invalid_file_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[connection]\nconnect_timeout_ms = 0\n").unwrap();

    let err = Config::load_from_file(&path).unwrap_err();
    assert!(matches!(
        err,
        SettingsError::Config(ConfigError::InvalidSetting { .. })
    ));
}

#[test]
fn test_unknown_dialect_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[connection]\ndialect = \"scpi\"\n").unwrap();

    assert!(matches!(
        Config::load_from_file(&path).unwrap_err(),
        SettingsError::TomlDe(_)
    ));
}

#[test]
fn test_load_or_default_without_file() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_missing_file_is_read_error() {
    let dir = TempDir::new().unwrap();
    let err = Config::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, SettingsError::Read { .. }));
}
