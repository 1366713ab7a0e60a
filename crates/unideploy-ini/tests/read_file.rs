//! Integration tests for loading configuration files from disk.

use std::io::Write;
use tempfile::tempdir;
use unideploy_ini::{Config, ConfigError};

#[test]
fn test_missing_file_is_config_missing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(".deploy.ini");

    let err = Config::read(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ConfigMissing { path: p } if p == path));
}

#[test]
fn test_read_deploy_ini() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(".deploy.ini");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(
        b"# deployment settings\r\n\
          [Misc]\r\n\
          verbose = false\r\n\
          always_run = true\r\n\
          \r\n\
          [Github]\r\n\
          enable = true\r\n\
          branch = release\r\n\
          packagename = MyPackage\r\n",
    )
    .unwrap();

    let config = Config::read(&path).expect("read failed");
    assert!(!config.get_bool("Misc", "verbose").unwrap());
    assert!(config.get_bool("Misc", "always_run").unwrap());
    assert_eq!(config.get_string("Github", "branch").unwrap(), "release");
    assert_eq!(config.get_string("Github", "packagename").unwrap(), "MyPackage");
    assert_eq!(config.sections().collect::<Vec<_>>(), vec!["Github", "Misc"]);
}

#[test]
fn test_directory_is_not_a_config() {
    let dir = tempdir().unwrap();
    let err = Config::read(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ConfigMissing { .. }));
}
