// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use tempfile::TempDir;
use yare::parameterized;

const OWNER: &str = "6fa459ea-ee8a-3ca4-894e-db77e160355e";

#[test]
fn test_init_and_load_config() {
    let temp = TempDir::new().unwrap();
    let config = Config::new(OWNER, Role::Victim).unwrap();
    let relief_dir = init_relief_dir(temp.path(), &config).unwrap();

    let loaded = Config::load(&relief_dir).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.role, Role::Victim);
    assert!(relief_dir.join(".gitignore").exists());
}

#[test]
fn test_invalid_owner() {
    assert!(matches!(Config::new("alice", Role::Admin), Err(Error::InvalidOwner(_))));
}

#[test]
fn test_already_initialized() {
    let temp = TempDir::new().unwrap();
    let config = Config::new(OWNER, Role::Admin).unwrap();
    init_relief_dir(temp.path(), &config).unwrap();

    let result = init_relief_dir(temp.path(), &config);
    assert!(matches!(result, Err(Error::AlreadyInitialized(_))));
}

#[test]
fn test_init_succeeds_with_empty_relief_dir() {
    let temp = TempDir::new().unwrap();
    let relief_dir = temp.path().join(".relief");
    std::fs::create_dir_all(&relief_dir).unwrap();

    let config = Config::new(OWNER, Role::Admin).unwrap();
    assert!(init_relief_dir(temp.path(), &config).is_ok());
    assert!(relief_dir.join("config.toml").exists());
}

#[test]
fn test_config_load_missing_file() {
    let temp = TempDir::new().unwrap();
    let result = Config::load(temp.path());
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_minimal_config_uses_defaults() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.toml"), format!("owner_id = \"{OWNER}\"\n")).unwrap();

    let config = Config::load(temp.path()).unwrap();

    assert_eq!(config.role, Role::Admin);
    assert!(config.remote.is_none());
    assert_eq!(config.sync, SyncConfig::default());
    assert_eq!(config.cache, CacheConfig::default());
}

#[test]
fn test_config_sections_override_defaults() {
    let temp = TempDir::new().unwrap();
    let content = format!(
        "owner_id = \"{OWNER}\"\nrole = \"volunteer\"\n\n\
         [remote]\nurl = \"ws://localhost:7890\"\n\n\
         [sync]\nmax_retries = 5\n\n\
         [cache]\nbudget_bytes = 1024\n"
    );
    std::fs::write(temp.path().join("config.toml"), content).unwrap();

    let config = Config::load(temp.path()).unwrap();

    assert_eq!(config.role, Role::Volunteer);
    assert_eq!(config.remote_url(), Some("ws://localhost:7890"));
    assert_eq!(config.remote.as_ref().unwrap().connect_timeout(), Duration::from_secs(2));
    assert_eq!(config.sync.max_retries, 5);
    assert_eq!(config.sync.base_delay_ms, 1_000);
    assert_eq!(config.cache.budget_bytes, 1024);
}

#[test]
fn test_config_with_bad_owner_fails_to_load() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.toml"), "owner_id = \"nobody\"\n").unwrap();

    assert!(matches!(Config::load(temp.path()), Err(Error::InvalidOwner(_))));
}

#[test]
fn test_config_save_and_reload_with_remote() {
    let temp = TempDir::new().unwrap();
    let mut config = Config::new(OWNER, Role::Volunteer).unwrap();
    config.remote = Some(RemoteConfig::new("wss://relief.example.org").unwrap());
    config.save(temp.path()).unwrap();

    let loaded = Config::load(temp.path()).unwrap();
    assert_eq!(loaded, config);
}

#[parameterized(
    ws = { "ws://localhost:7890", true },
    wss = { "wss://relief.example.org", true },
    http = { "http://localhost:7890", false },
    bare = { "localhost:7890", false },
)]
fn test_remote_url_validation(url: &str, valid: bool) {
    assert_eq!(RemoteConfig::new(url).is_ok(), valid);
}

#[test]
fn test_find_relief_dir_walks_up() {
    let temp = TempDir::new().unwrap();
    let config = Config::new(OWNER, Role::Admin).unwrap();
    let relief_dir = init_relief_dir(temp.path(), &config).unwrap();
    let nested = temp.path().join("a").join("b");
    std::fs::create_dir_all(&nested).unwrap();

    assert_eq!(find_relief_dir_from(&nested).unwrap(), relief_dir);
}

#[test]
fn test_find_relief_dir_not_initialized() {
    let temp = TempDir::new().unwrap();
    let result = find_relief_dir_from(temp.path());
    assert!(matches!(result, Err(Error::NotInitialized)));
}

#[test]
fn test_db_path() {
    assert_eq!(db_path(Path::new("/project/.relief")), PathBuf::from("/project/.relief/local.db"));
}
