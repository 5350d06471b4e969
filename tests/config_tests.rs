//! ConfigProvider unit tests

#[cfg(test)]
mod tests {
    use chunk_monitor::{ConfigError, ConfigProvider, Settings, ThresholdConfig};
    use std::collections::BTreeSet;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn config_path(dir: &TempDir) -> PathBuf {
        dir.path().join("config.json")
    }

    fn write(path: &Path, body: &str) {
        std::fs::write(path, body).unwrap();
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    const CUSTOM: &str = r#"{
        "main": {
            "debug": true,
            "interval": 10,
            "worlds": ["world", "world_nether"],
            "settings": {
                "maxEntityWarning": 80,
                "maxBlockUpdateWarning": 300,
                "maxRedstoneUpdateWarning": 40
            }
        }
    }"#;

    // -----------------------------------------------------------------------
    // Startup
    // -----------------------------------------------------------------------

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = config_path(&dir);

        let provider = ConfigProvider::load(&path).unwrap();
        assert_eq!(*provider.current(), ThresholdConfig::default());

        let written = read_json(&path);
        assert_eq!(written["main"]["interval"], 30);
        assert_eq!(written["main"]["debug"], false);
        assert_eq!(written["main"]["worlds"], serde_json::json!(["world"]));
        assert_eq!(written["main"]["settings"]["maxEntityWarning"], 50);
        assert_eq!(written["main"]["settings"]["maxBlockUpdateWarning"], 100);
        assert_eq!(written["main"]["settings"]["maxRedstoneUpdateWarning"], 20);
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = ThresholdConfig::default();
        assert!(!config.debug);
        assert_eq!(config.sample_interval_secs, 30);
        assert_eq!(config.watched_worlds, BTreeSet::from(["world".to_string()]));
        assert_eq!(
            config.settings,
            Settings {
                max_entity_warning: 50,
                max_block_update_warning: 100,
                max_redstone_update_warning: 20,
            }
        );
    }

    #[test]
    fn custom_values_are_loaded() {
        let dir = TempDir::new().unwrap();
        let path = config_path(&dir);
        write(&path, CUSTOM);

        let config = ConfigProvider::load(&path).unwrap().current();
        assert!(config.debug);
        assert_eq!(config.sample_interval_secs, 10);
        assert!(config.watches("world_nether"));
        assert_eq!(config.settings.max_entity_warning, 80);
        assert_eq!(config.settings.max_block_update_warning, 300);
        assert_eq!(config.settings.max_redstone_update_warning, 40);
    }

    #[test]
    fn missing_main_section_is_added_and_other_keys_kept() {
        let dir = TempDir::new().unwrap();
        let path = config_path(&dir);
        write(&path, r#"{ "notes": "operator scratch" }"#);

        let provider = ConfigProvider::load(&path).unwrap();
        assert_eq!(*provider.current(), ThresholdConfig::default());

        let written = read_json(&path);
        assert_eq!(written["notes"], "operator scratch");
        assert_eq!(written["main"]["interval"], 30);
    }

    #[test]
    fn partial_section_fills_missing_keys() {
        let dir = TempDir::new().unwrap();
        let path = config_path(&dir);
        write(&path, r#"{ "main": { "interval": 5, "worlds": [] } }"#);

        let config = ConfigProvider::load(&path).unwrap().current();
        assert_eq!(config.sample_interval_secs, 5);
        assert_eq!(config.watched_worlds, BTreeSet::from(["world".to_string()]));
        assert_eq!(config.settings, Settings::default());
    }

    #[test]
    fn corrupted_file_at_startup_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = config_path(&dir);
        write(&path, "{ main: [ this is not json");

        let provider = ConfigProvider::load(&path).unwrap();
        assert_eq!(*provider.current(), ThresholdConfig::default());
    }

    // -----------------------------------------------------------------------
    // Reload
    // -----------------------------------------------------------------------

    #[test]
    fn reload_swaps_in_new_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = config_path(&dir);
        let provider = ConfigProvider::load(&path).unwrap();
        let before = provider.current();

        write(&path, CUSTOM);
        let after = provider.reload().unwrap();

        assert_eq!(after.sample_interval_secs, 10);
        assert_eq!(provider.current().sample_interval_secs, 10);
        // Earlier readers keep their own snapshot.
        assert_eq!(before.sample_interval_secs, 30);
    }

    #[test]
    fn reload_with_malformed_document_keeps_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = config_path(&dir);
        write(&path, CUSTOM);
        let provider = ConfigProvider::load(&path).unwrap();
        let before = provider.current();

        write(&path, "{ \"main\": { \"interval\": ");
        let err = provider.reload().unwrap_err();

        assert!(matches!(err, ConfigError::Corrupted(_)), "{err:?}");
        assert_eq!(provider.current(), before);
    }

    #[test]
    fn reload_with_wrong_types_is_corrupted() {
        let dir = TempDir::new().unwrap();
        let path = config_path(&dir);
        let provider = ConfigProvider::load(&path).unwrap();

        write(
            &path,
            r#"{ "main": { "settings": { "maxEntityWarning": -4 } } }"#,
        );
        assert!(matches!(provider.reload(), Err(ConfigError::Corrupted(_))));
        assert_eq!(*provider.current(), ThresholdConfig::default());
    }

    #[test]
    fn reload_with_zero_interval_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = config_path(&dir);
        let provider = ConfigProvider::load(&path).unwrap();

        write(&path, r#"{ "main": { "interval": 0 } }"#);
        assert!(matches!(provider.reload(), Err(ConfigError::Invalid(_))));
        assert_eq!(provider.current().sample_interval_secs, 30);
    }

    #[test]
    fn reload_without_main_section_writes_and_adopts_defaults() {
        let dir = TempDir::new().unwrap();
        let path = config_path(&dir);
        write(&path, CUSTOM);
        let provider = ConfigProvider::load(&path).unwrap();
        assert_eq!(provider.current().sample_interval_secs, 10);

        write(&path, r#"{ "notes": "main was deleted" }"#);
        let reloaded = provider.reload().unwrap();

        assert_eq!(*reloaded, ThresholdConfig::default());
        assert_eq!(*provider.current(), ThresholdConfig::default());
        let written = read_json(&path);
        assert_eq!(written["notes"], "main was deleted");
        assert_eq!(written["main"]["interval"], 30);
        assert_eq!(written["main"]["settings"]["maxEntityWarning"], 50);
    }

    #[test]
    fn unwritable_location_is_fatal_at_startup() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-directory");
        write(&blocker, "plain file");

        let result = ConfigProvider::load(blocker.join("config.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn in_memory_provider_reload_is_stable() {
        let mut config = ThresholdConfig::default();
        config.sample_interval_secs = 7;
        let provider = ConfigProvider::in_memory(config.clone());

        assert!(provider.path().is_none());
        assert_eq!(*provider.reload().unwrap(), config);
    }

    #[test]
    fn replace_rejects_zero_interval() {
        let provider = ConfigProvider::in_memory(ThresholdConfig::default());
        let mut bad = ThresholdConfig::default();
        bad.sample_interval_secs = 0;

        assert!(matches!(provider.replace(bad), Err(ConfigError::Invalid(_))));
        assert_eq!(provider.current().sample_interval_secs, 30);
    }
}
