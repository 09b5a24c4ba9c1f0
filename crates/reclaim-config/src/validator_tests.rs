
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        let result = ConfigValidator::validate(&config);
        assert!(result.is_valid());
    }

    #[test]
    fn test_validate_zero_tick_interval() {
        let mut config = Config::default();
        config.scheduler.tick_interval_ms = 0;

        let result = ConfigValidator::validate(&config);
        assert!(!result.is_valid());
        assert!(result
            .errors
            .iter()
            .any(|e| e.path == "scheduler.tick_interval_ms"));
    }

    #[test]
    fn test_validate_slow_tick_warning() {
        let mut config = Config::default();
        config.scheduler.tick_interval_ms = 60_000;

        let result = ConfigValidator::validate(&config);
        assert!(result.is_valid());
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_validate_empty_level() {
        let mut config = Config::default();
        config.logging.level = "  ".to_string();

        let result = ConfigValidator::validate(&config);
        assert!(result.errors.iter().any(|e| e.path == "logging.level"));
    }

    #[test]
    fn test_validate_empty_store_path() {
        let mut config = Config::default();
        config.store.path = PathBuf::new();

        let result = ConfigValidator::validate(&config);
        assert!(result.errors.iter().any(|e| e.path == "store.path"));
    }

    #[test]
    fn test_validate_store_path_is_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.store.path = temp.path().to_path_buf();

        let result = ConfigValidator::validate(&config);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_validate_relative_store_path_warning() {
        let mut config = Config::default();
        config.store.path = PathBuf::from("config.json");

        let result = ConfigValidator::validate(&config);
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.path == "store.path"));
    }

    #[test]
    fn test_into_result() {
        let mut config = Config::default();
        config.scheduler.tick_interval_ms = 0;

        let err = ConfigValidator::validate(&config).into_result().unwrap_err();
        assert!(err.to_string().contains("tick_interval_ms"));

        let ok = ConfigValidator::validate(&Config::default()).into_result();
        assert!(ok.is_ok());
    }
