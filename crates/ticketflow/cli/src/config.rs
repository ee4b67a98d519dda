//! Configuration loading
//!
//! Layers, later wins: built-in defaults, an optional config file (any
//! format the `config` crate understands), then `TICKETFLOW_*`
//! environment variables such as `TICKETFLOW_ESCALATION_THRESHOLD=85`.

use ticketflow_engine::WorkflowConfig;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "TICKETFLOW";

/// Load the workflow configuration
pub fn load(path: Option<&str>) -> Result<WorkflowConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    builder = builder.add_source(config::Config::try_from(&WorkflowConfig::default())?);

    if let Some(path) = path {
        builder = builder.add_source(config::File::with_name(path).required(false));
    }

    // Field names contain underscores, so nesting uses a double underscore
    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = load(None).unwrap();
        assert_eq!(config.escalation_threshold, 90);
        assert_eq!(config.score_range(), 90..=100);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "escalation_threshold = 75").unwrap();
        writeln!(file, "score_seed = 42").unwrap();

        let config = load(file.path().to_str()).unwrap();
        assert_eq!(config.escalation_threshold, 75);
        assert_eq!(config.score_seed, Some(42));
        assert_eq!(config.score_ceiling, 100);
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let config = load(Some("/nonexistent/ticketflow-config")).unwrap();
        assert_eq!(config, WorkflowConfig::default());
    }
}
