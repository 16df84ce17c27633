//! Worker configuration.

use std::path::{Path, PathBuf};

use proctor_signal::StabilizerConfig;
use tracing::info;

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerConfig {
    /// JSON stabilizer configuration; built-in defaults when unset
    pub config_path: Option<PathBuf>,
    /// Newline-delimited frame observations; stdin when unset
    pub input_path: Option<PathBuf>,
    /// Also write every N-th frame report (0 = only on alert changes)
    pub report_every: u64,
    /// Port for the Prometheus exporter; disabled when unset
    pub metrics_port: Option<u16>,
    /// Emit JSON log lines
    pub json_logs: bool,
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            config_path: lookup("PROCTOR_CONFIG")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            input_path: lookup("PROCTOR_INPUT")
                .filter(|s| !s.trim().is_empty() && s.trim() != "-")
                .map(PathBuf::from),
            report_every: lookup("PROCTOR_REPORT_EVERY")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            metrics_port: lookup("PROCTOR_METRICS_PORT").and_then(|s| s.parse().ok()),
            json_logs: lookup("LOG_FORMAT")
                .map(|v| v.to_lowercase() == "json")
                .unwrap_or(false),
        }
    }
}

/// Load and validate the stabilizer configuration.
pub async fn load_stabilizer_config(path: Option<&Path>) -> WorkerResult<StabilizerConfig> {
    let Some(path) = path else {
        info!("Using default stabilizer configuration");
        let config = StabilizerConfig::default();
        config.validate()?;
        return Ok(config);
    };

    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        WorkerError::config_error(format!("failed to read {}: {}", path.display(), e))
    })?;
    let config = StabilizerConfig::from_json(&raw)?;

    info!(
        path = %path.display(),
        signals = config.signals.len(),
        "Loaded stabilizer configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = WorkerConfig::from_lookup(lookup(&[]));
        assert_eq!(config, WorkerConfig::default());
    }

    #[test]
    fn test_reads_all_variables() {
        let config = WorkerConfig::from_lookup(lookup(&[
            ("PROCTOR_CONFIG", "/etc/proctor.json"),
            ("PROCTOR_INPUT", "session.ndjson"),
            ("PROCTOR_REPORT_EVERY", "30"),
            ("PROCTOR_METRICS_PORT", "9102"),
            ("LOG_FORMAT", "JSON"),
        ]));
        assert_eq!(config.config_path, Some(PathBuf::from("/etc/proctor.json")));
        assert_eq!(config.input_path, Some(PathBuf::from("session.ndjson")));
        assert_eq!(config.report_every, 30);
        assert_eq!(config.metrics_port, Some(9102));
        assert!(config.json_logs);
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = WorkerConfig::from_lookup(lookup(&[
            ("PROCTOR_REPORT_EVERY", "often"),
            ("PROCTOR_METRICS_PORT", "99999"),
            ("PROCTOR_INPUT", "-"),
        ]));
        assert_eq!(config.report_every, 0);
        assert_eq!(config.metrics_port, None);
        assert_eq!(config.input_path, None);
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"voter": {{"window": 7, "min_votes": 4}}}}"#).unwrap();

        let config = load_stabilizer_config(Some(file.path())).await.unwrap();
        assert_eq!(config.voter.window, 7);
        assert_eq!(config.voter.min_votes, 4);
    }

    #[tokio::test]
    async fn test_invalid_config_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"voter": {{"window": 3, "min_votes": 4}}}}"#).unwrap();

        let err = load_stabilizer_config(Some(file.path())).await.unwrap_err();
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn test_missing_config_file() {
        let err = load_stabilizer_config(Some(Path::new("/nonexistent/proctor.json")))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::ConfigError(_)));
    }
}
