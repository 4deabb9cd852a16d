//! Configuration for as3d

use as3_reconciler::{ApplianceConfig, ReconcilerConfig, VersionConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Appliance connection
    #[serde(default)]
    pub appliance: ApplianceConfig,

    /// Reconciliation loop
    #[serde(default)]
    pub reconciler: ReconcilerConfig,

    /// Supported AS3 versions
    #[serde(default)]
    pub version: VersionConfig,

    /// Where desired state comes from
    #[serde(default)]
    pub source: SourceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Desired state source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// JSON file holding a desired configuration, re-read on SIGHUP
    #[serde(default)]
    pub desired_state: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration: defaults, then the optional file, then `AS3D_*` variables.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // e.g. AS3D_APPLIANCE__PASSWORD
        builder = builder.add_source(
            config::Environment::with_prefix("AS3D")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.logging.level, "info");
        assert!(config.source.desired_state.is_none());
        assert_eq!(config.reconciler.post_delay_secs, 0);
        assert_eq!(config.version.min_supported, "3.18");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("as3d.toml");
        std::fs::write(
            &path,
            r#"
[appliance]
url = "https://10.1.1.4"
username = "admin"
ssl_insecure = true

[reconciler]
post_delay_secs = 5
filter_tenants = true

[reconciler.retry]
error_ms = 1000

[source]
desired_state = "/etc/as3d/desired.json"
"#,
        )
        .unwrap();

        let config = DaemonConfig::load(path.to_str()).unwrap();
        assert_eq!(config.appliance.url, "https://10.1.1.4");
        assert!(config.appliance.ssl_insecure);
        assert_eq!(config.reconciler.post_delay_secs, 5);
        assert!(config.reconciler.filter_tenants);
        assert_eq!(config.reconciler.retry.error_ms, 1000);
        assert_eq!(config.reconciler.retry.service_unavailable_ms, 3000);
        assert_eq!(
            config.source.desired_state,
            Some(PathBuf::from("/etc/as3d/desired.json"))
        );
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = DaemonConfig::load(Some("/nonexistent/as3d")).unwrap();
        assert_eq!(config.appliance.request_timeout_secs, 60);
    }
}
