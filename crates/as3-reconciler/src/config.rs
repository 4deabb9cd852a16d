//! Configuration for the reconciler, the version gate and the appliance client

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::submitter::PostEvent;

/// Appliance connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplianceConfig {
    /// Base URL, e.g. `https://10.1.1.4`
    #[serde(default = "default_appliance_url")]
    pub url: String,

    /// Basic auth user
    #[serde(default)]
    pub username: String,

    /// Basic auth password
    #[serde(default)]
    pub password: String,

    /// Skip certificate verification
    #[serde(default)]
    pub ssl_insecure: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Log appliance response bodies
    #[serde(default)]
    pub log_response: bool,
}

impl Default for ApplianceConfig {
    fn default() -> Self {
        Self {
            url: default_appliance_url(),
            username: String::new(),
            password: String::new(),
            ssl_insecure: false,
            request_timeout_secs: default_request_timeout(),
            log_response: false,
        }
    }
}

/// Reconciliation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Seconds to wait between posts; 0 disables coalescing
    #[serde(default)]
    pub post_delay_secs: u64,

    /// Put the declaration's tenant list in the post URL
    #[serde(default)]
    pub filter_tenants: bool,

    /// Validate declarations against the local schema before posting
    #[serde(default)]
    pub validation: bool,

    /// Directory holding `as3-schema-<release>.json` files
    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,

    /// Administrator override document used when a request carries none
    #[serde(default)]
    pub override_file: Option<PathBuf>,

    /// User agent written into the declaration controls
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Backoff waits per failure kind
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            post_delay_secs: 0,
            filter_tenants: false,
            validation: false,
            schema_path: default_schema_path(),
            override_file: None,
            user_agent: default_user_agent(),
            retry: RetryConfig::default(),
        }
    }
}

impl ReconcilerConfig {
    pub fn post_delay(&self) -> Duration {
        Duration::from_secs(self.post_delay_secs)
    }
}

/// Backoff waits, in milliseconds, keyed by what the appliance reported
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_service_unavailable_ms")]
    pub service_unavailable_ms: u64,

    #[serde(default = "default_not_found_ms")]
    pub not_found_ms: u64,

    #[serde(default = "default_unprocessable_ms")]
    pub unprocessable_ms: u64,

    #[serde(default = "default_error_ms")]
    pub error_ms: u64,

    /// Wait after an unchanged declaration while a failure is unresolved
    #[serde(default)]
    pub no_op_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            service_unavailable_ms: default_service_unavailable_ms(),
            not_found_ms: default_not_found_ms(),
            unprocessable_ms: default_unprocessable_ms(),
            error_ms: default_error_ms(),
            no_op_ms: 0,
        }
    }
}

impl RetryConfig {
    /// How long to wait before reasserting after `event`.
    pub fn timeout_for(&self, event: PostEvent) -> Duration {
        let ms = match event {
            PostEvent::Ok => 0,
            PostEvent::ServiceUnavailable => self.service_unavailable_ms,
            PostEvent::NotFound => self.not_found_ms,
            PostEvent::UnprocessableEntity => self.unprocessable_ms,
            PostEvent::Error => self.error_ms,
            PostEvent::NoOp => self.no_op_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Supported AS3 range and the dialect to fall back to for newer appliances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionConfig {
    /// Oldest supported `major.minor`
    #[serde(default = "default_min_supported")]
    pub min_supported: String,

    /// Newest `major.minor` with a known schema
    #[serde(default = "default_max_known")]
    pub max_known: String,

    /// Version spoken to appliances newer than `max_known`
    #[serde(default = "default_fallback_version")]
    pub fallback_version: String,

    /// Build paired with `fallback_version`
    #[serde(default = "default_fallback_build")]
    pub fallback_build: String,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            min_supported: default_min_supported(),
            max_known: default_max_known(),
            fallback_version: default_fallback_version(),
            fallback_build: default_fallback_build(),
        }
    }
}

// Default value helpers
fn default_appliance_url() -> String {
    "https://127.0.0.1".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("schemas")
}

fn default_user_agent() -> String {
    format!("as3d/{}", env!("CARGO_PKG_VERSION"))
}

fn default_service_unavailable_ms() -> u64 {
    3_000
}

fn default_not_found_ms() -> u64 {
    180_000
}

fn default_unprocessable_ms() -> u64 {
    30_000
}

fn default_error_ms() -> u64 {
    30_000
}

fn default_min_supported() -> String {
    "3.18".to_string()
}

fn default_max_known() -> String {
    "3.21".to_string()
}

fn default_fallback_version() -> String {
    "3.21.0".to_string()
}

fn default_fallback_build() -> String {
    "4".to_string()
}
