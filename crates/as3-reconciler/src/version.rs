//! AS3 version compatibility gate.
//!
//! The appliance reports the AS3 version it runs. Versions inside the
//! supported range are spoken verbatim; newer ones are pinned to the newest
//! dialect we ship a schema for; older ones are rejected.

use std::fmt;
use std::sync::Arc;

use semver::{Version, VersionReq};
use tracing::{debug, error, info, instrument};

use crate::config::VersionConfig;
use crate::error::{GateError, GateResult};
use crate::submitter::VersionSource;

const SCHEMA_URL_BASE: &str =
    "https://raw.githubusercontent.com/F5Networks/f5-appsvcs-extension/master/schema";

/// The AS3 dialect every declaration is written in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionState {
    version: String,
    build: String,
}

impl VersionState {
    pub fn new(version: impl Into<String>, build: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            build: build.into(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// `<version>-<build>`, e.g. `3.20.1-4`
    pub fn release(&self) -> String {
        format!("{}-{}", self.version, self.build)
    }

    /// `$schema` URL for declarations in this dialect.
    pub fn schema_url(&self) -> String {
        format!(
            "{}/{}/as3-schema-{}.json",
            SCHEMA_URL_BASE,
            self.version,
            self.release()
        )
    }

    /// File name of the local validation schema.
    pub fn schema_file_name(&self) -> String {
        format!("as3-schema-{}.json", self.release())
    }
}

impl fmt::Display for VersionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.release())
    }
}

fn parse_version(version: &str) -> GateResult<Version> {
    Version::parse(version.trim()).map_err(|_| GateError::MalformedVersion(version.to_string()))
}

/// `op` applied to a `major.minor` bound; `<=3.21` also matches every 3.21.x.
fn bound(op: &str, version: &str) -> GateResult<VersionReq> {
    VersionReq::parse(&format!("{op}{}", version.trim()))
        .map_err(|_| GateError::MalformedVersion(version.to_string()))
}

/// Establishes and holds the current [`VersionState`]
pub struct VersionGate {
    config: VersionConfig,
    source: Arc<dyn VersionSource>,
    state: Option<VersionState>,
}

impl VersionGate {
    pub fn new(config: VersionConfig, source: Arc<dyn VersionSource>) -> Self {
        Self {
            config,
            source,
            state: None,
        }
    }

    /// Last successfully established state, if any.
    pub fn state(&self) -> Option<&VersionState> {
        self.state.as_ref()
    }

    /// Query the appliance and decide which dialect to speak.
    ///
    /// On any error the previously established state is kept.
    #[instrument(skip(self))]
    pub async fn establish(&mut self) -> GateResult<VersionState> {
        let (version, build) = self.source.appliance_version().await.map_err(|e| {
            error!(error = %e, "Failed to query AS3 version");
            GateError::from(e)
        })?;

        let state = self.evaluate(&version, &build).map_err(|e| {
            error!(error = %e, "AS3 version check failed");
            e
        })?;

        info!(version = %state.version(), release = %state.release(), "AS3 version established");
        self.state = Some(state.clone());
        Ok(state)
    }

    /// Apply the range policy to a reported `(version, build)`.
    pub fn evaluate(&self, version: &str, build: &str) -> GateResult<VersionState> {
        let reported = parse_version(version)?;
        let minimum = bound(">=", &self.config.min_supported)?;
        let maximum = bound("<=", &self.config.max_known)?;

        if !minimum.matches(&reported) {
            return Err(GateError::Unsupported {
                reported: version.to_string(),
                minimum: self.config.min_supported.clone(),
            });
        }

        if !maximum.matches(&reported) {
            debug!(
                reported = %version,
                fallback = %self.config.fallback_version,
                "Appliance AS3 is newer than known schemas, pinning to fallback"
            );
            return Ok(VersionState::new(
                self.config.fallback_version.clone(),
                self.config.fallback_build.clone(),
            ));
        }

        debug!(version = %version, "Appliance is serving a supported AS3 version");
        Ok(VersionState::new(version, build))
    }
}
