//! Desired-state and override files

use as3_types::{DesiredConfig, OverrideFragment};
use std::path::{Path, PathBuf};

use crate::error::{DaemonError, DaemonResult};

/// JSON file holding a [`DesiredConfig`]
#[derive(Debug, Clone)]
pub struct DesiredStateFile {
    path: PathBuf,
}

impl DesiredStateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the file.
    pub fn load(&self) -> DaemonResult<DesiredConfig> {
        let raw = read(&self.path)?;
        serde_json::from_str(&raw).map_err(|e| DaemonError::Source {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Read the operator-supplied override fragment.
///
/// The content is kept verbatim; it is parsed when the declaration is
/// assembled.
pub fn load_override(path: &Path) -> DaemonResult<OverrideFragment> {
    read(path).map(OverrideFragment::new)
}

fn read(path: &Path) -> DaemonResult<String> {
    std::fs::read_to_string(path).map_err(|e| DaemonError::Source {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_desired_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desired.json");
        let desired = DesiredConfig::new().with_tenant(
            "app1",
            json!({"class": "Tenant", "A1": {"class": "Application"}}),
        );
        std::fs::write(&path, serde_json::to_string(&desired).unwrap()).unwrap();

        let loaded = DesiredStateFile::new(&path).load().unwrap();
        assert_eq!(loaded, desired);
    }

    #[test]
    fn test_malformed_desired_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desired.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = DesiredStateFile::new(&path).load().unwrap_err();
        assert!(matches!(err, DaemonError::Source { .. }));
    }

    #[test]
    fn test_missing_override_file() {
        let err = load_override(Path::new("/nonexistent/override.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/override.json"));
    }

    #[test]
    fn test_override_kept_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("override.json");
        let body = r#"{"declaration": {"app1": {"label": "x"}}}"#;
        std::fs::write(&path, body).unwrap();

        assert_eq!(load_override(&path).unwrap().as_str(), body);
    }
}
