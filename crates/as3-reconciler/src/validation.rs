//! Local JSON-schema validation of declarations.
//!
//! Schemas are read from `<schema_path>/as3-schema-<release>.json` and the
//! compiled schema is kept until the release changes.

use std::path::{Path, PathBuf};

use jsonschema::JSONSchema;
use serde_json::Value;
use tracing::debug;

use crate::error::ValidationError;
use crate::version::VersionState;

pub struct SchemaValidator {
    dir: PathBuf,
    compiled: Option<(String, JSONSchema)>,
}

impl SchemaValidator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            compiled: None,
        }
    }

    /// Validate a serialized declaration against the schema for `version`.
    pub fn validate(
        &mut self,
        version: &VersionState,
        declaration: &str,
    ) -> Result<(), ValidationError> {
        let instance: Value = serde_json::from_str(declaration)?;
        let schema = self.schema_for(&version.schema_file_name())?;

        let violations: Vec<String> = match schema.validate(&instance) {
            Ok(()) => return Ok(()),
            Err(errors) => errors
                .map(|e| format!("{}: {}", e.instance_path, e))
                .collect(),
        };
        Err(ValidationError::Invalid { violations })
    }

    fn schema_for(&mut self, file_name: &str) -> Result<&JSONSchema, ValidationError> {
        let stale = self
            .compiled
            .as_ref()
            .map_or(true, |(name, _)| name != file_name);

        let path = self.dir.join(file_name);
        if stale {
            debug!(schema = %path.display(), "Loading AS3 schema");
            let compiled = load_schema(&path)?;
            self.compiled = Some((file_name.to_string(), compiled));
        }

        self.compiled
            .as_ref()
            .map(|(_, schema)| schema)
            .ok_or_else(|| ValidationError::SchemaLoad {
                path: path.display().to_string(),
                reason: "schema not loaded".to_string(),
            })
    }
}

fn load_schema(path: &Path) -> Result<JSONSchema, ValidationError> {
    let load_error = |reason: String| ValidationError::SchemaLoad {
        path: path.display().to_string(),
        reason,
    };

    let raw = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
    let schema: Value = serde_json::from_str(&raw).map_err(|e| load_error(e.to_string()))?;

    JSONSchema::compile(&schema).map_err(|e| ValidationError::SchemaCompile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_schema(dir: &Path, version: &VersionState) {
        let schema = json!({
            "type": "object",
            "required": ["class", "declaration"],
            "properties": {
                "class": { "const": "AS3" },
                "declaration": {
                    "type": "object",
                    "properties": { "class": { "const": "ADC" } }
                }
            }
        });
        std::fs::write(
            dir.join(version.schema_file_name()),
            serde_json::to_string(&schema).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_valid_and_invalid_declarations() {
        let dir = tempfile::tempdir().unwrap();
        let version = VersionState::new("3.20.1", "4");
        write_schema(dir.path(), &version);
        let mut validator = SchemaValidator::new(dir.path());

        assert!(validator
            .validate(&version, r#"{"class":"AS3","declaration":{"class":"ADC"}}"#)
            .is_ok());

        let err = validator
            .validate(&version, r#"{"class":"AS3","declaration":{"class":"Nope"}}"#)
            .unwrap_err();
        match err {
            ValidationError::Invalid { violations } => {
                assert_eq!(violations.len(), 1);
                assert!(violations[0].starts_with("/declaration/class"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_schema_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut validator = SchemaValidator::new(dir.path());

        let err = validator
            .validate(&VersionState::new("3.20.1", "4"), r#"{"class":"AS3"}"#)
            .unwrap_err();
        assert!(matches!(err, ValidationError::SchemaLoad { .. }));
    }

    #[test]
    fn test_schema_reloads_when_release_changes() {
        let dir = tempfile::tempdir().unwrap();
        let old = VersionState::new("3.20.1", "4");
        let new = VersionState::new("3.21.0", "4");
        write_schema(dir.path(), &old);
        let mut validator = SchemaValidator::new(dir.path());

        let doc = r#"{"class":"AS3","declaration":{"class":"ADC"}}"#;
        assert!(validator.validate(&old, doc).is_ok());
        assert!(matches!(
            validator.validate(&new, doc),
            Err(ValidationError::SchemaLoad { .. })
        ));
    }
}
