//! Error types for as3-reconciler.
//!
//! Only [`GateError`] is fatal. Everything else is recovered inside a cycle
//! and surfaces as a log line plus a fallback document or a skipped post.

use thiserror::Error;

/// Errors from the version compatibility check.
#[derive(Debug, Error)]
pub enum GateError {
    /// The appliance could not report its AS3 version.
    #[error("failed to query AS3 version: {0}")]
    VersionQuery(#[from] SubmitError),

    /// A reported version or configured bound is not valid semver.
    #[error("malformed AS3 version {0:?}")]
    MalformedVersion(String),

    /// The appliance runs an AS3 release older than the minimum supported.
    #[error(
        "this controller is compatible with AS3 versions >= {minimum}. \
         Upgrade AS3 version in the appliance from {reported} to {minimum} or above."
    )]
    Unsupported { reported: String, minimum: String },
}

/// Errors while building the merged declaration.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// The merged document could not be serialized.
    #[error("failed to serialize declaration: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors in an administrator override document.
#[derive(Debug, Error)]
pub enum OverrideError {
    /// Not valid JSON.
    #[error("override is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    /// Valid JSON but not an object.
    #[error("override must be a JSON object")]
    NotAnObject,

    /// No `declaration` object to overlay.
    #[error("override has no declaration object")]
    MissingDeclaration,
}

/// Errors from local schema validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The schema file could not be read or parsed.
    #[error("failed to load schema {path}: {reason}")]
    SchemaLoad { path: String, reason: String },

    /// The schema is not a valid JSON schema.
    #[error("failed to compile schema {path}: {reason}")]
    SchemaCompile { path: String, reason: String },

    /// The declaration is not valid JSON.
    #[error("declaration is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The declaration violates the schema.
    #[error("declaration failed schema validation: {}", violations.join("; "))]
    Invalid { violations: Vec<String> },
}

/// Errors from the appliance transport.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// Request failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The appliance answered with a non-success status.
    #[error("appliance returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not what was expected.
    #[error("unexpected response from appliance: {0}")]
    Decode(String),
}

/// Result type for the version gate.
pub type GateResult<T> = Result<T, GateError>;

/// Result type for transport calls.
pub type SubmitResult<T> = Result<T, SubmitError>;
