//! Declaration assembly.
//!
//! Precedence, lowest first: skeleton, resource tenants, config map tenants in
//! order, deletion stubs for tenants that disappeared, administrator override.

use as3_types::{DesiredConfig, OverrideFragment};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::error::AssemblyError;
use crate::overlay;
use crate::version::VersionState;

/// Fixed `id` of every declaration.
pub const DECLARATION_ID: &str = "urn:uuid:85626792-9ee7-46bb-8fc8-4ba708cfdc1d";

/// Shared partition, never named in a tenant-filtered post.
pub const COMMON_TENANT: &str = "Common";

const TENANT_CLASS: &str = "Tenant";
const LABEL: &str = "AS3 Sync Declaration";
const REMARK: &str = "Auto-generated by as3d";

/// Keys of the `declaration` object that are not tenants.
const SKELETON_KEYS: [&str; 6] = ["class", "schemaVersion", "id", "label", "remark", "controls"];

/// Body that tells the appliance to remove a tenant.
pub fn tenant_stub() -> Value {
    json!({ "class": TENANT_CLASS })
}

/// Whether `name` collides with a skeleton field.
pub fn is_reserved(name: &str) -> bool {
    SKELETON_KEYS.contains(&name)
}

/// Tenants of an AS3 document, in key order.
pub fn tenant_names(document: &Value, exclude_common: bool) -> Vec<String> {
    let Some(adc) = document.get("declaration").and_then(Value::as_object) else {
        return Vec::new();
    };

    adc.iter()
        .filter(|(name, _)| !is_reserved(name))
        .filter(|(_, body)| body.get("class").and_then(Value::as_str) == Some(TENANT_CLASS))
        .filter(|(name, _)| !(exclude_common && name.as_str() == COMMON_TENANT))
        .map(|(name, _)| name.clone())
        .collect()
}

/// An assembled declaration and its canonical serialized form
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    document: Value,
    serialized: String,
}

impl Declaration {
    fn from_document(document: Value) -> Result<Self, AssemblyError> {
        let serialized = serde_json::to_string(&document)?;
        Ok(Self {
            document,
            serialized,
        })
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn serialized(&self) -> &str {
        &self.serialized
    }

    pub fn tenants(&self, exclude_common: bool) -> Vec<String> {
        tenant_names(&self.document, exclude_common)
    }
}

/// The last declaration committed by the loop; the baseline for diffs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveSnapshot {
    declaration: Option<Declaration>,
}

impl ActiveSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.declaration.is_none()
    }

    /// Serialized form, `""` before the first commit.
    pub fn serialized(&self) -> &str {
        self.declaration
            .as_ref()
            .map(Declaration::serialized)
            .unwrap_or_default()
    }

    pub fn tenants(&self, exclude_common: bool) -> Vec<String> {
        self.declaration
            .as_ref()
            .map(|d| d.tenants(exclude_common))
            .unwrap_or_default()
    }
}

impl From<Declaration> for ActiveSnapshot {
    fn from(declaration: Declaration) -> Self {
        Self {
            declaration: Some(declaration),
        }
    }
}

/// Builds declarations in the current AS3 dialect
#[derive(Debug, Clone)]
pub struct Assembler {
    version: VersionState,
    user_agent: String,
}

impl Assembler {
    pub fn new(version: VersionState, user_agent: impl Into<String>) -> Self {
        Self {
            version,
            user_agent: user_agent.into(),
        }
    }

    pub fn version(&self) -> &VersionState {
        &self.version
    }

    fn adc_skeleton(&self) -> Map<String, Value> {
        let mut adc = Map::new();
        adc.insert("class".into(), json!("ADC"));
        adc.insert("schemaVersion".into(), json!(self.version.version()));
        adc.insert("id".into(), json!(DECLARATION_ID));
        adc.insert("label".into(), json!(LABEL));
        adc.insert("remark".into(), json!(REMARK));
        adc.insert(
            "controls".into(),
            json!({ "class": "Controls", "userAgent": self.user_agent }),
        );
        adc
    }

    fn wrap(&self, adc: Map<String, Value>) -> Value {
        json!({
            "$schema": self.version.schema_url(),
            "class": "AS3",
            "declaration": Value::Object(adc),
        })
    }

    /// Merge desired state over the skeleton and diff it against `active`.
    ///
    /// A broken override is logged and ignored.
    pub fn assemble(
        &self,
        desired: &DesiredConfig,
        override_fragment: Option<&OverrideFragment>,
        active: &ActiveSnapshot,
    ) -> Result<Declaration, AssemblyError> {
        let mut adc = self.adc_skeleton();

        for (name, body) in &desired.tenants {
            insert_tenant(&mut adc, name, body);
        }

        for config_map in &desired.config_maps {
            debug!(config_map = %config_map.key(), tenants = config_map.tenants.len(), "Merging config map tenants");
            for (name, body) in &config_map.tenants {
                insert_tenant(&mut adc, name, body);
            }
        }

        for name in deleted_tenants(active, &adc) {
            debug!(tenant = %name, "Tenant no longer desired, deleting");
            adc.insert(name, tenant_stub());
        }

        let merged = Declaration::from_document(self.wrap(adc))?;

        let Some(fragment) = override_fragment.filter(|f| !f.is_empty()) else {
            return Ok(merged);
        };

        match overlay::apply(fragment, merged.document()) {
            Ok(document) => Declaration::from_document(document),
            Err(e) => {
                warn!(error = %e, "Failed to override declaration, using merged declaration");
                Ok(merged)
            }
        }
    }

    /// Declaration that removes every partition in `partitions`.
    pub fn deletion_declaration(&self, partitions: &[String]) -> Result<Declaration, AssemblyError> {
        let mut adc = self.adc_skeleton();
        for partition in partitions.iter().filter(|p| !p.is_empty()) {
            insert_tenant(&mut adc, partition, &tenant_stub());
        }
        Declaration::from_document(self.wrap(adc))
    }
}

fn insert_tenant(adc: &mut Map<String, Value>, name: &str, body: &Value) {
    if is_reserved(name) {
        warn!(tenant = %name, "Tenant name collides with a declaration field, skipping");
        return;
    }
    adc.insert(name.to_string(), body.clone());
}

fn deleted_tenants(active: &ActiveSnapshot, adc: &Map<String, Value>) -> Vec<String> {
    active
        .tenants(false)
        .into_iter()
        .filter(|name| !adc.contains_key(name))
        .collect()
}
