//! Desired state produced by the translation layer

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Tenant name to tenant body.
pub type TenantMap = BTreeMap<String, Value>;

/// A backend endpoint referenced by a pool in the desired state
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolMember {
    /// Member address
    pub address: String,

    /// Service port
    pub port: u16,

    /// Tenant owning the pool
    #[serde(default)]
    pub tenant: String,
}

impl PoolMember {
    pub fn new(address: impl Into<String>, port: u16, tenant: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port,
            tenant: tenant.into(),
        }
    }
}

/// Tenants contributed by one user config map, applied after resource tenants
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigMapFragment {
    /// Config map name
    pub name: String,

    /// Config map namespace
    pub namespace: String,

    /// Tenants declared by this config map
    #[serde(default)]
    pub tenants: TenantMap,

    /// Endpoints of the pools in this config map
    #[serde(default)]
    pub members: Vec<PoolMember>,
}

impl ConfigMapFragment {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn with_tenant(mut self, name: impl Into<String>, body: Value) -> Self {
        self.tenants.insert(name.into(), body);
        self
    }

    /// `namespace/name`
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// Raw administrator override document. Validated when it is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideFragment(String);

impl OverrideFragment {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty override means no override is active.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Desired configuration for one cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesiredConfig {
    /// Tenants derived from cluster resources
    #[serde(default)]
    pub tenants: TenantMap,

    /// User config maps, in precedence order (later wins)
    #[serde(default)]
    pub config_maps: Vec<ConfigMapFragment>,

    /// Administrator override, applied last
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_fragment: Option<OverrideFragment>,

    /// Endpoints of the resource pools
    #[serde(default)]
    pub members: Vec<PoolMember>,
}

impl DesiredConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(mut self, name: impl Into<String>, body: Value) -> Self {
        self.tenants.insert(name.into(), body);
        self
    }

    pub fn with_config_map(mut self, fragment: ConfigMapFragment) -> Self {
        self.config_maps.push(fragment);
        self
    }

    pub fn with_override(mut self, fragment: OverrideFragment) -> Self {
        self.override_fragment = Some(fragment);
        self
    }

    pub fn with_member(mut self, member: PoolMember) -> Self {
        self.members.push(member);
        self
    }

    /// The active override, ignoring empty documents.
    pub fn active_override(&self) -> Option<&OverrideFragment> {
        self.override_fragment.as_ref().filter(|o| !o.is_empty())
    }

    /// Resource members followed by every config map's members.
    pub fn all_members(&self) -> Vec<PoolMember> {
        self.members
            .iter()
            .chain(self.config_maps.iter().flat_map(|cm| cm.members.iter()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_override_is_inactive() {
        let desired = DesiredConfig::new().with_override(OverrideFragment::new("  \n"));
        assert!(desired.active_override().is_none());

        let desired = DesiredConfig::new().with_override(OverrideFragment::new("{}"));
        assert!(desired.active_override().is_some());
    }

    #[test]
    fn test_all_members_includes_config_maps() {
        let mut cm = ConfigMapFragment::new("default", "cm1");
        cm.members.push(PoolMember::new("10.0.0.2", 80, "cm-tenant"));

        let desired = DesiredConfig::new()
            .with_member(PoolMember::new("10.0.0.1", 8080, "app1"))
            .with_config_map(cm);

        let members = desired.all_members();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].address, "10.0.0.1");
        assert_eq!(members[1].tenant, "cm-tenant");
    }

    #[test]
    fn test_desired_config_from_json() {
        let raw = json!({
            "tenants": { "app1": { "class": "Tenant" } },
            "config_maps": [
                { "name": "cm", "namespace": "ns", "tenants": { "app2": { "class": "Tenant" } } }
            ]
        });
        let desired: DesiredConfig = serde_json::from_value(raw).unwrap();
        assert!(desired.tenants.contains_key("app1"));
        assert_eq!(desired.config_maps[0].key(), "ns/cm");
        assert!(desired.override_fragment.is_none());
    }
}
