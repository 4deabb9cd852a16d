//! Messages carried on the inbound and outbound channels

use crate::desired::{DesiredConfig, PoolMember};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inbound request: apply this desired state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeployRequest {
    pub desired: DesiredConfig,
}

impl DeployRequest {
    pub fn new(desired: DesiredConfig) -> Self {
        Self { desired }
    }
}

impl From<DesiredConfig> for DeployRequest {
    fn from(desired: DesiredConfig) -> Self {
        Self::new(desired)
    }
}

/// Outbound notification after the appliance accepted a declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployOutcome {
    /// Whether the appliance accepted the declaration
    pub success: bool,

    /// Members to reassert at the network layer (ARP/FDB)
    pub members: Vec<PoolMember>,

    /// Tenants present in the accepted declaration
    pub tenants: Vec<String>,

    /// When the outcome was produced
    pub completed_at: DateTime<Utc>,
}

impl DeployOutcome {
    pub fn success(members: Vec<PoolMember>, tenants: Vec<String>) -> Self {
        Self {
            success: true,
            members,
            tenants,
            completed_at: Utc::now(),
        }
    }
}
