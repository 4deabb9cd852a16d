//! AS3 Types - shared data model for declaration sync
//!
//! The translation layer turns cluster resources into partial AS3 fragments and
//! hands them to the reconciler as a [`DeployRequest`]. The reconciler answers
//! on a single-slot channel with a [`DeployOutcome`].
//!
//! ## Key Concepts
//!
//! - **Tenant**: a named partition in a declaration, keyed by name
//! - **DesiredConfig**: everything the translation layer wants applied this cycle
//! - **ConfigMapFragment**: a user-supplied block of tenants merged after resources
//! - **OverrideFragment**: an administrator document overlaid last
//! - **PoolMember**: endpoint data reasserted downstream after a successful post

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod desired;
pub mod message;

pub use desired::{ConfigMapFragment, DesiredConfig, OverrideFragment, PoolMember, TenantMap};
pub use message::{DeployOutcome, DeployRequest};
