//! Boundary to the appliance.
//!
//! The loop only sees `(accepted, event)` pairs; transport, TLS and auth live
//! behind [`Submitter`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SubmitResult;

/// What happened to a post, as far as retry timing is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostEvent {
    /// Declaration accepted
    Ok,
    /// Appliance busy (HTTP 503)
    ServiceUnavailable,
    /// AS3 endpoint missing (HTTP 404)
    NotFound,
    /// Declaration rejected (HTTP 422)
    UnprocessableEntity,
    /// Any other status or a transport failure
    Error,
    /// Nothing was posted this cycle
    NoOp,
}

impl PostEvent {
    /// Map an HTTP status to an event.
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => PostEvent::Ok,
            503 => PostEvent::ServiceUnavailable,
            404 => PostEvent::NotFound,
            422 => PostEvent::UnprocessableEntity,
            _ => PostEvent::Error,
        }
    }
}

impl fmt::Display for PostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PostEvent::Ok => "ok",
            PostEvent::ServiceUnavailable => "service-unavailable",
            PostEvent::NotFound => "not-found",
            PostEvent::UnprocessableEntity => "unprocessable-entity",
            PostEvent::Error => "error",
            PostEvent::NoOp => "no-op",
        };
        f.write_str(s)
    }
}

/// Result of one submission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostResponse {
    pub accepted: bool,
    pub event: PostEvent,
}

impl PostResponse {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            event: PostEvent::Ok,
        }
    }

    pub fn rejected(event: PostEvent) -> Self {
        Self {
            accepted: false,
            event,
        }
    }

    /// Nothing posted. `accepted` is what the caller should be told.
    pub fn no_op(accepted: bool) -> Self {
        Self {
            accepted,
            event: PostEvent::NoOp,
        }
    }

    /// True when a declaration was actually posted and accepted.
    pub fn is_posted_ok(&self) -> bool {
        self.accepted && self.event == PostEvent::Ok
    }
}

/// Posts declarations to the appliance.
///
/// Implementations must tolerate the same payload being posted repeatedly;
/// the loop reasserts the active declaration while it backs off.
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Post a serialized declaration, optionally scoped to `tenants`.
    async fn post_config(&self, declaration: &str, tenants: Option<&[String]>) -> PostResponse;
}

/// Reports the AS3 version installed on the appliance.
#[async_trait]
pub trait VersionSource: Send + Sync {
    /// Returns `(version, build)`, e.g. `("3.20.1", "4")`.
    async fn appliance_version(&self) -> SubmitResult<(String, String)>;
}
