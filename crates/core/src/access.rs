//! Identity and permission contracts consumed by the interceptor.
//!
//! The concrete identity source (JWT, mTLS, ...) and the policy engine live
//! outside `core`; only their call contracts are defined here.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::CoreResult;

/// The five operation kinds every entity exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    List,
    Get,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Create,
        Action::List,
        Action::Get,
        Action::Update,
        Action::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::List => "list",
            Action::Get => "get",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// A permission kind: one action on one entity type, e.g. `plan:update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permission {
    pub entity: &'static str,
    pub action: Action,
}

impl Permission {
    pub const fn new(entity: &'static str, action: Action) -> Self {
        Self { entity, action }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity, self.action.as_str())
    }
}

/// The acting principal of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub subject: String,
    pub role: String,
}

/// Per-request metadata handed from the transport to the interceptor.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Bearer credential with the scheme prefix already stripped.
    pub bearer_token: Option<String>,
    pub request_id: Option<String>,
}

impl RequestContext {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            bearer_token: Some(token.into()),
            request_id: None,
        }
    }
}

/// Resolves who is acting. Fails with `Unauthenticated` when nobody is.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn acting_identity(&self, ctx: &RequestContext) -> CoreResult<Identity>;
}

/// Grants or denies a permission, optionally against a concrete object.
///
/// `object` is `None` for the coarse per-operation check and carries the JSON
/// form of the create payload, filter, or stored record for the object-level
/// check. Denial is reported as `PermissionDenied` with no further detail.
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    async fn check(
        &self,
        identity: &Identity,
        permission: Permission,
        object: Option<&serde_json::Value>,
    ) -> CoreResult<()>;
}
