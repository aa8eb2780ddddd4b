//! Role-based static permission checker.
//!
//! Grants are configured per role as `role=grant,grant;role=grant`, where a
//! grant is `*` (everything), `entity:*` (every action on one entity) or
//! `entity:action`. Object-level checks apply the same grants as the coarse
//! check.

use std::collections::HashMap;

use async_trait::async_trait;
use trellis_core::access::{Action, Identity, Permission, PermissionChecker};
use trellis_core::error::{CoreError, CoreResult};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrantError {
    #[error("malformed role entry {0:?}, expected role=grant[,grant...]")]
    MalformedRole(String),

    #[error("malformed grant {0:?}, expected *, entity:* or entity:action")]
    MalformedGrant(String),
}

/// One granted permission pattern. `None` is a wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub entity: Option<String>,
    pub action: Option<Action>,
}

impl Grant {
    pub fn parse(raw: &str) -> Result<Self, GrantError> {
        let raw = raw.trim();
        if raw == "*" {
            return Ok(Self {
                entity: None,
                action: None,
            });
        }

        let malformed = || GrantError::MalformedGrant(raw.to_string());
        let (entity, action) = raw.split_once(':').ok_or_else(malformed)?;
        let (entity, action) = (entity.trim(), action.trim());
        if entity.is_empty() || entity == "*" {
            return Err(malformed());
        }
        let action = match action {
            "*" => None,
            name => Some(
                Action::ALL
                    .into_iter()
                    .find(|a| a.as_str() == name)
                    .ok_or_else(malformed)?,
            ),
        };
        Ok(Self {
            entity: Some(entity.to_string()),
            action,
        })
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.entity.as_deref().map_or(true, |e| e == permission.entity)
            && self.action.map_or(true, |a| a == permission.action)
    }
}

/// Grants every role holds, keyed by role name.
#[derive(Debug, Clone, Default)]
pub struct StaticPermissionChecker {
    grants: HashMap<String, Vec<Grant>>,
}

impl StaticPermissionChecker {
    /// Parse a `role=grant,grant;role=grant` string.
    pub fn parse(raw: &str) -> Result<Self, GrantError> {
        let mut grants: HashMap<String, Vec<Grant>> = HashMap::new();
        for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (role, list) = entry
                .split_once('=')
                .ok_or_else(|| GrantError::MalformedRole(entry.to_string()))?;
            let role = role.trim();
            if role.is_empty() {
                return Err(GrantError::MalformedRole(entry.to_string()));
            }
            let parsed = list
                .split(',')
                .filter(|g| !g.trim().is_empty())
                .map(Grant::parse)
                .collect::<Result<Vec<_>, _>>()?;
            grants.entry(role.to_string()).or_default().extend(parsed);
        }
        Ok(Self { grants })
    }

    pub fn allows(&self, role: &str, permission: Permission) -> bool {
        self.grants
            .get(role)
            .is_some_and(|grants| grants.iter().any(|g| g.allows(permission)))
    }
}

#[async_trait]
impl PermissionChecker for StaticPermissionChecker {
    async fn check(
        &self,
        identity: &Identity,
        permission: Permission,
        _object: Option<&serde_json::Value>,
    ) -> CoreResult<()> {
        if self.allows(&identity.role, permission) {
            Ok(())
        } else {
            Err(CoreError::PermissionDenied)
        }
    }
}
