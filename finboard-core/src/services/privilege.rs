//! Privilege resolver - identity to the five page privileges

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{PrivilegePolicy, PrivilegeSet};
use crate::ports::DataStore;

/// Where a resolved privilege set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PrivilegeSource {
    /// A stored record for the identity
    Stored,
    /// No record (or the lookup failed), so the policy default applies
    PolicyDefault,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivilegeResolution {
    pub privileges: PrivilegeSet,
    pub source: PrivilegeSource,
}

/// Resolves privileges for an identity. Never fails.
pub struct PrivilegeResolver {
    store: Arc<dyn DataStore>,
    policy: PrivilegePolicy,
}

impl PrivilegeResolver {
    pub fn new(store: Arc<dyn DataStore>, policy: PrivilegePolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> PrivilegePolicy {
        self.policy
    }

    pub async fn resolve(&self, identity_id: &str) -> PrivilegeResolution {
        match self.store.get_privileges(identity_id).await {
            Ok(Some(stored)) => {
                debug!(identity = identity_id, "privileges loaded from store");
                // Null columns fall back per key; stored values are kept
                PrivilegeResolution {
                    privileges: stored.merge(self.policy.default_set()),
                    source: PrivilegeSource::Stored,
                }
            }
            Ok(None) => {
                warn!(
                    identity = identity_id,
                    policy = ?self.policy,
                    "no privilege record, applying default policy"
                );
                self.fallback()
            }
            Err(e) => {
                warn!(
                    identity = identity_id,
                    policy = ?self.policy,
                    error = %e,
                    "privilege lookup failed, applying default policy"
                );
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> PrivilegeResolution {
        PrivilegeResolution {
            privileges: self.policy.default_set(),
            source: PrivilegeSource::PolicyDefault,
        }
    }
}
