//! Per-call context: who is writing, for which project, with which headers.

use serde::{Deserialize, Serialize};

use snipstore_core::types::Headers;

use crate::snippet::OwnerSnapshot;

/// Username used for the placeholder system actor.
pub const SYSTEM_USERNAME: &str = "system";

/// The user performing a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Numeric user id.
    pub id: i64,
    /// Display name.
    pub username: String,
}

impl Actor {
    /// Creates a new actor.
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }

    /// The placeholder actor used when no user is known.
    pub fn system() -> Self {
        Self::new(1, SYSTEM_USERNAME)
    }

    /// Display snapshot of this actor.
    pub fn snapshot(&self) -> OwnerSnapshot {
        OwnerSnapshot {
            id: self.id,
            username: self.username.clone(),
        }
    }

    /// Display snapshot for the owner of a record.
    ///
    /// Only the acting user's name is known here, so any other owner is
    /// rendered with the system placeholder name.
    pub fn owner_snapshot(&self, owner_id: i64) -> OwnerSnapshot {
        let username = if owner_id == self.id {
            self.username.clone()
        } else {
            SYSTEM_USERNAME.to_string()
        };
        OwnerSnapshot {
            id: owner_id,
            username,
        }
    }
}

impl Default for Actor {
    fn default() -> Self {
        Self::system()
    }
}

/// Context passed to every store operation.
///
/// Extracted by the (external) request layer and handed to the facade so
/// that every write knows *who* is acting and for *which* project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreContext {
    /// Project scope stamped on saved snippets.
    pub project_id: i64,
    /// The acting user.
    pub actor: Actor,
    /// Request headers forwarded to a query gateway.
    #[serde(default)]
    pub headers: Headers,
}

impl StoreContext {
    /// Creates a new context without headers.
    pub fn new(project_id: i64, actor: Actor) -> Self {
        Self {
            project_id,
            actor,
            headers: Headers::new(),
        }
    }

    /// Attach headers to forward to the gateway.
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }
}

impl Default for StoreContext {
    fn default() -> Self {
        Self::new(1, Actor::system())
    }
}
