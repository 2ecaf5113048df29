use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role, resolved once when the acting identity is extracted.
/// Handlers and the lifecycle engine branch on this tag instead of probing
/// for the existence of a related profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Driver,
    Provider,
}

/// The authenticated identity behind a call. Authentication itself is an
/// external collaborator; this service trusts the forwarded identity.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: Uuid,
    pub role: AccountRole,
}

impl Actor {
    pub fn driver(id: Uuid) -> Self {
        Self {
            id,
            role: AccountRole::Driver,
        }
    }

    pub fn provider(id: Uuid) -> Self {
        Self {
            id,
            role: AccountRole::Provider,
        }
    }
}
