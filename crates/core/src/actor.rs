//! Actor roles for status mutations.

use serde::{Deserialize, Serialize};

/// Which side of an exchange the acting user is on.
///
/// The transition tables key authorization off this: accept/decline/complete
/// are owner-only, cancel is open to either party.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Owner,
    Requester,
}

impl core::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ActorRole::Owner => f.write_str("owner"),
            ActorRole::Requester => f.write_str("requester"),
        }
    }
}
