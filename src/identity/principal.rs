use serde::{Deserialize, Serialize};

/// Closed role set. Any other value is rejected at the user registry
/// boundary instead of being stored as a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    /// Parse a caller-supplied role name. Returns None for anything outside
    /// the closed set.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool { matches!(self, Role::Admin) }
}

impl Default for Role {
    fn default() -> Self { Role::User }
}

/// The authenticated actor reconstructed from a validated token.
/// Ephemeral per request; passed explicitly into every registry call so the
/// authorization policy stays pure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub display_name: String,
    pub role: Role,
}
