//! User registry: registration, lookup and credential verification.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::identity::{Principal, Role, TokenService, can_access_user, can_assume_role};
use crate::security;
use crate::storage::{SharedStore, User};

// Ids are 3-50 chars of [a-z0-9_], matched after lower-casing.
static USER_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new("^[a-z0-9_]{3,50}$").unwrap());

/// Registration payload. `role` stays a raw string here so unknown values
/// are rejected by the registry instead of the deserializer.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Clone)]
pub struct UserRegistry {
    store: SharedStore,
    tokens: Arc<TokenService>,
}

impl UserRegistry {
    pub fn new(store: SharedStore, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    /// Register a user. Anonymous callers and non-admins may only create
    /// default-role accounts; the escalation failure is 401 for anonymous
    /// callers and 403 for authenticated non-admins.
    pub fn create(&self, new: NewUser, caller: Option<&Principal>) -> AppResult<User> {
        let id = new.id.to_lowercase();
        if !USER_ID_RE.is_match(&id) {
            return Err(AppError::user(
                "invalid_id",
                "user id must be 3 to 50 characters of a-z, 0-9 or '_'",
            ));
        }
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::user("empty_name", "a user needs a name"));
        }
        if new.password.is_empty() {
            return Err(AppError::user("empty_password", "a user needs a password"));
        }
        let role = match new.role.as_deref() {
            None => Role::default(),
            Some(raw) => Role::parse(raw)
                .ok_or_else(|| AppError::user("invalid_role", "unknown role"))?,
        };
        if self.store.0.read().user_exists(&id) {
            return Err(AppError::conflict("id_taken", "user id is not available"));
        }
        if !can_assume_role(caller, role) {
            return Err(match caller {
                Some(_) => AppError::forbidden("role_escalation", "only admins may assign roles"),
                None => AppError::unauthenticated("role_escalation", "log in as admin to assign roles"),
            });
        }

        let user = User {
            id: id.clone(),
            name,
            password_digest: security::hash_password(&new.password)?,
            role,
        };
        if !self.store.0.write().insert_user(user.clone()) {
            return Err(AppError::conflict("id_taken", "user id is not available"));
        }
        info!("user.create id={} role={}", id, role.as_str());
        Ok(user.redacted())
    }

    /// Lookup by id; self or admin only. The digest field is always cleared.
    pub fn get(&self, id: &str, caller: &Principal) -> AppResult<User> {
        let user = self
            .store
            .0
            .read()
            .user(id)
            .ok_or_else(|| AppError::not_found("user_not_found", "no such user"))?;
        if !can_access_user(caller, &user.id) {
            return Err(AppError::forbidden("forbidden", "not your account"));
        }
        Ok(user.redacted())
    }

    /// Full registry listing, admin only, digests stripped.
    pub fn list_all(&self, caller: &Principal) -> AppResult<Vec<User>> {
        if !caller.role.is_admin() {
            return Err(AppError::forbidden("forbidden", "admin only"));
        }
        Ok(self.store.0.read().users().iter().map(User::redacted).collect())
    }

    /// Verify credentials and issue a token. The failure is deliberately the
    /// same for an unknown id and a wrong password.
    pub fn authenticate(&self, id: &str, password: &str) -> AppResult<String> {
        let bad = || AppError::unauthenticated("bad_credentials", "unknown user or wrong password");
        let user = self.store.0.read().user(id).ok_or_else(bad)?;
        if !security::verify_password(&user.password_digest, password) {
            return Err(bad());
        }
        let token = self.tokens.issue(&user)?;
        info!("auth.login user={}", user.id);
        Ok(token)
    }
}

/// Seed the bootstrap admin account on first start.
pub fn ensure_default_admin(store: &SharedStore, password: &str) -> anyhow::Result<()> {
    if store.0.read().user_exists("admin") {
        return Ok(());
    }
    let user = User {
        id: "admin".to_string(),
        name: "Administrator".to_string(),
        password_digest: security::hash_password(password)?,
        role: Role::Admin,
    };
    store.0.write().insert_user(user);
    info!("user.bootstrap id=admin");
    Ok(())
}
