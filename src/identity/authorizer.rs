//! Pure authorization policy.
//! These functions take the caller identity and the resource owner as plain
//! values so they can be unit-tested without any HTTP or storage context.
//! The admin check always short-circuits before the ownership comparison.

use crate::storage::Task;
use super::principal::{Principal, Role};

/// True iff the caller is an admin or is the target user themself.
pub fn can_access_user(caller: &Principal, target_user_id: &str) -> bool {
    caller.role.is_admin() || caller.user_id == target_user_id
}

/// True iff the caller is an admin or owns the task.
pub fn can_access_task(caller: &Principal, task: &Task) -> bool {
    caller.role.is_admin() || caller.user_id == task.owner_id
}

/// True iff the requested role is the default, or the caller is an
/// authenticated admin. Anonymous callers may only take the default role.
pub fn can_assume_role(caller: Option<&Principal>, requested: Role) -> bool {
    match requested {
        Role::User => true,
        Role::Admin => caller.map(|p| p.role.is_admin()).unwrap_or(false),
    }
}
