//! Caller identity, token issuance/validation and the authorization policy.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod token;
mod authorizer;

pub use principal::{Principal, Role};
pub use token::{TokenService, TokenError, Claims};
pub use authorizer::{can_access_user, can_access_task, can_assume_role};
