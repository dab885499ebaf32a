//! Registries owning record lifecycles.
//! Each operation validates its input, consults the authorization policy with
//! the explicit caller identity, and only then mutates the store.

pub mod tasks;
pub mod users;

pub use tasks::{TaskRegistry, NewTask, TaskUpdate, TaskFilter};
pub use users::{UserRegistry, NewUser, ensure_default_admin};
