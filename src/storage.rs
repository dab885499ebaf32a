//!
//! taskdeck storage module
//! -----------------------
//! In-memory keyed record store for users and tasks. Users are keyed by their
//! lower-cased id; tasks by a store-assigned, monotonically increasing
//! integer id, so iterating the task map yields insertion order.
//!
//! `User` and `Task` are flat records joined by `owner_id` only. There is no
//! live back-reference between them, which keeps serialization cycle-free.
//!
//! The public API centers around the `Store` type, which is usually wrapped
//! in a thread-safe `SharedStore` (`Arc<RwLock<Store>>`) elsewhere in the
//! codebase. Mutations are single-record read-modify-write; concurrent
//! updates to the same task are last-write-wins.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::identity::Role;

/// A registered account. The password digest is write-only from the outside:
/// it is skipped on serialization and cleared again by the registries before
/// a record leaves the crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub password_digest: String,
    #[serde(default)]
    pub role: Role,
}

impl User {
    /// Copy of the record with the digest cleared, for external consumption.
    pub fn redacted(&self) -> User {
        User {
            id: self.id.clone(),
            name: self.name.clone(),
            password_digest: String::new(),
            role: self.role,
        }
    }
}

/// A tracked task. `owner_id` is fixed at creation and never reassigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub description: String,
    pub completed: bool,
    pub owner_id: String,
}

#[derive(Debug, Default)]
pub struct Store {
    users: HashMap<String, User>,
    tasks: BTreeMap<i64, Task>,
    next_task_id: i64,
}

impl Store {
    pub fn new() -> Self {
        Self { users: HashMap::new(), tasks: BTreeMap::new(), next_task_id: 1 }
    }

    /// Insert a user record. Returns false (and leaves the store untouched)
    /// if the id is already taken.
    pub fn insert_user(&mut self, user: User) -> bool {
        if self.users.contains_key(&user.id) {
            return false;
        }
        self.users.insert(user.id.clone(), user);
        true
    }

    pub fn user(&self, id: &str) -> Option<User> {
        self.users.get(id).cloned()
    }

    pub fn user_exists(&self, id: &str) -> bool {
        self.users.contains_key(id)
    }

    pub fn users(&self) -> Vec<User> {
        let mut all: Vec<User> = self.users.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Create a task with a store-assigned id.
    pub fn insert_task(&mut self, description: String, owner_id: String) -> Task {
        let id = self.next_task_id;
        self.next_task_id += 1;
        let task = Task { id, description, completed: false, owner_id };
        self.tasks.insert(id, task.clone());
        task
    }

    pub fn task(&self, id: i64) -> Option<Task> {
        self.tasks.get(&id).cloned()
    }

    /// Replace an existing task record. Returns false if the id is unknown.
    pub fn replace_task(&mut self, task: Task) -> bool {
        if !self.tasks.contains_key(&task.id) {
            return false;
        }
        self.tasks.insert(task.id, task);
        true
    }

    pub fn remove_task(&mut self, id: i64) -> bool {
        self.tasks.remove(&id).is_some()
    }

    /// All tasks in insertion (ascending id) order.
    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.values().cloned().collect()
    }
}

/// Thread-safe handle shared across handlers and registries.
#[derive(Clone)]
pub struct SharedStore(pub Arc<RwLock<Store>>);

impl SharedStore {
    pub fn new() -> Self {
        SharedStore(Arc::new(RwLock::new(Store::new())))
    }
}

impl Default for SharedStore {
    fn default() -> Self { Self::new() }
}
