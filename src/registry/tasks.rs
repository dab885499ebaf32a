//! Task registry: creation, listing, mutation and the completion lifecycle.
//! A task's owner is fixed at creation; completion is a one-way transition.

use serde::Deserialize;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::identity::{Principal, can_access_task, can_access_user};
use crate::storage::{SharedStore, Task};

/// Creation payload. `owner_id` is only honored for admins; everyone else
/// gets the task under their own id.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub owner_id: Option<String>,
}

/// Update payload. Carries the task id so a path/payload mismatch can be
/// rejected. A missing `owner_id` means "unchanged".
#[derive(Debug, Clone, Deserialize)]
pub struct TaskUpdate {
    pub id: i64,
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub description_contains: Option<String>,
    pub pending_only: bool,
}

#[derive(Clone)]
pub struct TaskRegistry {
    store: SharedStore,
}

impl TaskRegistry {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// List tasks matching the filter. `scope_owner` restricts the result to
    /// one owner; handlers force it to the caller for non-admins. Results
    /// are in insertion order, except `pending_only` which returns the most
    /// recent pending tasks first (descending id).
    pub fn list(&self, filter: &TaskFilter, scope_owner: Option<&str>) -> Vec<Task> {
        let mut tasks = self.store.0.read().tasks();
        if let Some(needle) = filter.description_contains.as_deref() {
            if !needle.is_empty() {
                tasks.retain(|t| t.description.contains(needle));
            }
        }
        if let Some(owner) = scope_owner {
            tasks.retain(|t| t.owner_id == owner);
        }
        if filter.pending_only {
            tasks.retain(|t| !t.completed);
            tasks.sort_by(|a, b| b.id.cmp(&a.id));
        }
        tasks
    }

    pub fn get(&self, id: i64, caller: &Principal) -> AppResult<Task> {
        let task = self
            .store
            .0
            .read()
            .task(id)
            .ok_or_else(|| AppError::not_found("task_not_found", "no such task"))?;
        if !can_access_task(caller, &task) {
            return Err(AppError::forbidden("forbidden", "not your task"));
        }
        Ok(task)
    }

    /// Create a task. The effective owner is the caller unless an admin
    /// names someone else; a task can never start out completed.
    pub fn create(&self, new: NewTask, caller: &Principal) -> AppResult<Task> {
        if new.description.is_empty() {
            return Err(AppError::user("empty_description", "a task needs a description"));
        }
        if new.description.chars().count() > 200 {
            return Err(AppError::user("description_too_long", "description is limited to 200 characters"));
        }
        if new.completed {
            return Err(AppError::user(
                "already_completed_at_creation",
                "a task cannot be created already completed",
            ));
        }
        let owner_id = new.owner_id.unwrap_or_else(|| caller.user_id.clone());
        if !can_access_user(caller, &owner_id) {
            return Err(AppError::forbidden("forbidden", "cannot create tasks for another user"));
        }
        let mut store = self.store.0.write();
        if !store.user_exists(&owner_id) {
            return Err(AppError::user("unknown_owner", "owner does not exist"));
        }
        let task = store.insert_task(new.description, owner_id);
        info!("task.create id={} owner={}", task.id, task.owner_id);
        Ok(task)
    }

    /// Update description and completion flag. The owner is immutable and a
    /// completed task cannot be reopened; both are checked before the
    /// authorization decision, mirroring the input validation order.
    pub fn update(&self, path_id: i64, upd: TaskUpdate, caller: &Principal) -> AppResult<Task> {
        if upd.id != path_id {
            return Err(AppError::user("id_mismatch", "path and payload ids differ"));
        }
        if upd.description.is_empty() {
            return Err(AppError::user("empty_description", "a task cannot be left without a description"));
        }
        if upd.description.chars().count() > 200 {
            return Err(AppError::user("description_too_long", "description is limited to 200 characters"));
        }
        let mut task = self
            .store
            .0
            .read()
            .task(path_id)
            .ok_or_else(|| AppError::not_found("task_not_found", "no such task"))?;
        if let Some(owner) = upd.owner_id.as_deref() {
            if owner != task.owner_id {
                return Err(AppError::user(
                    "owner_change_forbidden",
                    "a task cannot be moved to another user",
                ));
            }
        }
        if task.completed && !upd.completed {
            return Err(AppError::user("reopen_forbidden", "a completed task cannot be reopened"));
        }
        if !can_access_task(caller, &task) {
            return Err(AppError::forbidden("forbidden", "not your task"));
        }
        task.description = upd.description;
        task.completed = upd.completed;
        if !self.store.0.write().replace_task(task.clone()) {
            return Err(AppError::not_found("task_not_found", "no such task"));
        }
        Ok(task)
    }

    /// Mark a task completed. Irreversible; a second call is rejected.
    pub fn complete(&self, id: i64, caller: &Principal) -> AppResult<Task> {
        let mut task = self
            .store
            .0
            .read()
            .task(id)
            .ok_or_else(|| AppError::not_found("task_not_found", "no such task"))?;
        if task.completed {
            return Err(AppError::user("already_completed", "task was completed earlier"));
        }
        if !can_access_task(caller, &task) {
            return Err(AppError::forbidden("forbidden", "not your task"));
        }
        task.completed = true;
        if !self.store.0.write().replace_task(task.clone()) {
            return Err(AppError::not_found("task_not_found", "no such task"));
        }
        info!("task.complete id={} owner={}", task.id, task.owner_id);
        Ok(task)
    }

    pub fn delete(&self, id: i64, caller: &Principal) -> AppResult<()> {
        let task = self
            .store
            .0
            .read()
            .task(id)
            .ok_or_else(|| AppError::not_found("task_not_found", "no such task"))?;
        if !can_access_task(caller, &task) {
            return Err(AppError::forbidden("forbidden", "not your task"));
        }
        if !self.store.0.write().remove_task(id) {
            return Err(AppError::not_found("task_not_found", "no such task"));
        }
        info!("task.delete id={} owner={}", task.id, task.owner_id);
        Ok(())
    }
}
