use async_trait::async_trait;

use crate::model::milestone::Milestone;
use crate::model::task::{NewTask, Task, TaskFilter, TaskPatch};

/// Error type for storage collaborator calls
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("malformed row: {0}")]
    MalformedRow(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// The row-store collaborator behind the board.
///
/// The engine only needs bulk reads, row creation, and partial updates; the
/// wire and storage formats are the implementor's concern. Updates consume
/// a [`TaskPatch`] whose `to_value` form is the partial-update payload.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Bulk read, called on mount and on explicit refresh.
    async fn load_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, StorageError>;

    /// Bulk read of all milestones.
    async fn load_milestones(&self) -> Result<Vec<Milestone>, StorageError>;

    /// Create a row; the store assigns the id.
    async fn create_task(&self, fields: NewTask) -> Result<Task, StorageError>;

    /// Apply a partial update to one row.
    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<(), StorageError>;
}
