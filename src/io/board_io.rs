use tracing::debug;

use crate::board::Board;
use crate::io::storage::{StorageError, TaskStore};
use crate::model::task::{NewTask, TaskFilter};
use crate::ops::tree::DataError;

/// Error type for the initial bulk load
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("data integrity error: {0}")]
    Data(#[from] DataError),
}

/// Load a board: fetch milestones and tasks, then build the state purely.
pub async fn load_board<S: TaskStore + ?Sized>(
    store: &S,
    filter: &TaskFilter,
) -> Result<Board, LoadError> {
    let milestones = store.load_milestones().await?;
    let rows = store.load_tasks(filter).await?;
    debug!(
        tasks = rows.len(),
        milestones = milestones.len(),
        "board data loaded"
    );
    Ok(Board::new(rows, milestones)?)
}

/// Re-fetch rows and milestones for an existing board. Unsaved optimistic
/// edits are re-applied on top of the fresh rows.
pub async fn refresh_board<S: TaskStore + ?Sized>(
    store: &S,
    board: &mut Board,
    filter: &TaskFilter,
) -> Result<(), LoadError> {
    let milestones = store.load_milestones().await?;
    let rows = store.load_tasks(filter).await?;
    debug!(tasks = rows.len(), "board data refreshed");
    board.replace(rows, milestones)?;
    Ok(())
}

/// Create a template through the collaborator and register it locally,
/// appended to the end of its sibling group.
pub async fn create_template<S: TaskStore + ?Sized>(
    store: &S,
    board: &mut Board,
    title: impl Into<String>,
    parent_id: Option<String>,
    milestone_id: Option<String>,
) -> Result<String, StorageError> {
    let order_index = board.next_order_index(parent_id.as_deref(), milestone_id.as_deref());
    let fields = NewTask {
        title: title.into(),
        parent_id,
        milestone_id,
        order_index,
    };
    let task = store.create_task(fields).await?;
    let id = task.id.clone();
    board
        .insert_task(task)
        .map_err(|e| StorageError::MalformedRow(e.to_string()))?;
    Ok(id)
}
