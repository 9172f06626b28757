use futures::future;
use indexmap::IndexMap;
use tracing::{info, warn};

use crate::board::Board;
use crate::io::storage::{StorageError, TaskStore};
use crate::model::task::TaskPatch;

/// Outcome of one batch save.
#[derive(Debug, Default)]
pub struct SaveReport {
    /// Task ids whose updates were persisted
    pub saved: Vec<String>,
    /// Task ids whose updates failed, with the collaborator's error
    pub failed: Vec<SaveFailure>,
}

#[derive(Debug)]
pub struct SaveFailure {
    pub task_id: String,
    pub error: StorageError,
}

impl SaveReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Push a pending-diff snapshot to the store, one update per task, all in
/// parallel. A failed row is reported and does not stop the others.
pub async fn flush_pending<S: TaskStore + ?Sized>(
    store: &S,
    snapshot: &IndexMap<String, TaskPatch>,
) -> SaveReport {
    let updates = snapshot.iter().map(|(id, patch)| async move {
        store
            .update_task(id, patch)
            .await
            .map(|()| id.clone())
            .map_err(|error| SaveFailure {
                task_id: id.clone(),
                error,
            })
    });

    let mut report = SaveReport::default();
    for result in future::join_all(updates).await {
        match result {
            Ok(id) => report.saved.push(id),
            Err(failure) => {
                warn!(task = %failure.task_id, error = %failure.error, "task update failed");
                report.failed.push(failure);
            }
        }
    }
    info!(
        saved = report.saved.len(),
        failed = report.failed.len(),
        "batch save finished"
    );
    report
}

/// Snapshot the board's pending diffs, flush them, and fold the outcome
/// back in. Saved diffs clear; failed diffs stay as the retry target; local
/// task state keeps the optimistic values either way.
pub async fn save_board<S: TaskStore + ?Sized>(store: &S, board: &mut Board) -> SaveReport {
    let snapshot = board.pending_snapshot();
    if snapshot.is_empty() {
        return SaveReport::default();
    }
    let report = flush_pending(store, &snapshot).await;
    board.absorb_save(&snapshot, &report);
    report
}
