use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use trellis::board::Board;
use trellis::drag::{DropTarget, Point};
use trellis::io::board_io::{create_template, load_board, refresh_board};
use trellis::io::save::{flush_pending, save_board};
use trellis::io::storage::{StorageError, TaskStore};
use trellis::model::{Milestone, MilestoneFilter, MilestoneKey, NewTask, Task, TaskFilter, TaskPatch};

// ============================================================================
// In-memory store double
// ============================================================================

struct MemStore {
    state: Mutex<MemState>,
}

struct MemState {
    tasks: Vec<Task>,
    milestones: Vec<Milestone>,
    fail_updates: HashSet<String>,
    fail_loads: bool,
    update_attempts: usize,
    next_id: usize,
}

impl MemStore {
    fn new(tasks: Vec<Task>, milestones: Vec<Milestone>) -> Self {
        MemStore {
            state: Mutex::new(MemState {
                tasks,
                milestones,
                fail_updates: HashSet::new(),
                fail_loads: false,
                update_attempts: 0,
                next_id: 0,
            }),
        }
    }

    fn fail_update(&self, id: &str) {
        self.state.lock().unwrap().fail_updates.insert(id.to_string());
    }

    fn clear_failures(&self) {
        self.state.lock().unwrap().fail_updates.clear();
    }

    fn fail_loads(&self) {
        self.state.lock().unwrap().fail_loads = true;
    }

    fn task(&self, id: &str) -> Option<Task> {
        self.state
            .lock()
            .unwrap()
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    fn update_attempts(&self) -> usize {
        self.state.lock().unwrap().update_attempts
    }
}

#[async_trait]
impl TaskStore for MemStore {
    async fn load_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, StorageError> {
        let state = self.state.lock().unwrap();
        if state.fail_loads {
            return Err(StorageError::Backend("connection reset".into()));
        }
        Ok(state
            .tasks
            .iter()
            .filter(|t| !filter.templates || t.is_template)
            .cloned()
            .collect())
    }

    async fn load_milestones(&self) -> Result<Vec<Milestone>, StorageError> {
        let state = self.state.lock().unwrap();
        if state.fail_loads {
            return Err(StorageError::Backend("connection reset".into()));
        }
        Ok(state.milestones.clone())
    }

    async fn create_task(&self, fields: NewTask) -> Result<Task, StorageError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let mut task = Task::new(format!("t{}", state.next_id), fields.title);
        task.parent_id = fields.parent_id;
        task.milestone_id = fields.milestone_id;
        task.order_index = fields.order_index;
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        state.update_attempts += 1;
        if state.fail_updates.contains(id) {
            return Err(StorageError::Backend("row locked".into()));
        }
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        patch.apply_to(task);
        Ok(())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn row(id: &str, parent: Option<&str>, milestone: Option<&str>, order: i64) -> Task {
    let mut task = Task::new(id, format!("task {}", id));
    task.parent_id = parent.map(|p| p.to_string());
    task.milestone_id = milestone.map(|m| m.to_string());
    task.order_index = order;
    task
}

/// Two unassigned roots (1, 2), task 3 nested under 1, one milestone.
fn seeded_store() -> MemStore {
    MemStore::new(
        vec![
            row("1", None, None, 0),
            row("2", None, None, 1),
            row("3", Some("1"), None, 0),
        ],
        vec![Milestone {
            id: "m1".into(),
            title: "Kickoff".into(),
            sort_order: 1,
        }],
    )
}

fn drag_before(board: &mut Board, task_id: &str, sibling: &str) {
    board.start_drag(task_id, Point::new(0.0, 0.0));
    board.update_drag(
        Point::new(2.0, -40.0),
        Some(DropTarget::BeforeTask {
            task_id: sibling.into(),
        }),
    );
    assert!(board.commit_drag());
}

// ============================================================================
// Load
// ============================================================================

#[tokio::test]
async fn load_builds_grouped_forest() {
    let store = seeded_store();
    let board = load_board(&store, &TaskFilter::default()).await.unwrap();

    let buckets = board.buckets(&MilestoneFilter::All);
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].key, MilestoneKey::Id("m1".into()));
    assert!(buckets[0].is_empty());

    let unassigned = &buckets[1];
    assert_eq!(unassigned.roots.len(), 2);
    assert_eq!(unassigned.roots[0].task.id, "1");
    assert_eq!(unassigned.roots[0].children[0].task.id, "3");
}

#[tokio::test]
async fn load_failure_is_blocking() {
    let store = seeded_store();
    store.fail_loads();
    assert!(load_board(&store, &TaskFilter::default()).await.is_err());
}

#[tokio::test]
async fn empty_milestone_stays_droppable() {
    let store = seeded_store();
    let mut board = load_board(&store, &TaskFilter::default()).await.unwrap();

    board.start_drag("2", Point::new(0.0, 0.0));
    board.update_drag(
        Point::new(0.0, -80.0),
        Some(DropTarget::EmptyMilestone {
            milestone: MilestoneKey::Id("m1".into()),
        }),
    );
    assert!(board.commit_drag());

    let buckets = board.buckets(&MilestoneFilter::Id("m1".into()));
    assert_eq!(buckets[0].roots[0].task.id, "2");
}

// ============================================================================
// Save
// ============================================================================

#[tokio::test]
async fn clean_save_clears_pending_and_persists() {
    let store = seeded_store();
    let mut board = load_board(&store, &TaskFilter::default()).await.unwrap();

    drag_before(&mut board, "2", "1");
    assert_eq!(board.pending_count(), 2);

    let report = save_board(&store, &mut board).await;
    assert!(report.is_clean());
    assert_eq!(report.saved.len(), 2);
    assert_eq!(board.pending_count(), 0);
    assert_eq!(store.task("2").unwrap().order_index, 0);
    assert_eq!(store.task("1").unwrap().order_index, 1);
}

#[tokio::test]
async fn save_with_nothing_pending_issues_no_updates() {
    let store = seeded_store();
    let mut board = load_board(&store, &TaskFilter::default()).await.unwrap();
    let report = save_board(&store, &mut board).await;
    assert!(report.is_clean());
    assert!(report.saved.is_empty());
    assert_eq!(store.update_attempts(), 0);
}

#[tokio::test]
async fn partial_failure_keeps_only_failed_diffs() {
    let store = seeded_store();
    let mut board = load_board(&store, &TaskFilter::default()).await.unwrap();

    drag_before(&mut board, "2", "1");
    store.fail_update("1");

    let report = save_board(&store, &mut board).await;
    assert_eq!(report.saved, vec!["2".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].task_id, "1");
    // the failed row did not stop its sibling's update
    assert_eq!(store.update_attempts(), 2);
    // exactly the failed diff remains as the retry target
    assert_eq!(board.pending_count(), 1);
    assert!(board.pending().contains_key("1"));
    // optimistic state is not rolled back
    assert_eq!(board.task("1").unwrap().order_index, 1);

    store.clear_failures();
    let report = save_board(&store, &mut board).await;
    assert!(report.is_clean());
    assert_eq!(board.pending_count(), 0);
    assert_eq!(store.task("1").unwrap().order_index, 1);
}

#[tokio::test]
async fn diff_recorded_mid_save_survives_to_next_save() {
    let store = seeded_store();
    let mut board = load_board(&store, &TaskFilter::default()).await.unwrap();

    assert!(board.edit_title("1", "first"));
    let snapshot = board.pending_snapshot();

    // a newer edit lands while the flush is in flight
    assert!(board.edit_title("1", "second"));

    let report = flush_pending(&store, &snapshot).await;
    board.absorb_save(&snapshot, &report);

    assert_eq!(board.pending_count(), 1);
    assert_eq!(board.pending()["1"].title.as_deref(), Some("second"));

    let report = save_board(&store, &mut board).await;
    assert!(report.is_clean());
    assert_eq!(store.task("1").unwrap().title, "second");
}

// ============================================================================
// Create and refresh
// ============================================================================

#[tokio::test]
async fn create_template_appends_to_sibling_group() {
    let store = seeded_store();
    let mut board = load_board(&store, &TaskFilter::default()).await.unwrap();

    let id = create_template(&store, &mut board, "New step", None, None)
        .await
        .unwrap();
    let created = board.task(&id).unwrap();
    assert_eq!(created.order_index, 2);
    assert!(store.task(&id).is_some());

    let nested = create_template(&store, &mut board, "Sub step", Some("1".into()), None)
        .await
        .unwrap();
    assert_eq!(board.task(&nested).unwrap().order_index, 1);
}

#[tokio::test]
async fn refresh_preserves_unsaved_edits() {
    let store = seeded_store();
    let mut board = load_board(&store, &TaskFilter::default()).await.unwrap();

    drag_before(&mut board, "2", "1");
    refresh_board(&store, &mut board, &TaskFilter::default())
        .await
        .unwrap();

    // the store still has the old order, the board keeps the optimistic one
    assert_eq!(store.task("2").unwrap().order_index, 1);
    assert_eq!(board.task("2").unwrap().order_index, 0);
    assert_eq!(board.pending_count(), 2);
}
