use indexmap::IndexMap;
use tracing::debug;

use crate::drag::{DragSession, DropTarget, Point};
use crate::io::save::SaveReport;
use crate::model::config::DragConfig;
use crate::model::milestone::{Milestone, MilestoneFilter, MilestoneKey};
use crate::model::task::{Task, TaskPatch};
use crate::ops::group::{MilestoneBucket, group_by_milestone};
use crate::ops::move_ops::{self, SiblingGroup};
use crate::ops::tree::{DataError, index_tasks};

/// The board state: tasks, milestones, pending diffs, and the live drag.
///
/// Every task mutation funnels through [`Board::apply_patch`], which keeps
/// the local arena and the pending-diff map in step. Nothing replaces either
/// wholesale, so diffs recorded while a save is in flight survive it.
pub struct Board {
    tasks: IndexMap<String, Task>,
    milestones: Vec<Milestone>,
    pending: IndexMap<String, TaskPatch>,
    drag: Option<DragSession>,
    config: DragConfig,
}

impl Board {
    pub fn new(rows: Vec<Task>, milestones: Vec<Milestone>) -> Result<Self, DataError> {
        Ok(Board {
            tasks: index_tasks(rows)?,
            milestones,
            pending: IndexMap::new(),
            drag: None,
            config: DragConfig::default(),
        })
    }

    pub fn with_config(mut self, config: DragConfig) -> Self {
        self.config = config;
        self
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// The forest-per-milestone snapshot for rendering.
    pub fn buckets(&self, filter: &MilestoneFilter) -> Vec<MilestoneBucket> {
        group_by_milestone(&self.tasks, &self.milestones, filter)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    /// The live drag, for drop-zone highlighting.
    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    pub fn pending(&self) -> &IndexMap<String, TaskPatch> {
        &self.pending
    }

    /// How many tasks have unsaved changes.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// The order index for a new task appended to a sibling group.
    pub fn next_order_index(
        &self,
        parent_id: Option<&str>,
        milestone_id: Option<&str>,
    ) -> i64 {
        let group = match parent_id {
            Some(pid) if self.tasks.contains_key(pid) => SiblingGroup::Children {
                parent: pid.to_string(),
            },
            _ => SiblingGroup::Roots {
                milestone: MilestoneKey::from_field(milestone_id),
            },
        };
        move_ops::group_len(&self.tasks, &group) as i64
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Merge a patch into the task and into its pending diff.
    ///
    /// Repeated patches to one task coalesce field-wise, last write wins, so
    /// any number of edits before a save leaves one pending entry per task.
    /// Returns false for unknown ids and empty patches.
    pub fn apply_patch(&mut self, task_id: &str, patch: TaskPatch) -> bool {
        if patch.is_empty() {
            return false;
        }
        let Some(task) = self.tasks.get_mut(task_id) else {
            return false;
        };
        patch.apply_to(task);
        self.pending
            .entry(task_id.to_string())
            .or_default()
            .merge(patch);
        true
    }

    /// Inline title edit.
    pub fn edit_title(&mut self, task_id: &str, title: impl Into<String>) -> bool {
        let title = title.into();
        match self.tasks.get(task_id) {
            Some(task) if task.title != title => self.apply_patch(task_id, TaskPatch::title(title)),
            _ => false,
        }
    }

    /// Register a collaborator-created row locally.
    pub fn insert_task(&mut self, task: Task) -> Result<(), DataError> {
        if self.tasks.contains_key(&task.id) {
            return Err(DataError::DuplicateTask(task.id));
        }
        self.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    /// Swap in freshly loaded rows, then re-apply still-pending diffs so
    /// unsaved optimistic edits stay visible. Diffs for rows that no longer
    /// exist are dropped. Any live drag is abandoned.
    pub fn replace(
        &mut self,
        rows: Vec<Task>,
        milestones: Vec<Milestone>,
    ) -> Result<(), DataError> {
        self.tasks = index_tasks(rows)?;
        self.milestones = milestones;
        self.drag = None;
        self.pending.retain(|id, _| self.tasks.contains_key(id));
        for (id, patch) in &self.pending {
            if let Some(task) = self.tasks.get_mut(id) {
                patch.apply_to(task);
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Drag session
    // -----------------------------------------------------------------------

    /// Idle → Dragging. Unknown ids are ignored.
    pub fn start_drag(&mut self, task_id: &str, at: Point) -> bool {
        if !self.tasks.contains_key(task_id) {
            return false;
        }
        self.drag = Some(DragSession::start(task_id, at));
        true
    }

    /// Reclassify the live drag for a pointer move. No-op when idle.
    pub fn update_drag(&mut self, at: Point, target: Option<DropTarget>) {
        if let Some(session) = &mut self.drag {
            session.update(at, target, &self.config);
        }
    }

    /// Drop: plan the move and apply it optimistically.
    ///
    /// Returns true when a mutation was applied. Invalid drops — no target,
    /// a cycle, the current position — leave all state untouched.
    pub fn commit_drag(&mut self) -> bool {
        let Some(session) = self.drag.take() else {
            return false;
        };
        let Some(target) = session.target else {
            return false;
        };
        let slot = move_ops::resolve_slot(session.intent, &target);
        let Some(patches) = move_ops::plan_move(&self.tasks, &session.task_id, &slot) else {
            debug!(task = %session.task_id, "drop rejected");
            return false;
        };
        debug!(task = %session.task_id, patches = patches.len(), "drop committed");
        for (id, patch) in patches {
            self.apply_patch(&id, patch);
        }
        true
    }

    /// Dragging → Idle with no mutation.
    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    // -----------------------------------------------------------------------
    // Save bookkeeping
    // -----------------------------------------------------------------------

    /// Clone the pending map for an in-flight save.
    pub fn pending_snapshot(&self) -> IndexMap<String, TaskPatch> {
        self.pending.clone()
    }

    /// Fold a save outcome back in. A saved id is cleared only when its
    /// pending diff still equals what the save sent; a diff recorded while
    /// the save was in flight stays queued for the next one. Failed ids
    /// keep their diffs, and local task state is never rolled back.
    pub fn absorb_save(
        &mut self,
        snapshot: &IndexMap<String, TaskPatch>,
        report: &SaveReport,
    ) {
        for id in &report.saved {
            if self.pending.get(id) == snapshot.get(id) {
                self.pending.shift_remove(id);
            }
        }
    }
}
