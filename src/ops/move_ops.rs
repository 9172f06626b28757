use std::collections::HashSet;

use indexmap::IndexMap;

use crate::drag::{DragIntent, DropTarget};
use crate::model::milestone::MilestoneKey;
use crate::model::task::{Task, TaskPatch};

/// The sibling group a task lives in: the children of one parent, or the
/// roots of one milestone bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiblingGroup {
    Children { parent: String },
    Roots { milestone: MilestoneKey },
}

impl SiblingGroup {
    /// The group a task currently occupies. A task whose parent is not in
    /// the arena counts as a root, matching how the forest is built.
    pub fn of(arena: &IndexMap<String, Task>, task: &Task) -> SiblingGroup {
        match effective_parent(arena, task) {
            Some(pid) => SiblingGroup::Children {
                parent: pid.to_string(),
            },
            None => SiblingGroup::Roots {
                milestone: MilestoneKey::from_field(task.milestone_id.as_deref()),
            },
        }
    }
}

/// Where a dragged task should land, resolved from intent + drop zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Sibling of the zone's task, placed before it
    Before { sibling: String },
    /// Sibling of the zone's task, placed after it
    After { sibling: String },
    /// Last child of the zone's task
    ChildOf { parent: String },
    /// Last root of a milestone bucket
    Bucket { milestone: MilestoneKey },
}

/// Combine the classified intent with the zone under the pointer.
///
/// A reparent over a task zone nests under that task; milestone zones land
/// at the root of the bucket regardless of intent.
pub fn resolve_slot(intent: DragIntent, target: &DropTarget) -> Slot {
    match (intent, target) {
        (DragIntent::Reorder, DropTarget::BeforeTask { task_id }) => Slot::Before {
            sibling: task_id.clone(),
        },
        (DragIntent::Reorder, DropTarget::AfterTask { task_id }) => Slot::After {
            sibling: task_id.clone(),
        },
        (
            DragIntent::Reparent,
            DropTarget::BeforeTask { task_id } | DropTarget::AfterTask { task_id },
        ) => Slot::ChildOf {
            parent: task_id.clone(),
        },
        (_, DropTarget::EmptyMilestone { milestone } | DropTarget::MilestoneHeader { milestone }) => {
            Slot::Bucket {
                milestone: milestone.clone(),
            }
        }
    }
}

/// True when `task_id` sits somewhere under `ancestor_id`.
/// Refuses to revisit a node, so corrupt parent chains terminate.
pub fn is_descendant(arena: &IndexMap<String, Task>, ancestor_id: &str, task_id: &str) -> bool {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut current = arena.get(task_id).and_then(|t| t.parent_id.as_deref());
    while let Some(pid) = current {
        if pid == ancestor_id {
            return true;
        }
        if !seen.insert(pid) {
            return false;
        }
        current = arena.get(pid).and_then(|t| t.parent_id.as_deref());
    }
    false
}

/// Number of tasks currently in a sibling group.
pub fn group_len(arena: &IndexMap<String, Task>, group: &SiblingGroup) -> usize {
    arena.values().filter(|t| in_group(arena, t, group)).count()
}

/// Compute the patch set for moving `task_id` into `slot`.
///
/// Returns None when the move is rejected (unknown ids, the target is the
/// dragged task or one of its descendants) or is a no-op (same group, same
/// position). Otherwise the patches carry the dragged task's new parent /
/// milestone / order plus a new `order_index` for every sibling — in the
/// group it left and the group it joined — whose value changes. Applying
/// them leaves both groups numbered `0..n` with no gaps.
pub fn plan_move(
    arena: &IndexMap<String, Task>,
    task_id: &str,
    slot: &Slot,
) -> Option<Vec<(String, TaskPatch)>> {
    let dragged = arena.get(task_id)?;

    let (dest, index) = match slot {
        Slot::Before { sibling } | Slot::After { sibling } => {
            if sibling == task_id || is_descendant(arena, task_id, sibling) {
                return None;
            }
            let sib = arena.get(sibling)?;
            let dest = SiblingGroup::of(arena, sib);
            let others = members_excluding(arena, &dest, task_id);
            let pos = others.iter().position(|t| t.id == *sibling)?;
            let index = match slot {
                Slot::After { .. } => pos + 1,
                _ => pos,
            };
            (dest, index)
        }
        Slot::ChildOf { parent } => {
            if parent == task_id || is_descendant(arena, task_id, parent) {
                return None;
            }
            arena.get(parent)?;
            let dest = SiblingGroup::Children {
                parent: parent.clone(),
            };
            let index = members_excluding(arena, &dest, task_id).len();
            (dest, index)
        }
        Slot::Bucket { milestone } => {
            let dest = SiblingGroup::Roots {
                milestone: milestone.clone(),
            };
            let index = members_excluding(arena, &dest, task_id).len();
            (dest, index)
        }
    };

    let source = SiblingGroup::of(arena, dragged);

    if source == dest {
        let current = members(arena, &source)
            .iter()
            .position(|t| t.id == *task_id)?;
        if current == index {
            return None;
        }
    }

    let mut patches: Vec<(String, TaskPatch)> = Vec::new();

    // Old group closes the gap left behind
    if source != dest {
        for (i, task) in members_excluding(arena, &source, task_id).iter().enumerate() {
            if task.order_index != i as i64 {
                patches.push((task.id.clone(), TaskPatch::order(i as i64)));
            }
        }
    }

    // New group makes room at the insertion point
    let mut landed = members_excluding(arena, &dest, task_id);
    landed.insert(index, dragged);
    for (i, task) in landed.iter().enumerate() {
        if task.id == *task_id {
            continue;
        }
        if task.order_index != i as i64 {
            patches.push((task.id.clone(), TaskPatch::order(i as i64)));
        }
    }

    let mut own = TaskPatch::default();
    if dragged.order_index != index as i64 {
        own.order_index = Some(index as i64);
    }
    match &dest {
        SiblingGroup::Children { parent } => {
            if dragged.parent_id.as_deref() != Some(parent.as_str()) {
                own.parent_id = Some(Some(parent.clone()));
            }
            // milestone_id is not consulted for children, leave it alone
        }
        SiblingGroup::Roots { milestone } => {
            if dragged.parent_id.is_some() {
                own.parent_id = Some(None);
            }
            let field = milestone.to_field();
            if dragged.milestone_id != field {
                own.milestone_id = Some(field);
            }
        }
    }
    if !own.is_empty() {
        patches.push((task_id.to_string(), own));
    }

    if patches.is_empty() {
        return None;
    }
    Some(patches)
}

fn effective_parent<'a>(arena: &'a IndexMap<String, Task>, task: &Task) -> Option<&'a str> {
    let pid = task.parent_id.as_deref()?;
    arena.get(pid).map(|parent| parent.id.as_str())
}

fn in_group(arena: &IndexMap<String, Task>, task: &Task, group: &SiblingGroup) -> bool {
    match group {
        SiblingGroup::Children { parent } => task.parent_id.as_deref() == Some(parent.as_str()),
        SiblingGroup::Roots { milestone } => {
            effective_parent(arena, task).is_none()
                && MilestoneKey::from_field(task.milestone_id.as_deref()) == *milestone
        }
    }
}

/// Group members sorted by order with arena order as tie-break.
fn members<'a>(arena: &'a IndexMap<String, Task>, group: &SiblingGroup) -> Vec<&'a Task> {
    let mut list: Vec<&Task> = arena
        .values()
        .filter(|t| in_group(arena, t, group))
        .collect();
    list.sort_by_key(|t| t.order_index);
    list
}

fn members_excluding<'a>(
    arena: &'a IndexMap<String, Task>,
    group: &SiblingGroup,
    task_id: &str,
) -> Vec<&'a Task> {
    let mut list = members(arena, group);
    list.retain(|t| t.id != task_id);
    list
}
