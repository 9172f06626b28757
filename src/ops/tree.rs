use std::collections::HashMap;

use indexmap::IndexMap;

use crate::model::task::Task;

/// Error type for loaded row sets that violate structural assumptions
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("duplicate task id: {0}")]
    DuplicateTask(String),
}

/// A task with its resolved children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskNode {
    pub task: Task,
    pub children: Vec<TaskNode>,
}

/// Index a flat row set by id, preserving load order.
///
/// Load order is what breaks `order_index` ties everywhere downstream, so
/// the arena must never be reordered after this point.
pub fn index_tasks(rows: Vec<Task>) -> Result<IndexMap<String, Task>, DataError> {
    let mut arena = IndexMap::with_capacity(rows.len());
    for task in rows {
        if arena.contains_key(&task.id) {
            return Err(DataError::DuplicateTask(task.id));
        }
        arena.insert(task.id.clone(), task);
    }
    Ok(arena)
}

/// Build the forest for an arena.
///
/// A task whose `parent_id` does not resolve to a loaded task is kept as a
/// root rather than dropped. Every sibling list is sorted by `order_index`
/// ascending; the sort is stable, so equal values keep arena order and the
/// result is identical on every call.
pub fn build_forest(arena: &IndexMap<String, Task>) -> Vec<TaskNode> {
    let mut children: HashMap<&str, Vec<&Task>> = HashMap::new();
    let mut roots: Vec<&Task> = Vec::new();

    for task in arena.values() {
        match task.parent_id.as_deref() {
            Some(pid) if pid != task.id && arena.contains_key(pid) => {
                children.entry(pid).or_default().push(task);
            }
            _ => roots.push(task),
        }
    }

    roots.sort_by_key(|t| t.order_index);
    roots
        .into_iter()
        .map(|task| build_node(task, &children))
        .collect()
}

fn build_node(task: &Task, children: &HashMap<&str, Vec<&Task>>) -> TaskNode {
    let mut kids: Vec<&Task> = children
        .get(task.id.as_str())
        .map(|list| list.to_vec())
        .unwrap_or_default();
    kids.sort_by_key(|t| t.order_index);
    TaskNode {
        task: task.clone(),
        children: kids
            .into_iter()
            .map(|kid| build_node(kid, children))
            .collect(),
    }
}

/// Pre-order walk of a forest, respecting sibling order.
pub fn flatten_forest<'a>(forest: &'a [TaskNode]) -> Vec<&'a Task> {
    let mut out = Vec::new();
    for node in forest {
        flatten_into(node, &mut out);
    }
    out
}

fn flatten_into<'a>(node: &'a TaskNode, out: &mut Vec<&'a Task>) {
    out.push(&node.task);
    for child in &node.children {
        flatten_into(child, out);
    }
}
