use indexmap::IndexMap;

use crate::model::milestone::{Milestone, MilestoneFilter, MilestoneKey};
use crate::model::task::Task;
use crate::ops::tree::{TaskNode, build_forest};

/// One milestone's slice of the board: its identity and its root subtrees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneBucket {
    pub key: MilestoneKey,
    pub title: String,
    pub roots: Vec<TaskNode>,
}

impl MilestoneBucket {
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Partition the forest's roots into milestone buckets.
///
/// Every known milestone gets a bucket even when it holds no tasks — empty
/// milestones must stay visible as drop destinations. Buckets are ordered
/// by `sort_order` with the unassigned bucket last. A root pointing at an
/// unknown milestone falls into the unassigned bucket.
pub fn group_by_milestone(
    arena: &IndexMap<String, Task>,
    milestones: &[Milestone],
    filter: &MilestoneFilter,
) -> Vec<MilestoneBucket> {
    let mut ordered: Vec<&Milestone> = milestones.iter().collect();
    ordered.sort_by_key(|m| m.sort_order);

    let mut buckets: Vec<MilestoneBucket> = ordered
        .iter()
        .map(|m| MilestoneBucket {
            key: MilestoneKey::Id(m.id.clone()),
            title: m.title.clone(),
            roots: Vec::new(),
        })
        .collect();
    buckets.push(MilestoneBucket {
        key: MilestoneKey::Unassigned,
        title: "Unassigned".to_string(),
        roots: Vec::new(),
    });

    for node in build_forest(arena) {
        let key = MilestoneKey::from_field(node.task.milestone_id.as_deref());
        let slot = buckets
            .iter()
            .position(|b| b.key == key)
            .unwrap_or(buckets.len() - 1);
        buckets[slot].roots.push(node);
    }

    buckets.retain(|b| filter.admits(&b.key));
    buckets
}
