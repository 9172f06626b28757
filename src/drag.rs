use serde::{Deserialize, Serialize};

use crate::model::config::DragConfig;
use crate::model::milestone::MilestoneKey;

/// Pointer position reported by the rendering layer, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// The classified purpose of an in-progress drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragIntent {
    /// Place before/after a sibling, or into a milestone zone
    Reorder,
    /// Nest under the node below the pointer
    Reparent,
}

/// The drop zone under the pointer, as resolved by the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropTarget {
    BeforeTask { task_id: String },
    AfterTask { task_id: String },
    EmptyMilestone { milestone: MilestoneKey },
    MilestoneHeader { milestone: MilestoneKey },
}

/// One live drag, from pick-up to drop or cancel.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    /// The task being dragged
    pub task_id: String,
    /// Pointer position at pick-up
    pub origin: Point,
    /// Latest pointer position
    pub pointer: Point,
    pub intent: DragIntent,
    pub target: Option<DropTarget>,
}

impl DragSession {
    pub fn start(task_id: impl Into<String>, origin: Point) -> Self {
        DragSession {
            task_id: task_id.into(),
            origin,
            pointer: origin,
            intent: DragIntent::Reorder,
            target: None,
        }
    }

    /// Record a pointer move: reclassify intent and replace the target.
    pub fn update(&mut self, pointer: Point, target: Option<DropTarget>, config: &DragConfig) {
        self.pointer = pointer;
        self.intent = classify_intent(self.origin, pointer, config);
        self.target = target;
    }
}

/// Axis dominance: a mostly-horizontal pull past the threshold reads as
/// reparent, anything else as reorder.
pub fn classify_intent(origin: Point, pointer: Point, config: &DragConfig) -> DragIntent {
    let dx = (pointer.x - origin.x).abs();
    let dy = (pointer.y - origin.y).abs();
    if dx > config.reparent_threshold && dx > dy {
        DragIntent::Reparent
    } else {
        DragIntent::Reorder
    }
}
