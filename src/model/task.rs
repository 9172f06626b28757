use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A task-template row as loaded from the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Row identifier, assigned by the collaborator
    pub id: String,
    /// Display text
    pub title: String,
    /// `None` means root-level
    pub parent_id: Option<String>,
    /// `None` means unassigned; only consulted for root tasks
    pub milestone_id: Option<String>,
    /// Sibling order, unique within a sibling group
    pub order_index: i64,
    /// Always true for rows this engine manages
    pub is_template: bool,
    /// Tie-break for equal order values
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a root-level template with the given id and title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Task {
            id: id.into(),
            title: title.into(),
            parent_id: None,
            milestone_id: None,
            order_index: 0,
            is_template: true,
            created_at: Utc::now(),
        }
    }
}

/// Accumulated, not-yet-persisted field changes for one task.
///
/// Nullable columns use a two-level `Option`: the outer level is "field
/// touched", the inner level is the stored value, so clearing a parent
/// (`Some(None)`) is distinct from leaving it alone (`None`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub parent_id: Option<Option<String>>,
    pub milestone_id: Option<Option<String>>,
    pub order_index: Option<i64>,
}

impl TaskPatch {
    /// A patch that only changes the title.
    pub fn title(title: impl Into<String>) -> Self {
        TaskPatch {
            title: Some(title.into()),
            ..TaskPatch::default()
        }
    }

    /// A patch that only changes the order index.
    pub fn order(order_index: i64) -> Self {
        TaskPatch {
            order_index: Some(order_index),
            ..TaskPatch::default()
        }
    }

    /// True when no field is touched.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.parent_id.is_none()
            && self.milestone_id.is_none()
            && self.order_index.is_none()
    }

    /// Fold a newer patch into this one, last write wins per field.
    pub fn merge(&mut self, newer: TaskPatch) {
        if let Some(title) = newer.title {
            self.title = Some(title);
        }
        if let Some(parent_id) = newer.parent_id {
            self.parent_id = Some(parent_id);
        }
        if let Some(milestone_id) = newer.milestone_id {
            self.milestone_id = Some(milestone_id);
        }
        if let Some(order_index) = newer.order_index {
            self.order_index = Some(order_index);
        }
    }

    /// Overwrite the touched fields on a task.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(parent_id) = &self.parent_id {
            task.parent_id = parent_id.clone();
        }
        if let Some(milestone_id) = &self.milestone_id {
            task.milestone_id = milestone_id.clone();
        }
        if let Some(order_index) = self.order_index {
            task.order_index = order_index;
        }
    }

    /// The partial-update payload: a JSON object holding only the touched
    /// columns, with explicit nulls for cleared ones.
    pub fn to_value(&self) -> Value {
        let mut fields = Map::new();
        if let Some(title) = &self.title {
            fields.insert("title".into(), Value::String(title.clone()));
        }
        if let Some(parent_id) = &self.parent_id {
            fields.insert("parent_id".into(), opt_str(parent_id));
        }
        if let Some(milestone_id) = &self.milestone_id {
            fields.insert("milestone_id".into(), opt_str(milestone_id));
        }
        if let Some(order_index) = self.order_index {
            fields.insert("order_index".into(), Value::from(order_index));
        }
        Value::Object(fields)
    }
}

fn opt_str(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::String(s.clone()),
        None => Value::Null,
    }
}

/// Fields for creating a template row; the collaborator assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub parent_id: Option<String>,
    pub milestone_id: Option<String>,
    pub order_index: i64,
}

/// Scope for the bulk task read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskFilter {
    /// Restrict the read to template rows
    pub templates: bool,
}

impl Default for TaskFilter {
    fn default() -> Self {
        TaskFilter { templates: true }
    }
}
