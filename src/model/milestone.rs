use serde::{Deserialize, Serialize};

/// A named grouping bucket for root-level task templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub title: String,
    /// Bucket order in the UI
    pub sort_order: i64,
}

/// Identity of a milestone bucket, including the unassigned one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneKey {
    Unassigned,
    Id(String),
}

impl MilestoneKey {
    /// The bucket a `milestone_id` column value falls into.
    pub fn from_field(milestone_id: Option<&str>) -> Self {
        match milestone_id {
            Some(id) => MilestoneKey::Id(id.to_string()),
            None => MilestoneKey::Unassigned,
        }
    }

    /// The column value that places a root task in this bucket.
    pub fn to_field(&self) -> Option<String> {
        match self {
            MilestoneKey::Unassigned => None,
            MilestoneKey::Id(id) => Some(id.clone()),
        }
    }
}

impl std::fmt::Display for MilestoneKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MilestoneKey::Unassigned => write!(f, "unassigned"),
            MilestoneKey::Id(id) => write!(f, "{}", id),
        }
    }
}

/// Which buckets a view should include.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneFilter {
    All,
    Unassigned,
    Id(String),
}

impl MilestoneFilter {
    pub fn admits(&self, key: &MilestoneKey) -> bool {
        match self {
            MilestoneFilter::All => true,
            MilestoneFilter::Unassigned => *key == MilestoneKey::Unassigned,
            MilestoneFilter::Id(id) => matches!(key, MilestoneKey::Id(k) if k == id),
        }
    }
}
