use serde::{Deserialize, Serialize};

/// Tuning for drag gesture classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DragConfig {
    /// Horizontal displacement in pixels before a drag reads as a reparent
    #[serde(default = "default_reparent_threshold")]
    pub reparent_threshold: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        DragConfig {
            reparent_threshold: default_reparent_threshold(),
        }
    }
}

fn default_reparent_threshold() -> f64 {
    24.0
}
