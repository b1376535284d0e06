use serde::{Deserialize, Serialize};

use crate::RectSelection;

/// Selections in the shape the labeling service exchanges them:
/// `{"selections": [{"slice_index", "x", "y", "width", "height"}, ...]}`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SelectionExport {
    pub selections: Vec<RectSelection>,
}

impl SelectionExport {
    pub fn new(selections: Vec<RectSelection>) -> Self {
        Self { selections }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Accepts either the wrapped object or a bare array of selections.
    pub fn from_json(text: &str) -> Option<Self> {
        if let Ok(export) = serde_json::from_str::<SelectionExport>(text) {
            return Some(export);
        }
        serde_json::from_str::<Vec<RectSelection>>(text)
            .ok()
            .map(Self::new)
    }
}
