use serde::{Deserialize, Serialize};

use crate::analysis::{bbox::Bbox, labels::Category};

/// One raw layout element reported by the recognizer for a page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: Bbox,
    pub category: Category,
    /// Pictures carry no text, tables carry HTML, everything else markdown.
    #[serde(default)]
    pub text: String,
}

impl Detection {
    pub fn new(bbox: Bbox, category: Category, text: impl Into<String>) -> Self {
        Self {
            bbox,
            category,
            text: text.into(),
        }
    }
}
