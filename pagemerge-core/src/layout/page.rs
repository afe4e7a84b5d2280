use serde::{Deserialize, Serialize};

use crate::layout::{component::Component, element::Detection};

/// Raw recognizer output for one page, the input of a merge.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PageDetections {
    pub page_number: u32,
    #[serde(default, alias = "ocr_results")]
    pub detections: Vec<Detection>,
}

impl PageDetections {
    pub fn new(page_number: u32, detections: Vec<Detection>) -> Self {
        Self {
            page_number,
            detections,
        }
    }
}

/// A page after clustering: components in reading order.
#[derive(Clone, Debug, PartialEq)]
pub struct PageUnit {
    pub page_number: u32,
    pub components: Vec<Component>,
}

impl PageUnit {
    pub fn new(page_number: u32, components: Vec<Component>) -> Self {
        Self {
            page_number,
            components,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn first_is_table(&self) -> bool {
        self.components.first().is_some_and(Component::is_table)
    }

    pub fn last_is_table(&self) -> bool {
        self.components.last().is_some_and(Component::is_table)
    }

    /// Member detections of all components, flattened in order.
    pub fn detections(&self) -> impl Iterator<Item = &Detection> {
        self.components.iter().flat_map(|c| c.detections().iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_detections_accepts_ocr_results_key() {
        let raw = r#"{"page_number": 3, "ocr_results": [
            {"bbox": [0, 0, 10, 10], "category": "Text", "text": "hello"}
        ]}"#;
        let page: PageDetections = serde_json::from_str(raw).unwrap();
        assert_eq!(page.page_number, 3);
        assert_eq!(page.detections.len(), 1);
    }

    #[test]
    fn test_page_detections_empty_list() {
        let page: PageDetections = serde_json::from_str(r#"{"page_number": 1}"#).unwrap();
        assert!(page.detections.is_empty());
    }
}
