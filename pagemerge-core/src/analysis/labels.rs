use serde::{Deserialize, Serialize};

/// Layout category assigned by the recognizer.
///
/// The serde names are the exact strings the recognizer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Caption,
    Footnote,
    Formula,
    #[serde(rename = "List-item")]
    ListItem,
    #[serde(rename = "Page-footer")]
    PageFooter,
    #[serde(rename = "Page-header")]
    PageHeader,
    Picture,
    #[serde(rename = "Section-header")]
    SectionHeader,
    Table,
    Text,
    Title,
}

impl Category {
    pub const fn name(&self) -> &str {
        match self {
            Category::Caption => "Caption",
            Category::Footnote => "Footnote",
            Category::Formula => "Formula",
            Category::ListItem => "List-item",
            Category::PageFooter => "Page-footer",
            Category::PageHeader => "Page-header",
            Category::Picture => "Picture",
            Category::SectionHeader => "Section-header",
            Category::Table => "Table",
            Category::Text => "Text",
            Category::Title => "Title",
        }
    }

    /// Markdown heading level for heading-like categories.
    pub const fn heading_level(&self) -> Option<usize> {
        match self {
            Category::PageHeader => Some(1),
            Category::SectionHeader => Some(2),
            Category::Title => Some(3),
            _ => None,
        }
    }

    pub const fn is_table(&self) -> bool {
        matches!(self, Category::Table)
    }

    pub const fn is_picture(&self) -> bool {
        matches!(self, Category::Picture)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
