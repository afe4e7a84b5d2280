use crate::{
    analysis::labels::Category,
    consts::PICTURE_PLACEHOLDER,
    layout::element::Detection,
};

/// Detections of one page judged to be a single logical element.
///
/// Members keep the order in which the clusterer visited them.
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    detections: Vec<Detection>,
    text: String,
}

impl Component {
    pub fn new(detections: Vec<Detection>) -> Self {
        let text = detections
            .iter()
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();
        Self { detections, text }
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    /// Newline-joined member texts.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// A component counts as a table as soon as one member is a table.
    pub fn is_table(&self) -> bool {
        self.detections.iter().any(|d| d.category.is_table())
    }

    /// Text used to compare this component across pages, pictures collapse
    /// into a fixed placeholder token.
    pub fn comparison_text(&self) -> String {
        self.detections
            .iter()
            .map(|d| match d.category {
                Category::Picture => PICTURE_PLACEHOLDER,
                _ => d.text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    /// Table markup of this component: the table members' texts.
    pub fn table_markup(&self) -> String {
        self.detections
            .iter()
            .filter(|d| d.category.is_table())
            .map(|d| d.text.trim())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Members that are not tables, in member order.
    pub fn non_table_detections(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter().filter(|d| !d.category.is_table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::bbox::Bbox;

    fn det(category: Category, text: &str) -> Detection {
        Detection::new(Bbox::from_corners(0.0, 0.0, 10.0, 10.0), category, text)
    }

    #[test]
    fn test_component_text_joins_members() {
        let component = Component::new(vec![
            det(Category::Caption, "Figure 1."),
            det(Category::Caption, "Revenue by quarter "),
        ]);
        assert_eq!(component.text(), "Figure 1.\nRevenue by quarter");
        assert!(!component.is_table());
    }

    #[test]
    fn test_component_table_parts() {
        let component = Component::new(vec![
            det(Category::Text, "Table 2"),
            det(Category::Table, "<table><tr><td>a</td></tr></table>"),
        ]);
        assert!(component.is_table());
        assert_eq!(
            component.table_markup(),
            "<table><tr><td>a</td></tr></table>"
        );
        let extras: Vec<_> = component.non_table_detections().collect();
        assert_eq!(extras.len(), 1);
        assert_eq!(extras[0].text, "Table 2");
    }

    #[test]
    fn test_comparison_text_replaces_pictures() {
        let component = Component::new(vec![det(Category::Picture, "")]);
        assert_eq!(component.comparison_text(), PICTURE_PLACEHOLDER);
        assert_eq!(component.text(), "");
    }
}
