use tracing::*;

use crate::{
    consts::SECTION_SEPARATOR,
    error::MergeError,
    layout::{element::Detection, page::PageUnit},
    merge::chain::{MergedUnit, TableChainBlock},
    render::Renderer,
};

/// A partitioned document with its table chains fused, ready to render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedDocument {
    pub begin_cover: Vec<PageUnit>,
    pub header: Vec<PageUnit>,
    pub content: Vec<MergedUnit>,
    pub footer: Vec<PageUnit>,
    pub end_cover: Vec<PageUnit>,
}

impl MergedDocument {
    /// Renders the five sections in document order.
    pub fn render<R: Renderer + ?Sized>(&self, renderer: &R) -> Result<String, MergeError> {
        let sections = [
            render_pages(renderer, &self.begin_cover)?,
            render_pages(renderer, &self.header)?,
            render_content(renderer, &self.content)?,
            render_pages(renderer, &self.footer)?,
            render_pages(renderer, &self.end_cover)?,
        ];
        debug!(
            "Rendered section sizes: {:?}",
            sections.iter().map(String::len).collect::<Vec<_>>()
        );
        Ok(join_blocks(sections))
    }
}

/// Concatenates rendered blocks with a single blank line between them.
///
/// Blank blocks are skipped. A block that already ends in a line break only
/// gets topped up to a blank line, so renderer output that ends in a blank
/// line is never padded further.
pub fn join_blocks<I, S>(blocks: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for block in blocks {
        let block = block.as_ref();
        if block.trim().is_empty() {
            continue;
        }
        if !joined.is_empty() {
            if !joined.ends_with('\n') {
                joined.push_str(SECTION_SEPARATOR);
            } else if !joined.ends_with(SECTION_SEPARATOR) {
                joined.push('\n');
            }
        }
        joined.push_str(block);
    }
    joined
}

/// Renders one page's components through the renderer.
pub fn render_page<R: Renderer + ?Sized>(
    renderer: &R,
    page: &PageUnit,
) -> Result<String, MergeError> {
    if page.is_empty() {
        return Ok(String::new());
    }
    let detections: Vec<Detection> = page.detections().cloned().collect();
    renderer.render(page.page_number, &detections)
}

fn render_pages<R: Renderer + ?Sized>(
    renderer: &R,
    pages: &[PageUnit],
) -> Result<String, MergeError> {
    let rendered = pages
        .iter()
        .map(|page| render_page(renderer, page))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(join_blocks(rendered))
}

/// Non-table members first, then the merged table markup as is.
fn render_chain<R: Renderer + ?Sized>(
    renderer: &R,
    block: &TableChainBlock,
) -> Result<String, MergeError> {
    let mut rendered = block
        .extras
        .iter()
        .map(|page| render_page(renderer, page))
        .collect::<Result<Vec<_>, _>>()?;
    rendered.push(block.merged_table_text.clone());
    Ok(join_blocks(rendered))
}

fn render_content<R: Renderer + ?Sized>(
    renderer: &R,
    content: &[MergedUnit],
) -> Result<String, MergeError> {
    let rendered = content
        .iter()
        .map(|unit| match unit {
            MergedUnit::Page(page) => render_page(renderer, page),
            MergedUnit::Chain(block) => render_chain(renderer, block),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(join_blocks(rendered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::{bbox::Bbox, labels::Category},
        layout::component::Component,
    };

    /// Prints `p{page}:{text}` per detection, one per line.
    struct PlainRenderer;

    impl Renderer for PlainRenderer {
        fn render(&self, page_number: u32, detections: &[Detection]) -> Result<String, MergeError> {
            Ok(detections
                .iter()
                .map(|d| format!("p{page_number}:{}\n", d.text))
                .collect())
        }
    }

    fn page(page_number: u32, texts: &[&str]) -> PageUnit {
        let components = texts
            .iter()
            .map(|t| {
                Component::new(vec![Detection::new(
                    Bbox::from_corners(0.0, 0.0, 10.0, 10.0),
                    Category::Text,
                    *t,
                )])
            })
            .collect();
        PageUnit::new(page_number, components)
    }

    #[test]
    fn test_join_blocks() {
        assert_eq!(join_blocks(["a", "b"]), "a\n\nb");
        assert_eq!(join_blocks(["a\n", "b\n"]), "a\n\nb\n");
        assert_eq!(join_blocks(["a\n\n", "", "  \n", "b\n\n"]), "a\n\nb\n\n");
        assert_eq!(join_blocks(["only\n\n"]), "only\n\n");
        assert_eq!(join_blocks::<_, &str>([]), "");
    }

    #[test]
    fn test_render_document_order() {
        let document = MergedDocument {
            begin_cover: vec![page(1, &["cover"])],
            header: vec![page(2, &["header"])],
            content: vec![
                MergedUnit::Page(page(2, &["body"])),
                MergedUnit::Chain(TableChainBlock {
                    member_pages: vec![2, 3],
                    merged_table_text: "<table></table>".to_string(),
                    extras: vec![page(2, &["Table 1"])],
                }),
            ],
            footer: Vec::new(),
            end_cover: vec![page(4, &["back"])],
        };
        let text = document.render(&PlainRenderer).unwrap();
        assert_eq!(
            text,
            "p1:cover\n\np2:header\n\np2:body\n\np2:Table 1\n\n<table></table>\n\np4:back\n"
        );
    }

    #[test]
    fn test_render_empty_document() {
        let text = MergedDocument::default().render(&PlainRenderer).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn test_render_skips_empty_pages() {
        let document = MergedDocument {
            content: vec![
                MergedUnit::Page(page(1, &["a"])),
                MergedUnit::Page(page(2, &[])),
                MergedUnit::Page(page(3, &["b"])),
            ],
            ..Default::default()
        };
        assert_eq!(document.render(&PlainRenderer).unwrap(), "p1:a\n\np3:b\n");
    }
}
