use std::collections::BTreeSet;

use tracing::*;

use crate::{
    analysis::similarity::RepetitionClassifier,
    layout::{component::Component, page::PageUnit},
};

/// Pages of a document split by role.
///
/// Covers and content hold every input page exactly once. Header and footer
/// entries hold one representative component each and point at the content
/// page it was taken from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutPartition {
    pub begin_cover: Vec<PageUnit>,
    pub header: Vec<PageUnit>,
    pub content: Vec<PageUnit>,
    pub footer: Vec<PageUnit>,
    pub end_cover: Vec<PageUnit>,
}

/// Splits pages into covers, running header/footer and content.
#[derive(Debug, Clone, Copy)]
pub struct LayoutPartitioner {
    pub classifier: RepetitionClassifier,
    pub start_page_offset: usize,
    pub end_page_offset: usize,
    pub begin_num_result_content: usize,
    pub end_num_result_content: usize,
}

impl LayoutPartitioner {
    pub fn partition(&self, mut pages: Vec<PageUnit>) -> LayoutPartition {
        let total = pages.len();
        let begin = self.start_page_offset.min(total);
        let end = self.end_page_offset.min(total - begin);

        let end_cover = pages.split_off(total - end);
        let window = pages.split_off(begin);
        let begin_cover = pages;

        if window.len() <= 1 {
            return LayoutPartition {
                begin_cover,
                content: window,
                end_cover,
                ..Default::default()
            };
        }

        let (header, header_idx) = self.detect_headers(&window);
        let (footer, footer_rev_idx) = self.detect_footers(&window);
        info!(
            "Detected {} running header and {} running footer positions over {} pages",
            header.len(),
            footer.len(),
            window.len()
        );

        let content = window
            .into_iter()
            .map(|page| strip_positions(page, &header_idx, &footer_rev_idx))
            .collect();

        LayoutPartition {
            begin_cover,
            header,
            content,
            footer,
            end_cover,
        }
    }

    /// Scans leading positions, keeps the first page's component of every
    /// repeating one.
    fn detect_headers(&self, window: &[PageUnit]) -> (Vec<PageUnit>, BTreeSet<usize>) {
        let mut header = Vec::new();
        let mut used = BTreeSet::new();

        for idx in 0..self.begin_num_result_content {
            let group: Vec<(u32, &Component)> = window
                .iter()
                .filter(|p| in_header_zone(p.components.len(), idx))
                .map(|p| (p.page_number, &p.components[idx]))
                .collect();

            if self.repeats(&group) {
                debug!("Component position {} is a running header", idx);
                let (page_number, component) = group[0];
                header.push(PageUnit::new(page_number, vec![component.clone()]));
                used.insert(idx);
            }
        }

        (header, used)
    }

    /// Scans trailing positions, keeps the last page's component of every
    /// repeating one. Positions are counted from the end, 1 is the last.
    fn detect_footers(&self, window: &[PageUnit]) -> (Vec<PageUnit>, BTreeSet<usize>) {
        let mut footer = Vec::new();
        let mut used = BTreeSet::new();

        for rev_idx in 1..=self.end_num_result_content {
            let group: Vec<(u32, &Component)> = window
                .iter()
                .filter(|p| in_footer_zone(p.components.len(), rev_idx))
                .map(|p| (p.page_number, &p.components[p.components.len() - rev_idx]))
                .collect();

            if self.repeats(&group) {
                debug!("Component position -{} is a running footer", rev_idx);
                if let Some(&(page_number, component)) = group.last() {
                    footer.push(PageUnit::new(page_number, vec![component.clone()]));
                }
                used.insert(rev_idx);
            }
        }

        (footer, used)
    }

    fn repeats(&self, group: &[(u32, &Component)]) -> bool {
        if group.len() < 2 {
            return false;
        }
        let texts: Vec<String> = group.iter().map(|(_, c)| c.comparison_text()).collect();
        self.classifier.is_repeating(&texts)
    }
}

/// Header positions live in the top half of a page (the middle component of
/// an odd page included), footer positions in the rest, so no component is
/// claimed twice.
fn in_header_zone(len: usize, idx: usize) -> bool {
    2 * idx < len
}

fn in_footer_zone(len: usize, rev_idx: usize) -> bool {
    rev_idx >= 1 && rev_idx <= len && 2 * (len - rev_idx) >= len
}

fn strip_positions(
    page: PageUnit,
    header_idx: &BTreeSet<usize>,
    footer_rev_idx: &BTreeSet<usize>,
) -> PageUnit {
    let len = page.components.len();
    let components = page
        .components
        .into_iter()
        .enumerate()
        .filter(|(i, _)| {
            let header = in_header_zone(len, *i) && header_idx.contains(i);
            let footer = in_footer_zone(len, len - i) && footer_rev_idx.contains(&(len - i));
            !header && !footer
        })
        .map(|(_, c)| c)
        .collect();
    PageUnit::new(page.page_number, components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::{bbox::Bbox, labels::Category},
        layout::element::Detection,
    };

    fn component(text: &str) -> Component {
        Component::new(vec![Detection::new(
            Bbox::from_corners(0.0, 0.0, 10.0, 10.0),
            Category::Text,
            text,
        )])
    }

    fn page(page_number: u32, texts: &[&str]) -> PageUnit {
        PageUnit::new(page_number, texts.iter().map(|t| component(t)).collect())
    }

    fn partitioner(start: usize, end: usize) -> LayoutPartitioner {
        LayoutPartitioner {
            classifier: RepetitionClassifier::new(0.1, 0.8),
            start_page_offset: start,
            end_page_offset: end,
            begin_num_result_content: 2,
            end_num_result_content: 2,
        }
    }

    fn texts(page: &PageUnit) -> Vec<&str> {
        page.components.iter().map(Component::text).collect()
    }

    fn document() -> Vec<PageUnit> {
        vec![
            page(1, &["Annual Report 2024"]),
            page(2, &["ACME Corp", "Revenue grew strongly", "Confidential draft"]),
            page(3, &["ACME Corp", "Costs were flat this year", "Confidential draft"]),
            page(4, &["ACME Corp", "Outlook remains cautious", "Confidential draft"]),
            page(5, &["Back cover"]),
        ]
    }

    #[test]
    fn test_partition_headers_footers_and_covers() {
        let partition = partitioner(1, 1).partition(document());

        assert_eq!(partition.begin_cover.len(), 1);
        assert_eq!(partition.begin_cover[0].page_number, 1);
        assert_eq!(partition.end_cover.len(), 1);
        assert_eq!(partition.end_cover[0].page_number, 5);

        assert_eq!(partition.header.len(), 1);
        assert_eq!(partition.header[0].page_number, 2);
        assert_eq!(texts(&partition.header[0]), vec!["ACME Corp"]);

        assert_eq!(partition.footer.len(), 1);
        assert_eq!(partition.footer[0].page_number, 4);
        assert_eq!(texts(&partition.footer[0]), vec!["Confidential draft"]);

        let content: Vec<Vec<&str>> = partition.content.iter().map(texts).collect();
        assert_eq!(
            content,
            vec![
                vec!["Revenue grew strongly"],
                vec!["Costs were flat this year"],
                vec!["Outlook remains cautious"],
            ]
        );
    }

    #[test]
    fn test_partition_completeness() {
        for (start, end) in [(0, 0), (1, 0), (0, 2), (2, 2), (4, 4), (9, 9)] {
            let partition = partitioner(start, end).partition(document());
            let mut numbers: Vec<u32> = partition
                .begin_cover
                .iter()
                .chain(&partition.content)
                .chain(&partition.end_cover)
                .map(|p| p.page_number)
                .collect();
            numbers.sort_unstable();
            assert_eq!(numbers, vec![1, 2, 3, 4, 5]);

            let content: Vec<u32> = partition.content.iter().map(|p| p.page_number).collect();
            for entry in partition.header.iter().chain(&partition.footer) {
                assert!(content.contains(&entry.page_number));
            }
        }
    }

    #[test]
    fn test_partition_single_page_window_is_content() {
        let partition = partitioner(2, 2).partition(document());
        assert!(partition.header.is_empty());
        assert!(partition.footer.is_empty());
        assert_eq!(partition.content.len(), 1);
        assert_eq!(partition.content[0].components.len(), 3);
    }

    #[test]
    fn test_partition_footer_stripped_from_uneven_pages() {
        let pages = vec![
            page(1, &["Intro", "Body one", "Page footer text"]),
            page(2, &["Only body", "Page footer text"]),
            page(3, &["Chapter", "Results table", "More body", "Page footer text"]),
        ];
        let partition = partitioner(0, 0).partition(pages);
        assert_eq!(partition.footer.len(), 1);
        assert_eq!(partition.footer[0].page_number, 3);
        let content: Vec<Vec<&str>> = partition.content.iter().map(texts).collect();
        assert_eq!(
            content,
            vec![
                vec!["Intro", "Body one"],
                vec!["Only body"],
                vec!["Chapter", "Results table", "More body"],
            ]
        );
    }

    #[test]
    fn test_partition_short_pages_claim_each_component_once() {
        let pages = vec![
            page(2, &["Confidential"]),
            page(3, &["Body text here", "Confidential"]),
            page(4, &["Other body words", "Confidential"]),
        ];
        let partition = partitioner(0, 0).partition(pages);
        assert!(partition.header.is_empty());
        assert_eq!(partition.footer.len(), 1);
        assert_eq!(partition.footer[0].page_number, 4);

        let content: Vec<Vec<&str>> = partition.content.iter().map(texts).collect();
        assert_eq!(
            content,
            vec![
                vec!["Confidential"],
                vec!["Body text here"],
                vec!["Other body words"],
            ]
        );
    }

    #[test]
    fn test_partition_repeated_logo_is_header() {
        let logo = || {
            Component::new(vec![Detection::new(
                Bbox::from_corners(0.0, 0.0, 40.0, 40.0),
                Category::Picture,
                "",
            )])
        };
        let pages = vec![
            PageUnit::new(1, vec![logo(), component("Revenue grew strongly")]),
            PageUnit::new(2, vec![logo(), component("Costs were flat this year")]),
            PageUnit::new(3, vec![logo(), component("Outlook remains cautious")]),
        ];
        let partition = partitioner(0, 0).partition(pages);

        assert_eq!(partition.header.len(), 1);
        assert_eq!(partition.header[0].page_number, 1);
        assert!(partition.header[0].components[0].detections()[0].category.is_picture());
        assert!(partition.footer.is_empty());

        let content: Vec<Vec<&str>> = partition.content.iter().map(texts).collect();
        assert_eq!(
            content,
            vec![
                vec!["Revenue grew strongly"],
                vec!["Costs were flat this year"],
                vec!["Outlook remains cautious"],
            ]
        );
    }

    #[test]
    fn test_partition_empty() {
        let partition = partitioner(1, 1).partition(Vec::new());
        assert_eq!(partition, LayoutPartition::default());
    }
}
