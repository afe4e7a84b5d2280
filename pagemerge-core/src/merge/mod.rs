pub mod chain;
pub mod config;
pub mod partition;
pub mod section;
pub mod table;

use serde::{Deserialize, Serialize};
use tracing::*;

use crate::{
    analysis::cluster::cluster_detections,
    consts::SECTION_SEPARATOR,
    error::MergeError,
    layout::page::{PageDetections, PageUnit},
    merge::{
        chain::merge_table_chains,
        config::{MergeAlgorithm, MergeConfig},
        partition::LayoutPartitioner,
        section::MergedDocument,
    },
    render::Renderer,
};

/// Rendered markdown of a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMarkdown {
    pub page_number: u32,
    pub markdown: String,
}

/// Merges the per-page detections of one document into a single text.
///
/// Every call is independent: the merger keeps no state between documents
/// and may be shared across threads when its renderer can.
pub struct TableAwareMerger<'a, R: Renderer + ?Sized> {
    pub config: MergeConfig,
    renderer: &'a R,
}

impl<'a, R: Renderer + ?Sized> TableAwareMerger<'a, R> {
    pub fn new(config: MergeConfig, renderer: &'a R) -> Self {
        Self { config, renderer }
    }

    /// Validates the config, caps the page count and prunes detections.
    pub fn prepare(&self, mut pages: Vec<PageDetections>) -> Result<Vec<PageDetections>, MergeError> {
        let filter = self.config.validate()?;

        if let Some(max_pages) = self.config.max_pages {
            if pages.len() > max_pages {
                debug!("Keeping the first {} of {} pages", max_pages, pages.len());
                pages.truncate(max_pages);
            }
        }

        Ok(pages
            .into_iter()
            .map(|page| PageDetections::new(page.page_number, filter.apply(page.detections)))
            .collect())
    }

    /// Renders every page on its own, without any merging.
    pub fn render_pages(&self, pages: Vec<PageDetections>) -> Result<Vec<PageMarkdown>, MergeError> {
        self.prepare(pages)?
            .into_iter()
            .map(|page| {
                let markdown = self.renderer.render(page.page_number, &page.detections)?;
                Ok(PageMarkdown {
                    page_number: page.page_number,
                    markdown,
                })
            })
            .collect()
    }

    /// Runs pruning, clustering, partitioning and table chaining, stopping
    /// short of rendering.
    pub fn merge_layout(&self, pages: Vec<PageDetections>) -> Result<MergedDocument, MergeError> {
        let units: Vec<PageUnit> = self
            .prepare(pages)?
            .into_iter()
            .map(|page| {
                PageUnit::new(
                    page.page_number,
                    cluster_detections(page.detections, self.config.bbox_overlap_threshold),
                )
            })
            .collect();

        let partitioner = LayoutPartitioner {
            classifier: self.config.classifier(),
            start_page_offset: self.config.start_page_offset,
            end_page_offset: self.config.end_page_offset,
            begin_num_result_content: self.config.begin_num_result_content,
            end_num_result_content: self.config.end_num_result_content,
        };
        let partition = partitioner.partition(units);

        let content = merge_table_chains(partition.content);
        Ok(MergedDocument {
            begin_cover: partition.begin_cover,
            header: partition.header,
            content,
            footer: partition.footer,
            end_cover: partition.end_cover,
        })
    }

    /// Merges a document with the configured algorithm.
    ///
    /// # Arguments
    /// * `pages` - Detections per page, in document order
    ///
    /// # Example
    /// ```
    /// use pagemerge_core::analysis::bbox::Bbox;
    /// use pagemerge_core::{
    ///     Category, Detection, MergeConfig, MergeError, PageDetections, Renderer, TableAwareMerger,
    /// };
    ///
    /// struct Plain;
    ///
    /// impl Renderer for Plain {
    ///     fn render(&self, _page: u32, detections: &[Detection]) -> Result<String, MergeError> {
    ///         Ok(detections.iter().map(|d| format!("{}\n\n", d.text)).collect())
    ///     }
    /// }
    ///
    /// let bbox = Bbox::from_corners(0.0, 0.0, 100.0, 20.0);
    /// let page = PageDetections::new(1, vec![Detection::new(bbox, Category::Text, "Hello")]);
    /// let merger = TableAwareMerger::new(MergeConfig::default(), &Plain);
    /// assert_eq!(merger.merge(vec![page])?, "Hello\n\n");
    /// # Ok::<(), MergeError>(())
    /// ```
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub fn merge(&self, pages: Vec<PageDetections>) -> Result<String, MergeError> {
        if pages.is_empty() {
            return Ok(String::new());
        }

        if self.config.merge_algorithm == MergeAlgorithm::Simple {
            let rendered = self.render_pages(pages)?;
            info!("Simple merge of {} pages", rendered.len());
            return Ok(rendered
                .into_iter()
                .map(|page| page.markdown)
                .collect::<Vec<_>>()
                .join(SECTION_SEPARATOR));
        }

        let document = self.merge_layout(pages)?;
        info!(
            "Merged layout: {} cover, {} header, {} content, {} footer, {} end cover units",
            document.begin_cover.len(),
            document.header.len(),
            document.content.len(),
            document.footer.len(),
            document.end_cover.len()
        );

        document.render(self.renderer)
    }
}
