use std::{
    collections::HashMap,
    io::Cursor,
    sync::{
        LazyLock,
        atomic::{AtomicUsize, Ordering},
    },
};

use bytes::Bytes;
use glam::Vec2;
use image::{DynamicImage, ImageFormat};
use regex::Regex;
use snafu::ResultExt;
use tracing::*;

use crate::{
    analysis::labels::Category,
    error::{ImageEncodeSnafu, MergeError},
    layout::element::Detection,
    render::{AssetStore, Renderer},
};

static HEADING_MARKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#+\s*").unwrap());
static FORMULA_DELIMITERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\${1,2}|\${1,2}$").unwrap());

/// Markdown for recognizer detections.
///
/// Pictures are cropped out of the page image, uploaded through the asset
/// store and linked. Page footers are left out.
pub struct MarkdownRenderer<S> {
    store: S,
    filename: String,
    images: HashMap<u32, DynamicImage>,
    /// Maps recognizer coordinates onto the page image.
    bbox_scale: Vec2,
    picture_seq: AtomicUsize,
}

impl<S: AssetStore> MarkdownRenderer<S> {
    pub fn new(store: S, filename: impl Into<String>) -> Self {
        Self {
            store,
            filename: filename.into(),
            images: HashMap::new(),
            bbox_scale: Vec2::ONE,
            picture_seq: AtomicUsize::new(0),
        }
    }

    pub fn with_page_image(mut self, page_number: u32, image: DynamicImage) -> Self {
        self.images.insert(page_number, image);
        self
    }

    pub fn with_bbox_scale(mut self, bbox_scale: Vec2) -> Self {
        self.bbox_scale = bbox_scale;
        self
    }

    fn picture(&self, page_number: u32, detection: &Detection) -> Result<Option<String>, MergeError> {
        let Some(image) = self.images.get(&page_number) else {
            warn!("No image for page {}, skipping picture", page_number);
            return Ok(None);
        };

        let bbox = detection.bbox.scale(self.bbox_scale).clamp(
            Vec2::ZERO,
            Vec2::new(image.width() as f32, image.height() as f32),
        );
        let (width, height) = (bbox.width() as u32, bbox.height() as u32);
        if bbox.is_degenerate() || width == 0 || height == 0 {
            warn!("Empty picture crop on page {}, skipping", page_number);
            return Ok(None);
        }

        let cropped = image.crop_imm(bbox.min.x as u32, bbox.min.y as u32, width, height);
        let seq = self.picture_seq.fetch_add(1, Ordering::Relaxed);
        let object_name = format!("{}_{}_{}.png", self.filename, page_number, seq);

        let mut buf = Vec::new();
        cropped
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .context(ImageEncodeSnafu {
                object_name: object_name.clone(),
            })?;

        let url = self.store.upload(&object_name, Bytes::from(buf))?;
        debug!("Uploaded picture {} from page {}", object_name, page_number);
        Ok(Some(format!("![{}]({})", self.filename, url)))
    }
}

impl<S: AssetStore> Renderer for MarkdownRenderer<S> {
    fn render(&self, page_number: u32, detections: &[Detection]) -> Result<String, MergeError> {
        let mut markdown = String::new();

        for detection in detections {
            let text = detection.text.trim();
            let block = match detection.category {
                Category::ListItem | Category::Table | Category::Text => text.to_string(),
                Category::Caption => format!("*{text}*"),
                Category::Footnote => format!("_{text}_"),
                Category::Formula => format!("${}$", FORMULA_DELIMITERS.replace_all(text, "")),
                Category::PageFooter => continue,
                Category::Picture => match self.picture(page_number, detection)? {
                    Some(link) => link,
                    None => continue,
                },
                Category::PageHeader | Category::SectionHeader | Category::Title => {
                    let level = detection.category.heading_level().unwrap_or(1);
                    let title = HEADING_MARKS.replace(text, "");
                    format!("{} {}", "#".repeat(level), title.trim())
                }
            };
            markdown.push_str(&block);
            markdown.push_str("\n\n");
        }

        Ok(markdown)
    }
}
