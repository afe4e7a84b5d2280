use std::path::{Path, PathBuf};

use bytes::Bytes;
use snafu::ResultExt;
use uuid::Uuid;

use crate::{
    error::{IoSnafu, MergeError},
    layout::element::Detection,
};

pub mod markdown;

pub use markdown::MarkdownRenderer;

/// Turns the detections of one page (or part of a page) into output text.
pub trait Renderer {
    fn render(&self, page_number: u32, detections: &[Detection]) -> Result<String, MergeError>;
}

/// Stores binary assets (cropped pictures) and hands back a URL for them.
pub trait AssetStore {
    fn upload(&self, object_name: &str, data: Bytes) -> Result<String, MergeError>;
}

/// Writes assets into a local directory, the URL is the file path.
#[derive(Debug, Clone)]
pub struct DirAssetStore {
    dir: PathBuf,
}

impl DirAssetStore {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, MergeError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).context(IoSnafu {
            path: dir.display().to_string(),
        })?;
        Ok(Self { dir })
    }
}

impl AssetStore for DirAssetStore {
    fn upload(&self, object_name: &str, data: Bytes) -> Result<String, MergeError> {
        let path = self.dir.join(object_name);
        std::fs::write(&path, &data).context(IoSnafu {
            path: path.display().to_string(),
        })?;
        Ok(path.display().to_string())
    }
}

/// Unique name for a document's assets.
///
/// Without a name a random one is generated, otherwise the stem gets a short
/// random suffix so repeated uploads of the same file do not collide.
pub fn document_filename(name: Option<&str>) -> String {
    let id = Uuid::new_v4().simple().to_string();
    match name {
        None => format!("{id}.pdf"),
        Some(name) => {
            let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
            format!("{stem}{}.pdf", &id[..8])
        }
    }
}
