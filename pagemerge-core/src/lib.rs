pub mod analysis;
pub mod consts;
pub mod detect;
pub mod error;
pub mod layout;
pub mod merge;
pub mod render;

// Re-export commonly used types
pub use analysis::labels::Category;
pub use error::MergeError;
pub use layout::{element::Detection, page::PageDetections};
pub use merge::{
    PageMarkdown, TableAwareMerger,
    config::{MergeAlgorithm, MergeConfig},
};
pub use render::{AssetStore, DirAssetStore, MarkdownRenderer, Renderer};
