use std::error::Error;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use glam::Vec2;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pagemerge_core::{
    DirAssetStore, MarkdownRenderer, MergeAlgorithm, MergeConfig, PageDetections,
    TableAwareMerger,
    render::document_filename,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputMode {
    /// One merged markdown document
    Merged,
    /// Markdown per page, as a JSON array
    Markdown,
    /// Pruned detections per page, as a JSON array
    Json,
}

#[derive(Parser)]
#[command(name = "pagemerge")]
#[command(about = "Merge per-page layout detections into one markdown document")]
struct Args {
    #[arg(help = "JSON file with an array of {page_number, ocr_results} objects")]
    input: PathBuf,

    #[arg(short, long, help = "JSON file with merge config overrides")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Directory of page images named {page_number}.png")]
    images_dir: Option<PathBuf>,

    #[arg(short, long, default_value = "assets", help = "Directory for cropped pictures")]
    assets_dir: PathBuf,

    #[arg(short, long, help = "Document name used for picture assets")]
    filename: Option<String>,

    #[arg(
        short,
        long,
        default_value = "1.0",
        help = "Factor mapping detection coordinates onto page image pixels"
    )]
    bbox_scale: f32,

    #[arg(short, long, value_enum, default_value = "merged", help = "Output mode")]
    mode: OutputMode,

    #[arg(long, value_enum, help = "Merge algorithm, overrides the config file")]
    algorithm: Option<MergeAlgorithm>,

    #[arg(long, help = "Only process the first N pages")]
    max_pages: Option<usize>,

    #[arg(short, long, help = "Write the result here instead of stdout")]
    output: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<MergeConfig> {
    let Some(path) = path else {
        return Ok(MergeConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading pages {}", args.input.display()))?;
    let pages: Vec<PageDetections> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing pages {}", args.input.display()))?;
    let mut config = load_config(args.config.as_deref())?;
    if let Some(algorithm) = args.algorithm {
        config.merge_algorithm = algorithm;
    }
    if args.max_pages.is_some() {
        config.max_pages = args.max_pages;
    }
    info!("Loaded {} pages from {}", pages.len(), args.input.display());

    let filename = document_filename(args.filename.as_deref());
    let store = DirAssetStore::new(&args.assets_dir)?;
    let mut renderer =
        MarkdownRenderer::new(store, filename).with_bbox_scale(Vec2::splat(args.bbox_scale));

    if let Some(dir) = &args.images_dir {
        for page in &pages {
            let path = dir.join(format!("{}.png", page.page_number));
            match image::open(&path) {
                Ok(image) => renderer = renderer.with_page_image(page.page_number, image),
                Err(e) => warn!("No page image at {}: {}", path.display(), e),
            }
        }
    }

    let merger = TableAwareMerger::new(config, &renderer);
    let result = match args.mode {
        OutputMode::Merged => merger.merge(pages)?,
        OutputMode::Markdown => serde_json::to_string_pretty(&merger.render_pages(pages)?)?,
        OutputMode::Json => serde_json::to_string_pretty(&merger.prepare(pages)?)?,
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &result)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote {} bytes to {}", result.len(), path.display());
        }
        None => print!("{result}"),
    }

    Ok(())
}
