/// Default IoU threshold above which two detections on a page are clustered
/// into one component.
///
/// The recognizer sometimes emits the same region twice (for example a table
/// and a text block covering the same cells). At 0.5 the boxes must share at
/// least half of their combined area before they are treated as one element:
/// - Lower values (0.2-0.4): merges neighbouring blocks that merely touch
/// - Higher values (0.7-0.9): only near-identical boxes are merged
pub const BBOX_OVERLAP_THRESHOLD: f32 = 0.5;

/// Default maximum TF-IDF difference (1 - cosine similarity to the window
/// centroid) for a page's component to count as "the same" as the others.
pub const DIFF_WORD_FREQ_THRESHOLD: f64 = 0.1;

/// Default fraction of pages in the window that must agree before a component
/// position is treated as a running header or footer.
pub const DIFF_WORD_NUM_COMPONENT_THRESHOLD: f64 = 0.8;

/// Number of leading component positions inspected for running headers.
pub const BEGIN_NUM_RESULT_CONTENT: usize = 5;

/// Number of trailing component positions inspected for running footers.
pub const END_NUM_RESULT_CONTENT: usize = 5;

/// Upper bound on concurrent detector calls.
///
/// The recognizer is usually a single GPU-backed model server, two in-flight
/// pages keep it busy without exhausting its memory.
pub const MAX_CONCURRENT_TASKS: usize = 2;

/// Env var overriding [`MAX_CONCURRENT_TASKS`] in the binary.
pub const MAX_CONCURRENT_TASKS_ENV_NAME: &str = "MAX_CONCURRENT_TASKS";

/// Token substituted for the text of `Picture` detections when comparing
/// components across pages, so a repeated logo compares equal while its
/// (empty) text does not drop the page from the window.
pub const PICTURE_PLACEHOLDER: &str = "__picture__";

/// Separator between rendered sections of the final document.
pub const SECTION_SEPARATOR: &str = "\n\n";
