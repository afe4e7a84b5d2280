use std::sync::LazyLock;

use derive_builder::Builder;
use plsfix::TextFixerConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::{
    analysis::{labels::Category, similarity::RepetitionClassifier},
    consts::*,
    error::{MergeError, PatternSnafu},
    layout::element::Detection,
};

/// Only undoes encoding damage: mojibake, terminal escapes, C1 and other
/// control characters. Quotes, entities, ligatures, widths, line breaks and
/// normalisation form are left exactly as recognized.
static TEXT_FIXER: LazyLock<TextFixerConfig> = LazyLock::new(|| TextFixerConfig {
    unescape_html: Some(false),
    fix_latin_ligatures: false,
    fix_character_width: false,
    uncurl_quotes: false,
    fix_line_breaks: false,
    normalization: None,
    ..TextFixerConfig::default()
});

/// How the pages of a document are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MergeAlgorithm {
    /// Every page rendered on its own, joined by a blank line.
    Simple,
    /// Clustering, header/footer suppression and table chaining.
    #[default]
    TableAware,
}

/// Tuning of a merge.
///
/// Deserializes from a partial JSON object, missing fields take their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default, deny_unknown_fields)]
#[builder(default, setter(into))]
pub struct MergeConfig {
    /// Minimum IoU for two detections of a page to join one component.
    pub bbox_overlap_threshold: f32,
    /// Maximum TF-IDF difference for a page to agree with the window.
    pub diff_word_freq_threshold: f64,
    /// Fraction of agreeing pages that makes a position repeating.
    pub diff_word_num_component_threshold: f64,
    /// Leading pages kept verbatim as the begin cover.
    pub start_page_offset: usize,
    /// Trailing pages kept verbatim as the end cover.
    pub end_page_offset: usize,
    /// Leading component positions checked for running headers.
    pub begin_num_result_content: usize,
    /// Trailing component positions checked for running footers.
    pub end_num_result_content: usize,
    /// Detections whose whole text matches one of these are dropped.
    pub removal_regex_patterns: Vec<String>,
    /// Detections of these categories are dropped.
    pub drop_categories: Vec<Category>,
    /// Repair mojibake and stray control characters in detection text.
    pub fix_text: bool,
    pub merge_algorithm: MergeAlgorithm,
    /// Only the first `max_pages` pages are merged, all of them when unset.
    pub max_pages: Option<usize>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            bbox_overlap_threshold: BBOX_OVERLAP_THRESHOLD,
            diff_word_freq_threshold: DIFF_WORD_FREQ_THRESHOLD,
            diff_word_num_component_threshold: DIFF_WORD_NUM_COMPONENT_THRESHOLD,
            start_page_offset: 0,
            end_page_offset: 0,
            begin_num_result_content: BEGIN_NUM_RESULT_CONTENT,
            end_num_result_content: END_NUM_RESULT_CONTENT,
            removal_regex_patterns: Vec::new(),
            drop_categories: Vec::new(),
            fix_text: true,
            merge_algorithm: MergeAlgorithm::TableAware,
            max_pages: None,
        }
    }
}

impl MergeConfig {
    /// Checks threshold ranges and compiles the removal patterns.
    pub fn validate(&self) -> Result<DetectionFilter, MergeError> {
        let threshold = self.bbox_overlap_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(MergeError::Config {
                field: "bbox_overlap_threshold".to_string(),
                message: format!("{threshold} is outside (0, 1]"),
            });
        }

        for (field, value) in [
            ("diff_word_freq_threshold", self.diff_word_freq_threshold),
            (
                "diff_word_num_component_threshold",
                self.diff_word_num_component_threshold,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(MergeError::Config {
                    field: field.to_string(),
                    message: format!("{value} is outside [0, 1]"),
                });
            }
        }

        if self.max_pages == Some(0) {
            return Err(MergeError::Config {
                field: "max_pages".to_string(),
                message: "must be at least 1 when set".to_string(),
            });
        }

        DetectionFilter::new(self)
    }

    pub fn classifier(&self) -> RepetitionClassifier {
        RepetitionClassifier::new(
            self.diff_word_freq_threshold,
            self.diff_word_num_component_threshold,
        )
    }
}

/// Pre-clustering pruning built from a [`MergeConfig`].
#[derive(Debug)]
pub struct DetectionFilter {
    patterns: Vec<Regex>,
    drop_categories: Vec<Category>,
    fix_text: bool,
}

impl DetectionFilter {
    fn new(config: &MergeConfig) -> Result<Self, MergeError> {
        let patterns = config
            .removal_regex_patterns
            .iter()
            .map(|pattern| {
                // whole-text match only
                Regex::new(&format!("^(?:{pattern})$")).context(PatternSnafu {
                    pattern: pattern.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            patterns,
            drop_categories: config.drop_categories.clone(),
            fix_text: config.fix_text,
        })
    }

    /// Cleans the text of every detection and drops the unwanted ones.
    pub fn apply(&self, detections: Vec<Detection>) -> Vec<Detection> {
        detections
            .into_iter()
            .filter(|d| !self.drop_categories.contains(&d.category))
            .map(|mut d| {
                if self.fix_text && !d.text.is_empty() {
                    d.text = plsfix::fix_text(&d.text, Some(&*TEXT_FIXER));
                }
                d
            })
            .filter(|d| d.category.is_picture() || !self.matches(d.text.trim()))
            .collect()
    }

    fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
    }
}
