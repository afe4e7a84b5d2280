use std::{
    collections::{BTreeMap, HashMap},
    sync::LazyLock,
};

use regex::Regex;
use tracing::*;

/// Terms are runs of two or more word characters.
static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").unwrap());

fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// TF-IDF vectors for a small window of documents.
///
/// Weights are raw term counts times a smoothed idf,
/// `ln((1 + n) / (1 + df)) + 1`, and every row is L2 normalised.
#[derive(Debug)]
pub struct TfIdf {
    rows: Vec<Vec<f64>>,
    vocabulary: usize,
}

impl TfIdf {
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d.as_ref())).collect();

        let mut vocabulary: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in &tokenized {
            for token in tokens {
                let next = vocabulary.len();
                vocabulary.entry(token.as_str()).or_insert(next);
            }
        }

        let mut df = vec![0usize; vocabulary.len()];
        let mut counts: Vec<HashMap<usize, usize>> = Vec::with_capacity(tokenized.len());
        for tokens in &tokenized {
            let mut tf: HashMap<usize, usize> = HashMap::new();
            for token in tokens {
                *tf.entry(vocabulary[token.as_str()]).or_default() += 1;
            }
            for term in tf.keys() {
                df[*term] += 1;
            }
            counts.push(tf);
        }

        let n = documents.len() as f64;
        let idf: Vec<f64> = df
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let rows = counts
            .into_iter()
            .map(|tf| {
                let mut row = vec![0.0; idf.len()];
                for (term, count) in tf {
                    row[term] = count as f64 * idf[term];
                }
                let norm = l2_norm(&row);
                if norm > 0.0 {
                    row.iter_mut().for_each(|w| *w /= norm);
                }
                row
            })
            .collect();

        Self {
            rows,
            vocabulary: idf.len(),
        }
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Mean of all rows.
    pub fn centroid(&self) -> Vec<f64> {
        let mut centroid = vec![0.0; self.vocabulary];
        if self.rows.is_empty() {
            return centroid;
        }
        for row in &self.rows {
            for (c, w) in centroid.iter_mut().zip(row) {
                *c += w;
            }
        }
        let n = self.rows.len() as f64;
        centroid.iter_mut().for_each(|c| *c /= n);
        centroid
    }
}

fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Cosine similarity, 0.0 when either vector is all zeros.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let denom = l2_norm(a) * l2_norm(b);
    if denom == 0.0 {
        return 0.0;
    }
    a.iter().zip(b).map(|(x, y)| x * y).sum::<f64>() / denom
}

/// `1 - cosine(row, centroid)` for every document of the window.
pub fn word_freq_differences<S: AsRef<str>>(documents: &[S]) -> Vec<f64> {
    let tfidf = TfIdf::fit(documents);
    let centroid = tfidf.centroid();
    tfidf
        .rows()
        .iter()
        .map(|row| 1.0 - cosine_similarity(row, &centroid))
        .collect()
}

/// Decides whether one component position repeats across a page window.
#[derive(Debug, Clone, Copy)]
pub struct RepetitionClassifier {
    /// A page is similar when its difference to the centroid is at most this.
    pub diff_word_freq_threshold: f64,
    /// Fraction of similar pages required to call the position repeating.
    pub diff_word_num_component_threshold: f64,
}

impl RepetitionClassifier {
    pub fn new(diff_word_freq_threshold: f64, diff_word_num_component_threshold: f64) -> Self {
        Self {
            diff_word_freq_threshold,
            diff_word_num_component_threshold,
        }
    }

    /// `texts` holds the comparison text of the component at one index for
    /// every page of the window that has it. Blank texts are not comparable.
    ///
    /// # Example
    /// ```
    /// use pagemerge_core::analysis::similarity::RepetitionClassifier;
    ///
    /// let classifier = RepetitionClassifier::new(0.1, 0.8);
    /// assert!(classifier.is_repeating(&["ACME Corp", "ACME Corp", "ACME Corp"]));
    /// assert!(!classifier.is_repeating(&["Revenue grew", "Costs fell", "Outlook"]));
    /// // a single page is not evidence
    /// assert!(!classifier.is_repeating(&["ACME Corp"]));
    /// ```
    pub fn is_repeating<S: AsRef<str>>(&self, texts: &[S]) -> bool {
        let comparable: Vec<&str> = texts
            .iter()
            .map(|t| t.as_ref().trim())
            .filter(|t| !t.is_empty())
            .collect();

        if comparable.len() < 2 {
            return false;
        }

        // identical text repeats even when it has no terms at all
        if comparable.iter().all(|t| *t == comparable[0]) {
            return true;
        }

        let diffs = word_freq_differences(&comparable);
        let similar = diffs
            .iter()
            .filter(|&&d| d <= self.diff_word_freq_threshold)
            .count();
        let ratio = similar as f64 / comparable.len() as f64;
        debug!(
            "Repetition check: {}/{} pages similar (ratio {:.3})",
            similar,
            comparable.len(),
            ratio
        );

        ratio >= self.diff_word_num_component_threshold
    }
}
