//! Result curation: thresholding and per-section diversity.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{Document, ScoredCandidate};

/// Curation tuning. Defaults are the production values.
#[derive(Debug, Clone, PartialEq)]
pub struct CurationParams {
    /// Fraction of the top score a candidate must reach.
    pub threshold_ratio: f64,
    /// Absolute score floor.
    pub min_threshold: f64,
    /// Leading results admitted regardless of section.
    pub diversity_head: usize,
    /// Maximum admitted results per url section (checked after the head).
    pub section_cap: usize,
    /// Hard cap on returned results.
    pub max_results: usize,
}

impl Default for CurationParams {
    fn default() -> Self {
        Self {
            threshold_ratio: 0.15,
            min_threshold: 30.0,
            diversity_head: 5,
            section_cap: 5,
            max_results: 25,
        }
    }
}

impl CurationParams {
    /// Score a candidate must reach given the best score in the set.
    pub fn threshold(&self, top_score: f64) -> f64 {
        (top_score * self.threshold_ratio).max(self.min_threshold)
    }
}

/// Sort, threshold, and diversify scored candidates.
///
/// Sorting is stable, so equal scores keep their candidate order.
pub fn curate<'a>(
    mut candidates: Vec<ScoredCandidate<'a>>,
    params: &CurationParams,
) -> Vec<ScoredCandidate<'a>> {
    candidates.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(Ordering::Equal)
    });

    let Some(top) = candidates.first().map(|c| c.final_score) else {
        return Vec::new();
    };
    let threshold = params.threshold(top);

    let mut admitted: Vec<ScoredCandidate<'a>> = Vec::new();
    let mut per_section: HashMap<&'a str, usize> = HashMap::new();

    for candidate in candidates {
        if admitted.len() >= params.max_results {
            break;
        }
        if candidate.final_score < threshold {
            // Sorted descending: nothing after this can pass.
            break;
        }

        let document: &'a Document = candidate.document;
        let section = document.section();
        let count = per_section.entry(section).or_insert(0);
        if admitted.len() < params.diversity_head || *count < params.section_cap {
            *count += 1;
            admitted.push(candidate);
        }
    }

    admitted
}
