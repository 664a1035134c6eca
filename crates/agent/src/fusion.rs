//! Reciprocal-rank fusion over ranked passage lists.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use troubleshooter_knowledge::RetrievedPassage;

/// A passage after fusion, with its accumulated score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusedPassage {
    pub text: String,
    pub locator: String,
    pub score: f64,
    /// Best (lowest) zero-indexed rank the passage reached in any list
    pub best_rank: usize,
}

/// Fuse ranked lists into one ranking.
///
/// Each passage scores `sum(1 / (rank + k))` over the lists it appears in,
/// with `rank` zero-indexed. Passages with identical text are one passage;
/// a repeat inside the same list only counts at its best position.
///
/// Ordering is descending score, then best rank, then text. None of these
/// depend on list order, so fusing `[a, b]` and `[b, a]` gives the same
/// ranking.
///
/// `k` below 1 is raised to 1 so rank-0 scores stay finite.
pub fn reciprocal_rank_fusion(lists: &[Vec<RetrievedPassage>], k: u32) -> Vec<FusedPassage> {
    let k = f64::from(k.max(1));
    let mut fused: HashMap<&str, FusedPassage> = HashMap::new();

    for list in lists {
        let mut seen_in_list = std::collections::HashSet::new();
        for (rank, passage) in list.iter().enumerate() {
            if !seen_in_list.insert(passage.text.as_str()) {
                continue;
            }
            let contribution = 1.0 / (rank as f64 + k);
            let entry = fused
                .entry(passage.text.as_str())
                .or_insert_with(|| FusedPassage {
                    text: passage.text.clone(),
                    locator: passage.locator.clone(),
                    score: 0.0,
                    best_rank: rank,
                });
            entry.score += contribution;
            if rank < entry.best_rank
                || (rank == entry.best_rank && passage.locator < entry.locator)
            {
                entry.best_rank = rank;
                entry.locator = passage.locator.clone();
            }
        }
    }

    let mut ranking: Vec<FusedPassage> = fused.into_values().collect();
    ranking.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.best_rank.cmp(&b.best_rank))
            .then_with(|| a.text.cmp(&b.text))
    });
    ranking
}
