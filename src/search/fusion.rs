//! Reciprocal Rank Fusion (RRF) for combining ranked result lists, plus
//! the position-aware reranker blend and min-max normalization used by
//! the full query pipeline.

use crate::search::SearchResult;
use std::collections::HashMap;

/// Default RRF constant, balancing the contribution of high vs. low ranks.
pub const DEFAULT_K: f64 = 60.0;

/// Combines multiple ranked result lists into one, scoring each document
/// by `sum(1 / (k + rank + 1))` across every list it appears in.
///
/// When `top_rank_bonus` is set, documents that rank first in any input
/// list get a `+0.05` bonus, and documents that rank in the top 3 (but
/// not first) get `+0.02`. Results are sorted by descending fused score,
/// deduplicated by `file_path`.
#[must_use]
pub fn reciprocal_rank_fusion(
    result_lists: &[Vec<SearchResult>],
    k: f64,
    top_rank_bonus: bool,
) -> Vec<SearchResult> {
    if result_lists.is_empty() {
        return Vec::new();
    }

    let mut scores: HashMap<String, f64> = HashMap::new();
    let mut docs: HashMap<String, SearchResult> = HashMap::new();
    let mut best_ranks: HashMap<String, usize> = HashMap::new();

    for results in result_lists {
        for (rank, doc) in results.iter().enumerate() {
            let id = doc.file_path.clone();
            if id.is_empty() {
                continue;
            }

            docs.entry(id.clone()).or_insert_with(|| doc.clone());
            let best = best_ranks.entry(id.clone()).or_insert(rank);
            if rank < *best {
                *best = rank;
            }

            #[allow(clippy::cast_precision_loss)]
            let contribution = 1.0 / (k + rank as f64 + 1.0);
            *scores.entry(id).or_insert(0.0) += contribution;
        }
    }

    if top_rank_bonus {
        for (id, best_rank) in &best_ranks {
            let Some(score) = scores.get_mut(id) else {
                continue;
            };
            if *best_rank == 0 {
                *score += 0.05;
            } else if *best_rank <= 2 {
                *score += 0.02;
            }
        }
    }

    let mut ordered: Vec<(String, f64)> = scores.into_iter().collect();
    ordered.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    ordered
        .into_iter()
        .filter_map(|(id, score)| {
            docs.remove(&id).map(|mut doc| {
                doc.score = score;
                doc
            })
        })
        .collect()
}

/// Blends RRF scores with reranker scores, weighting the reranker more
/// heavily for documents further down the fused list: 75/25 for the top
/// 3, 60/40 for ranks 4-10, 40/60 beyond that. Re-sorts by the blended
/// score.
#[must_use]
pub fn position_aware_blend(
    rrf_results: Vec<SearchResult>,
    rerank_scores: &HashMap<String, f64>,
) -> Vec<SearchResult> {
    let mut blended: Vec<SearchResult> = rrf_results
        .into_iter()
        .enumerate()
        .map(|(i, mut doc)| {
            let rrf_score = doc.score;
            let rerank_score = rerank_scores.get(&doc.file_path).copied().unwrap_or(0.0);

            let rrf_weight = if i < 3 {
                0.75
            } else if i < 10 {
                0.60
            } else {
                0.40
            };
            let rerank_weight = 1.0 - rrf_weight;

            doc.score = rrf_weight * rrf_score + rerank_weight * rerank_score;
            doc
        })
        .collect();

    blended.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    blended
}

/// Min-max normalizes `results`' scores to `[0, 1]`. If every score is
/// equal, every result is normalized to `1.0`.
pub fn normalize_scores(results: &mut [SearchResult]) {
    if results.is_empty() {
        return;
    }
    let min = results.iter().map(|r| r.score).fold(f64::INFINITY, f64::min);
    let max = results.iter().map(|r| r.score).fold(f64::NEG_INFINITY, f64::max);

    if (max - min).abs() < f64::EPSILON {
        for r in results.iter_mut() {
            r.score = 1.0;
        }
        return;
    }

    for r in results.iter_mut() {
        r.score = (r.score - min) / (max - min);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::Vault;

    fn result(file_path: &str, score: f64) -> SearchResult {
        SearchResult {
            score,
            file_path: file_path.to_string(),
            title: file_path.to_string(),
            excerpt: String::new(),
            date: None,
            people: vec![],
            category: String::new(),
            vault: Vault::Work,
        }
    }

    #[test]
    fn fusion_ranks_documents_appearing_in_both_lists_highest() {
        let list_a = vec![result("a", 0.0), result("b", 0.0), result("c", 0.0)];
        let list_b = vec![result("b", 0.0), result("a", 0.0)];
        let fused = reciprocal_rank_fusion(&[list_a, list_b], DEFAULT_K, true);
        assert_eq!(fused[0].file_path, "a");
    }

    #[test]
    fn fusion_of_empty_input_is_empty() {
        let fused: Vec<SearchResult> = reciprocal_rank_fusion(&[], DEFAULT_K, true);
        assert!(fused.is_empty());
    }

    #[test]
    fn top_rank_bonus_favors_first_place_finisher() {
        let list_a = vec![result("winner", 0.0), result("runner_up", 0.0)];
        let list_b = vec![result("runner_up", 0.0), result("winner", 0.0)];
        // "winner" is #1 in list_a, "runner_up" is #1 in list_b: tied RRF sums,
        // both get the bonus, so the tie is preserved by stable-ish ordering.
        let fused = reciprocal_rank_fusion(&[list_a, list_b], DEFAULT_K, true);
        assert_eq!(fused.len(), 2);
    }

    #[test]
    fn top_rank_bonus_disabled_leaves_pure_rrf_sums() {
        let list_a = vec![result("a", 0.0), result("b", 0.0)];
        let list_b = vec![result("b", 0.0), result("a", 0.0)];
        let with_bonus = reciprocal_rank_fusion(&[list_a.clone(), list_b.clone()], DEFAULT_K, true);
        let without_bonus = reciprocal_rank_fusion(&[list_a, list_b], DEFAULT_K, false);
        let a_with = with_bonus.iter().find(|r| r.file_path == "a").map(|r| r.score).unwrap_or_default();
        let a_without = without_bonus.iter().find(|r| r.file_path == "a").map(|r| r.score).unwrap_or_default();
        assert!(a_with > a_without);
    }

    #[test]
    fn position_aware_blend_reweights_by_rank() {
        let rrf = vec![result("doc1", 1.0), result("doc2", 0.5)];
        let mut rerank_scores = HashMap::new();
        rerank_scores.insert("doc1".to_string(), 0.0);
        rerank_scores.insert("doc2".to_string(), 1.0);

        let blended = position_aware_blend(rrf, &rerank_scores);
        // doc1: 0.75*1.0 + 0.25*0.0 = 0.75
        // doc2: 0.75*0.5 + 0.25*1.0 = 0.625
        assert_eq!(blended[0].file_path, "doc1");
    }

    #[test]
    fn normalize_scores_maps_to_unit_range() {
        let mut results = vec![result("a", 10.0), result("b", 0.0)];
        normalize_scores(&mut results);
        assert!((results[0].score - 1.0).abs() < 1e-9);
        assert!((results[1].score - 0.0).abs() < 1e-9);
    }

    #[test]
    fn normalize_scores_of_equal_scores_is_all_ones() {
        let mut results = vec![result("a", 5.0), result("b", 5.0)];
        normalize_scores(&mut results);
        assert!(results.iter().all(|r| (r.score - 1.0).abs() < 1e-9));
    }
}
