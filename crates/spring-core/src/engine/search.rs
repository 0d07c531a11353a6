use crate::core::io::crossref::CrossReference;
use crate::core::io::hhr::TemplateHits;
use itertools::Itertools;
use tracing::{info, instrument};

/// A co-crystallized template pair evidencing an interaction between the two queries.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateCandidate {
    /// Template of the core chain, then of its partner.
    pub templates: [String; 2],
    /// The smaller of the two homology scores.
    pub score: f64,
}

/// Ranks cross-referenced template pairs supported by both hit lists.
///
/// Every hit of `a_hits` registered as a core in `cross_reference` contributes one
/// candidate per partner found in `b_hits`, scored by the weaker of the two hits.
/// Candidates are sorted by descending score, keeping hit-table order among equal
/// scores, and the scan stops at the first score below `min_score` or after
/// `max_tries` candidates.
#[instrument(skip_all, name = "template_pair_search")]
pub fn enumerate_candidates(
    a_hits: &TemplateHits,
    b_hits: &TemplateHits,
    cross_reference: &CrossReference,
    min_score: f64,
    max_tries: usize,
) -> Vec<TemplateCandidate> {
    let candidates: Vec<TemplateCandidate> = a_hits
        .iter()
        .filter_map(|(core, core_score)| {
            cross_reference
                .get(core)
                .map(|entry| (core_score, entry))
        })
        .flat_map(|(core_score, entry)| {
            entry.iter().filter_map(move |(partner, templates)| {
                b_hits.score(partner).map(|partner_score| TemplateCandidate {
                    templates: templates.clone(),
                    score: core_score.min(partner_score),
                })
            })
        })
        .sorted_by(|a, b| b.score.total_cmp(&a.score))
        .collect();

    info!(found = candidates.len(), "Found template pairs");

    candidates
        .into_iter()
        .take_while(|candidate| candidate.score >= min_score)
        .take(max_tries)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn cross(content: &str) -> CrossReference {
        CrossReference::read_from(&mut Cursor::new(content), false).unwrap()
    }

    fn hits(scores: &[(&str, f64)]) -> TemplateHits {
        TemplateHits::from_scores(scores.iter().copied(), 5)
    }

    #[test]
    fn single_supported_pair_is_yielded() {
        let candidates = enumerate_candidates(
            &hits(&[("A_1", 30.0)]),
            &hits(&[("B_2", 20.0)]),
            &cross("A_1 B_2 A_1 B_2\n"),
            10.0,
            5,
        );
        assert_eq!(
            candidates,
            vec![TemplateCandidate {
                templates: ["A_1".to_string(), "B_2".to_string()],
                score: 20.0,
            }]
        );
    }

    #[test]
    fn candidates_are_ranked_by_weaker_hit() {
        let candidates = enumerate_candidates(
            &hits(&[("1aaa_A", 15.0), ("2bbb_A", 50.0)]),
            &hits(&[("1aaa_B", 40.0), ("2bbb_B", 25.0), ("2bbb_C", 60.0)]),
            &cross("1aaa_A 1aaa_B\n2bbb_A 2bbb_B\n2bbb_A 2bbb_C\n"),
            0.0,
            10,
        );
        let scores: Vec<f64> = candidates.iter().map(|c| c.score).collect();
        assert_eq!(scores, vec![50.0, 25.0, 15.0]);
        assert_eq!(candidates[0].templates[1], "2bbb_C");
    }

    #[test]
    fn equal_scores_keep_hit_table_order() {
        let candidates = enumerate_candidates(
            &hits(&[("1aaa_A", 20.0), ("2bbb_A", 20.0)]),
            &hits(&[("1aaa_B", 20.0), ("2bbb_B", 20.0)]),
            &cross("2bbb_A 2bbb_B\n1aaa_A 1aaa_B\n"),
            0.0,
            10,
        );
        assert_eq!(candidates[0].templates[0], "1aaa_A");
        assert_eq!(candidates[1].templates[0], "2bbb_A");
    }

    #[test]
    fn cutoffs_apply_after_sorting() {
        let a = hits(&[("1aaa_A", 5.0), ("2bbb_A", 30.0), ("3ccc_A", 25.0), ("4ddd_A", 12.0)]);
        let b = hits(&[("1aaa_B", 50.0), ("2bbb_B", 50.0), ("3ccc_B", 50.0), ("4ddd_B", 50.0)]);
        let cross = cross("1aaa_A 1aaa_B\n2bbb_A 2bbb_B\n3ccc_A 3ccc_B\n4ddd_A 4ddd_B\n");

        let bounded = enumerate_candidates(&a, &b, &cross, 10.0, 2);
        let scores: Vec<f64> = bounded.iter().map(|c| c.score).collect();
        assert_eq!(scores, vec![30.0, 25.0]);

        let floored = enumerate_candidates(&a, &b, &cross, 10.0, 10);
        assert!(floored.iter().all(|c| c.score >= 10.0));
        assert_eq!(floored.len(), 3);
        assert!(floored.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn unsupported_partners_and_cores_are_ignored() {
        let candidates = enumerate_candidates(
            &hits(&[("1aaa_A", 30.0), ("9zzz_A", 30.0)]),
            &hits(&[("5eee_B", 30.0)]),
            &cross("1aaa_A 1aaa_B\n"),
            0.0,
            10,
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn zero_tries_yield_nothing() {
        let candidates = enumerate_candidates(
            &hits(&[("A_1", 30.0)]),
            &hits(&[("B_2", 20.0)]),
            &cross("A_1 B_2\n"),
            10.0,
            0,
        );
        assert!(candidates.is_empty());
    }
}
