use crate::core::models::structure::Structure;
use serde::Serialize;

/// Scores of one evaluated template pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub core_template: String,
    pub partner_template: String,
    /// Homology hits the two monomer models were built on.
    pub core_hit: String,
    pub partner_hit: String,
    pub biomolecule: u32,
    pub homology_score: f64,
    pub core_tmscore: f64,
    pub partner_tmscore: f64,
    pub tmscore: f64,
    pub energy: f64,
    pub clashes: f64,
    pub spring_score: f64,
    pub accepted: bool,
}

/// The coordinates retained for the best candidate.
#[derive(Debug, Clone)]
pub struct ComplexModel {
    pub core: Structure,
    pub partner: Structure,
    /// The template assembly the subunits were superposed onto.
    pub template: Structure,
}

/// Running best of the candidate search.
#[derive(Debug)]
pub struct SearchState {
    max_clashes: f64,
    best_score: f64,
    best: Option<(ScoredCandidate, ComplexModel)>,
    evaluated: Vec<ScoredCandidate>,
}

impl SearchState {
    pub fn new(max_clashes: f64) -> Self {
        Self {
            max_clashes,
            best_score: f64::NEG_INFINITY,
            best: None,
            evaluated: Vec::new(),
        }
    }

    /// Whether a candidate with these scores would replace the current best.
    pub fn improves(&self, spring_score: f64, clashes: f64) -> bool {
        spring_score > self.best_score && clashes <= self.max_clashes
    }

    /// Records an evaluated candidate, keeping its model if it becomes the new best.
    ///
    /// The model is only built for accepted candidates.
    pub fn offer(
        &mut self,
        mut candidate: ScoredCandidate,
        model: impl FnOnce() -> ComplexModel,
    ) -> bool {
        candidate.accepted = self.improves(candidate.spring_score, candidate.clashes);
        if candidate.accepted {
            self.best_score = candidate.spring_score;
            self.best = Some((candidate.clone(), model()));
        }
        let accepted = candidate.accepted;
        self.evaluated.push(candidate);
        accepted
    }

    pub fn best(&self) -> Option<&(ScoredCandidate, ComplexModel)> {
        self.best.as_ref()
    }

    pub fn evaluated(&self) -> &[ScoredCandidate] {
        &self.evaluated
    }

    pub fn into_parts(self) -> (Option<(ScoredCandidate, ComplexModel)>, Vec<ScoredCandidate>) {
        (self.best, self.evaluated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, spring_score: f64, clashes: f64) -> ScoredCandidate {
        ScoredCandidate {
            core_template: name.to_string(),
            partner_template: name.to_string(),
            core_hit: "1abc_A".to_string(),
            partner_hit: "1abc_B".to_string(),
            biomolecule: 0,
            homology_score: 20.0,
            core_tmscore: spring_score,
            partner_tmscore: spring_score,
            tmscore: spring_score,
            energy: 0.0,
            clashes,
            spring_score,
            accepted: false,
        }
    }

    fn empty_model() -> ComplexModel {
        ComplexModel {
            core: Structure::new(),
            partner: Structure::new(),
            template: Structure::new(),
        }
    }

    #[test]
    fn only_strict_improvements_are_accepted() {
        let mut state = SearchState::new(0.1);
        assert!(state.offer(candidate("first", 0.5, 0.0), empty_model));
        assert!(!state.offer(candidate("tie", 0.5, 0.0), empty_model));
        assert!(state.offer(candidate("better", 0.7, 0.0), empty_model));
        assert!(!state.offer(candidate("worse", 0.6, 0.0), empty_model));

        assert_eq!(state.best().unwrap().0.core_template, "better");
        let flags: Vec<bool> = state.evaluated().iter().map(|c| c.accepted).collect();
        assert_eq!(flags, vec![true, false, true, false]);
    }

    #[test]
    fn clash_threshold_is_inclusive() {
        let mut state = SearchState::new(0.1);
        assert!(!state.offer(candidate("clashing", 0.9, 0.2), empty_model));
        assert!(state.offer(candidate("limit", 0.3, 0.1), empty_model));
        assert_eq!(state.best().unwrap().0.core_template, "limit");
    }

    #[test]
    fn negative_scores_can_still_win() {
        let mut state = SearchState::new(0.1);
        assert!(state.offer(candidate("negative", -4.0, 0.0), empty_model));
    }

    #[test]
    fn rejected_candidates_never_build_a_model() {
        let mut state = SearchState::new(0.0);
        let accepted = state.offer(candidate("clashing", 1.0, 0.5), || {
            panic!("model built for a rejected candidate")
        });
        assert!(!accepted);
        let (best, evaluated) = state.into_parts();
        assert!(best.is_none());
        assert_eq!(evaluated.len(), 1);
    }
}
