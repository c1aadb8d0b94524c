//! Primer-dimer conflict detection.
//!
//! Any two primers under consideration together are screened for
//! 3'-complementarity; an interaction counts as a conflict when its
//! predicted melting temperature climbs into the pair's own annealing
//! range. Only primers actually selected into the scheme are screened
//! pairwise, which keeps the check quadratic in the scheme size rather
//! than the candidate pool size.

use rayon::prelude::*;
use tracing::debug;

use crate::config::DesignConfig;
use crate::thermo::ThermoModel;
use crate::types::PrimerCandidate;

/// A conflict between two screened primers, by index into the screened
/// slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimerEdge {
    pub first: usize,
    pub second: usize,
    /// Predicted dimer melting temperature (deg C)
    pub tm: f64,
}

/// Pairwise dimer screening with the configured competitiveness margin.
#[derive(Debug, Clone, Copy)]
pub struct DimerChecker<'a> {
    model: &'a ThermoModel,
    margin: f64,
}

impl<'a> DimerChecker<'a> {
    #[must_use]
    pub fn new(model: &'a ThermoModel, config: &DesignConfig) -> Self {
        Self {
            model,
            margin: config.dimer_tm_margin,
        }
    }

    /// Predicted dimer Tm when the interaction between two primers is
    /// competitive, `None` otherwise.
    ///
    /// Competitive means the dimer melts within `margin` deg C of the
    /// weakest permutation Tm of either primer, or above it.
    #[must_use]
    pub fn check_pair(&self, first: &PrimerCandidate, second: &PrimerCandidate) -> Option<f64> {
        let hit = self.model.dimer(&first.primary, &second.primary)?;
        let annealing_floor = first.tm.min.min(second.tm.min) - self.margin;
        (hit.tm >= annealing_floor).then_some(hit.tm)
    }

    /// Screen the given index pairs and return conflicts sorted by index
    /// pair.
    ///
    /// The pair checks run in parallel; sorting the edges afterwards keeps
    /// downstream tie-breaking independent of thread scheduling.
    #[must_use]
    pub fn conflict_edges(
        &self,
        primers: &[&PrimerCandidate],
        pairs: &[(usize, usize)],
    ) -> Vec<DimerEdge> {
        let mut edges: Vec<DimerEdge> = pairs
            .par_iter()
            .filter_map(|&(first, second)| {
                self.check_pair(primers[first], primers[second])
                    .map(|tm| DimerEdge { first, second, tm })
            })
            .collect();
        edges.sort_by(|a, b| (a.first, a.second).cmp(&(b.first, b.second)));
        debug!(
            screened = pairs.len(),
            conflicts = edges.len(),
            "dimer screening finished"
        );
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SaltConditions;
    use crate::iupac;
    use crate::types::PermutationStats;
    use bio::bio_types::strand::Strand;

    fn candidate(sequence: &[u8], strand: Strand, tm_min: f64) -> PrimerCandidate {
        PrimerCandidate {
            region: 0,
            start: 0,
            end: sequence.len(),
            strand,
            sequence: sequence.to_vec(),
            primary: sequence.to_vec(),
            permutations: vec![sequence.to_vec()],
            gc: PermutationStats { min: 0.5, mean: 0.5, max: 0.5 },
            tm: PermutationStats { min: tm_min, mean: tm_min + 1.0, max: tm_min + 2.0 },
            penalty: 1.0,
        }
    }

    fn checker_parts() -> (ThermoModel, DesignConfig) {
        let config = DesignConfig::default();
        let model = ThermoModel::new(&SaltConditions::default());
        (model, config)
    }

    #[test]
    fn test_fully_complementary_pair_conflicts() {
        let (model, config) = checker_parts();
        let checker = DimerChecker::new(&model, &config);
        let forward = candidate(b"acgttgcaacgttgcaacgt", Strand::Forward, 57.0);
        let complement = candidate(
            &iupac::reverse_complement(b"acgttgcaacgttgcaacgt"),
            Strand::Reverse,
            57.0,
        );
        let tm = checker.check_pair(&forward, &complement);
        assert!(tm.is_some());
        // a full-length duplex melts near the primer's own Tm
        assert!(tm.unwrap() > 40.0);
    }

    #[test]
    fn test_unrelated_pair_passes() {
        let (model, config) = checker_parts();
        let checker = DimerChecker::new(&model, &config);
        let first = candidate(b"aagaagaagaagaagaagaa", Strand::Forward, 57.0);
        let second = candidate(b"agaagaagaagaagaagaag", Strand::Reverse, 57.0);
        // complementary stretches between these never exceed a couple bases
        assert!(checker.check_pair(&first, &second).is_none());
    }

    #[test]
    fn test_margin_widens_the_net() {
        let model = ThermoModel::new(&SaltConditions::default());
        let strict = DesignConfig {
            dimer_tm_margin: 0.0,
            ..Default::default()
        };
        let loose = DesignConfig {
            dimer_tm_margin: 100.0,
            ..Default::default()
        };
        // short complementary 3' stretch: melts far below the primers
        let first = candidate(b"gattacagattacagaattc", Strand::Forward, 57.0);
        let second = candidate(b"gattacagattacagaattc", Strand::Reverse, 57.0);

        let strict_hit = DimerChecker::new(&model, &strict).check_pair(&first, &second);
        let loose_hit = DimerChecker::new(&model, &loose).check_pair(&first, &second);
        assert!(strict_hit.is_none());
        assert!(loose_hit.is_some());
    }

    #[test]
    fn test_edges_are_sorted_and_deterministic() {
        let (model, config) = checker_parts();
        let loose = DesignConfig {
            dimer_tm_margin: 100.0,
            ..config
        };
        let checker = DimerChecker::new(&model, &loose);
        let a = candidate(b"acgttgcaacgttgcaacgt", Strand::Forward, 57.0);
        let b = candidate(
            &iupac::reverse_complement(b"acgttgcaacgttgcaacgt"),
            Strand::Reverse,
            57.0,
        );
        let c = candidate(b"ttttttgaattcttttttaa", Strand::Forward, 57.0);
        let primers: Vec<&PrimerCandidate> = vec![&a, &b, &c];
        let pairs = vec![(0, 1), (0, 2), (1, 2)];
        let edges = checker.conflict_edges(&primers, &pairs);
        assert!(!edges.is_empty());
        for window in edges.windows(2) {
            assert!((window[0].first, window[0].second) < (window[1].first, window[1].second));
        }
        assert_eq!(edges, checker.conflict_edges(&primers, &pairs));
    }
}
