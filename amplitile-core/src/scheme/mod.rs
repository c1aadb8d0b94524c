//! Amplicon scheme assembly and conflict resolution.
//!
//! The assembler tiles the consensus left to right with primer pairs drawn
//! from the ranked pools; a subsequent resolution pass swaps primers to
//! clear predicted dimer conflicts. Assembly is inherently sequential and
//! deterministic: every choice is a minimum over an explicitly ordered
//! candidate set.

mod assembly;
mod resolution;

pub use assembly::{assemble_scheme, AssemblyOutcome};
pub use resolution::{resolve_conflicts, ResolutionOutcome};

use serde::{Deserialize, Serialize};

use crate::types::Amplicon;

/// Assembler phases, in the order they are entered.
///
/// The tiling loop is a state machine over these values; keeping the states
/// explicit makes the left-to-right invariant auditable in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyState {
    /// Determining the search window for the next forward primer
    Seeding,
    /// Searching for the best feasible primer pair in the window
    Extending,
    /// A pair was appended to the scheme
    Committed,
    /// No feasible pair existed; skipping to the next conserved region
    Gapped,
    /// Screening the selected primers for dimer conflicts
    ConflictResolving,
    /// Tiling reached the end of the consensus
    Done,
}

/// An uncovered stretch between two committed amplicons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageGap {
    pub start: usize,
    pub end: usize,
}

impl CoverageGap {
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// The ordered amplicon tiling of one consensus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmpliconScheme {
    pub amplicons: Vec<Amplicon>,
}

impl AmpliconScheme {
    #[must_use]
    pub fn len(&self) -> usize {
        self.amplicons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amplicons.is_empty()
    }

    /// Consensus columns covered by at least one amplicon.
    #[must_use]
    pub fn covered_columns(&self) -> usize {
        // amplicons are sorted by start; count unions of overlapping tiles
        let mut covered = 0usize;
        let mut reach = 0usize;
        for amplicon in &self.amplicons {
            let start = amplicon.start().max(reach);
            let end = amplicon.end().max(reach);
            covered += end - start;
            reach = end;
        }
        covered
    }

    /// Fraction of the consensus covered by the scheme.
    #[must_use]
    pub fn coverage(&self, consensus_len: usize) -> f64 {
        if consensus_len == 0 {
            return 0.0;
        }
        self.covered_columns() as f64 / consensus_len as f64
    }

    /// True when amplicons are sorted by start with non-decreasing
    /// coordinates.
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.amplicons
            .windows(2)
            .all(|pair| pair[0].start() <= pair[1].start())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PermutationStats, PrimerCandidate};
    use bio::bio_types::strand::Strand;

    fn amplicon(start: usize, end: usize) -> Amplicon {
        let primer = |s: usize, e: usize, strand| PrimerCandidate {
            region: 0,
            start: s,
            end: e,
            strand,
            sequence: vec![b'a'; e - s],
            primary: vec![b'a'; e - s],
            permutations: vec![vec![b'a'; e - s]],
            gc: PermutationStats::default(),
            tm: PermutationStats::default(),
            penalty: 0.0,
        };
        Amplicon::new(
            primer(start, start + 20, Strand::Forward),
            primer(end - 20, end, Strand::Reverse),
        )
    }

    #[test]
    fn test_coverage_counts_overlap_once() {
        let scheme = AmpliconScheme {
            amplicons: vec![amplicon(0, 100), amplicon(50, 150)],
        };
        assert_eq!(scheme.covered_columns(), 150);
        assert!((scheme.coverage(200) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_coverage_with_gap() {
        let scheme = AmpliconScheme {
            amplicons: vec![amplicon(0, 100), amplicon(150, 250)],
        };
        assert_eq!(scheme.covered_columns(), 200);
    }

    #[test]
    fn test_sorted_invariant() {
        let sorted = AmpliconScheme {
            amplicons: vec![amplicon(0, 100), amplicon(50, 150)],
        };
        assert!(sorted.is_sorted());
        let unsorted = AmpliconScheme {
            amplicons: vec![amplicon(50, 150), amplicon(0, 100)],
        };
        assert!(!unsorted.is_sorted());
    }

    #[test]
    fn test_empty_scheme() {
        let scheme = AmpliconScheme::default();
        assert!(scheme.is_empty());
        assert_eq!(scheme.coverage(100), 0.0);
        assert!(scheme.is_sorted());
    }
}
