use std::fmt;

use bio::bio_types::strand::Strand;
use serde::{Deserialize, Serialize};

use crate::primer::PrimerPools;
use crate::scheme::{AmpliconScheme, CoverageGap};
use crate::types::{strand_serde, ConservedRegion, PrimerDimer};

/// Metadata about the profiled alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentInfo {
    /// Number of aligned sequences
    pub sequences: usize,
    /// Number of alignment columns
    pub columns: usize,
    /// GC fraction of the callable majority consensus
    pub gc_content: f64,
}

/// A non-fatal condition collected during the run.
///
/// Fatal conditions abort with [`crate::types::AmplitileError`]; everything
/// here is reported alongside a (possibly partial) scheme and left to the
/// caller to present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DesignEvent {
    /// A region produced no valid primer on one strand
    NoPrimerCandidates {
        region: usize,
        #[serde(with = "strand_serde")]
        strand: Strand,
    },
    /// The scheme leaves a stretch of the consensus uncovered
    CoverageGap { start: usize, end: usize },
    /// Conflict resolution ran out of passes with conflicts left
    ResolutionBudgetExhausted { remaining: usize },
    /// Overall coverage fell below the warning threshold
    LowCoverage { coverage: f64 },
}

impl fmt::Display for DesignEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPrimerCandidates { region, strand } => {
                let direction = match strand {
                    Strand::Forward => "forward",
                    Strand::Reverse => "reverse",
                    Strand::Unknown => "unknown-strand",
                };
                write!(f, "region {region} yielded no {direction} primer")
            }
            Self::CoverageGap { start, end } => {
                write!(f, "coverage gap at {start}-{end} ({} bp)", end - start)
            }
            Self::ResolutionBudgetExhausted { remaining } => {
                write!(
                    f,
                    "dimer resolution budget exhausted with {remaining} conflicts left"
                )
            }
            Self::LowCoverage { coverage } => {
                write!(f, "scheme covers only {:.1}% of the consensus", coverage * 100.0)
            }
        }
    }
}

/// Accumulated non-fatal events of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignReport {
    pub events: Vec<DesignEvent>,
}

impl DesignReport {
    pub fn push(&mut self, event: DesignEvent) {
        self.events.push(event);
    }

    /// True when the run completed without warnings.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Everything a design run produces.
///
/// Downstream writers consume this structure; coordinates are 0-based and
/// half-open, primer sequences read 5'->3' on their own strand.
#[derive(Debug, Clone)]
pub struct DesignResults {
    /// Metadata about the profiled alignment
    pub alignment_info: AlignmentInfo,
    /// IUPAC consensus tolerant of variation, one symbol per column
    pub ambiguous_consensus: Vec<u8>,
    /// Majority-base consensus, one symbol per column
    pub majority_consensus: Vec<u8>,
    /// Ordered conserved regions the primers anchor in
    pub regions: Vec<ConservedRegion>,
    /// Full ranked candidate pools, keyed by (region, strand)
    pub pools: PrimerPools,
    /// The assembled amplicon tiling
    pub scheme: AmpliconScheme,
    /// Uncovered stretches between amplicons
    pub gaps: Vec<CoverageGap>,
    /// Dimer conflicts that survived resolution
    pub unresolved_dimers: Vec<PrimerDimer>,
    /// Non-fatal events of the run
    pub report: DesignReport,
}

impl DesignResults {
    /// Fraction of the consensus covered by the scheme.
    #[must_use]
    pub fn coverage(&self) -> f64 {
        self.scheme.coverage(self.alignment_info.columns)
    }

    /// Total primers selected into the scheme.
    #[must_use]
    pub fn selected_primers(&self) -> usize {
        self.scheme.len() * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_display() {
        let event = DesignEvent::CoverageGap { start: 100, end: 400 };
        assert_eq!(event.to_string(), "coverage gap at 100-400 (300 bp)");

        let event = DesignEvent::NoPrimerCandidates {
            region: 2,
            strand: Strand::Reverse,
        };
        assert_eq!(event.to_string(), "region 2 yielded no reverse primer");
    }

    #[test]
    fn test_report_accumulates() {
        let mut report = DesignReport::default();
        assert!(report.is_clean());
        report.push(DesignEvent::LowCoverage { coverage: 0.5 });
        assert!(!report.is_clean());
        assert_eq!(report.len(), 1);
    }
}
