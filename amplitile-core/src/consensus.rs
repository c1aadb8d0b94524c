//! Consensus derivation from column frequency vectors.
//!
//! Two consensus sequences are derived in one pass over the alignment: an
//! ambiguous consensus that encodes tolerated variation as IUPAC codes, and
//! a majority consensus holding the single most frequent base per column.
//! Both are deterministic functions of the alignment and the thresholds.

use crate::alignment::Alignment;
use crate::config::DesignConfig;
use crate::iupac;

/// Both consensus renditions of one alignment, lowercase, one symbol per
/// alignment column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consensus {
    ambiguous: Vec<u8>,
    majority: Vec<u8>,
}

impl Consensus {
    /// IUPAC-encoded consensus tolerant of variation.
    #[must_use]
    pub fn ambiguous(&self) -> &[u8] {
        &self.ambiguous
    }

    /// Single most frequent base per column.
    #[must_use]
    pub fn majority(&self) -> &[u8] {
        &self.majority
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ambiguous.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ambiguous.is_empty()
    }
}

/// Per-column nucleotide statistics.
#[derive(Debug, Clone, Copy, Default)]
struct ColumnCounts {
    /// Fractional base weights in canonical order a, c, g, t
    bases: [f64; 4],
    /// Rows contributing base information
    informative: f64,
    /// Rows carrying a gap
    gaps: usize,
}

impl ColumnCounts {
    fn tally(column: impl Iterator<Item = u8>) -> (Self, usize) {
        let mut counts = Self::default();
        let mut rows = 0usize;
        for symbol in column {
            rows += 1;
            if iupac::is_gap(symbol) {
                counts.gaps += 1;
                continue;
            }
            let mask = iupac::mask(symbol);
            let degeneracy = mask.count_ones();
            if degeneracy == 0 || degeneracy == 4 {
                // `n` carries no base information
                continue;
            }
            let weight = 1.0 / f64::from(degeneracy);
            for bit in 0..4 {
                if mask & (1 << bit) != 0 {
                    counts.bases[bit] += weight;
                }
            }
            counts.informative += 1.0;
        }
        (counts, rows)
    }

    /// Base indices sorted most-frequent-first; frequency ties fall back to
    /// the fixed a > c > g > t order so derivation stays deterministic.
    fn ranked_bases(&self) -> [usize; 4] {
        let mut order = [0usize, 1, 2, 3];
        order.sort_by(|&a, &b| {
            self.bases[b]
                .partial_cmp(&self.bases[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });
        order
    }
}

/// Derive both consensus sequences.
///
/// For each column the ambiguous symbol encodes the smallest base set whose
/// cumulative frequency reaches `config.frequency_threshold`, bases added
/// most-frequent-first; the majority symbol is the single top base. Columns
/// whose gap fraction exceeds `config.max_gap_fraction`, or that carry no
/// base information at all, yield the non-callable `n` sentinel in both.
#[must_use]
pub fn build_consensus(alignment: &Alignment, config: &DesignConfig) -> Consensus {
    let columns = alignment.columns();
    let mut ambiguous = Vec::with_capacity(columns);
    let mut majority = Vec::with_capacity(columns);

    for index in 0..columns {
        let (counts, rows) = ColumnCounts::tally(alignment.column(index));
        let gap_fraction = counts.gaps as f64 / rows as f64;

        if gap_fraction > config.max_gap_fraction || counts.informative == 0.0 {
            ambiguous.push(b'n');
            majority.push(b'n');
            continue;
        }

        let ranked = counts.ranked_bases();
        majority.push(iupac::CANONICAL_BASES[ranked[0]]);

        let mut mask = 0u8;
        let mut cumulative = 0.0;
        for &base in &ranked {
            let frequency = counts.bases[base] / counts.informative;
            if frequency <= 0.0 {
                break;
            }
            mask |= 1 << base;
            cumulative += frequency;
            if cumulative >= config.frequency_threshold {
                break;
            }
        }
        ambiguous.push(iupac::code(mask));
    }

    Consensus { ambiguous, majority }
}
