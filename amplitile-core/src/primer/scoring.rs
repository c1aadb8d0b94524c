//! Intrinsic primer statistics and the penalty model.

use crate::config::DesignConfig;
use crate::iupac;
use crate::types::PermutationStats;

/// GC fraction of an explicit sequence.
#[must_use]
pub fn gc_fraction(sequence: &[u8]) -> f64 {
    if sequence.is_empty() {
        return 0.0;
    }
    let gc = sequence
        .iter()
        .filter(|&&base| matches!(base, b'g' | b'c'))
        .count();
    gc as f64 / sequence.len() as f64
}

/// Length of the longest single-base run.
#[must_use]
pub fn max_homopolymer(sequence: &[u8]) -> usize {
    let mut longest = 0usize;
    let mut current = 0usize;
    let mut previous = 0u8;
    for &base in sequence {
        if base == previous {
            current += 1;
        } else {
            previous = base;
            current = 1;
        }
        longest = longest.max(current);
    }
    longest
}

/// Number of consecutive repeats of the same dinucleotide, checked on both
/// frame offsets. `"catatatag"` repeats `ta` three times in a row.
#[must_use]
pub fn max_dinucleotide_run(sequence: &[u8]) -> usize {
    let mut longest = 0usize;
    for frame in [&sequence[..], sequence.get(1..).unwrap_or(&[])] {
        let mut current = 1usize;
        let mut chunks = frame.chunks_exact(2);
        let Some(mut previous) = chunks.next() else {
            continue;
        };
        for chunk in chunks {
            if chunk == previous {
                current += 1;
            } else {
                previous = chunk;
                current = 1;
            }
            longest = longest.max(current);
        }
        longest = longest.max(current.min(frame.len() / 2));
    }
    longest
}

/// Penalty weights resolved from the configuration.
///
/// Lower penalties are better; zero means the candidate sits exactly on
/// every optimum.
#[derive(Debug, Clone)]
pub struct PenaltyModel {
    tm_opt: f64,
    gc_opt_percent: f64,
    size_opt: usize,
    tm_weight: f64,
    gc_weight: f64,
    size_weight: f64,
    permutation_weight: f64,
    three_prime_weights: Vec<f64>,
    homopolymer_weight: f64,
    gc_clamp_weight: f64,
    hard_clamp: bool,
}

impl PenaltyModel {
    #[must_use]
    pub fn from_config(config: &DesignConfig) -> Self {
        Self {
            tm_opt: config.primer_tm.opt,
            gc_opt_percent: config.primer_gc.opt * 100.0,
            size_opt: config.primer_size.opt,
            tm_weight: config.tm_penalty,
            gc_weight: config.gc_penalty,
            size_weight: config.size_penalty,
            permutation_weight: config.permutation_penalty,
            three_prime_weights: config.three_prime_penalties.clone(),
            homopolymer_weight: config.homopolymer_penalty,
            gc_clamp_weight: config.gc_clamp_penalty,
            hard_clamp: config.gc_clamp > 0,
        }
    }

    /// Deviation of mean Tm, mean GC and size from their optima.
    #[must_use]
    pub fn base_penalty(&self, tm: &PermutationStats, gc: &PermutationStats, size: usize) -> f64 {
        self.tm_weight * (tm.mean - self.tm_opt).abs()
            + self.gc_weight * (gc.mean * 100.0 - self.gc_opt_percent).abs()
            + self.size_weight * (size.abs_diff(self.size_opt) as f64)
    }

    /// Full penalty for a degenerate sequence written 5'->3'.
    ///
    /// `primary` is the explicit majority rendition used for the clamp and
    /// homopolymer terms; `degenerate` carries the ambiguity codes scored by
    /// the permutation and 3' terms.
    #[must_use]
    pub fn penalty(
        &self,
        degenerate: &[u8],
        primary: &[u8],
        tm: &PermutationStats,
        gc: &PermutationStats,
        permutation_count: usize,
        max_run: usize,
    ) -> f64 {
        let mut penalty = self.base_penalty(tm, gc, degenerate.len());
        penalty += self.permutation_weight * permutation_count as f64;
        for (offset, weight) in self.three_prime_weights.iter().enumerate() {
            if offset >= degenerate.len() {
                break;
            }
            if iupac::is_ambiguous(degenerate[degenerate.len() - 1 - offset]) {
                penalty += weight;
            }
        }
        penalty += self.homopolymer_weight * max_run.saturating_sub(3) as f64;
        if !self.hard_clamp && !matches!(primary.last(), Some(b'g' | b'c')) {
            penalty += self.gc_clamp_weight;
        }
        penalty
    }
}
