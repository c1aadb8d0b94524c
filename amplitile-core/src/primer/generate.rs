//! Window digestion and permutation expansion.
//!
//! Each conserved region is digested into every (start, length) window of
//! the configured primer size range. Windows expand their ambiguity codes
//! into explicit permutations, are scored thermodynamically, and leave this
//! stage as forward and reverse candidates that already satisfy every
//! direction-independent constraint. Regions are processed in parallel and
//! merged back in region order, so output is deterministic.

use bio::bio_types::strand::Strand;
use rayon::prelude::*;
use tracing::debug;

use crate::config::DesignConfig;
use crate::consensus::Consensus;
use crate::iupac;
use crate::primer::scoring::{
    gc_fraction, max_dinucleotide_run, max_homopolymer, PenaltyModel,
};
use crate::thermo::ThermoModel;
use crate::types::{ConservedRegion, PermutationStats, PrimerCandidate};

/// Enumerate, expand and score primer candidates for all regions.
///
/// The result is sorted by (region, start, end, strand) and contains both
/// orientations of every surviving window.
#[must_use]
pub fn generate_candidates(
    consensus: &Consensus,
    regions: &[ConservedRegion],
    config: &DesignConfig,
    model: &ThermoModel,
) -> Vec<PrimerCandidate> {
    let penalties = PenaltyModel::from_config(config);

    let per_region: Vec<Vec<PrimerCandidate>> = regions
        .par_iter()
        .enumerate()
        .map(|(index, region)| digest_region(index, *region, consensus, config, model, &penalties))
        .collect();

    let candidates: Vec<PrimerCandidate> = per_region.into_iter().flatten().collect();
    debug!(candidates = candidates.len(), "candidate generation finished");
    candidates
}

/// Digest one region into scored candidates on both strands.
fn digest_region(
    region_index: usize,
    region: ConservedRegion,
    consensus: &Consensus,
    config: &DesignConfig,
    model: &ThermoModel,
    penalties: &PenaltyModel,
) -> Vec<PrimerCandidate> {
    let ambiguous = consensus.ambiguous();
    let majority = consensus.majority();
    let mut candidates = Vec::new();

    for start in region.start..region.end {
        for length in config.primer_size.min..=config.primer_size.max {
            let end = start + length;
            if end > region.end {
                break;
            }

            let degenerate = &ambiguous[start..end];
            if iupac::count_ambiguous(degenerate) > config.max_ambiguous_per_primer {
                continue;
            }
            let permutation_count = iupac::permutation_count(degenerate);
            if permutation_count > config.max_permutations {
                continue;
            }

            let permutations = expand_degenerate(degenerate);
            let Some(stats) = window_stats(&permutations, model) else {
                continue;
            };
            let (tm, gc, max_run, max_dinuc) = stats;

            // direction-independent hard bounds over every permutation
            if !tm.within(config.primer_tm.min, config.primer_tm.max)
                || !gc.within(config.primer_gc.min, config.primer_gc.max)
                || max_run > config.max_homopolymer
                || max_dinuc > config.max_dinucleotide_repeats
            {
                continue;
            }
            if penalties.base_penalty(&tm, &gc, length) > config.max_base_penalty {
                continue;
            }

            let primary = &majority[start..end];
            if model
                .dimer(primary, primary)
                .is_some_and(|hit| hit.tm > config.max_self_dimer_tm)
            {
                continue;
            }

            for strand in [Strand::Forward, Strand::Reverse] {
                let (sequence, primary, permutations) = match strand {
                    Strand::Forward => {
                        (degenerate.to_vec(), primary.to_vec(), permutations.clone())
                    }
                    _ => (
                        iupac::reverse_complement(degenerate),
                        iupac::reverse_complement(primary),
                        permutations
                            .iter()
                            .map(|p| iupac::reverse_complement(p))
                            .collect(),
                    ),
                };
                let penalty = penalties.penalty(
                    &sequence,
                    &primary,
                    &tm,
                    &gc,
                    permutation_count,
                    max_run,
                );
                candidates.push(PrimerCandidate {
                    region: region_index,
                    start,
                    end,
                    strand,
                    sequence,
                    primary,
                    permutations,
                    gc,
                    tm,
                    penalty,
                });
            }
        }
    }

    candidates
}

/// Per-permutation Tm/GC statistics plus the worst homopolymer and
/// dinucleotide runs. `None` when any permutation fails Tm prediction.
fn window_stats(
    permutations: &[Vec<u8>],
    model: &ThermoModel,
) -> Option<(PermutationStats, PermutationStats, usize, usize)> {
    let mut tms = Vec::with_capacity(permutations.len());
    let mut gcs = Vec::with_capacity(permutations.len());
    let mut max_run = 0usize;
    let mut max_dinuc = 0usize;
    for permutation in permutations {
        tms.push(model.duplex_tm(permutation)?);
        gcs.push(gc_fraction(permutation));
        max_run = max_run.max(max_homopolymer(permutation));
        max_dinuc = max_dinuc.max(max_dinucleotide_run(permutation));
    }
    Some((
        PermutationStats::from_values(&tms),
        PermutationStats::from_values(&gcs),
        max_run,
        max_dinuc,
    ))
}

/// Expand ambiguity codes into the cross-product of explicit sequences.
///
/// Positions expand left to right with bases in canonical order, so the
/// result order is deterministic. Callers bound the product via
/// [`iupac::permutation_count`] before expanding.
#[must_use]
pub fn expand_degenerate(degenerate: &[u8]) -> Vec<Vec<u8>> {
    let mut expansions: Vec<Vec<u8>> = vec![Vec::with_capacity(degenerate.len())];
    for &symbol in degenerate {
        let bases = iupac::expand(symbol);
        if bases.len() == 1 {
            for expansion in &mut expansions {
                expansion.push(bases[0]);
            }
            continue;
        }
        let mut next = Vec::with_capacity(expansions.len() * bases.len());
        for expansion in &expansions {
            for &base in &bases {
                let mut extended = expansion.clone();
                extended.push(base);
                next.push(extended);
            }
        }
        expansions = next;
    }
    expansions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::Alignment;
    use crate::config::Bounds;
    use crate::consensus::build_consensus;

    /// Wide bounds so small synthetic sequences survive the hard filters.
    fn test_config() -> DesignConfig {
        DesignConfig {
            primer_size: Bounds::new(18, 22, 20),
            primer_tm: Bounds::new(20.0, 90.0, 60.0),
            primer_gc: Bounds::new(0.0, 1.0, 0.5),
            max_homopolymer: 6,
            max_dinucleotide_repeats: 6,
            max_base_penalty: 1000.0,
            max_self_dimer_tm: 1000.0,
            ..Default::default()
        }
    }

    fn consensus_of(rows: &[&[u8]]) -> Consensus {
        let alignment = Alignment::new(
            rows.iter()
                .enumerate()
                .map(|(i, row)| (format!("s{i}"), row.to_vec())),
        )
        .unwrap();
        build_consensus(&alignment, &test_config())
    }

    #[test]
    fn test_expand_degenerate() {
        assert_eq!(expand_degenerate(b"ac"), vec![b"ac".to_vec()]);
        let expanded = expand_degenerate(b"ar");
        assert_eq!(expanded, vec![b"aa".to_vec(), b"ag".to_vec()]);
        assert_eq!(expand_degenerate(b"rr").len(), 4);
    }

    #[test]
    fn test_candidates_cover_both_strands() {
        let row = b"gactgcaatgcgtacgttagcatgcaagctt".repeat(2);
        let consensus = consensus_of(&[&row, &row]);
        let regions = vec![ConservedRegion::new(0, row.len())];
        let config = test_config();
        let model = ThermoModel::new(&config.salt);
        let candidates = generate_candidates(&consensus, &regions, &config, &model);

        assert!(!candidates.is_empty());
        assert!(candidates.iter().any(|c| c.strand == Strand::Forward));
        assert!(candidates.iter().any(|c| c.strand == Strand::Reverse));
        // identical alignment rows leave nothing degenerate
        assert!(candidates.iter().all(|c| c.permutations.len() == 1));
    }

    #[test]
    fn test_reverse_candidates_are_reverse_complemented() {
        let row = b"gactgcaatgcgtacgttagcatgcaagctt".repeat(2);
        let consensus = consensus_of(&[&row, &row]);
        let regions = vec![ConservedRegion::new(0, row.len())];
        let config = test_config();
        let model = ThermoModel::new(&config.salt);
        let candidates = generate_candidates(&consensus, &regions, &config, &model);

        let forward = candidates
            .iter()
            .find(|c| c.strand == Strand::Forward)
            .unwrap();
        let mate = candidates
            .iter()
            .find(|c| {
                c.strand == Strand::Reverse && c.start == forward.start && c.end == forward.end
            })
            .unwrap();
        assert_eq!(mate.sequence, iupac::reverse_complement(&forward.sequence));
        assert_eq!(mate.tm, forward.tm);
    }

    #[test]
    fn test_window_with_excess_ambiguity_is_dropped() {
        // three rows disagreeing at many columns produce degenerate columns
        let consensus = consensus_of(&[
            b"acgtacgtacgtacgtacgtacgtacgtacgt",
            b"tcgaacgaacgaacgaacgaacgaacgaacga",
            b"ccgcacgcacgcacgcacgcacgcacgcacgc",
        ]);
        let regions = vec![ConservedRegion::new(0, 32)];
        let config = DesignConfig {
            max_ambiguous_per_primer: 1,
            ..test_config()
        };
        let model = ThermoModel::new(&config.salt);
        let candidates = generate_candidates(&consensus, &regions, &config, &model);
        for candidate in &candidates {
            assert!(iupac::count_ambiguous(&candidate.sequence) <= 1);
        }
    }

    #[test]
    fn test_permutation_cap_bounds_expansion() {
        let consensus = consensus_of(&[
            b"acgtacgtacgtacgtacgtacgtacgtacgt",
            b"tcgaacgaacgaacgaacgaacgaacgaacga",
        ]);
        let regions = vec![ConservedRegion::new(0, 32)];
        let config = DesignConfig {
            max_ambiguous_per_primer: 8,
            max_permutations: 4,
            ..test_config()
        };
        let model = ThermoModel::new(&config.salt);
        let candidates = generate_candidates(&consensus, &regions, &config, &model);
        for candidate in &candidates {
            assert!(candidate.permutations.len() <= 4);
        }
    }

    #[test]
    fn test_tm_bounds_are_hard() {
        let row = b"gactgcaatgcgtacgttagcatgcaagctt".repeat(2);
        let consensus = consensus_of(&[&row, &row]);
        let regions = vec![ConservedRegion::new(0, row.len())];
        let config = DesignConfig {
            primer_tm: Bounds::new(59.0, 61.0, 60.0),
            ..test_config()
        };
        let model = ThermoModel::new(&config.salt);
        let candidates = generate_candidates(&consensus, &regions, &config, &model);
        for candidate in &candidates {
            assert!(candidate.tm.min >= 59.0 && candidate.tm.max <= 61.0);
        }
    }

    #[test]
    fn test_homopolymer_limit_is_hard() {
        let row = b"gcatgcttttttgcatgcacgtacgtacgtgc".to_vec();
        let consensus = consensus_of(&[&row, &row]);
        let regions = vec![ConservedRegion::new(0, row.len())];
        let config = DesignConfig {
            max_homopolymer: 4,
            ..test_config()
        };
        let model = ThermoModel::new(&config.salt);
        let candidates = generate_candidates(&consensus, &regions, &config, &model);
        // every candidate spanning the t-run is gone
        for candidate in &candidates {
            assert!(max_homopolymer(&candidate.primary) <= 4);
        }
    }

    #[test]
    fn test_output_order_is_deterministic() {
        let row = b"gactgcaatgcgtacgttagcatgcaagctt".repeat(3);
        let consensus = consensus_of(&[&row, &row]);
        let regions = vec![
            ConservedRegion::new(0, 45),
            ConservedRegion::new(45, row.len()),
        ];
        let config = test_config();
        let model = ThermoModel::new(&config.salt);
        let first = generate_candidates(&consensus, &regions, &config, &model);
        let second = generate_candidates(&consensus, &regions, &config, &model);
        assert_eq!(first, second);
    }
}
