//! Dimer conflict resolution by primer substitution.
//!
//! After assembly, every primer pair within the same or adjacent amplicons
//! is screened for competitive dimers. For each conflict the lower-ranked
//! endpoint is swapped for the next candidate from its own pool that keeps
//! the scheme valid and introduces no new conflict; pairs with no such
//! substitute on either side are reported as unsolvable rather than
//! treated as fatal.

use std::collections::HashSet;

use bio::bio_types::strand::Strand;
use tracing::{debug, info};

use crate::config::DesignConfig;
use crate::dimer::DimerChecker;
use crate::primer::PrimerPools;
use crate::scheme::AmpliconScheme;
use crate::types::{PrimerCandidate, PrimerDimer};

/// Result of the conflict-resolution pass.
#[derive(Debug, Clone, Default)]
pub struct ResolutionOutcome {
    /// Conflicts that survived resolution, unsolvable ones flagged
    pub unresolved: Vec<PrimerDimer>,
    /// Set when the iteration budget ran out with conflicts left
    pub budget_exhausted: bool,
}

/// Position of a selected primer inside the scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Selected {
    amplicon: usize,
    forward: bool,
}

/// Stable identity of a primer within one run.
type PrimerId = (usize, u8, usize, usize);

fn primer_id(candidate: &PrimerCandidate) -> PrimerId {
    let strand = match candidate.strand {
        Strand::Forward => 0,
        Strand::Reverse => 1,
        Strand::Unknown => 2,
    };
    (candidate.region, strand, candidate.start, candidate.end)
}

fn edge_id(first: &PrimerCandidate, second: &PrimerCandidate) -> (PrimerId, PrimerId) {
    let a = primer_id(first);
    let b = primer_id(second);
    if a <= b { (a, b) } else { (b, a) }
}

/// Screen the scheme and substitute primers until no resolvable conflict
/// remains or the budget is exhausted.
pub fn resolve_conflicts(
    scheme: &mut AmpliconScheme,
    pools: &PrimerPools,
    checker: &DimerChecker<'_>,
    config: &DesignConfig,
) -> ResolutionOutcome {
    let mut unsolvable: Vec<PrimerDimer> = Vec::new();
    let mut unsolvable_ids: HashSet<(PrimerId, PrimerId)> = HashSet::new();

    for pass in 0..config.resolution_budget {
        let conflicts = open_conflicts(scheme, checker, &unsolvable_ids);
        if conflicts.is_empty() {
            debug!(passes = pass, "conflict resolution converged");
            return ResolutionOutcome {
                unresolved: unsolvable,
                budget_exhausted: false,
            };
        }

        let mut substituted = false;
        for (first, second, tm) in &conflicts {
            // endpoints ordered worst-ranked first
            let first_penalty = primer_at(scheme, *first).penalty;
            let second_penalty = primer_at(scheme, *second).penalty;
            let order = if first_penalty >= second_penalty {
                [*first, *second]
            } else {
                [*second, *first]
            };

            if order
                .iter()
                .any(|&endpoint| try_substitute(scheme, endpoint, pools, checker, config))
            {
                substituted = true;
                // the scheme changed; re-screen before touching more edges
                break;
            }

            let dimer = PrimerDimer {
                first: primer_at(scheme, *first).clone(),
                second: primer_at(scheme, *second).clone(),
                tm: *tm,
                unsolvable: true,
            };
            unsolvable_ids.insert(edge_id(&dimer.first, &dimer.second));
            unsolvable.push(dimer);
        }

        if !substituted {
            // every open conflict was just declared unsolvable
            return ResolutionOutcome {
                unresolved: unsolvable,
                budget_exhausted: false,
            };
        }
    }

    // budget gone; report whatever still conflicts
    let mut unresolved = unsolvable;
    for (first, second, tm) in open_conflicts(scheme, checker, &unsolvable_ids) {
        unresolved.push(PrimerDimer {
            first: primer_at(scheme, first).clone(),
            second: primer_at(scheme, second).clone(),
            tm,
            unsolvable: false,
        });
    }
    info!(
        unresolved = unresolved.len(),
        "conflict resolution budget exhausted"
    );
    ResolutionOutcome {
        unresolved,
        budget_exhausted: true,
    }
}

/// Conflicting primer pairs among same or adjacent amplicons, excluding
/// pairs already declared unsolvable.
fn open_conflicts(
    scheme: &AmpliconScheme,
    checker: &DimerChecker<'_>,
    unsolvable_ids: &HashSet<(PrimerId, PrimerId)>,
) -> Vec<(Selected, Selected, f64)> {
    let selected = selected_primers(scheme);
    let primers: Vec<&PrimerCandidate> = selected
        .iter()
        .map(|&s| primer_at(scheme, s))
        .collect();

    let mut pairs = Vec::new();
    for (i, a) in selected.iter().enumerate() {
        for (j, b) in selected.iter().enumerate().skip(i + 1) {
            if b.amplicon - a.amplicon <= 1 {
                pairs.push((i, j));
            }
        }
    }

    checker
        .conflict_edges(&primers, &pairs)
        .into_iter()
        .filter(|edge| {
            !unsolvable_ids.contains(&edge_id(primers[edge.first], primers[edge.second]))
        })
        .map(|edge| (selected[edge.first], selected[edge.second], edge.tm))
        .collect()
}

fn selected_primers(scheme: &AmpliconScheme) -> Vec<Selected> {
    (0..scheme.len())
        .flat_map(|amplicon| {
            [
                Selected { amplicon, forward: true },
                Selected { amplicon, forward: false },
            ]
        })
        .collect()
}

fn primer_at(scheme: &AmpliconScheme, selected: Selected) -> &PrimerCandidate {
    let amplicon = &scheme.amplicons[selected.amplicon];
    if selected.forward {
        &amplicon.forward
    } else {
        &amplicon.reverse
    }
}

/// Try to replace one endpoint with the best-ranked valid substitute from
/// its own pool. Returns true when the scheme was changed.
fn try_substitute(
    scheme: &mut AmpliconScheme,
    endpoint: Selected,
    pools: &PrimerPools,
    checker: &DimerChecker<'_>,
    config: &DesignConfig,
) -> bool {
    let current_id = primer_id(primer_at(scheme, endpoint));
    let Some(pool) = pools.get(&primer_at(scheme, endpoint).pool_key()) else {
        return false;
    };

    for substitute in pool {
        if primer_id(substitute) == current_id {
            continue;
        }
        if !preserves_layout(scheme, endpoint, substitute, config) {
            continue;
        }
        if introduces_conflict(scheme, endpoint, substitute, checker) {
            continue;
        }
        debug!(
            amplicon = endpoint.amplicon,
            replaced = %primer_at(scheme, endpoint),
            substitute = %substitute,
            "substituting primer"
        );
        let amplicon = &mut scheme.amplicons[endpoint.amplicon];
        if endpoint.forward {
            amplicon.forward = substitute.clone();
        } else {
            amplicon.reverse = substitute.clone();
        }
        return true;
    }
    false
}

/// Size, overlap and ordering constraints the substitute has to keep.
fn preserves_layout(
    scheme: &AmpliconScheme,
    endpoint: Selected,
    substitute: &PrimerCandidate,
    config: &DesignConfig,
) -> bool {
    let amplicon = &scheme.amplicons[endpoint.amplicon];
    let (new_start, new_end) = if endpoint.forward {
        (substitute.start, amplicon.reverse.end)
    } else {
        (amplicon.forward.start, substitute.end)
    };

    // primers must not overlap each other and the length must hold
    if endpoint.forward {
        if substitute.end > amplicon.reverse.start {
            return false;
        }
    } else if substitute.start < amplicon.forward.end {
        return false;
    }
    if !config.amplicon_length.contains(new_end - new_start) {
        return false;
    }

    if endpoint.amplicon > 0 {
        let prev = &scheme.amplicons[endpoint.amplicon - 1];
        if substitute.strand == Strand::Forward && substitute.start < prev.forward.end {
            return false;
        }
        // keep whichever relation (overlap or bridged gap) held before
        let had_overlap = amplicon.start() + config.min_overlap <= prev.end();
        if had_overlap {
            if new_start + config.min_overlap > prev.end() {
                return false;
            }
        } else if new_start > prev.end() + config.max_gap {
            return false;
        }
        if new_end <= prev.end() {
            return false;
        }
    }

    if endpoint.amplicon + 1 < scheme.len() {
        let next = &scheme.amplicons[endpoint.amplicon + 1];
        // the next forward primer has to start past this forward primer
        if substitute.strand == Strand::Forward && next.forward.start < substitute.end {
            return false;
        }
        let had_overlap = next.start() + config.min_overlap <= amplicon.end();
        if had_overlap && next.start() + config.min_overlap > new_end {
            return false;
        }
        if next.end() <= new_end {
            return false;
        }
    }

    true
}

/// Does the substitute conflict with any other primer of the same or
/// adjacent amplicons?
fn introduces_conflict(
    scheme: &AmpliconScheme,
    endpoint: Selected,
    substitute: &PrimerCandidate,
    checker: &DimerChecker<'_>,
) -> bool {
    let lo = endpoint.amplicon.saturating_sub(1);
    let hi = (endpoint.amplicon + 1).min(scheme.len() - 1);
    for amplicon in lo..=hi {
        for forward in [true, false] {
            let other = Selected { amplicon, forward };
            if other == endpoint {
                continue;
            }
            if checker
                .check_pair(substitute, primer_at(scheme, other))
                .is_some()
            {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Bounds;
    use crate::iupac;
    use crate::thermo::ThermoModel;
    use crate::types::{Amplicon, PermutationStats, PoolKey};

    fn primer(
        region: usize,
        start: usize,
        end: usize,
        strand: Strand,
        sequence: &[u8],
        penalty: f64,
    ) -> PrimerCandidate {
        PrimerCandidate {
            region,
            start,
            end,
            strand,
            sequence: sequence.to_vec(),
            primary: sequence.to_vec(),
            permutations: vec![sequence.to_vec()],
            gc: PermutationStats { min: 0.5, mean: 0.5, max: 0.5 },
            tm: PermutationStats { min: 57.0, mean: 58.0, max: 59.0 },
            penalty,
        }
    }

    fn config() -> DesignConfig {
        DesignConfig {
            primer_size: Bounds::new(18, 22, 20),
            amplicon_length: Bounds::new(80, 120, 100),
            min_overlap: 20,
            max_gap: 100,
            resolution_budget: 10,
            ..Default::default()
        }
    }

    const BENIGN_A: &[u8] = b"aagaagaagaagaagaagaa";
    const BENIGN_B: &[u8] = b"agaagaagaagaagaagaag";
    const STICKY: &[u8] = b"gattacagattacagatcgc";

    /// Scheme of two overlapping amplicons where the first reverse primer
    /// and the second forward primer form a full-length dimer.
    fn conflicted_parts() -> (AmpliconScheme, PrimerPools) {
        let sticky_rc = iupac::reverse_complement(STICKY);
        let f0 = primer(0, 0, 20, Strand::Forward, BENIGN_A, 1.0);
        let r0 = primer(0, 100, 120, Strand::Reverse, STICKY, 1.0);
        let f1 = primer(1, 80, 100, Strand::Forward, &sticky_rc, 2.0);
        let r1 = primer(1, 170, 190, Strand::Reverse, BENIGN_A, 1.0);
        let f1_alt = primer(1, 82, 102, Strand::Forward, BENIGN_B, 3.0);

        let scheme = AmpliconScheme {
            amplicons: vec![
                Amplicon::new(f0.clone(), r0.clone()),
                Amplicon::new(f1.clone(), r1.clone()),
            ],
        };

        let mut pools = PrimerPools::new();
        pools.insert(PoolKey::new(0, Strand::Forward), vec![f0]);
        pools.insert(PoolKey::new(0, Strand::Reverse), vec![r0]);
        pools.insert(PoolKey::new(1, Strand::Forward), vec![f1, f1_alt]);
        pools.insert(PoolKey::new(1, Strand::Reverse), vec![r1]);
        (scheme, pools)
    }

    #[test]
    fn test_conflict_is_resolved_by_substitution() {
        let (mut scheme, pools) = conflicted_parts();
        let config = config();
        let model = ThermoModel::new(&config.salt);
        let checker = DimerChecker::new(&model, &config);

        let outcome = resolve_conflicts(&mut scheme, &pools, &checker, &config);
        assert!(outcome.unresolved.is_empty());
        assert!(!outcome.budget_exhausted);
        // the worse-ranked endpoint was swapped for its pool alternative
        assert_eq!(scheme.amplicons[1].forward.sequence, BENIGN_B.to_vec());
        assert_eq!(scheme.amplicons[1].forward.start, 82);
    }

    #[test]
    fn test_pair_without_substitutes_is_unsolvable() {
        let (mut scheme, mut pools) = conflicted_parts();
        // drop the alternative: nothing can be substituted
        pools.insert(
            PoolKey::new(1, Strand::Forward),
            vec![scheme.amplicons[1].forward.clone()],
        );
        let config = config();
        let model = ThermoModel::new(&config.salt);
        let checker = DimerChecker::new(&model, &config);

        let outcome = resolve_conflicts(&mut scheme, &pools, &checker, &config);
        assert_eq!(outcome.unresolved.len(), 1);
        let dimer = &outcome.unresolved[0];
        assert!(dimer.unsolvable);
        assert!(dimer.tm > 20.0);
        assert!(!outcome.budget_exhausted);
        // the scheme itself is left intact
        assert_eq!(scheme.amplicons[1].forward.sequence, iupac::reverse_complement(STICKY));
    }

    #[test]
    fn test_clean_scheme_needs_no_work() {
        let f0 = primer(0, 0, 20, Strand::Forward, BENIGN_A, 1.0);
        let r0 = primer(0, 100, 120, Strand::Reverse, BENIGN_B, 1.0);
        let mut scheme = AmpliconScheme {
            amplicons: vec![Amplicon::new(f0.clone(), r0.clone())],
        };
        let mut pools = PrimerPools::new();
        pools.insert(PoolKey::new(0, Strand::Forward), vec![f0]);
        pools.insert(PoolKey::new(0, Strand::Reverse), vec![r0]);
        let config = config();
        let model = ThermoModel::new(&config.salt);
        let checker = DimerChecker::new(&model, &config);

        let before = scheme.clone();
        let outcome = resolve_conflicts(&mut scheme, &pools, &checker, &config);
        assert!(outcome.unresolved.is_empty());
        assert_eq!(scheme, before);
    }

    #[test]
    fn test_substitution_respects_amplicon_bounds() {
        let (mut scheme, mut pools) = conflicted_parts();
        // replace the alternative with one that would shrink the amplicon
        // below the minimum length; it must not be chosen
        let sticky_rc = iupac::reverse_complement(STICKY);
        let f1 = primer(1, 80, 100, Strand::Forward, &sticky_rc, 2.0);
        let too_late = primer(1, 150, 170, Strand::Forward, BENIGN_B, 3.0);
        pools.insert(PoolKey::new(1, Strand::Forward), vec![f1, too_late]);
        let config = config();
        let model = ThermoModel::new(&config.salt);
        let checker = DimerChecker::new(&model, &config);

        let outcome = resolve_conflicts(&mut scheme, &pools, &checker, &config);
        // no valid substitute on either side: both endpoints stay put
        assert_eq!(scheme.amplicons[1].forward.start, 80);
        assert_eq!(outcome.unresolved.len(), 1);
        assert!(outcome.unresolved[0].unsolvable);
    }
}
