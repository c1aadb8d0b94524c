//! Left-to-right tiling of the consensus.

use bio::bio_types::strand::Strand;
use tracing::{debug, info};

use crate::config::DesignConfig;
use crate::primer::PrimerPools;
use crate::scheme::{AmpliconScheme, AssemblyState, CoverageGap};
use crate::types::{Amplicon, ConservedRegion, PrimerCandidate};

/// Result of the tiling pass.
#[derive(Debug, Clone)]
pub struct AssemblyOutcome {
    pub scheme: AmpliconScheme,
    /// Uncovered stretches between committed amplicons
    pub gaps: Vec<CoverageGap>,
}

/// Window the next forward primer may start in.
#[derive(Debug, Clone, Copy)]
struct SeedWindow {
    lo: usize,
    hi: usize,
    /// Set when starting inside this window violates the overlap rule
    bridges_gap: bool,
}

/// Tile the consensus with amplicons drawn from the ranked pools.
///
/// The loop is a state machine: `Seeding` derives the forward search window
/// from the previous amplicon, `Extending` picks the cheapest feasible
/// pair, `Committed` appends it and advances the frontier past the forward
/// primer's 3' edge, and `Gapped` skips to the next conserved region when
/// nothing fits. An empty scheme is not an error here; the caller decides
/// whether that is fatal.
#[must_use]
pub fn assemble_scheme(
    pools: &PrimerPools,
    regions: &[ConservedRegion],
    consensus_len: usize,
    config: &DesignConfig,
) -> AssemblyOutcome {
    let mut scheme = AmpliconScheme::default();
    let mut gaps = Vec::new();

    // frontier: smallest column the next forward primer may start at
    let mut frontier = 0usize;
    // interval of the previously committed amplicon
    let mut previous: Option<(usize, usize)> = None;
    // rightmost column covered so far, for gap bookkeeping
    let mut covered_end: Option<usize> = None;
    let mut state = AssemblyState::Seeding;
    // the window Extending searches, set by Seeding/Gapped
    let mut window: Option<SeedWindow> = None;

    loop {
        state = match state {
            AssemblyState::Seeding => {
                window = Some(seed_window(frontier, previous, consensus_len, config));
                AssemblyState::Extending
            }

            AssemblyState::Extending => {
                let current = window.take().expect("window set before Extending");
                match best_pair(pools, current, previous, config) {
                    Some(amplicon) => {
                        if let Some(end) = covered_end {
                            if amplicon.start() > end {
                                gaps.push(CoverageGap {
                                    start: end,
                                    end: amplicon.start(),
                                });
                            }
                        }
                        frontier = amplicon.forward.end;
                        previous = Some((amplicon.start(), amplicon.end()));
                        covered_end =
                            Some(covered_end.map_or(amplicon.end(), |e| e.max(amplicon.end())));
                        debug!(
                            amplicon = %amplicon,
                            "committed"
                        );
                        scheme.amplicons.push(amplicon);
                        AssemblyState::Committed
                    }
                    None if !current.bridges_gap && previous.is_some() => {
                        // retry the same frontier with a gap-tolerant window
                        let (_, prev_end) = previous.expect("checked");
                        window = Some(SeedWindow {
                            lo: frontier,
                            hi: (prev_end + config.max_gap).min(consensus_len),
                            bridges_gap: true,
                        });
                        AssemblyState::Extending
                    }
                    None => AssemblyState::Gapped,
                }
            }

            AssemblyState::Committed => AssemblyState::Seeding,

            AssemblyState::Gapped => {
                // skip to the next conserved region past everything tried
                let tried_to = previous
                    .map(|(_, end)| (end + config.max_gap).max(frontier))
                    .unwrap_or(frontier);
                match regions.iter().find(|region| region.start > tried_to) {
                    Some(region) => {
                        debug!(resume_at = region.start, "skipping ahead after gap");
                        frontier = region.start;
                        // the fresh start is exempt from the overlap rule
                        previous = None;
                        AssemblyState::Seeding
                    }
                    None => AssemblyState::Done,
                }
            }

            AssemblyState::Done => break,
            // conflict resolution runs as a separate pass
            AssemblyState::ConflictResolving => break,
        };
    }

    info!(
        amplicons = scheme.len(),
        gaps = gaps.len(),
        coverage_percent = scheme.coverage(consensus_len) * 100.0,
        "assembly finished"
    );
    AssemblyOutcome { scheme, gaps }
}

/// Forward-primer window derived from the previous amplicon.
fn seed_window(
    frontier: usize,
    previous: Option<(usize, usize)>,
    consensus_len: usize,
    config: &DesignConfig,
) -> SeedWindow {
    match previous {
        // overlap rule: the next amplicon has to reach back into the
        // previous one by at least min_overlap
        Some((_, prev_end)) => SeedWindow {
            lo: frontier,
            hi: prev_end.saturating_sub(config.min_overlap),
            bridges_gap: false,
        },
        None => SeedWindow {
            lo: frontier,
            hi: consensus_len,
            bridges_gap: true,
        },
    }
}

/// Cheapest feasible (forward, reverse) pair with the forward primer
/// starting inside the window.
///
/// Feasible means the amplicon length stays within bounds and the primers
/// do not overlap each other. Ties fall to the larger overlap with the
/// previous amplicon, then the smaller start, then the smaller end.
fn best_pair(
    pools: &PrimerPools,
    window: SeedWindow,
    previous: Option<(usize, usize)>,
    config: &DesignConfig,
) -> Option<Amplicon> {
    let mut best: Option<(Amplicon, f64, usize)> = None;

    for (key, pool) in pools {
        if key.strand != Strand::Forward {
            continue;
        }
        for forward in pool {
            if forward.start < window.lo || forward.start > window.hi {
                continue;
            }
            for reverse in feasible_reverses(pools, forward, config) {
                // tiling must advance: a new amplicon has to extend coverage
                if let Some((_, prev_end)) = previous {
                    if reverse.end <= prev_end {
                        continue;
                    }
                }
                let amplicon = Amplicon::new(forward.clone(), reverse.clone());
                let penalty = amplicon.penalty();
                let overlap = previous
                    .map(|(_, prev_end)| prev_end.saturating_sub(amplicon.start()))
                    .unwrap_or(0);
                let better = match &best {
                    None => true,
                    Some((incumbent, best_penalty, best_overlap)) => {
                        match penalty.partial_cmp(best_penalty) {
                            Some(std::cmp::Ordering::Less) => true,
                            Some(std::cmp::Ordering::Greater) => false,
                            _ => {
                                (overlap > *best_overlap)
                                    || (overlap == *best_overlap
                                        && (amplicon.start(), amplicon.end())
                                            < (incumbent.start(), incumbent.end()))
                            }
                        }
                    }
                };
                if better {
                    best = Some((amplicon, penalty, overlap));
                }
            }
        }
    }

    best.map(|(amplicon, _, _)| amplicon)
}

/// Reverse candidates forming a valid amplicon with `forward`.
fn feasible_reverses<'a>(
    pools: &'a PrimerPools,
    forward: &'a PrimerCandidate,
    config: &'a DesignConfig,
) -> impl Iterator<Item = &'a PrimerCandidate> {
    pools
        .iter()
        .filter(|(key, _)| key.strand == Strand::Reverse)
        .flat_map(|(_, pool)| pool.iter())
        .filter(move |reverse| {
            let length = reverse.end.saturating_sub(forward.start);
            reverse.start >= forward.end && config.amplicon_length.contains(length)
        })
}
