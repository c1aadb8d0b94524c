//! Direction-dependent filtering and pool ranking.
//!
//! Candidates that survive generation are checked against the constraints
//! that depend on their reading direction (3' chemistry), then ranked into
//! per-(region, strand) pools. Within a pool only the best few candidates
//! per start bucket are retained, which bounds the assembler's search cost
//! without orphaning any stretch of the region.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::DesignConfig;
use crate::constants::POSITION_POOL_DEPTH;
use crate::iupac;
use crate::thermo::ThermoModel;
use crate::types::{PoolKey, PrimerCandidate};

/// Ranked candidate pools keyed by (region, strand); each pool is sorted by
/// ascending penalty, so a candidate's index is its rank.
pub type PrimerPools = BTreeMap<PoolKey, Vec<PrimerCandidate>>;

/// Apply 3'-end constraints and rank the survivors into pools.
#[must_use]
pub fn rank_pools(
    candidates: Vec<PrimerCandidate>,
    config: &DesignConfig,
    model: &ThermoModel,
) -> PrimerPools {
    let mut pools: PrimerPools = BTreeMap::new();
    for candidate in candidates {
        if passes_direction_checks(&candidate, config, model) {
            pools.entry(candidate.pool_key()).or_default().push(candidate);
        }
    }

    // half a primer of bucket granularity keeps region edges represented
    let bucket_width = (config.primer_size.min / 2).max(1);
    for pool in pools.values_mut() {
        // penalty rank with coordinate tie-break keeps ordering reproducible
        pool.sort_by(|a, b| {
            a.penalty
                .partial_cmp(&b.penalty)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.start.cmp(&b.start))
                .then(a.end.cmp(&b.end))
        });
        *pool = retain_best_per_bucket(pool, bucket_width);
        pool.truncate(config.pool_depth);
    }
    pools.retain(|_, pool| !pool.is_empty());

    debug!(
        pools = pools.len(),
        primers = pools.values().map(Vec::len).sum::<usize>(),
        "primer pools ranked"
    );
    pools
}

/// Checks that depend on which strand the primer reads from.
fn passes_direction_checks(
    candidate: &PrimerCandidate,
    config: &DesignConfig,
    model: &ThermoModel,
) -> bool {
    let degenerate = &candidate.sequence;
    let primary = &candidate.primary;

    // no ambiguity code near the 3' terminus
    let unambiguous_tail = config.min_3prime_unambiguous.min(degenerate.len());
    if degenerate[degenerate.len() - unambiguous_tail..]
        .iter()
        .any(|&symbol| !iupac::is_canonical(symbol))
    {
        return false;
    }

    // G/C clamp on the 3' terminus
    if config.gc_clamp > 0 {
        let clamp = config.gc_clamp.min(primary.len());
        if primary[primary.len() - clamp..]
            .iter()
            .any(|&base| !matches!(base, b'g' | b'c'))
        {
            return false;
        }
    }

    // an overly GC-heavy 3' end anneals promiscuously
    let tail = primary.len().min(5);
    let gc_end = primary[primary.len() - tail..]
        .iter()
        .filter(|&&base| matches!(base, b'g' | b'c'))
        .count();
    if gc_end > config.max_gc_end {
        return false;
    }

    if model
        .hairpin_tm(primary)
        .is_some_and(|tm| tm > config.max_hairpin_tm)
    {
        return false;
    }

    true
}

/// Keep the top candidates per start bucket.
///
/// Input must be sorted by ascending penalty; the output preserves that
/// order. Bucketing by start keeps the whole region represented even when
/// one stretch of it scores far better than the rest.
fn retain_best_per_bucket(pool: &[PrimerCandidate], bucket_width: usize) -> Vec<PrimerCandidate> {
    let mut bucket_counts: BTreeMap<usize, usize> = BTreeMap::new();
    let mut retained = Vec::new();
    for candidate in pool {
        let bucket = candidate.start / bucket_width;
        let count = bucket_counts.entry(bucket).or_insert(0);
        if *count < POSITION_POOL_DEPTH {
            *count += 1;
            retained.push(candidate.clone());
        }
    }
    retained
}

#[cfg(test)]
mod tests {
    use super::*;
    use bio::bio_types::strand::Strand;
    use crate::types::PermutationStats;

    fn candidate(start: usize, end: usize, penalty: f64, sequence: &[u8]) -> PrimerCandidate {
        PrimerCandidate {
            region: 0,
            start,
            end,
            strand: Strand::Forward,
            sequence: sequence.to_vec(),
            primary: sequence.to_vec(),
            permutations: vec![sequence.to_vec()],
            gc: PermutationStats { min: 0.5, mean: 0.5, max: 0.5 },
            tm: PermutationStats { min: 60.0, mean: 60.0, max: 60.0 },
            penalty,
        }
    }

    fn open_config() -> DesignConfig {
        DesignConfig {
            min_3prime_unambiguous: 2,
            gc_clamp: 0,
            max_gc_end: 5,
            max_hairpin_tm: 1000.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_three_prime_ambiguity_is_rejected() {
        let config = DesignConfig {
            min_3prime_unambiguous: 3,
            gc_clamp: 0,
            max_gc_end: 5,
            ..Default::default()
        };
        let model = ThermoModel::new(&config.salt);
        let clean = candidate(0, 20, 1.0, b"gattacagattacagatcgc");
        let tainted = candidate(20, 40, 1.0, b"gattacagattacagatcrc");
        let pools = rank_pools(vec![clean, tainted], &config, &model);
        let pool = pools.values().next().unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].start, 0);
    }

    #[test]
    fn test_gc_clamp_requirement() {
        let config = DesignConfig {
            gc_clamp: 1,
            min_3prime_unambiguous: 2,
            max_gc_end: 5,
            max_hairpin_tm: 1000.0,
            ..Default::default()
        };
        let model = ThermoModel::new(&config.salt);
        let clamped = candidate(0, 20, 1.0, b"gattacagattacagatacg");
        let unclamped = candidate(20, 40, 1.0, b"gattacagattacagatcga");
        let pools = rank_pools(vec![clamped, unclamped], &config, &model);
        let pool = pools.values().next().unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].start, 0);
    }

    #[test]
    fn test_gc_heavy_three_prime_end_is_rejected() {
        let config = DesignConfig {
            max_gc_end: 3,
            gc_clamp: 0,
            min_3prime_unambiguous: 2,
            max_hairpin_tm: 1000.0,
            ..Default::default()
        };
        let model = ThermoModel::new(&config.salt);
        let heavy = candidate(0, 20, 1.0, b"gattacagattacagcggcg");
        let pools = rank_pools(vec![heavy], &config, &model);
        assert!(pools.is_empty());
    }

    #[test]
    fn test_hairpin_rejection() {
        let config = DesignConfig {
            max_hairpin_tm: -50.0,
            gc_clamp: 0,
            min_3prime_unambiguous: 2,
            max_gc_end: 5,
            ..Default::default()
        };
        let model = ThermoModel::new(&config.salt);
        // 3' end folds back onto the 5' start
        let folding = candidate(0, 20, 1.0, b"ggccgcaaaaaaaagcggcc");
        let pools = rank_pools(vec![folding], &config, &model);
        assert!(pools.is_empty());
    }

    #[test]
    fn test_pools_are_ranked_by_penalty() {
        let config = open_config();
        let model = ThermoModel::new(&config.salt);
        let pools = rank_pools(
            vec![
                candidate(0, 20, 3.0, b"gattacagattacagatcgc"),
                candidate(30, 50, 1.0, b"gattacagattacagatcgc"),
                candidate(60, 80, 2.0, b"gattacagattacagatcgc"),
            ],
            &config,
            &model,
        );
        let pool = pools.values().next().unwrap();
        let penalties: Vec<f64> = pool.iter().map(|c| c.penalty).collect();
        assert_eq!(penalties, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_bucket_keeps_every_stretch_represented() {
        let config = open_config();
        let model = ThermoModel::new(&config.salt);
        // a crowd of good candidates in one bucket must not evict the only
        // candidate of a later stretch
        let mut candidates: Vec<PrimerCandidate> = (0..6)
            .map(|i| candidate(i, i + 20, 0.1 * i as f64, b"gattacagattacagatcgc"))
            .collect();
        candidates.push(candidate(120, 140, 9.0, b"gattacagattacagatcgc"));
        let pools = rank_pools(candidates, &config, &model);
        let pool = pools.values().next().unwrap();
        // bucket 0 keeps its best three, the far candidate survives
        assert_eq!(pool.len(), POSITION_POOL_DEPTH + 1);
        assert!(pool.iter().any(|c| c.start == 120));
        let starts: Vec<usize> = pool.iter().filter(|c| c.start < 18).map(|c| c.start).collect();
        assert_eq!(starts, vec![0, 1, 2]);
    }

    #[test]
    fn test_pool_depth_truncation() {
        let config = DesignConfig {
            pool_depth: 2,
            ..open_config()
        };
        let model = ThermoModel::new(&config.salt);
        let pools = rank_pools(
            (0..5)
                .map(|i| candidate(i * 30, i * 30 + 20, i as f64, b"gattacagattacagatcgc"))
                .collect(),
            &config,
            &model,
        );
        assert_eq!(pools.values().next().unwrap().len(), 2);
    }
}
