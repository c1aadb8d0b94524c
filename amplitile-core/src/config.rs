use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AMPLICON_LENGTH, DEFAULT_DIMER_TM_MARGIN, DEFAULT_FREQUENCY_THRESHOLD,
    DEFAULT_GC_CLAMP, DEFAULT_GC_CLAMP_PENALTY, DEFAULT_GC_PENALTY, DEFAULT_HOMOPOLYMER_PENALTY,
    DEFAULT_MAX_AMBIGUOUS_PER_PRIMER, DEFAULT_MAX_BASE_PENALTY, DEFAULT_MAX_DINUCLEOTIDE_REPEATS,
    DEFAULT_MAX_GAP, DEFAULT_MAX_GAP_FRACTION, DEFAULT_MAX_GC_END, DEFAULT_MAX_HAIRPIN_TM,
    DEFAULT_MAX_HOMOPOLYMER, DEFAULT_MAX_PERMUTATIONS, DEFAULT_MAX_SELF_DIMER_TM,
    DEFAULT_MIN_3PRIME_UNAMBIGUOUS, DEFAULT_MIN_OVERLAP, DEFAULT_NON_CALLABLE_MARGIN,
    DEFAULT_PERMUTATION_PENALTY, DEFAULT_POOL_DEPTH, DEFAULT_PRIMER_GC, DEFAULT_PRIMER_SIZE,
    DEFAULT_PRIMER_TM, DEFAULT_RESOLUTION_BUDGET, DEFAULT_SIZE_PENALTY,
    DEFAULT_THREE_PRIME_PENALTIES, DEFAULT_TM_PENALTY,
};
use crate::types::AmplitileError;

/// A `(min, max, opt)` bound triple for a primer or amplicon property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
    pub opt: T,
}

impl<T: Copy + PartialOrd> Bounds<T> {
    #[must_use]
    pub const fn new(min: T, max: T, opt: T) -> Self {
        Self { min, max, opt }
    }

    /// True when `min <= opt <= max`.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.min <= self.opt && self.opt <= self.max
    }

    #[must_use]
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }
}

impl<T: Copy + PartialOrd> From<(T, T, T)> for Bounds<T> {
    fn from((min, max, opt): (T, T, T)) -> Self {
        Self { min, max, opt }
    }
}

/// PCR buffer composition used by the thermodynamic model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaltConditions {
    /// Monovalent cation concentration in mM
    pub mv_conc_mm: f64,
    /// Divalent cation concentration in mM
    pub dv_conc_mm: f64,
    /// dNTP concentration in mM
    pub dntp_conc_mm: f64,
    /// Annealing oligo concentration in nM
    pub dna_conc_nm: f64,
}

impl Default for SaltConditions {
    fn default() -> Self {
        Self {
            mv_conc_mm: 100.0,
            dv_conc_mm: 2.0,
            dntp_conc_mm: 0.8,
            dna_conc_nm: 15.0,
        }
    }
}

/// Configuration for a scheme design run.
///
/// Every numeric knob of the pipeline lives here; the engine itself holds no
/// hidden tunables. Defaults follow the values in [`crate::constants`].
///
/// # Examples
///
/// ## Default configuration
///
/// ```rust
/// use amplitile_core::config::DesignConfig;
///
/// let config = DesignConfig::default();
/// assert!(config.validate().is_ok());
/// ```
///
/// ## Shorter amplicons with tighter overlap
///
/// ```rust
/// use amplitile_core::config::{Bounds, DesignConfig};
///
/// let config = DesignConfig {
///     amplicon_length: Bounds::new(300, 800, 500),
///     min_overlap: 50,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignConfig {
    /// Cumulative base frequency the ambiguous-consensus symbol of a column
    /// has to represent. Bases are added most-frequent-first until this
    /// threshold is reached.
    ///
    /// **Default**: `0.9`
    pub frequency_threshold: f64,

    /// Gap fraction above which a column becomes non-callable in both
    /// consensus sequences.
    ///
    /// **Default**: `0.5`
    pub max_gap_fraction: f64,

    /// Distance in columns to a non-callable column within which a position
    /// never qualifies for a conserved region.
    ///
    /// **Default**: `3`
    pub non_callable_margin: usize,

    /// Primer length bounds in bases.
    ///
    /// **Default**: `18..=24`, optimum `21`
    pub primer_size: Bounds<usize>,

    /// Primer melting temperature bounds in deg C. Every explicit
    /// permutation of a degenerate primer has to stay inside.
    ///
    /// **Default**: `56..=63`, optimum `60`
    pub primer_tm: Bounds<f64>,

    /// Primer GC fraction bounds. Every permutation has to stay inside.
    ///
    /// **Default**: `0.35..=0.65`, optimum `0.50`
    pub primer_gc: Bounds<f64>,

    /// Ambiguity codes tolerated within a single primer; also bounds the
    /// ambiguity density of conserved regions.
    ///
    /// **Default**: `2`
    pub max_ambiguous_per_primer: usize,

    /// Upper bound on the explicit expansions of one degenerate primer.
    /// Windows above it are discarded before any expansion happens.
    ///
    /// **Default**: `128`
    pub max_permutations: usize,

    /// Longest tolerated single-base run in any permutation.
    ///
    /// **Default**: `4`
    pub max_homopolymer: usize,

    /// Longest tolerated dinucleotide repeat run.
    ///
    /// **Default**: `4`
    pub max_dinucleotide_repeats: usize,

    /// Number of 3'-terminal bases required to be G or C. `0` disables the
    /// hard requirement; a missing clamp is then only penalized.
    ///
    /// **Default**: `1`
    pub gc_clamp: usize,

    /// Maximum G/C bases within the five 3'-terminal positions.
    ///
    /// **Default**: `4`
    pub max_gc_end: usize,

    /// 3'-terminal bases that must be free of ambiguity codes.
    ///
    /// **Default**: `3`
    pub min_3prime_unambiguous: usize,

    /// Maximum tolerated hairpin melting temperature in deg C.
    ///
    /// **Default**: `47.0`
    pub max_hairpin_tm: f64,

    /// Maximum tolerated self-dimer melting temperature in deg C.
    ///
    /// **Default**: `21.0`
    pub max_self_dimer_tm: f64,

    /// Candidates retained per (region, strand) pool after ranking; bounds
    /// the search space of assembly and conflict resolution.
    ///
    /// **Default**: `50`
    pub pool_depth: usize,

    /// Amplicon length bounds in bases.
    ///
    /// **Default**: `200..=2000`, optimum `1000`
    pub amplicon_length: Bounds<usize>,

    /// Required overlap between consecutive amplicons in bases. The first
    /// amplicon is exempt.
    ///
    /// **Default**: `100`
    pub min_overlap: usize,

    /// Largest coverage gap the assembler bridges before skipping to the
    /// next conserved region.
    ///
    /// **Default**: `500`
    pub max_gap: usize,

    /// A dimer is competitive when its predicted melting temperature reaches
    /// the pair's lowest permutation Tm minus this margin (deg C).
    ///
    /// **Default**: `35.0`
    pub dimer_tm_margin: f64,

    /// Substitution passes the conflict-resolution step may run before
    /// remaining dimers are reported as unsolved.
    ///
    /// **Default**: `10`
    pub resolution_budget: usize,

    /// Penalty weights: deg C of mean-Tm deviation from the optimum.
    pub tm_penalty: f64,
    /// Penalty weights: GC percentage points of mean-GC deviation.
    pub gc_penalty: f64,
    /// Penalty weights: bases of size deviation from the optimum.
    pub size_penalty: f64,
    /// Penalty weights: per explicit permutation.
    pub permutation_penalty: f64,
    /// Penalty weights: ambiguity codes at the 3'-most positions, ordered
    /// from the terminus inward.
    pub three_prime_penalties: Vec<f64>,
    /// Penalty weights: per homopolymer base beyond a run of three.
    pub homopolymer_penalty: f64,
    /// Penalty weights: missing G/C clamp (only when `gc_clamp == 0`).
    pub gc_clamp_penalty: f64,
    /// Intrinsic penalty above which a candidate is discarded outright.
    pub max_base_penalty: f64,

    /// PCR buffer composition for the thermodynamic model.
    pub salt: SaltConditions,

    /// Number of rayon threads for the parallel map steps. `None` uses the
    /// global pool.
    ///
    /// **Default**: `None`
    pub num_threads: Option<usize>,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            frequency_threshold: DEFAULT_FREQUENCY_THRESHOLD,
            max_gap_fraction: DEFAULT_MAX_GAP_FRACTION,
            non_callable_margin: DEFAULT_NON_CALLABLE_MARGIN,
            primer_size: DEFAULT_PRIMER_SIZE.into(),
            primer_tm: DEFAULT_PRIMER_TM.into(),
            primer_gc: DEFAULT_PRIMER_GC.into(),
            max_ambiguous_per_primer: DEFAULT_MAX_AMBIGUOUS_PER_PRIMER,
            max_permutations: DEFAULT_MAX_PERMUTATIONS,
            max_homopolymer: DEFAULT_MAX_HOMOPOLYMER,
            max_dinucleotide_repeats: DEFAULT_MAX_DINUCLEOTIDE_REPEATS,
            gc_clamp: DEFAULT_GC_CLAMP,
            max_gc_end: DEFAULT_MAX_GC_END,
            min_3prime_unambiguous: DEFAULT_MIN_3PRIME_UNAMBIGUOUS,
            max_hairpin_tm: DEFAULT_MAX_HAIRPIN_TM,
            max_self_dimer_tm: DEFAULT_MAX_SELF_DIMER_TM,
            pool_depth: DEFAULT_POOL_DEPTH,
            amplicon_length: DEFAULT_AMPLICON_LENGTH.into(),
            min_overlap: DEFAULT_MIN_OVERLAP,
            max_gap: DEFAULT_MAX_GAP,
            dimer_tm_margin: DEFAULT_DIMER_TM_MARGIN,
            resolution_budget: DEFAULT_RESOLUTION_BUDGET,
            tm_penalty: DEFAULT_TM_PENALTY,
            gc_penalty: DEFAULT_GC_PENALTY,
            size_penalty: DEFAULT_SIZE_PENALTY,
            permutation_penalty: DEFAULT_PERMUTATION_PENALTY,
            three_prime_penalties: DEFAULT_THREE_PRIME_PENALTIES.to_vec(),
            homopolymer_penalty: DEFAULT_HOMOPOLYMER_PENALTY,
            gc_clamp_penalty: DEFAULT_GC_CLAMP_PENALTY,
            max_base_penalty: DEFAULT_MAX_BASE_PENALTY,
            salt: SaltConditions::default(),
            num_threads: None,
        }
    }
}

impl DesignConfig {
    /// Check the configuration for out-of-domain values.
    ///
    /// # Errors
    ///
    /// Returns [`AmplitileError::InvalidConfig`] describing the first
    /// offending knob.
    pub fn validate(&self) -> Result<(), AmplitileError> {
        let fail = |message: &str| Err(AmplitileError::InvalidConfig(message.to_string()));

        if !(0.0..=1.0).contains(&self.frequency_threshold) {
            return fail("frequency_threshold must be between 0 and 1");
        }
        if !(0.0..=1.0).contains(&self.max_gap_fraction) {
            return fail("max_gap_fraction must be between 0 and 1");
        }
        if !self.primer_size.is_ordered() || self.primer_size.min == 0 {
            return fail("primer_size must satisfy 0 < min <= opt <= max");
        }
        if !self.primer_tm.is_ordered() {
            return fail("primer_tm must satisfy min <= opt <= max");
        }
        if !self.primer_gc.is_ordered()
            || self.primer_gc.min < 0.0
            || self.primer_gc.max > 1.0
        {
            return fail("primer_gc must satisfy 0 <= min <= opt <= max <= 1");
        }
        if !self.amplicon_length.is_ordered() {
            return fail("amplicon_length must satisfy min <= opt <= max");
        }
        if self.amplicon_length.min < 2 * self.primer_size.min {
            return fail("amplicon_length.min must hold two primers");
        }
        if self.min_overlap >= self.amplicon_length.max {
            return fail("min_overlap must be smaller than amplicon_length.max");
        }
        if self.max_permutations == 0 {
            return fail("max_permutations must be positive");
        }
        if self.max_homopolymer == 0 {
            return fail("max_homopolymer must be positive");
        }
        if self.min_3prime_unambiguous > self.primer_size.min {
            return fail("min_3prime_unambiguous cannot exceed the minimum primer size");
        }
        if self.gc_clamp > self.primer_size.min {
            return fail("gc_clamp cannot exceed the minimum primer size");
        }
        if self.pool_depth == 0 {
            return fail("pool_depth must be positive");
        }
        if self.salt.mv_conc_mm <= 0.0 || self.salt.dna_conc_nm <= 0.0 {
            return fail("salt concentrations must be positive");
        }
        if self.salt.dv_conc_mm < 0.0 || self.salt.dntp_conc_mm < 0.0 {
            return fail("salt concentrations must not be negative");
        }
        let weights = [
            self.tm_penalty,
            self.gc_penalty,
            self.size_penalty,
            self.permutation_penalty,
            self.homopolymer_penalty,
            self.gc_clamp_penalty,
            self.max_base_penalty,
        ];
        if weights.iter().any(|w| *w < 0.0)
            || self.three_prime_penalties.iter().any(|w| *w < 0.0)
        {
            return fail("penalty weights must not be negative");
        }
        Ok(())
    }
}
