// =============================================================================
// =============================================================================

/// Version string for amplitile
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Nearest-neighbor duplex thermodynamics (unified parameter set).
// Enthalpies in kcal/mol, entropies in cal/(mol*K); tables indexed by the
// 5'->3' dinucleotide on the top strand with base order a, c, g, t.
// =============================================================================

/// Gas constant in cal/(K*mol)
pub const GAS_CONSTANT: f64 = 1.987;

/// 0 degrees Celsius in Kelvin
pub const ZERO_CELSIUS_KELVIN: f64 = 273.15;

/// Stacking enthalpies \[first]\[second]
pub const NN_ENTHALPY: [[f64; 4]; 4] = [
    [-7.9, -8.4, -7.8, -7.2],
    [-8.5, -8.0, -10.6, -7.8],
    [-8.2, -9.8, -8.0, -8.4],
    [-7.2, -8.2, -8.5, -7.9],
];

/// Stacking entropies \[first]\[second]
pub const NN_ENTROPY: [[f64; 4]; 4] = [
    [-22.2, -22.4, -21.0, -20.4],
    [-22.7, -19.9, -27.2, -21.0],
    [-22.2, -24.4, -19.9, -22.4],
    [-21.3, -22.2, -22.7, -22.2],
];

/// Duplex initiation with a terminal G/C pair (enthalpy, entropy)
pub const INIT_GC: (f64, f64) = (0.1, -2.8);

/// Duplex initiation with a terminal A/T pair (enthalpy, entropy)
pub const INIT_AT: (f64, f64) = (2.3, 4.1);

/// Entropy correction per stack and ln(\[Na+]) unit for salt adjustment
pub const SALT_ENTROPY_FACTOR: f64 = 0.368;

/// Divalent-to-monovalent conversion factor (Owczarzy approximation)
pub const DIVALENT_CONVERSION_FACTOR: f64 = 120.0;

// =============================================================================
// Consensus and conserved-region defaults
// =============================================================================

/// Cumulative base frequency a consensus symbol has to represent
pub const DEFAULT_FREQUENCY_THRESHOLD: f64 = 0.9;

/// Gap fraction above which a column becomes non-callable
pub const DEFAULT_MAX_GAP_FRACTION: f64 = 0.5;

/// Columns around a non-callable column that never anchor primers
pub const DEFAULT_NON_CALLABLE_MARGIN: usize = 3;

// =============================================================================
// Primer defaults
// =============================================================================

/// Primer size bounds (min, max, opt) in bases
pub const DEFAULT_PRIMER_SIZE: (usize, usize, usize) = (18, 24, 21);

/// Primer melting temperature bounds (min, max, opt) in deg C
pub const DEFAULT_PRIMER_TM: (f64, f64, f64) = (56.0, 63.0, 60.0);

/// Primer GC fraction bounds (min, max, opt)
pub const DEFAULT_PRIMER_GC: (f64, f64, f64) = (0.35, 0.65, 0.50);

/// Ambiguity codes tolerated within one primer
pub const DEFAULT_MAX_AMBIGUOUS_PER_PRIMER: usize = 2;

/// Explicit expansions tolerated for one degenerate primer
pub const DEFAULT_MAX_PERMUTATIONS: usize = 128;

/// Longest tolerated single-base run
pub const DEFAULT_MAX_HOMOPOLYMER: usize = 4;

/// Longest tolerated dinucleotide repeat run
pub const DEFAULT_MAX_DINUCLEOTIDE_REPEATS: usize = 4;

/// Terminal 3' bases required to be G or C (0 disables the requirement)
pub const DEFAULT_GC_CLAMP: usize = 1;

/// Maximum G/C bases within the five 3'-terminal positions
pub const DEFAULT_MAX_GC_END: usize = 4;

/// 3'-terminal bases that must be free of ambiguity codes
pub const DEFAULT_MIN_3PRIME_UNAMBIGUOUS: usize = 3;

/// Maximum tolerated hairpin melting temperature (deg C)
pub const DEFAULT_MAX_HAIRPIN_TM: f64 = 47.0;

/// Maximum tolerated self-dimer melting temperature (deg C)
pub const DEFAULT_MAX_SELF_DIMER_TM: f64 = 21.0;

/// Candidates retained per (region, strand) pool
pub const DEFAULT_POOL_DEPTH: usize = 50;

/// Candidates retained per start bucket within one pool; the bucket width
/// is half the minimum primer size
pub const POSITION_POOL_DEPTH: usize = 3;

// =============================================================================
// Penalty weights
// =============================================================================

/// Penalty per degree of mean-Tm deviation from the optimum
pub const DEFAULT_TM_PENALTY: f64 = 2.0;

/// Penalty per GC percentage point of mean-GC deviation from the optimum
pub const DEFAULT_GC_PENALTY: f64 = 0.2;

/// Penalty per base of size deviation from the optimum
pub const DEFAULT_SIZE_PENALTY: f64 = 0.5;

/// Penalty per explicit permutation of a degenerate primer
pub const DEFAULT_PERMUTATION_PENALTY: f64 = 0.1;

/// Penalty weights for ambiguity codes at the 3'-most positions,
/// ordered from the 3' terminus inward
pub const DEFAULT_THREE_PRIME_PENALTIES: [f64; 5] = [32.0, 16.0, 8.0, 4.0, 2.0];

/// Penalty per homopolymer base beyond a run of three
pub const DEFAULT_HOMOPOLYMER_PENALTY: f64 = 1.0;

/// Penalty for a 3' terminus without a G/C clamp (applies when the hard
/// clamp requirement is disabled)
pub const DEFAULT_GC_CLAMP_PENALTY: f64 = 2.0;

/// Base penalty above which a candidate is discarded outright
pub const DEFAULT_MAX_BASE_PENALTY: f64 = 8.0;

// =============================================================================
// Amplicon and scheme defaults
// =============================================================================

/// Amplicon length bounds (min, max, opt) in bases
pub const DEFAULT_AMPLICON_LENGTH: (usize, usize, usize) = (200, 2000, 1000);

/// Required overlap between consecutive amplicons in bases
pub const DEFAULT_MIN_OVERLAP: usize = 100;

/// Largest tolerated coverage gap between consecutive amplicons in bases
pub const DEFAULT_MAX_GAP: usize = 500;

/// Margin below the primer annealing range at which a dimer counts as
/// competitive (deg C)
pub const DEFAULT_DIMER_TM_MARGIN: f64 = 35.0;

/// Substitution passes the conflict-resolution step may run
pub const DEFAULT_RESOLUTION_BUDGET: usize = 10;

// =============================================================================
// Reporting
// =============================================================================

/// Coverage fraction below which the run report carries a warning
pub const LOW_COVERAGE_WARNING: f64 = 0.7;
