use std::fmt;

use bio::bio_types::strand::Strand;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Half-open interval of alignment columns conserved enough to anchor
/// primers.
///
/// Coordinates are 0-based on the shared alignment/consensus coordinate
/// system. Regions are derived once per run and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConservedRegion {
    /// First column of the region
    pub start: usize,
    /// One past the last column of the region
    pub end: usize,
}

impl ConservedRegion {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    #[must_use]
    pub const fn contains(&self, column: usize) -> bool {
        column >= self.start && column < self.end
    }
}

impl fmt::Display for ConservedRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Minimum / mean / maximum of a per-permutation statistic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PermutationStats {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl PermutationStats {
    /// Aggregate over a non-empty slice of per-permutation values.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Self {
        debug_assert!(!values.is_empty());
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &v in values {
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        Self {
            min,
            mean: sum / values.len() as f64,
            max,
        }
    }

    /// True when every permutation value lies within `[lo, hi]`.
    #[must_use]
    pub fn within(&self, lo: f64, hi: f64) -> bool {
        self.min >= lo && self.max <= hi
    }
}

/// Identifies the ranked candidate pool a primer was drawn from.
///
/// Pools are keyed by (region index, strand); together with the rank inside
/// the pool this is a stable identifier for every candidate, which is what
/// the conflict-resolution pass uses to look up substitutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolKey {
    pub region: usize,
    #[serde(with = "strand_serde")]
    pub strand: Strand,
}

// `bio`'s Strand implements `PartialEq` but not `Eq`; its equality is
// reflexive, so `PoolKey` satisfies `Eq` and we assert it directly rather
// than deriving (which would demand `Strand: Eq`).
impl Eq for PoolKey {}

impl PoolKey {
    #[must_use]
    pub const fn new(region: usize, strand: Strand) -> Self {
        Self { region, strand }
    }

    const fn strand_rank(&self) -> u8 {
        match self.strand {
            Strand::Forward => 0,
            Strand::Reverse => 1,
            Strand::Unknown => 2,
        }
    }
}

// `bio`'s Strand has no Ord; order pools by (region, forward-before-reverse)
// so iteration over pool maps is deterministic.
impl Ord for PoolKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.region, self.strand_rank()).cmp(&(other.region, other.strand_rank()))
    }
}

impl PartialOrd for PoolKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A scored degenerate primer candidate.
///
/// `sequence` is the degenerate sequence written 5'->3' on the candidate's
/// own strand and may carry ambiguity codes; `permutations` are its explicit
/// expansions in the same orientation. Candidates are immutable once built:
/// assembly only removes them from consideration or swaps one for another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimerCandidate {
    /// Index of the conserved region that spawned the candidate
    pub region: usize,
    /// First consensus column covered (0-based)
    pub start: usize,
    /// One past the last consensus column covered
    pub end: usize,
    /// Strand the primer anneals to
    #[serde(with = "strand_serde")]
    pub strand: Strand,
    /// Degenerate sequence, 5'->3' on `strand`
    pub sequence: Vec<u8>,
    /// Majority-base rendition of `sequence`; the permutation backed by the
    /// most frequent alleles, used wherever a single explicit sequence is
    /// needed (clamp, hairpin and dimer checks)
    pub primary: Vec<u8>,
    /// Explicit-base expansions of `sequence`, 5'->3' on `strand`
    pub permutations: Vec<Vec<u8>>,
    /// GC fraction statistics across permutations (0.0-1.0)
    pub gc: PermutationStats,
    /// Melting temperature statistics across permutations (deg C)
    pub tm: PermutationStats,
    /// Combined penalty, lower is better
    pub penalty: f64,
}

impl PrimerCandidate {
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Pool this candidate belongs to.
    #[must_use]
    pub fn pool_key(&self) -> PoolKey {
        PoolKey::new(self.region, self.strand)
    }

    /// True when both candidates cover at least one common column.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Sequence as a display string.
    #[must_use]
    pub fn sequence_str(&self) -> String {
        String::from_utf8_lossy(&self.sequence).into_owned()
    }
}

impl fmt::Display for PrimerCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strand = match self.strand {
            Strand::Forward => '+',
            Strand::Reverse => '-',
            Strand::Unknown => '.',
        };
        write!(
            f,
            "{}:{}-{}({}) penalty={:.2}",
            self.sequence_str(),
            self.start,
            self.end,
            strand,
            self.penalty
        )
    }
}

/// An unordered primer pair predicted to form a competitive dimer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimerDimer {
    pub first: PrimerCandidate,
    pub second: PrimerCandidate,
    /// Predicted melting temperature of the dimer duplex (deg C)
    pub tm: f64,
    /// Set when no substitute in either endpoint's pool resolves the pair
    pub unsolvable: bool,
}

impl fmt::Display for PrimerDimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x {} (dimer tm {:.1})",
            self.first, self.second, self.tm
        )
    }
}

/// One tile of the scheme: a forward/reverse primer pair and the interval
/// they amplify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amplicon {
    pub forward: PrimerCandidate,
    pub reverse: PrimerCandidate,
}

impl Amplicon {
    #[must_use]
    pub fn new(forward: PrimerCandidate, reverse: PrimerCandidate) -> Self {
        debug_assert_eq!(forward.strand, Strand::Forward);
        debug_assert_eq!(reverse.strand, Strand::Reverse);
        Self { forward, reverse }
    }

    /// First covered consensus column (the forward primer's 5' end).
    #[must_use]
    pub fn start(&self) -> usize {
        self.forward.start
    }

    /// One past the last covered column (the reverse primer's 5' end).
    #[must_use]
    pub fn end(&self) -> usize {
        self.reverse.end
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end() <= self.start()
    }

    /// Summed primer penalty, lower is better.
    #[must_use]
    pub fn penalty(&self) -> f64 {
        self.forward.penalty + self.reverse.penalty
    }
}

impl fmt::Display for Amplicon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{} ({} bp, penalty {:.2})",
            self.start(),
            self.end(),
            self.len(),
            self.penalty()
        )
    }
}

/// Error conditions that abort a design run.
///
/// Only genuinely fatal states live here; recoverable conditions (regions
/// without candidates, coverage gaps, unresolved dimers) are accumulated in
/// the run report instead.
#[derive(Error, Debug)]
pub enum AmplitileError {
    /// Malformed or empty input alignment
    #[error("Invalid alignment: {0}")]
    InvalidAlignment(String),
    /// No conserved region can hold even a single primer
    #[error("No conserved region of at least {min_len} columns; lower the frequency threshold")]
    InsufficientConservation { min_len: usize },
    /// The assembler produced zero amplicons for the whole genome
    #[error("No amplicons could be assembled; increase the maximum amplicon length or lower the frequency threshold")]
    AmpliconSchemeFailure,
    /// A configuration value is out of its valid domain
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// File I/O failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Input data could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Serde helpers for `bio`'s `Strand`, stored as "+", "-" or ".".
pub(crate) mod strand_serde {
    use bio::bio_types::strand::Strand;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(strand: &Strand, serializer: S) -> Result<S::Ok, S::Error> {
        let symbol = match strand {
            Strand::Forward => "+",
            Strand::Reverse => "-",
            Strand::Unknown => ".",
        };
        serializer.serialize_str(symbol)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Strand, D::Error> {
        match String::deserialize(deserializer)?.as_str() {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            "." => Ok(Strand::Unknown),
            other => Err(de::Error::custom(format!("invalid strand: {other}"))),
        }
    }
}
