//! Nearest-neighbor duplex thermodynamics.
//!
//! Melting temperatures come from the unified nearest-neighbor parameter
//! set with a monovalent-equivalent salt correction; divalent cations are
//! folded into the monovalent concentration after subtracting the dNTP
//! fraction that chelates them. Hairpin and dimer estimates reuse the same
//! stack tables on the best self- or cross-complementary stretch, which is
//! deliberately a simplified model of the competing structure.

use crate::config::SaltConditions;
use crate::constants::{
    DIVALENT_CONVERSION_FACTOR, GAS_CONSTANT, INIT_AT, INIT_GC, NN_ENTHALPY, NN_ENTROPY,
    SALT_ENTROPY_FACTOR, ZERO_CELSIUS_KELVIN,
};
use crate::iupac;

/// Shortest complementary stretch treated as a stem or dimer duplex.
const MIN_DUPLEX_RUN: usize = 3;

/// Smallest loop a hairpin stem can fold back over.
const MIN_HAIRPIN_LOOP: usize = 3;

/// Best cross-complementary alignment between two primers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimerHit {
    /// Predicted melting temperature of the paired stretch (deg C)
    pub tm: f64,
    /// Length of the longest contiguous complementary run
    pub run: usize,
}

/// Precomputed buffer terms for melting-temperature prediction.
#[derive(Debug, Clone, Copy)]
pub struct ThermoModel {
    /// Monovalent-equivalent salt concentration in mol/l
    salt_molar: f64,
    /// `R * ln(Ct / 4)` term of the two-state melting formula
    concentration_term: f64,
}

impl ThermoModel {
    #[must_use]
    pub fn new(salt: &SaltConditions) -> Self {
        let effective_divalent = (salt.dv_conc_mm - salt.dntp_conc_mm).max(0.0);
        let salt_molar =
            (salt.mv_conc_mm + DIVALENT_CONVERSION_FACTOR * effective_divalent.sqrt()) / 1000.0;
        let total_strand_molar = salt.dna_conc_nm * 1e-9;
        Self {
            salt_molar,
            concentration_term: GAS_CONSTANT * (total_strand_molar / 4.0).ln(),
        }
    }

    /// Melting temperature of a perfectly matched duplex in deg C.
    ///
    /// `sequence` must be explicit lowercase bases; ambiguity codes have to
    /// be expanded before scoring. Sequences shorter than two bases have no
    /// stack and return `None`.
    #[must_use]
    pub fn duplex_tm(&self, sequence: &[u8]) -> Option<f64> {
        if sequence.len() < 2 {
            return None;
        }

        let mut enthalpy = 0.0;
        let mut entropy = 0.0;
        for stack in sequence.windows(2) {
            let first = base_index(stack[0])?;
            let second = base_index(stack[1])?;
            enthalpy += NN_ENTHALPY[first][second];
            entropy += NN_ENTROPY[first][second];
        }
        for &terminal in &[sequence[0], sequence[sequence.len() - 1]] {
            let (dh, ds) = if matches!(terminal, b'g' | b'c') {
                INIT_GC
            } else {
                INIT_AT
            };
            enthalpy += dh;
            entropy += ds;
        }

        let stacks = (sequence.len() - 1) as f64;
        let entropy_salted = entropy + SALT_ENTROPY_FACTOR * stacks * self.salt_molar.ln();
        let tm_kelvin = enthalpy * 1000.0 / (entropy_salted + self.concentration_term);
        Some(tm_kelvin - ZERO_CELSIUS_KELVIN)
    }

    /// Hairpin melting temperature of the strongest stem that pairs the
    /// 3' terminal window back onto the rest of the sequence.
    ///
    /// Returns `None` when no stem of at least [`MIN_DUPLEX_RUN`] bases with
    /// a loop of at least [`MIN_HAIRPIN_LOOP`] bases exists.
    #[must_use]
    pub fn hairpin_tm(&self, sequence: &[u8]) -> Option<f64> {
        let n = sequence.len();
        let mut best: Option<f64> = None;

        let max_stem = n.saturating_sub(MIN_HAIRPIN_LOOP + MIN_DUPLEX_RUN);
        for stem_len in MIN_DUPLEX_RUN..=max_stem.min(n / 2) {
            let stem = &sequence[n - stem_len..];
            let target = iupac::reverse_complement(stem);
            // the stem may close onto any upstream stretch leaving a loop
            let search_end = n - stem_len - MIN_HAIRPIN_LOOP;
            let found = sequence[..search_end]
                .windows(stem_len)
                .any(|window| window == target.as_slice());
            if found {
                if let Some(tm) = self.duplex_tm(stem) {
                    best = Some(best.map_or(tm, |b: f64| b.max(tm)));
                }
            }
        }
        best
    }

    /// Best dimer interaction between two primers.
    ///
    /// Slides every relative offset of `first` against the reverse
    /// complement of `second`, keeps the offset with the longest contiguous
    /// complementary run and scores that run as a short duplex. Self-dimers
    /// are `dimer(seq, seq)`.
    #[must_use]
    pub fn dimer(&self, first: &[u8], second: &[u8]) -> Option<DimerHit> {
        let second_rc = iupac::reverse_complement(second);
        let mut best_run: &[u8] = &[];

        let first_len = first.len() as isize;
        let second_len = second_rc.len() as isize;
        for shift in -(second_len - 1)..first_len {
            let mut run_start = 0usize;
            let mut run_len = 0usize;
            let mut current_start = 0usize;
            let mut current_len = 0usize;
            for i in 0..first_len {
                let j = i - shift;
                let matches = j >= 0
                    && j < second_len
                    && first[i as usize] == second_rc[j as usize];
                if matches {
                    if current_len == 0 {
                        current_start = i as usize;
                    }
                    current_len += 1;
                    if current_len > run_len {
                        run_len = current_len;
                        run_start = current_start;
                    }
                } else {
                    current_len = 0;
                }
            }
            if run_len > best_run.len() {
                best_run = &first[run_start..run_start + run_len];
            }
        }

        if best_run.len() < MIN_DUPLEX_RUN {
            return None;
        }
        self.duplex_tm(best_run).map(|tm| DimerHit {
            tm,
            run: best_run.len(),
        })
    }
}

const fn base_index(base: u8) -> Option<usize> {
    match base {
        b'a' => Some(0),
        b'c' => Some(1),
        b'g' => Some(2),
        b't' => Some(3),
        _ => None,
    }
}
