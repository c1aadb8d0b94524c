//! Conserved-region discovery on the ambiguous consensus.
//!
//! A region is a maximal stretch of callable columns in which degenerate
//! positions stay sparse enough that every primer-sized window respects the
//! per-primer ambiguity cap. Regions too short to hold a primer of the
//! maximum configured size are dropped.

use tracing::debug;

use crate::config::DesignConfig;
use crate::iupac;
use crate::types::ConservedRegion;

/// Scan the ambiguous consensus for primer-anchoring regions.
///
/// A column qualifies when it is not the `n` sentinel and lies further than
/// `config.non_callable_margin` columns from every sentinel. Qualifying
/// stretches are split wherever `config.max_ambiguous_per_primer + 1`
/// degenerate columns would fall inside one window of the minimum primer
/// size. The result is ordered and non-overlapping.
#[must_use]
pub fn find_conserved_regions(ambiguous: &[u8], config: &DesignConfig) -> Vec<ConservedRegion> {
    let blocked = blocked_columns(ambiguous, config.non_callable_margin);
    let min_primer = config.primer_size.min;
    let ambiguity_cap = config.max_ambiguous_per_primer;

    let mut regions = Vec::new();
    let mut start: Option<usize> = None;
    let mut degenerate: Vec<usize> = Vec::new();

    let close = |regions: &mut Vec<ConservedRegion>, from: usize, to: usize| {
        if to > from && to - from >= config.primer_size.max {
            regions.push(ConservedRegion::new(from, to));
        }
    };

    for (column, &symbol) in ambiguous.iter().enumerate() {
        if blocked[column] {
            if let Some(from) = start.take() {
                close(&mut regions, from, column);
            }
            degenerate.clear();
            continue;
        }

        if start.is_none() {
            start = Some(column);
            degenerate.clear();
        }

        if iupac::is_ambiguous(symbol) {
            degenerate.push(column);
            if degenerate.len() > ambiguity_cap {
                let window_first = degenerate[degenerate.len() - 1 - ambiguity_cap];
                if column - window_first < min_primer {
                    // one primer window would hold cap + 1 degenerate columns
                    let from = start.take().unwrap_or(column);
                    close(&mut regions, from, column);
                    if ambiguity_cap > 0 {
                        start = Some(column);
                        degenerate.clear();
                        degenerate.push(column);
                    } else {
                        degenerate.clear();
                    }
                }
            }
        }
    }

    if let Some(from) = start {
        close(&mut regions, from, ambiguous.len());
    }

    debug!(
        regions = regions.len(),
        conserved_columns = regions.iter().map(ConservedRegion::len).sum::<usize>(),
        "conserved region scan finished"
    );
    regions
}

/// Mark sentinel columns and everything within `margin` of them.
fn blocked_columns(ambiguous: &[u8], margin: usize) -> Vec<bool> {
    let mut blocked = vec![false; ambiguous.len()];
    for (column, &symbol) in ambiguous.iter().enumerate() {
        if symbol == b'n' {
            let from = column.saturating_sub(margin);
            let to = (column + margin + 1).min(ambiguous.len());
            blocked[from..to].iter_mut().for_each(|b| *b = true);
        }
    }
    blocked
}

/// Fraction of consensus columns inside conserved regions.
#[must_use]
pub fn conserved_fraction(regions: &[ConservedRegion], consensus_len: usize) -> f64 {
    if consensus_len == 0 {
        return 0.0;
    }
    regions.iter().map(ConservedRegion::len).sum::<usize>() as f64 / consensus_len as f64
}
