//! Alignment input and validation.
//!
//! The engine consumes a pre-built multiple-sequence alignment; no alignment
//! construction happens here. Rows are normalized to lowercase, `.` gaps to
//! `-`, and every byte outside the IUPAC alphabet to the `n` sentinel, so
//! all downstream code can assume a clean lowercase alphabet.

use std::fs::File;
use std::path::Path;

use bio::io::fasta;

use crate::iupac;
use crate::types::AmplitileError;

/// An immutable multiple-sequence alignment.
///
/// All rows share the same length; column index `0..columns()` is the shared
/// coordinate system for every derived structure (consensus, regions,
/// primers, amplicons).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    ids: Vec<String>,
    rows: Vec<Vec<u8>>,
    columns: usize,
}

impl Alignment {
    /// Build an alignment from `(id, sequence)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`AmplitileError::InvalidAlignment`] when no rows are given
    /// or the rows differ in length.
    pub fn new<I, S>(records: I) -> Result<Self, AmplitileError>
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: Into<String>,
    {
        let mut ids = Vec::new();
        let mut rows = Vec::new();

        for (id, sequence) in records {
            ids.push(id.into());
            rows.push(normalize_row(&sequence));
        }

        let Some(first) = rows.first() else {
            return Err(AmplitileError::InvalidAlignment(
                "alignment contains no sequences".to_string(),
            ));
        };
        let columns = first.len();
        if columns == 0 {
            return Err(AmplitileError::InvalidAlignment(
                "alignment rows are empty".to_string(),
            ));
        }
        for (row, id) in rows.iter().zip(&ids) {
            if row.len() != columns {
                return Err(AmplitileError::InvalidAlignment(format!(
                    "row '{}' has length {} but the alignment has {} columns",
                    id,
                    row.len(),
                    columns
                )));
            }
        }

        Ok(Self { ids, rows, columns })
    }

    /// Read an aligned FASTA file.
    ///
    /// # Errors
    ///
    /// Returns [`AmplitileError::Io`] when the file cannot be opened,
    /// [`AmplitileError::Parse`] on malformed FASTA, and
    /// [`AmplitileError::InvalidAlignment`] when rows differ in length.
    pub fn from_fasta<P: AsRef<Path>>(path: P) -> Result<Self, AmplitileError> {
        let file = File::open(path)?;
        let reader = fasta::Reader::new(file);
        let mut records = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| AmplitileError::Parse(e.to_string()))?;
            records.push((record.id().to_string(), record.seq().to_vec()));
        }
        Self::new(records)
    }

    /// Number of aligned sequences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of alignment columns.
    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Sequence identifiers, in input order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Normalized lowercase rows, in input order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    /// Iterate over the bytes of one column.
    pub fn column(&self, index: usize) -> impl Iterator<Item = u8> + '_ {
        self.rows.iter().map(move |row| row[index])
    }
}

/// Lowercase the row, fold `.` into `-`, fold anything unrecognized into `n`.
fn normalize_row(sequence: &[u8]) -> Vec<u8> {
    sequence
        .iter()
        .map(|&byte| {
            let lower = byte.to_ascii_lowercase();
            if iupac::is_gap(lower) {
                b'-'
            } else if iupac::mask(lower) != 0 {
                lower
            } else {
                b'n'
            }
        })
        .collect()
}
