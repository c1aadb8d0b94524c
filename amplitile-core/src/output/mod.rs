//! Writers for the downstream file formats.
//!
//! The engine itself defines no wire format; these helpers serialize the
//! results for common consumers. Coordinates stay 0-based and half-open,
//! primer sequences are written 5'->3' on their own strand.

use std::io::Write;

use bio::bio_types::strand::Strand;

use crate::results::DesignResults;
use crate::types::AmplitileError;

/// Reference name used in coordinate-bearing outputs.
const CONSENSUS_NAME: &str = "consensus";

/// Write a consensus sequence as single-record FASTA, wrapped at 70
/// columns.
pub fn write_consensus_fasta<W: Write>(
    writer: &mut W,
    header: &str,
    sequence: &[u8],
) -> Result<(), AmplitileError> {
    writeln!(writer, ">{header}")?;
    for chunk in sequence.chunks(70) {
        writer.write_all(chunk)?;
        writeln!(writer)?;
    }
    Ok(())
}

/// Write the selected primers in BED format.
///
/// The score column carries the primer penalty scaled to an integer; the
/// name encodes the amplicon index and direction.
pub fn write_primer_bed<W: Write>(
    writer: &mut W,
    results: &DesignResults,
) -> Result<(), AmplitileError> {
    for (index, amplicon) in results.scheme.amplicons.iter().enumerate() {
        for primer in [&amplicon.forward, &amplicon.reverse] {
            let (suffix, strand) = match primer.strand {
                Strand::Forward => ("LEFT", '+'),
                Strand::Reverse => ("RIGHT", '-'),
                Strand::Unknown => ("UNKNOWN", '.'),
            };
            writeln!(
                writer,
                "{}\t{}\t{}\tAMPLICON_{}_{}\t{}\t{}",
                CONSENSUS_NAME,
                primer.start,
                primer.end,
                index,
                suffix,
                (primer.penalty * 100.0).round() as i64,
                strand
            )?;
        }
    }
    Ok(())
}

/// Write the amplicon scheme as a tab-separated table.
pub fn write_scheme_tsv<W: Write>(
    writer: &mut W,
    results: &DesignResults,
) -> Result<(), AmplitileError> {
    writeln!(
        writer,
        "amplicon\tstart\tend\tlength\tpenalty\tforward_primer\tforward_tm_mean\tforward_gc_mean\treverse_primer\treverse_tm_mean\treverse_gc_mean"
    )?;
    for (index, amplicon) in results.scheme.amplicons.iter().enumerate() {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{:.2}\t{}\t{:.1}\t{:.1}\t{}\t{:.1}\t{:.1}",
            index,
            amplicon.start(),
            amplicon.end(),
            amplicon.len(),
            amplicon.penalty(),
            amplicon.forward.sequence_str(),
            amplicon.forward.tm.mean,
            amplicon.forward.gc.mean * 100.0,
            amplicon.reverse.sequence_str(),
            amplicon.reverse.tm.mean,
            amplicon.reverse.gc.mean * 100.0,
        )?;
    }
    Ok(())
}

/// Write unresolved dimers as a tab-separated table.
pub fn write_dimer_tsv<W: Write>(
    writer: &mut W,
    results: &DesignResults,
) -> Result<(), AmplitileError> {
    writeln!(
        writer,
        "first_primer\tfirst_start\tsecond_primer\tsecond_start\tdimer_tm\tunsolvable"
    )?;
    for dimer in &results.unresolved_dimers {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{:.1}\t{}",
            dimer.first.sequence_str(),
            dimer.first.start,
            dimer.second.sequence_str(),
            dimer.second.start,
            dimer.tm,
            dimer.unsolvable,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primer::PrimerPools;
    use crate::results::{AlignmentInfo, DesignReport};
    use crate::scheme::AmpliconScheme;
    use crate::types::{Amplicon, PermutationStats, PrimerCandidate, PrimerDimer};

    fn primer(start: usize, end: usize, strand: Strand, sequence: &[u8]) -> PrimerCandidate {
        PrimerCandidate {
            region: 0,
            start,
            end,
            strand,
            sequence: sequence.to_vec(),
            primary: sequence.to_vec(),
            permutations: vec![sequence.to_vec()],
            gc: PermutationStats { min: 0.5, mean: 0.5, max: 0.5 },
            tm: PermutationStats { min: 58.0, mean: 60.0, max: 62.0 },
            penalty: 1.25,
        }
    }

    fn results() -> DesignResults {
        let forward = primer(0, 20, Strand::Forward, b"gattacagattacagatcgc");
        let reverse = primer(80, 100, Strand::Reverse, b"cgatcgatcgatcgatcgat");
        DesignResults {
            alignment_info: AlignmentInfo { sequences: 3, columns: 100, gc_content: 0.5 },
            ambiguous_consensus: vec![b'a'; 100],
            majority_consensus: vec![b'a'; 100],
            regions: vec![],
            pools: PrimerPools::new(),
            scheme: AmpliconScheme {
                amplicons: vec![Amplicon::new(forward.clone(), reverse.clone())],
            },
            gaps: vec![],
            unresolved_dimers: vec![PrimerDimer {
                first: forward,
                second: reverse,
                tm: 41.5,
                unsolvable: true,
            }],
            report: DesignReport::default(),
        }
    }

    #[test]
    fn test_consensus_fasta_wraps_lines() {
        let mut output = Vec::new();
        write_consensus_fasta(&mut output, "ambiguous_consensus", &vec![b'a'; 150]).unwrap();
        let text = String::from_utf8(output).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(">ambiguous_consensus"));
        assert_eq!(lines.next().map(str::len), Some(70));
        assert_eq!(lines.next().map(str::len), Some(70));
        assert_eq!(lines.next().map(str::len), Some(10));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_primer_bed_rows() {
        let mut output = Vec::new();
        write_primer_bed(&mut output, &results()).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("consensus\t0\t20\tAMPLICON_0_LEFT\t125\t+"));
        assert!(text.contains("consensus\t80\t100\tAMPLICON_0_RIGHT\t125\t-"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_scheme_tsv_has_header_and_row() {
        let mut output = Vec::new();
        write_scheme_tsv(&mut output, &results()).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with("amplicon\tstart\tend"));
        assert!(text.contains("0\t0\t100\t100\t2.50\tgattacagattacagatcgc"));
    }

    #[test]
    fn test_dimer_tsv_lists_unsolved_pairs() {
        let mut output = Vec::new();
        write_dimer_tsv(&mut output, &results()).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("gattacagattacagatcgc\t0\tcgatcgatcgatcgatcgat\t80\t41.5\ttrue"));
    }
}
