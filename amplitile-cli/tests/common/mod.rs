#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// A conserved 31-mer with balanced GC whose primer-sized windows melt in
/// the default temperature range.
pub const MOTIF: &str = "gactgcaatgcgtacgttagcatgcaagctt";

/// Write an aligned FASTA of identical rows built from repeats of `MOTIF`.
pub fn write_alignment(dir: &Path, rows: usize, columns: usize) -> PathBuf {
    let mut sequence = MOTIF.repeat(columns / MOTIF.len() + 1);
    sequence.truncate(columns);

    let mut fasta = String::new();
    for row in 0..rows {
        fasta.push_str(&format!(">variant_{row}\n{sequence}\n"));
    }
    let path = dir.join("alignment.fasta");
    fs::write(&path, fasta).unwrap();
    path
}

/// Run the amplitile binary against an alignment file.
pub fn run_amplitile(alignment: &Path, output: &Path, extra_args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("amplitile").unwrap();
    cmd.arg(alignment)
        .arg("-o")
        .arg(output)
        .args(extra_args);
    cmd.assert()
}

/// Fresh working directory for one test.
pub fn workspace() -> TempDir {
    TempDir::new().unwrap()
}
