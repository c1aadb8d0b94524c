//! # Amplitile - Tiling Amplicon Scheme Designer
//!
//! Amplitile designs tiling PCR amplicon schemes from a multiple-sequence
//! alignment of genome variants. A small number of degenerate primer pairs
//! is selected so that overlapping amplicons cover as much of the genome as
//! possible despite sequence variability.
//!
//! ## Overview
//!
//! The pipeline is a strict forward data flow:
//!
//! 1. **Consensus**: per-column frequency vectors turn the alignment into
//!    an ambiguous (IUPAC) and a majority consensus.
//! 2. **Conserved regions**: stretches of the ambiguous consensus clean
//!    enough to anchor primers.
//! 3. **Candidates**: every primer-sized window is expanded over its
//!    ambiguity codes, scored thermodynamically and penalized.
//! 4. **Pools**: 3'-end constraints, then penalty-ranked pools per
//!    (region, strand).
//! 5. **Assembly**: left-to-right tiling under length and overlap
//!    constraints, with gaps recorded instead of failing.
//! 6. **Conflict resolution**: predicted primer dimers are cleared by
//!    substitution where possible and reported otherwise.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use amplitile_core::{config::DesignConfig, SchemeDesigner};
//!
//! let designer = SchemeDesigner::new(DesignConfig::default())?;
//! let results = designer.design_fasta("variants.fasta")?;
//!
//! println!(
//!     "{} amplicons covering {:.1}% of the consensus",
//!     results.scheme.len(),
//!     results.coverage() * 100.0
//! );
//! for dimer in &results.unresolved_dimers {
//!     eprintln!("unresolved: {dimer}");
//! }
//! # Ok::<(), amplitile_core::types::AmplitileError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`alignment`]: alignment input and validation
//! - [`config`]: all numeric knobs of the pipeline
//! - [`consensus`]: ambiguous and majority consensus derivation
//! - [`regions`]: conserved-region discovery
//! - [`iupac`]: IUPAC codes as 4-bit base sets
//! - [`thermo`]: nearest-neighbor melting temperatures, hairpins, dimers
//! - [`primer`]: candidate generation, scoring and ranked pools
//! - [`dimer`]: pairwise dimer conflict detection
//! - [`scheme`]: tiling assembly and conflict resolution
//! - [`results`]: run results and the non-fatal event report
//! - [`output`]: BED/TSV/FASTA writers for downstream consumers
//! - [`engine`]: the type-state design engine
//!
//! ## Error Handling
//!
//! Fatal conditions (empty alignment, nothing conserved, zero amplicons)
//! return [`types::AmplitileError`]; recoverable ones (a region without
//! candidates, coverage gaps, unresolved dimers) are accumulated in
//! [`results::DesignReport`] next to the partial result.

pub mod alignment;
pub mod config;
pub mod consensus;
pub mod constants;
pub mod dimer;
pub mod engine;
pub mod iupac;
pub mod output;
pub mod primer;
pub mod regions;
pub mod results;
pub mod scheme;
pub mod thermo;
pub mod types;

pub use engine::SchemeDesigner;
