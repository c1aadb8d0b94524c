use std::marker::PhantomData;
use std::path::Path;

use bio::bio_types::strand::Strand;
use tracing::info;

use crate::alignment::Alignment;
use crate::config::DesignConfig;
use crate::consensus::{build_consensus, Consensus};
use crate::constants::LOW_COVERAGE_WARNING;
use crate::dimer::DimerChecker;
use crate::primer::{gc_fraction, generate_candidates, rank_pools};
use crate::regions::find_conserved_regions;
use crate::results::{AlignmentInfo, DesignEvent, DesignReport, DesignResults};
use crate::scheme::{assemble_scheme, resolve_conflicts};
use crate::thermo::ThermoModel;
use crate::types::{AmplitileError, ConservedRegion, PoolKey};

/// Marker trait for the designer's profiling state.
///
/// Part of the type-state pattern that forces the alignment profile
/// (consensus and conserved regions) to exist before primer design can run.
pub trait ProfileState {}

/// Marker type: no alignment has been profiled yet.
#[derive(Debug, Clone)]
pub struct Unprofiled;

/// Marker type: consensus and conserved regions are available.
#[derive(Debug, Clone)]
pub struct Profiled;

impl ProfileState for Unprofiled {}
impl ProfileState for Profiled {}

/// Derived per-alignment data the design stage runs on.
#[derive(Debug, Clone)]
struct Profile {
    consensus: Consensus,
    regions: Vec<ConservedRegion>,
    info: AlignmentInfo,
}

/// The scheme design engine.
///
/// Uses the type-state pattern with the `S` parameter: an
/// [`UnprofiledDesigner`] can only profile alignments, and profiling turns
/// it into a [`ProfiledDesigner`] that can design schemes and expose the
/// derived consensus data.
///
/// # Examples
///
/// ```rust,no_run
/// use amplitile_core::alignment::Alignment;
/// use amplitile_core::config::DesignConfig;
/// use amplitile_core::engine::UnprofiledDesigner;
///
/// let alignment = Alignment::from_fasta("variants.fasta")?;
/// let designer = UnprofiledDesigner::with_config(DesignConfig::default())?
///     .profile_alignment(&alignment)?;
/// let results = designer.design()?;
/// println!("{} amplicons", results.scheme.len());
/// # Ok::<(), amplitile_core::types::AmplitileError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Designer<S: ProfileState> {
    /// Configuration for all pipeline stages
    pub config: DesignConfig,
    profile: Option<Profile>,
    _state: PhantomData<S>,
}

/// Type alias for a designer that still needs an alignment profile.
pub type UnprofiledDesigner = Designer<Unprofiled>;

/// Type alias for a designer ready to produce schemes.
pub type ProfiledDesigner = Designer<Profiled>;

impl Default for UnprofiledDesigner {
    fn default() -> Self {
        Self::new()
    }
}

impl UnprofiledDesigner {
    /// Create a designer with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: DesignConfig::default(),
            profile: None,
            _state: PhantomData,
        }
    }

    /// Create a designer with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AmplitileError::InvalidConfig`] when the configuration is
    /// out of domain or the requested thread pool cannot be built.
    pub fn with_config(config: DesignConfig) -> Result<Self, AmplitileError> {
        config.validate()?;
        if let Some(num_threads) = config.num_threads {
            rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()
                .map_err(|e| {
                    AmplitileError::InvalidConfig(format!("failed to configure thread pool: {e}"))
                })?;
        }
        Ok(Self {
            config,
            profile: None,
            _state: PhantomData,
        })
    }

    /// Derive the consensus sequences and conserved regions of an
    /// alignment, turning this designer into a [`ProfiledDesigner`].
    ///
    /// # Errors
    ///
    /// Returns [`AmplitileError::InsufficientConservation`] when no region
    /// can hold a primer of the maximum configured size.
    pub fn profile_alignment(
        self,
        alignment: &Alignment,
    ) -> Result<ProfiledDesigner, AmplitileError> {
        info!(
            sequences = alignment.len(),
            columns = alignment.columns(),
            "profiling alignment"
        );
        let consensus = build_consensus(alignment, &self.config);
        let regions = find_conserved_regions(consensus.ambiguous(), &self.config);
        if regions.is_empty() {
            return Err(AmplitileError::InsufficientConservation {
                min_len: self.config.primer_size.max,
            });
        }

        let callable: Vec<u8> = consensus
            .majority()
            .iter()
            .copied()
            .filter(|&b| b != b'n')
            .collect();
        let info = AlignmentInfo {
            sequences: alignment.len(),
            columns: alignment.columns(),
            gc_content: gc_fraction(&callable),
        };
        info!(regions = regions.len(), "alignment profiled");

        Ok(Designer {
            config: self.config,
            profile: Some(Profile {
                consensus,
                regions,
                info,
            }),
            _state: PhantomData,
        })
    }
}

impl ProfiledDesigner {
    fn profile(&self) -> &Profile {
        self.profile.as_ref().expect("profiled designer holds a profile")
    }

    /// The derived consensus sequences.
    #[must_use]
    pub fn consensus(&self) -> &Consensus {
        &self.profile().consensus
    }

    /// The conserved regions primers may anchor in.
    #[must_use]
    pub fn regions(&self) -> &[ConservedRegion] {
        &self.profile().regions
    }

    /// Run candidate generation, filtering, assembly and conflict
    /// resolution.
    ///
    /// # Errors
    ///
    /// Returns [`AmplitileError::AmpliconSchemeFailure`] when not a single
    /// amplicon could be assembled. Partial coverage is not an error; gaps
    /// and unresolved dimers are reported in the results.
    pub fn design(&self) -> Result<DesignResults, AmplitileError> {
        let profile = self.profile();
        let config = &self.config;
        let model = ThermoModel::new(&config.salt);
        let mut report = DesignReport::default();

        info!("generating primer candidates");
        let candidates =
            generate_candidates(&profile.consensus, &profile.regions, config, &model);
        let pools = rank_pools(candidates, config, &model);

        for (region_index, _) in profile.regions.iter().enumerate() {
            for strand in [Strand::Forward, Strand::Reverse] {
                if !pools.contains_key(&PoolKey::new(region_index, strand)) {
                    report.push(DesignEvent::NoPrimerCandidates {
                        region: region_index,
                        strand,
                    });
                }
            }
        }

        info!(
            pools = pools.len(),
            primers = pools.values().map(Vec::len).sum::<usize>(),
            "assembling scheme"
        );
        let consensus_len = profile.consensus.len();
        let outcome = assemble_scheme(&pools, &profile.regions, consensus_len, config);
        let mut scheme = outcome.scheme;
        if scheme.is_empty() {
            return Err(AmplitileError::AmpliconSchemeFailure);
        }
        for gap in &outcome.gaps {
            report.push(DesignEvent::CoverageGap {
                start: gap.start,
                end: gap.end,
            });
        }

        let checker = DimerChecker::new(&model, config);
        let resolution = resolve_conflicts(&mut scheme, &pools, &checker, config);
        if resolution.budget_exhausted {
            report.push(DesignEvent::ResolutionBudgetExhausted {
                remaining: resolution
                    .unresolved
                    .iter()
                    .filter(|dimer| !dimer.unsolvable)
                    .count(),
            });
        }

        let coverage = scheme.coverage(consensus_len);
        if coverage < LOW_COVERAGE_WARNING {
            report.push(DesignEvent::LowCoverage { coverage });
        }

        info!(
            amplicons = scheme.len(),
            coverage_percent = coverage * 100.0,
            warnings = report.len(),
            "design finished"
        );
        Ok(DesignResults {
            alignment_info: profile.info.clone(),
            ambiguous_consensus: profile.consensus.ambiguous().to_vec(),
            majority_consensus: profile.consensus.majority().to_vec(),
            regions: profile.regions.clone(),
            pools,
            scheme,
            gaps: outcome.gaps,
            unresolved_dimers: resolution.unresolved,
            report,
        })
    }
}

/// Convenience front end running the whole pipeline in one call.
///
/// # Examples
///
/// ```rust,no_run
/// use amplitile_core::config::DesignConfig;
/// use amplitile_core::SchemeDesigner;
///
/// let designer = SchemeDesigner::new(DesignConfig::default())?;
/// let results = designer.design_fasta("variants.fasta")?;
/// println!("{} amplicons", results.scheme.len());
/// # Ok::<(), amplitile_core::types::AmplitileError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SchemeDesigner {
    config: DesignConfig,
}

impl SchemeDesigner {
    /// # Errors
    ///
    /// Returns [`AmplitileError::InvalidConfig`] for an invalid
    /// configuration.
    pub fn new(config: DesignConfig) -> Result<Self, AmplitileError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &DesignConfig {
        &self.config
    }

    /// Design a scheme for an in-memory alignment.
    ///
    /// # Errors
    ///
    /// Propagates every fatal pipeline error; see
    /// [`crate::types::AmplitileError`].
    pub fn design(&self, alignment: &Alignment) -> Result<DesignResults, AmplitileError> {
        UnprofiledDesigner::with_config(self.config.clone())?
            .profile_alignment(alignment)?
            .design()
    }

    /// Design a scheme for an aligned FASTA file.
    ///
    /// # Errors
    ///
    /// As [`Self::design`], plus I/O and parse errors from reading the
    /// file.
    pub fn design_fasta<P: AsRef<Path>>(&self, path: P) -> Result<DesignResults, AmplitileError> {
        let alignment = Alignment::from_fasta(path)?;
        self.design(&alignment)
    }
}
