//! Exact sampling of 1D Lipschitz-continuous densities
//!
//! This crate draws independent samples from any non-negative, unnormalised
//! function `f` on a closed interval `[a, b]`, given a Lipschitz constant
//! `L` of `f`:
//!
//! $$ |f(x) - f(y)| \le L |x - y| $$
//!
//! It is an acceptance-rejection scheme. The proposal is a piecewise-linear
//! envelope built from the values of `f` on an even grid, raised just enough
//! for no `L`-Lipschitz function with these values to cross it. Proposals are
//! drawn from the envelope as a mixture of tent kernels, and a matching
//! lower bound (the squeeze curve) accepts most of them without evaluating
//! `f` again.
//!
//! ```
//! # use lipschitz_sampler::{sample, SamplerConfig, SamplerError};
//! # use rand::SeedableRng;
//! # fn main() -> Result<(), SamplerError> {
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//! let config = SamplerConfig::default();
//! let drawn = sample(|x: f64| x.abs(), 1.0, -1.0..=1.0, 100, &config, &mut rng)?;
//!
//! assert_eq!(100, drawn.values.len());
//! assert_eq!(drawn.grid_x.len(), drawn.grid_y.len());
//! # Ok(())}
//! ```
//!
//! # Correctness
//! The output is exact only if `L` is not smaller than the true Lipschitz
//! constant of `f` on `[a, b]`. A too small `L` is not detected in general
//! and results in a biased sample.
//!
use rand::distributions::WeightedError;
use rand::Rng;
use std::ops::RangeInclusive;
use thiserror::Error;

pub mod acceptance;
pub mod config;
pub mod envelope;
pub mod mixture;
pub mod sampler;

pub use config::SamplerConfig;
pub use envelope::Envelope;
pub use sampler::{LipschitzSampler, SampleStats};

#[derive(Error, Debug)]
pub enum SamplerError {
    #[error("Interval [{start}, {end}] is not a finite interval with start < end")]
    InvalidInterval { start: f64, end: f64 },
    #[error("Lipschitz constant {0} is not a finite non-negative number")]
    InvalidLipschitz(f64),
    #[error("Envelope grid needs at least one segment")]
    ZeroSegments,
    #[error("Negative value {value} of probability density function at {x}")]
    NegativeDensity { x: f64, value: f64 },
    #[error("Non-finite value {value} of probability density function at {x}")]
    NonFiniteDensity { x: f64, value: f64 },
    #[error("Envelope is zero everywhere, there is nothing to sample")]
    EmptyEnvelope,
    #[error(transparent)]
    Categorical(#[from] WeightedError),
    #[error("Only {collected} of {requested} samples accepted after {batches} batches")]
    Exhausted {
        batches: usize,
        collected: usize,
        requested: usize,
    },
}

///
/// Sample drawn by [sample] together with the envelope it was drawn from
///
#[derive(Debug, Clone)]
pub struct Sample {
    /// Exactly the requested number of values in `[a, b]`
    pub values: Vec<f64>,
    /// Nodes of the envelope grid
    pub grid_x: Vec<f64>,
    /// Envelope values at the nodes
    pub grid_y: Vec<f64>,
    pub stats: SampleStats,
}

///
/// Draw `m` independent samples from the unnormalised `density` on `range`
///
/// # Arguments
/// - `density` - non-negative function, need not integrate to one
/// - `lipschitz` - Lipschitz constant of `density` on `range`
/// - `range` - closed interval `[a, b]` with `a < b`
/// - `m` - number of samples
/// - `config` - segment count and batch limit
/// - `rng` - source of uniform random numbers
///
/// For `m = 0` only the envelope is built.
///
pub fn sample<F, R>(
    density: F,
    lipschitz: f64,
    range: RangeInclusive<f64>,
    m: usize,
    config: &SamplerConfig,
    rng: &mut R,
) -> Result<Sample, SamplerError>
where
    F: Fn(f64) -> f64,
    R: Rng + ?Sized,
{
    if m == 0 {
        let segments = config.segments(lipschitz)?;
        let envelope = Envelope::build(&density, lipschitz, range, segments)?;
        return Ok(Sample {
            values: Vec::new(),
            grid_x: envelope.grid().to_vec(),
            grid_y: envelope.upper_values().to_vec(),
            stats: SampleStats::default(),
        });
    }

    let sampler = LipschitzSampler::new(density, lipschitz, range, config)?;
    let (values, stats) = sampler.sample_n(rng, m)?;
    let envelope = sampler.envelope();
    Ok(Sample {
        values,
        grid_x: envelope.grid().to_vec(),
        grid_y: envelope.upper_values().to_vec(),
        stats,
    })
}
