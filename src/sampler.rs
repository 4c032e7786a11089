//! Rejection sampler with batch completion
//!
use crate::acceptance::{AcceptanceFilter, Verdict};
use crate::config::SamplerConfig;
use crate::envelope::Envelope;
use crate::mixture::MixtureSampler;
use crate::SamplerError;
use rand::distributions::Distribution;
use rand::Rng;
use std::ops::RangeInclusive;
use tracing::{debug, trace};

/// Counters collected while drawing a sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleStats {
    /// Proposal batches run
    pub batches: usize,
    /// Proposals drawn from the envelope
    pub proposals: usize,
    /// Proposals accepted by the squeeze test alone
    pub squeezed: usize,
    /// Evaluations of the density made by the full test
    pub evaluations: usize,
    /// Proposals accepted in total
    pub accepted: usize,
}

impl SampleStats {
    /// Fraction of proposals that were accepted
    pub fn acceptance_rate(&self) -> f64 {
        if self.proposals == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposals as f64
        }
    }
}

///
/// Exact sampler of an unnormalised Lipschitz-continuous density
///
/// Holds the envelope and the proposal mixture for a density `f` on `[a, b]`.
/// Both are built once on construction and reused by every request.
///
/// ```
/// # use lipschitz_sampler::{LipschitzSampler, SamplerConfig, SamplerError};
/// # use rand::SeedableRng;
/// # fn main() -> Result<(), SamplerError> {
/// let mut rng = rand::rngs::StdRng::seed_from_u64(2);
/// let config = SamplerConfig::default();
/// let sampler = LipschitzSampler::new(|x: f64| x * (2.0 - x), 2.0, 0.0..=2.0, &config)?;
///
/// let (values, stats) = sampler.sample_n(&mut rng, 1000)?;
/// assert_eq!(1000, values.len());
/// assert!(stats.accepted >= 1000);
/// # Ok(())}
/// ```
///
/// # Correctness
/// The samples are exact only if `lipschitz` bounds the true Lipschitz
/// constant of `f` on `[a, b]`. Nothing checks this.
///
#[derive(Debug, Clone)]
pub struct LipschitzSampler<F> {
    density: F,
    envelope: Envelope,
    mixture: MixtureSampler,
    max_batches: Option<usize>,
}

impl<F> LipschitzSampler<F>
where
    F: Fn(f64) -> f64,
{
    ///
    /// Build the envelope of `density` and the matching proposal mixture
    ///
    pub fn new(
        density: F,
        lipschitz: f64,
        range: RangeInclusive<f64>,
        config: &SamplerConfig,
    ) -> Result<Self, SamplerError> {
        let segments = config.segments(lipschitz)?;
        let envelope = Envelope::build(&density, lipschitz, range, segments)?;
        let mixture = MixtureSampler::from_envelope(&envelope)?;
        Ok(Self {
            density,
            envelope,
            mixture,
            max_batches: config.max_batches(),
        })
    }

    /// Envelope used for proposals
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    ///
    /// Number of proposals drawn in a batch meant to produce `m` samples
    ///
    /// $$ n_{prop} = \lceil (1 + s) m \rceil $$
    ///
    pub fn batch_size(&self, m: usize) -> usize {
        ((1.0 + self.envelope.oversampling()) * m as f64).ceil() as usize
    }

    ///
    /// Run a single batch aimed at `m` more samples
    ///
    /// Accepted values are appended to `out` until it holds `capacity`
    /// values. Remaining proposals of the batch are then discarded.
    ///
    fn run_batch<R>(
        &self,
        rng: &mut R,
        m: usize,
        capacity: usize,
        out: &mut Vec<f64>,
        stats: &mut SampleStats,
    ) -> Result<(), SamplerError>
    where
        R: Rng + ?Sized,
    {
        let filter = AcceptanceFilter::new(&self.envelope, &self.density);
        let size = self.batch_size(m);
        let before = out.len();

        for _ in 0..size {
            if out.len() >= capacity {
                break;
            }
            let u = self.mixture.sample(rng);
            let v: f64 = rng.gen();
            stats.proposals += 1;

            let verdict = filter.test(u, v)?;
            match verdict {
                Verdict::Squeezed => stats.squeezed += 1,
                Verdict::Accepted | Verdict::Rejected => stats.evaluations += 1,
            }
            if verdict.is_accepted() {
                stats.accepted += 1;
                out.push(self.envelope.from_unit(u));
            }
        }
        stats.batches += 1;

        trace!(
            batch = stats.batches,
            size,
            accepted = out.len() - before,
            "Batch finished"
        );
        Ok(())
    }

    ///
    /// Draw exactly `m` independent samples
    ///
    /// Runs batches sized for the current shortfall until `m` values are
    /// accepted. Fails with [SamplerError::Exhausted] if the configured
    /// batch limit is reached first, or with a density error if `f` returns
    /// an invalid value at a proposal.
    ///
    pub fn sample_n<R>(
        &self,
        rng: &mut R,
        m: usize,
    ) -> Result<(Vec<f64>, SampleStats), SamplerError>
    where
        R: Rng + ?Sized,
    {
        let mut values = Vec::with_capacity(m);
        let mut stats = SampleStats::default();

        while values.len() < m {
            if let Some(limit) = self.max_batches {
                if stats.batches >= limit {
                    return Err(SamplerError::Exhausted {
                        batches: stats.batches,
                        collected: values.len(),
                        requested: m,
                    });
                }
            }
            let shortfall = m - values.len();
            self.run_batch(rng, shortfall, m, &mut values, &mut stats)?;
        }

        debug!(
            requested = m,
            batches = stats.batches,
            proposals = stats.proposals,
            evaluations = stats.evaluations,
            "Sample complete"
        );
        Ok((values, stats))
    }
}

/// Draws a single sample
///
/// Proposals are drawn until one is accepted.
///
/// # Panics
/// If the density returns a negative or non-finite value at a proposal.
///
impl<F> Distribution<f64> for LipschitzSampler<F>
where
    F: Fn(f64) -> f64,
{
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let filter = AcceptanceFilter::new(&self.envelope, &self.density);
        loop {
            let u = self.mixture.sample(rng);
            let v: f64 = rng.gen();
            match filter.test(u, v) {
                Ok(verdict) if verdict.is_accepted() => return self.envelope.from_unit(u),
                Ok(_) => continue,
                Err(err) => panic!("{err}"),
            }
        }
    }
}
