//! Proposal distribution shaped like the envelope
//!
//! A continuous piecewise-linear function on an even grid is a sum of tent
//! functions, one per node, scaled by the node values. Sampling the envelope
//! thus reduces to picking a tent with probability proportional to its area
//! and drawing from a symmetric triangular distribution around its node.
//!
use crate::envelope::Envelope;
use crate::SamplerError;
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::Rng;

///
/// Mixture of tent kernels centred on the nodes of an envelope
///
/// Samples are given in the normalised coordinate `u ∈ [0, 1]`.
///
#[derive(Debug, Clone)]
pub struct MixtureSampler {
    kernels: WeightedIndex<f64>,
    segments: usize,
}

impl MixtureSampler {
    ///
    /// Create the mixture from node values of a piecewise-linear function
    ///
    /// Only half of the boundary tents lies inside `[0, 1]`, hence their
    /// weights are halved. The folded half is recovered in [Self::sample] by
    /// reflection at the ends of the interval.
    ///
    /// Fails with [SamplerError::EmptyEnvelope] if all values are zero.
    ///
    pub fn new(values: &[f64]) -> Result<Self, SamplerError> {
        if values.len() < 2 {
            return Err(SamplerError::ZeroSegments);
        }
        let segments = values.len() - 1;

        let mut weights = values.to_vec();
        weights[0] *= 0.5;
        weights[segments] *= 0.5;

        let kernels = WeightedIndex::new(&weights).map_err(|err| match err {
            WeightedError::AllWeightsZero => SamplerError::EmptyEnvelope,
            err => SamplerError::Categorical(err),
        })?;
        Ok(Self { kernels, segments })
    }

    /// Create the mixture matching the upper bound of an envelope
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, SamplerError> {
        Self::new(envelope.upper_values())
    }

    /// Number of segments (number of kernels less one)
    pub fn segments(&self) -> usize {
        self.segments
    }
}

/// Draws a normalised proposal location
///
/// The sum of two uniforms is triangular on `[0, 2]`, shifted to be centred on
/// the selected node. Offsets outside `[0, 1]` are reflected back.
///
impl Distribution<f64> for MixtureSampler {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let idx = self.kernels.sample(rng);
        let u1: f64 = rng.gen();
        let u2: f64 = rng.gen();

        let u = ((u1 + u2 + idx as f64 - 1.0) / self.segments as f64).abs();
        if u > 1.0 {
            2.0 - u
        } else {
            u
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stat_tests::ks1_test;
    use rand::SeedableRng;

    /// Normalised CDF of the piecewise-linear function through `values`
    fn piecewise_linear_cdf(values: &[f64], u: f64) -> f64 {
        let n = values.len() - 1;
        let step = 1.0 / n as f64;
        let area =
            |j: usize, t: f64| step * (values[j] * t + 0.5 * (values[j + 1] - values[j]) * t * t);
        let total: f64 = (0..n).map(|j| area(j, 1.0)).sum();

        let pos = u.clamp(0.0, 1.0) * n as f64;
        let idx = (pos.floor() as usize).min(n - 1);
        let full: f64 = (0..idx).map(|j| area(j, 1.0)).sum();
        let partial = full + area(idx, pos - idx as f64);
        partial / total
    }

    #[test]
    fn test_reference_cdf() {
        let values = [1.0, 3.0, 2.0];
        approx::assert_relative_eq!(0.0, piecewise_linear_cdf(&values, 0.0));
        approx::assert_relative_eq!(4.0 / 9.0, piecewise_linear_cdf(&values, 0.5));
        approx::assert_relative_eq!(1.0, piecewise_linear_cdf(&values, 1.0));
    }

    #[test]
    fn test_proposals_follow_envelope() {
        let cases = [
            vec![1.0, 3.0, 2.0],
            vec![1.0, 1.0],
            vec![0.0, 5.0, 0.0, 0.1, 2.0],
            vec![4.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
        ];
        let mut rng = rand::rngs::StdRng::seed_from_u64(31337);

        for values in cases {
            let mixture = MixtureSampler::new(&values).unwrap();
            let samples: Vec<f64> = (0..50_000).map(|_| mixture.sample(&mut rng)).collect();
            assert!(samples.iter().all(|u| (0.0..=1.0).contains(u)));

            let res = ks1_test(|u| piecewise_linear_cdf(&values, *u), samples).unwrap();
            println!("{values:?} {res:?}");
            assert!(res.p_value() > 0.001);
        }
    }

    #[test]
    fn test_boundary_weights_are_halved() {
        // Flat function: the mixture must be uniform, not heavier at the ends
        let mixture = MixtureSampler::new(&[1.0; 5]).unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let n = 100_000;
        let near_ends = (0..n)
            .map(|_| mixture.sample(&mut rng))
            .filter(|u| *u < 0.1 || *u > 0.9)
            .count();
        approx::assert_abs_diff_eq!(0.2, near_ends as f64 / n as f64, epsilon = 0.01);
    }

    #[test]
    fn test_invalid_weights() {
        assert!(matches!(
            MixtureSampler::new(&[0.0, 0.0, 0.0]),
            Err(SamplerError::EmptyEnvelope)
        ));
        assert!(matches!(
            MixtureSampler::new(&[1.0]),
            Err(SamplerError::ZeroSegments)
        ));
        assert!(matches!(
            MixtureSampler::new(&[1.0, -2.0, 1.0]),
            Err(SamplerError::Categorical(_))
        ));
    }
}
