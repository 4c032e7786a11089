//! Options of a sampling call
//!
use crate::SamplerError;

///
/// Configuration passed to [crate::sample] and [crate::LipschitzSampler::new]
///
/// All fields are optional. An unset segment count is computed from the
/// Lipschitz constant at build time (see [SamplerConfig::default_segments]).
///
/// ```
/// # use lipschitz_sampler::SamplerConfig;
/// let config = SamplerConfig::new().with_segments(50).with_max_batches(10);
/// assert_eq!(config.segments(3.0).unwrap(), 50);
/// assert_eq!(config.max_batches(), Some(10));
/// ```
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SamplerConfig {
    segments: Option<usize>,
    max_batches: Option<usize>,
}

impl SamplerConfig {
    /// Configuration with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the number of segments of the envelope grid
    ///
    /// The grid then has `segments + 1` points. Zero is rejected when the
    /// envelope is built.
    ///
    pub fn with_segments(mut self, segments: usize) -> Self {
        self.segments = Some(segments);
        self
    }

    /// Limit the number of proposal batches a single request may run
    ///
    /// If the limit is hit before enough samples are accepted the request
    /// fails with [SamplerError::Exhausted].
    ///
    pub fn with_max_batches(mut self, max_batches: usize) -> Self {
        self.max_batches = Some(max_batches);
        self
    }

    /// Default number of segments for a Lipschitz constant
    ///
    /// $$ n = \lceil 200 L \rceil + 200 $$
    ///
    pub fn default_segments(lipschitz: f64) -> usize {
        ((200.0 * lipschitz).ceil() as usize).saturating_add(200)
    }

    /// Resolve the segment count for a Lipschitz constant
    ///
    pub fn segments(&self, lipschitz: f64) -> Result<usize, SamplerError> {
        match self.segments {
            Some(0) => Err(SamplerError::ZeroSegments),
            Some(n) => Ok(n),
            None => Ok(Self::default_segments(lipschitz)),
        }
    }

    /// Batch limit, `None` if unbounded
    pub fn max_batches(&self) -> Option<usize> {
        self.max_batches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_segments() {
        assert_eq!(200, SamplerConfig::default_segments(0.0));
        assert_eq!(400, SamplerConfig::default_segments(1.0));
        assert_eq!(401, SamplerConfig::default_segments(1.001));
        assert_eq!(
            SamplerConfig::default_segments(2.5),
            SamplerConfig::new().segments(2.5).unwrap()
        );
    }

    #[test]
    fn test_explicit_segments() {
        let config = SamplerConfig::new().with_segments(7);
        assert_eq!(7, config.segments(100.0).unwrap());
        assert_eq!(None, config.max_batches());
    }

    #[test]
    fn test_zero_segments() {
        assert!(matches!(
            SamplerConfig::new().with_segments(0).segments(1.0),
            Err(SamplerError::ZeroSegments)
        ));
    }
}
