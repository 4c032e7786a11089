//! Acceptance test of envelope proposals
//!
use crate::envelope::{check_density, Envelope};
use crate::SamplerError;

/// Outcome of testing a single proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Accepted by the squeeze curve, density was not evaluated
    Squeezed,
    /// Accepted after evaluating the density
    Accepted,
    /// Rejected after evaluating the density
    Rejected,
}

impl Verdict {
    pub fn is_accepted(self) -> bool {
        !matches!(self, Verdict::Rejected)
    }
}

///
/// Two-stage acceptance test of proposals drawn from the envelope
///
/// A proposal `u` with uniform `v` is accepted if `v E(u) < f(x)` where `E`
/// is the envelope and `x` the true coordinate of `u`. Since the squeeze
/// curve `B` never exceeds `f`, `v E(u) < B(u)` already implies acceptance and
/// the evaluation of `f` is skipped.
///
pub struct AcceptanceFilter<'a, F: ?Sized> {
    envelope: &'a Envelope,
    density: &'a F,
}

impl<'a, F> AcceptanceFilter<'a, F>
where
    F: Fn(f64) -> f64 + ?Sized,
{
    pub fn new(envelope: &'a Envelope, density: &'a F) -> Self {
        Self { envelope, density }
    }

    ///
    /// Test proposal `u ∈ [0, 1]` against acceptance uniform `v ∈ [0, 1)`
    ///
    /// Fails if the density had to be evaluated and returned a negative or
    /// non-finite value.
    ///
    pub fn test(&self, u: f64, v: f64) -> Result<Verdict, SamplerError> {
        let threshold = v * self.envelope.upper_at(u);

        if threshold < self.envelope.lower_at(u) {
            return Ok(Verdict::Squeezed);
        }

        let x = self.envelope.from_unit(u);
        let value = check_density(x, (self.density)(x))?;
        if threshold < value {
            Ok(Verdict::Accepted)
        } else {
            Ok(Verdict::Rejected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_squeeze_skips_evaluation() {
        let calls = Cell::new(0);
        let f = |x: f64| {
            calls.set(calls.get() + 1);
            1.0 + 0.5 * x
        };
        let env = Envelope::build(&f, 1.0, 0.0..=1.0, 10).unwrap();
        calls.set(0);

        let filter = AcceptanceFilter::new(&env, &f);

        // Envelope and squeeze lie 0.0375 above and below the density
        assert_eq!(Verdict::Squeezed, filter.test(0.5, 0.5).unwrap());
        assert_eq!(Verdict::Squeezed, filter.test(0.05, 0.0).unwrap());
        assert_eq!(0, calls.get());

        assert_eq!(Verdict::Rejected, filter.test(0.5, 0.99).unwrap());
        assert_eq!(1, calls.get());
    }

    #[test]
    fn test_full_evaluation() {
        // Envelope of a tent with a loose constant is well above the density
        let f = |x: f64| 1.0 - (x - 0.5).abs();
        let env = Envelope::build(&f, 4.0, 0.0..=1.0, 1).unwrap();
        let filter = AcceptanceFilter::new(&env, &f);

        // E(0.5) = 0.5 + h, f(0.5) = 1.0
        let e = env.upper_at(0.5);
        assert!(e > 1.0);
        assert_eq!(Verdict::Accepted, filter.test(0.5, 0.99 / e).unwrap());
        assert_eq!(Verdict::Rejected, filter.test(0.5, 1.01 / e).unwrap());
        assert!(filter.test(0.5, 0.2).unwrap().is_accepted());
        assert!(!Verdict::Rejected.is_accepted());
    }

    #[test]
    fn test_invalid_density_at_proposal() {
        // Valid on the grid nodes, negative in between
        let f = |x: f64| if (0.2..0.3).contains(&x) { -1.0 } else { 1.0 };
        let env = Envelope::build(&f, 1.0, 0.0..=1.0, 2).unwrap();
        let filter = AcceptanceFilter::new(&env, &f);

        assert!(matches!(
            filter.test(0.25, 0.9),
            Err(SamplerError::NegativeDensity { .. })
        ));
    }
}
