//! Piecewise-linear bounds of a Lipschitz function
//!
//! Knowing the values of `f` on a grid and its Lipschitz constant `L`, every
//! point between two neighbouring nodes is confined to the parallelogram
//! formed by the lines of slope `±L` through both nodes. Raising (lowering)
//! the secant by the height of that parallelogram above (below) it yields a
//! pair of piecewise-linear curves that bound `f` on the whole interval.
//!
use crate::SamplerError;
use std::ops::RangeInclusive;
use tracing::{debug, warn};

///
/// Upper (envelope) and lower (squeeze) piecewise-linear bounds of a density
///
/// Both curves share an evenly spaced grid of `n + 1` nodes over `[a, b]`.
///
#[derive(Debug, Clone)]
pub struct Envelope {
    start: f64,
    end: f64,
    lipschitz: f64,
    grid: Vec<f64>,
    upper: Vec<f64>,
    lower: Vec<f64>,
}

///
/// Height of the Lipschitz cone over the secant of a single segment
///
/// The cone edges through the segment ends have slopes `±L`. With
/// `α = atan(L)` and `β = |atan(k)|`, the law of sines in the triangle made by
/// the secant and the cone edges places the apex at the horizontal distance
/// `r = w (L + |k|) / 2L` from the lower end. The apex lies `r (L - |k|)`
/// above the secant.
///
/// Returns zero for `L = 0` and for secants steeper than `L`.
///
fn cone_height(lipschitz: f64, slope: f64, width: f64) -> f64 {
    if lipschitz <= 0.0 {
        return 0.0;
    }
    let steepness = slope.abs();
    let radius = 0.5 * width * (lipschitz + steepness) / lipschitz;
    f64::max(radius * (lipschitz - steepness), 0.0)
}

///
/// Linear interpolation of values given on `[0, 1]` split into even segments
///
/// `u` is clamped to `[0, 1]`. Needs at least two values.
///
fn interpolate(values: &[f64], u: f64) -> f64 {
    let n = values.len() - 1;
    let pos = u.clamp(0.0, 1.0) * n as f64;
    let idx = (pos.floor() as usize).min(n - 1);
    let t = pos - idx as f64;
    values[idx] + t * (values[idx + 1] - values[idx])
}

///
/// Check that the density returned a valid value at `x`
///
pub(crate) fn check_density(x: f64, value: f64) -> Result<f64, SamplerError> {
    if !value.is_finite() {
        Err(SamplerError::NonFiniteDensity { x, value })
    } else if value < 0.0 {
        Err(SamplerError::NegativeDensity { x, value })
    } else {
        Ok(value)
    }
}

///
/// Validate the interval and Lipschitz constant of a request
///
pub(crate) fn check_inputs(
    lipschitz: f64,
    range: &RangeInclusive<f64>,
) -> Result<(), SamplerError> {
    let (start, end) = (*range.start(), *range.end());
    if !(start.is_finite() && end.is_finite()) || start >= end {
        return Err(SamplerError::InvalidInterval { start, end });
    }
    if !lipschitz.is_finite() || lipschitz < 0.0 {
        return Err(SamplerError::InvalidLipschitz(lipschitz));
    }
    Ok(())
}

impl Envelope {
    ///
    /// Build the bounds of `density` over `range` with `segments` segments
    ///
    /// Evaluates `density` exactly `segments + 1` times.
    ///
    /// # Correctness
    /// The bounds are only guaranteed if `lipschitz` is not smaller than the
    /// true Lipschitz constant of `density` on `range`. This cannot be
    /// verified in general. A secant steeper than `lipschitz` is reported as a
    /// warning and its adjustment is set to zero.
    ///
    pub fn build<F>(
        density: &F,
        lipschitz: f64,
        range: RangeInclusive<f64>,
        segments: usize,
    ) -> Result<Self, SamplerError>
    where
        F: Fn(f64) -> f64 + ?Sized,
    {
        check_inputs(lipschitz, &range)?;
        if segments == 0 {
            return Err(SamplerError::ZeroSegments);
        }
        let (start, end) = range.into_inner();
        let width = end - start;
        let step = width / segments as f64;

        let mut grid: Vec<f64> = (0..segments).map(|i| start + i as f64 * step).collect();
        grid.push(end);

        let values = grid
            .iter()
            .map(|&x| check_density(x, density(x)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut steep = 0;
        let heights = values
            .windows(2)
            .map(|w| {
                let slope = (w[1] - w[0]) / step;
                if slope.abs() > lipschitz * (1.0 + 1e-12) {
                    steep += 1;
                }
                cone_height(lipschitz, slope, step)
            })
            .collect::<Vec<_>>();

        if steep > 0 {
            warn!(
                steep,
                lipschitz, "Secant slopes exceed the Lipschitz constant, envelope may not dominate"
            );
        }

        // Nodes take the larger adjustment of the segments they touch
        let mut upper = values.clone();
        let mut lower = values;
        for (i, (u, l)) in std::iter::zip(upper.iter_mut(), lower.iter_mut()).enumerate() {
            let left = if i > 0 { heights[i - 1] } else { 0.0 };
            let right = heights.get(i).copied().unwrap_or(0.0);
            let h = left.max(right);
            *u += h;
            *l -= h;
        }

        let envelope = Self {
            start,
            end,
            lipschitz,
            grid,
            upper,
            lower,
        };
        debug!(
            segments,
            mass = envelope.mass(),
            oversampling = envelope.oversampling(),
            "Envelope built"
        );
        Ok(envelope)
    }

    /// Number of segments of the grid
    pub fn segments(&self) -> usize {
        self.grid.len() - 1
    }

    /// Interval covered by the envelope
    pub fn range(&self) -> RangeInclusive<f64> {
        self.start..=self.end
    }

    /// Lipschitz constant the envelope was built with
    pub fn lipschitz(&self) -> f64 {
        self.lipschitz
    }

    /// Nodes of the grid in true coordinates
    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    /// Envelope values at the nodes
    pub fn upper_values(&self) -> &[f64] {
        &self.upper
    }

    /// Squeeze values at the nodes
    pub fn lower_values(&self) -> &[f64] {
        &self.lower
    }

    /// Map a point of `[a, b]` into `[0, 1]`
    pub fn to_unit(&self, x: f64) -> f64 {
        (x - self.start) / (self.end - self.start)
    }

    /// Map a point of `[0, 1]` into `[a, b]`
    pub fn from_unit(&self, u: f64) -> f64 {
        (self.end - self.start) * u + self.start
    }

    /// Envelope at a normalised coordinate
    pub fn upper_at(&self, u: f64) -> f64 {
        interpolate(&self.upper, u)
    }

    /// Squeeze curve at a normalised coordinate
    pub fn lower_at(&self, u: f64) -> f64 {
        interpolate(&self.lower, u)
    }

    /// Envelope at a point of `[a, b]`
    pub fn upper_at_x(&self, x: f64) -> f64 {
        self.upper_at(self.to_unit(x))
    }

    /// Squeeze curve at a point of `[a, b]`
    pub fn lower_at_x(&self, x: f64) -> f64 {
        self.lower_at(self.to_unit(x))
    }

    ///
    /// Expected relative excess of envelope over the density
    ///
    /// $$ s = \frac{(b - a) L}{2 n} $$
    ///
    /// Each batch draws `(1 + s)` proposals per requested sample.
    ///
    pub fn oversampling(&self) -> f64 {
        (self.end - self.start) * self.lipschitz / (2.0 * self.segments() as f64)
    }

    /// Integral of the envelope over `[a, b]`
    pub fn mass(&self) -> f64 {
        let step = (self.end - self.start) / self.segments() as f64;
        self.upper.windows(2).map(|w| 0.5 * (w[0] + w[1]) * step).sum()
    }
}
