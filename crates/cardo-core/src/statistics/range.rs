//! Range view of a column statistic.

use super::column::ColumnStatistic;
use super::math::clamp_count;
use serde::{Deserialize, Serialize};

/// A column's value domain viewed as `[low, high]` with an associated
/// distinct-value density.
///
/// This is the ephemeral working representation behind filter narrowing and
/// set-operation combination: build one from a [`ColumnStatistic`], combine,
/// and write the result back. Unknown bounds are `None` and behave as
/// unbounded for intersection purposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticRange {
    /// Lower bound, unknown if `None`.
    pub low: Option<f64>,
    /// Upper bound, unknown if `None`.
    pub high: Option<f64>,
    /// Distinct values inside the range, unknown if `None`.
    pub distinct: Option<f64>,
}

impl StatisticRange {
    /// Creates a range from explicit bounds.
    #[must_use]
    pub fn new(low: Option<f64>, high: Option<f64>, distinct: Option<f64>) -> Self {
        Self { low, high, distinct }
    }

    /// Builds the range view of a column statistic.
    #[must_use]
    pub fn from_column(stat: &ColumnStatistic) -> Self {
        Self {
            low: stat.min_value,
            high: stat.max_value,
            distinct: stat.ndv,
        }
    }

    /// Both bounds known and ordered.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        matches!((self.low, self.high), (Some(l), Some(h)) if h >= l)
    }

    /// Width of the range when bounded.
    #[must_use]
    pub fn width(&self) -> Option<f64> {
        match (self.low, self.high) {
            (Some(l), Some(h)) => Some((h - l).max(0.0)),
            _ => None,
        }
    }

    /// Whether a point lies inside the range. Unknown bounds are unbounded.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.low.is_none_or(|l| value >= l) && self.high.is_none_or(|h| value <= h)
    }

    /// Fraction of this range's width covered by the intersection with
    /// `other`, clamped to `[0, 1]`. Unknown when this range is unbounded.
    ///
    /// A zero-width range is covered fully or not at all, depending on
    /// whether its single point survives the intersection.
    #[must_use]
    pub fn overlap_fraction(&self, other: &Self) -> Option<f64> {
        let (l1, h1) = (self.low?, self.high?);
        let lo = other.low.map_or(l1, |l2| l1.max(l2));
        let hi = other.high.map_or(h1, |h2| h1.min(h2));
        let width = h1 - l1;
        if width <= 0.0 {
            return Some(if hi >= lo { 1.0 } else { 0.0 });
        }
        Some(((hi - lo).max(0.0) / width).clamp(0.0, 1.0))
    }

    /// Narrows this range to its intersection with `other`.
    ///
    /// The distinct count scales with the fraction of this range that
    /// survives, under the uniformity assumption. An empty intersection
    /// collapses to a zero-width, zero-distinct range.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let low = opt_max(self.low, other.low);
        let high = opt_min(self.high, other.high);
        if let (Some(l), Some(h)) = (low, high) {
            if h < l {
                return Self {
                    low: Some(l),
                    high: Some(l),
                    distinct: Some(0.0),
                };
            }
        }
        let distinct = match (self.distinct, self.overlap_fraction(other)) {
            (Some(d), Some(f)) => Some(clamp_count(d * f)),
            (Some(d), None) => Some(other.distinct.map_or(d, |o| d.min(o))),
            (None, _) => None,
        };
        Self { low, high, distinct }
    }

    /// Widens this range to its union with `other`.
    ///
    /// The combined distinct count is the sum of both operands' counts,
    /// reduced by the fraction of the combined domain the two ranges share:
    /// fully overlapping ranges do not double-count shared values, disjoint
    /// ranges sum exactly. A degenerate operand (unknown bound, zero width)
    /// falls back to the non-degenerate operand's values.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if self == other {
            return self.clone();
        }
        let self_usable = self.is_bounded() && self.width().unwrap_or(0.0) > 0.0;
        let other_usable = other.is_bounded() && other.width().unwrap_or(0.0) > 0.0;
        match (self_usable, other_usable) {
            (true, true) => {
                let (l1, h1) = (self.low.unwrap_or(0.0), self.high.unwrap_or(0.0));
                let (l2, h2) = (other.low.unwrap_or(0.0), other.high.unwrap_or(0.0));
                let low = l1.min(l2);
                let high = h1.max(h2);
                let overlap = (h1.min(h2) - l1.max(l2)).max(0.0);
                let shared = (overlap / (high - low)).clamp(0.0, 1.0);
                let distinct = match (self.distinct, other.distinct) {
                    (Some(a), Some(b)) => Some(clamp_count(a + b - shared * a.min(b))),
                    (Some(a), None) | (None, Some(a)) => Some(a),
                    (None, None) => None,
                };
                Self {
                    low: Some(low),
                    high: Some(high),
                    distinct,
                }
            }
            (false, true) => other.clone(),
            (true, false) => self.clone(),
            (false, false) => Self {
                low: opt_min(self.low, other.low),
                high: opt_max(self.high, other.high),
                distinct: match (self.distinct, other.distinct) {
                    (Some(a), Some(b)) => Some(a + b),
                    (Some(a), None) | (None, Some(a)) => Some(a),
                    (None, None) => None,
                },
            },
        }
    }
}

fn opt_min(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

fn opt_max(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}
