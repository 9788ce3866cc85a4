//! Parametric membership terms.

use serde::{Deserialize, Serialize};

/// The parametric function behind a linguistic term.
///
/// Antecedent terms map a crisp value into `[0, 1]`. `Constant` and
/// `Linear` double as Sugeno consequents: a crisp value or an affine
/// function of the engine's inputs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TermKind {
    /// Generalized bell: `1 / (1 + |(x - center) / width|^(2 slope))`.
    Bell { center: f64, width: f64, slope: f64 },
    /// Hyperbolically saturating curve, rising when `inflection <= end`.
    Concave { inflection: f64, end: f64 },
    /// A crisp constant; ignores its argument.
    Constant { value: f64 },
    /// Raised cosine over `[center - width/2, center + width/2]`.
    Cosine { center: f64, width: f64 },
    /// Piecewise-linear interpolation through `(x, y)` pairs with
    /// strictly increasing `x`, clamped at both ends.
    Discrete { pairs: Vec<(f64, f64)> },
    /// Affine consequent: one coefficient per engine input, bias last.
    Linear { coefficients: Vec<f64> },
    /// Linear ramp between `start` and `end`, rising or falling.
    Ramp { start: f64, end: f64 },
    /// Logistic curve: `1 / (1 + e^(-slope (x - inflection)))`.
    Sigmoid { inflection: f64, slope: f64 },
    /// Smooth S-shaped polynomial spline between `start` and `end`.
    SShape { start: f64, end: f64 },
    /// Triangle with vertices `a <= b <= c`.
    Triangle { a: f64, b: f64, c: f64 },
    /// Smooth Z-shaped polynomial spline between `start` and `end`.
    ZShape { start: f64, end: f64 },
}

impl TermKind {
    /// Class name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            TermKind::Bell { .. } => "Bell",
            TermKind::Concave { .. } => "Concave",
            TermKind::Constant { .. } => "Constant",
            TermKind::Cosine { .. } => "Cosine",
            TermKind::Discrete { .. } => "Discrete",
            TermKind::Linear { .. } => "Linear",
            TermKind::Ramp { .. } => "Ramp",
            TermKind::Sigmoid { .. } => "Sigmoid",
            TermKind::SShape { .. } => "SShape",
            TermKind::Triangle { .. } => "Triangle",
            TermKind::ZShape { .. } => "ZShape",
        }
    }

    /// Membership degree at `x`.
    ///
    /// `Linear` has no scalar membership; it yields NaN here and is
    /// evaluated through [`TermKind::consequent_value`] instead.
    pub fn membership(&self, x: f64) -> f64 {
        match self {
            TermKind::Bell {
                center,
                width,
                slope,
            } => 1.0 / (1.0 + ((x - center) / width).abs().powf(2.0 * slope)),
            TermKind::Concave { inflection, end } => {
                if inflection <= end {
                    if x < *end {
                        (end - inflection) / (2.0 * end - inflection - x)
                    } else {
                        1.0
                    }
                } else if x > *end {
                    (inflection - end) / (inflection - 2.0 * end + x)
                } else {
                    1.0
                }
            }
            TermKind::Constant { value } => *value,
            TermKind::Cosine { center, width } => {
                if x < center - width / 2.0 || x > center + width / 2.0 {
                    0.0
                } else {
                    0.5 * (1.0 + (2.0 / width * std::f64::consts::PI * (x - center)).cos())
                }
            }
            TermKind::Discrete { pairs } => {
                if pairs.is_empty() {
                    return f64::NAN;
                }
                let (x0, y0) = pairs[0];
                let (xn, yn) = pairs[pairs.len() - 1];
                if x <= x0 {
                    return y0;
                }
                if x >= xn {
                    return yn;
                }
                let upper = pairs
                    .iter()
                    .position(|&(px, _)| px >= x)
                    .unwrap_or(pairs.len() - 1)
                    .max(1);
                let (xa, ya) = pairs[upper - 1];
                let (xb, yb) = pairs[upper];
                if xb == xa {
                    return ya;
                }
                ya + (yb - ya) * (x - xa) / (xb - xa)
            }
            TermKind::Linear { .. } => f64::NAN,
            TermKind::Ramp { start, end } => {
                if start == end {
                    return f64::NAN;
                }
                if start < end {
                    if x <= *start {
                        0.0
                    } else if x >= *end {
                        1.0
                    } else {
                        (x - start) / (end - start)
                    }
                } else if x >= *start {
                    0.0
                } else if x <= *end {
                    1.0
                } else {
                    (start - x) / (start - end)
                }
            }
            TermKind::Sigmoid { inflection, slope } => {
                1.0 / (1.0 + (-slope * (x - inflection)).exp())
            }
            TermKind::SShape { start, end } => {
                if x <= *start {
                    0.0
                } else if x <= (start + end) / 2.0 {
                    2.0 * ((x - start) / (end - start)).powi(2)
                } else if x < *end {
                    1.0 - 2.0 * ((x - end) / (end - start)).powi(2)
                } else {
                    1.0
                }
            }
            TermKind::Triangle { a, b, c } => {
                if x < *a || x > *c {
                    0.0
                } else if x == *b {
                    1.0
                } else if x < *b {
                    (x - a) / (b - a)
                } else {
                    (c - x) / (c - b)
                }
            }
            TermKind::ZShape { start, end } => {
                if x <= *start {
                    1.0
                } else if x <= (start + end) / 2.0 {
                    1.0 - 2.0 * ((x - start) / (end - start)).powi(2)
                } else if x < *end {
                    2.0 * ((x - end) / (end - start)).powi(2)
                } else {
                    0.0
                }
            }
        }
    }

    /// Value of this term used as a Sugeno consequent, given the engine's
    /// current crisp inputs.
    ///
    /// `Constant` is its value, `Linear` is the affine function of the
    /// inputs (bias last; a length mismatch yields NaN); any other kind
    /// falls back to its membership at the sentinel 1.
    pub fn consequent_value(&self, inputs: &[f64]) -> f64 {
        match self {
            TermKind::Constant { value } => *value,
            TermKind::Linear { coefficients } => {
                if coefficients.len() != inputs.len() + 1 {
                    return f64::NAN;
                }
                let bias = coefficients[coefficients.len() - 1];
                coefficients
                    .iter()
                    .zip(inputs)
                    .map(|(c, x)| c * x)
                    .sum::<f64>()
                    + bias
            }
            other => other.membership(1.0),
        }
    }

    /// Number of free parameters of this kind.
    pub fn parameter_count(&self) -> usize {
        match self {
            TermKind::Bell { .. } | TermKind::Triangle { .. } => 3,
            TermKind::Concave { .. }
            | TermKind::Cosine { .. }
            | TermKind::Ramp { .. }
            | TermKind::Sigmoid { .. }
            | TermKind::SShape { .. }
            | TermKind::ZShape { .. } => 2,
            TermKind::Constant { .. } => 1,
            TermKind::Discrete { pairs } => 2 * pairs.len(),
            TermKind::Linear { coefficients } => coefficients.len(),
        }
    }
}

/// A named term of a linguistic variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Term {
    name: String,
    kind: TermKind,
}

impl Term {
    pub fn new(name: impl Into<String>, kind: TermKind) -> Self {
        Term {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TermKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut TermKind {
        &mut self.kind
    }

    /// Membership degree at `x`. See [`TermKind::membership`].
    pub fn membership(&self, x: f64) -> f64 {
        self.kind.membership(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bell_membership() {
        let bell = TermKind::Bell {
            center: 0.0,
            width: 0.5,
            slope: 2.0,
        };
        assert_relative_eq!(bell.membership(0.0), 1.0);
        assert_relative_eq!(bell.membership(0.5), 0.5);
        assert!(bell.membership(5.0) < 1e-3);
    }

    #[test]
    fn triangle_membership() {
        let tri = TermKind::Triangle {
            a: 0.0,
            b: 1.0,
            c: 3.0,
        };
        assert_relative_eq!(tri.membership(-1.0), 0.0);
        assert_relative_eq!(tri.membership(0.5), 0.5);
        assert_relative_eq!(tri.membership(1.0), 1.0);
        assert_relative_eq!(tri.membership(2.0), 0.5);
        assert_relative_eq!(tri.membership(4.0), 0.0);
    }

    #[test]
    fn degenerate_triangle_has_no_division_by_zero() {
        let spike = TermKind::Triangle {
            a: 1.0,
            b: 1.0,
            c: 2.0,
        };
        assert_relative_eq!(spike.membership(1.0), 1.0);
        assert_relative_eq!(spike.membership(1.5), 0.5);
        assert_relative_eq!(spike.membership(0.5), 0.0);
    }

    #[test]
    fn ramp_rising_and_falling() {
        let up = TermKind::Ramp {
            start: 0.0,
            end: 1.0,
        };
        assert_relative_eq!(up.membership(-1.0), 0.0);
        assert_relative_eq!(up.membership(0.25), 0.25);
        assert_relative_eq!(up.membership(2.0), 1.0);

        let down = TermKind::Ramp {
            start: 1.0,
            end: 0.0,
        };
        assert_relative_eq!(down.membership(-1.0), 1.0);
        assert_relative_eq!(down.membership(0.75), 0.25);
        assert_relative_eq!(down.membership(2.0), 0.0);
    }

    #[test]
    fn sshape_and_zshape_are_complementary() {
        let s = TermKind::SShape {
            start: 0.0,
            end: 1.0,
        };
        let z = TermKind::ZShape {
            start: 0.0,
            end: 1.0,
        };
        for i in 0..=10 {
            let x = i as f64 / 10.0;
            assert_relative_eq!(s.membership(x) + z.membership(x), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn discrete_interpolates_and_clamps() {
        let d = TermKind::Discrete {
            pairs: vec![(0.0, 0.0), (1.0, 1.0), (2.0, 0.5)],
        };
        assert_relative_eq!(d.membership(-1.0), 0.0);
        assert_relative_eq!(d.membership(0.5), 0.5);
        assert_relative_eq!(d.membership(1.5), 0.75);
        assert_relative_eq!(d.membership(3.0), 0.5);
    }

    #[test]
    fn cosine_window() {
        let c = TermKind::Cosine {
            center: 0.0,
            width: 2.0,
        };
        assert_relative_eq!(c.membership(0.0), 1.0);
        assert_relative_eq!(c.membership(1.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(c.membership(1.5), 0.0);
    }

    #[test]
    fn concave_directions() {
        let rising = TermKind::Concave {
            inflection: 0.0,
            end: 1.0,
        };
        assert_relative_eq!(rising.membership(1.0), 1.0);
        assert!(rising.membership(0.0) < rising.membership(0.9));

        let falling = TermKind::Concave {
            inflection: 1.0,
            end: 0.0,
        };
        assert_relative_eq!(falling.membership(-1.0), 1.0);
        assert!(falling.membership(2.0) < falling.membership(0.5));
    }

    #[test]
    fn linear_consequent_value() {
        let lin = TermKind::Linear {
            coefficients: vec![3.0, -2.0, 0.5],
        };
        assert_relative_eq!(lin.consequent_value(&[1.0, 2.0]), 3.0 - 4.0 + 0.5);
        assert!(lin.consequent_value(&[1.0]).is_nan());
    }

    #[test]
    fn constant_consequent_ignores_inputs() {
        let c = TermKind::Constant { value: 0.25 };
        assert_relative_eq!(c.consequent_value(&[]), 0.25);
        assert_relative_eq!(c.consequent_value(&[9.0, 9.0]), 0.25);
        assert_relative_eq!(c.membership(123.0), 0.25);
    }

    #[test]
    fn serde_round_trip() {
        let term = Term::new(
            "low",
            TermKind::Bell {
                center: 0.0,
                width: 0.5,
                slope: 2.0,
            },
        );
        let json = serde_json::to_string(&term).unwrap();
        let back: Term = serde_json::from_str(&json).unwrap();
        assert_eq!(term, back);
    }
}
