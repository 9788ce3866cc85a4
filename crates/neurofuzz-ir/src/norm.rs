//! T-norm and S-norm families.

use serde::{Deserialize, Serialize};

/// Fuzzy conjunction operators on `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TNorm {
    Minimum,
    AlgebraicProduct,
    BoundedDifference,
    DrasticProduct,
    EinsteinProduct,
    HamacherProduct,
}

impl TNorm {
    pub fn compute(&self, a: f64, b: f64) -> f64 {
        match self {
            TNorm::Minimum => a.min(b),
            TNorm::AlgebraicProduct => a * b,
            TNorm::BoundedDifference => (a + b - 1.0).max(0.0),
            TNorm::DrasticProduct => {
                if a.max(b) == 1.0 {
                    a.min(b)
                } else {
                    0.0
                }
            }
            TNorm::EinsteinProduct => (a * b) / (2.0 - (a + b - a * b)),
            TNorm::HamacherProduct => {
                let den = a + b - a * b;
                if den == 0.0 {
                    0.0
                } else {
                    (a * b) / den
                }
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TNorm::Minimum => "Minimum",
            TNorm::AlgebraicProduct => "AlgebraicProduct",
            TNorm::BoundedDifference => "BoundedDifference",
            TNorm::DrasticProduct => "DrasticProduct",
            TNorm::EinsteinProduct => "EinsteinProduct",
            TNorm::HamacherProduct => "HamacherProduct",
        }
    }
}

/// Fuzzy disjunction operators on `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SNorm {
    Maximum,
    AlgebraicSum,
    BoundedSum,
    DrasticSum,
    EinsteinSum,
    HamacherSum,
}

impl SNorm {
    pub fn compute(&self, a: f64, b: f64) -> f64 {
        match self {
            SNorm::Maximum => a.max(b),
            SNorm::AlgebraicSum => a + b - a * b,
            SNorm::BoundedSum => (a + b).min(1.0),
            SNorm::DrasticSum => {
                if a.min(b) == 0.0 {
                    a.max(b)
                } else {
                    1.0
                }
            }
            SNorm::EinsteinSum => (a + b) / (1.0 + a * b),
            SNorm::HamacherSum => {
                let den = 1.0 - a * b;
                if den == 0.0 {
                    1.0
                } else {
                    (a + b - 2.0 * a * b) / den
                }
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SNorm::Maximum => "Maximum",
            SNorm::AlgebraicSum => "AlgebraicSum",
            SNorm::BoundedSum => "BoundedSum",
            SNorm::DrasticSum => "DrasticSum",
            SNorm::EinsteinSum => "EinsteinSum",
            SNorm::HamacherSum => "HamacherSum",
        }
    }
}

/// Either family, as carried by a firing-strength node: a conjunctive
/// antecedent folds with a T-norm, a disjunctive one with an S-norm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Norm {
    T(TNorm),
    S(SNorm),
}

impl Norm {
    pub fn compute(&self, a: f64, b: f64) -> f64 {
        match self {
            Norm::T(t) => t.compute(a, b),
            Norm::S(s) => s.compute(a, b),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Norm::T(t) => t.name(),
            Norm::S(s) => s.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn tnorm_boundary_conditions() {
        for t in [
            TNorm::Minimum,
            TNorm::AlgebraicProduct,
            TNorm::BoundedDifference,
            TNorm::DrasticProduct,
            TNorm::EinsteinProduct,
            TNorm::HamacherProduct,
        ] {
            assert_relative_eq!(t.compute(1.0, 1.0), 1.0);
            assert_relative_eq!(t.compute(0.7, 1.0), 0.7, epsilon = 1e-12);
            assert_relative_eq!(t.compute(0.0, 0.4), 0.0);
        }
    }

    #[test]
    fn snorm_boundary_conditions() {
        for s in [
            SNorm::Maximum,
            SNorm::AlgebraicSum,
            SNorm::BoundedSum,
            SNorm::DrasticSum,
            SNorm::EinsteinSum,
            SNorm::HamacherSum,
        ] {
            assert_relative_eq!(s.compute(0.0, 0.0), 0.0);
            assert_relative_eq!(s.compute(0.3, 0.0), 0.3, epsilon = 1e-12);
            assert_relative_eq!(s.compute(1.0, 0.6), 1.0);
        }
    }

    #[test]
    fn algebraic_pair() {
        assert_relative_eq!(TNorm::AlgebraicProduct.compute(0.5, 0.4), 0.2);
        assert_relative_eq!(SNorm::AlgebraicSum.compute(0.5, 0.4), 0.7);
    }
}
