//! Term-parameter adapter.
//!
//! Training reads and writes term parameters as flat vectors in the
//! canonical order of each kind, and needs the derivative of a term's
//! membership with respect to those parameters. Only the generalized
//! bell has an implemented derivative; requesting any other kind fails
//! with [`IrError::DerivativeNotImplemented`].

use crate::error::{IrError, IrResult};
use crate::term::{Term, TermKind};

/// The term's parameters as a flat vector, in canonical order.
///
/// `Discrete` interleaves `x0, y0, x1, y1, ...`; `Linear` returns the
/// full coefficient vector, bias last.
pub fn parameters(term: &Term) -> Vec<f64> {
    match term.kind() {
        TermKind::Bell {
            center,
            width,
            slope,
        } => vec![*center, *width, *slope],
        TermKind::Concave { inflection, end } => vec![*inflection, *end],
        TermKind::Constant { value } => vec![*value],
        TermKind::Cosine { center, width } => vec![*center, *width],
        TermKind::Discrete { pairs } => pairs.iter().flat_map(|&(x, y)| [x, y]).collect(),
        TermKind::Linear { coefficients } => coefficients.clone(),
        TermKind::Ramp { start, end } => vec![*start, *end],
        TermKind::Sigmoid { inflection, slope } => vec![*inflection, *slope],
        TermKind::SShape { start, end } => vec![*start, *end],
        TermKind::Triangle { a, b, c } => vec![*a, *b, *c],
        TermKind::ZShape { start, end } => vec![*start, *end],
    }
}

/// Replace the term's parameters from a flat vector.
///
/// Fails with [`IrError::InvalidParameters`] when the vector length does
/// not match the kind, or an ordering invariant is violated (Triangle
/// vertices out of order, Discrete abscissae not strictly increasing).
pub fn set_parameters(term: &mut Term, params: &[f64]) -> IrResult<()> {
    let expected = term.kind().parameter_count();
    let reject = |reason: String| IrError::InvalidParameters {
        term: term.name().to_string(),
        kind: term.kind().name().to_string(),
        reason,
    };

    match term.kind() {
        TermKind::Discrete { .. } => {
            if params.is_empty() || params.len() % 2 != 0 {
                return Err(reject(format!(
                    "expected a non-empty even number of values, got {}",
                    params.len()
                )));
            }
        }
        _ => {
            if params.len() != expected {
                return Err(reject(format!(
                    "expected {} values, got {}",
                    expected,
                    params.len()
                )));
            }
        }
    }

    let kind = match term.kind() {
        TermKind::Bell { .. } => TermKind::Bell {
            center: params[0],
            width: params[1],
            slope: params[2],
        },
        TermKind::Concave { .. } => TermKind::Concave {
            inflection: params[0],
            end: params[1],
        },
        TermKind::Constant { .. } => TermKind::Constant { value: params[0] },
        TermKind::Cosine { .. } => TermKind::Cosine {
            center: params[0],
            width: params[1],
        },
        TermKind::Discrete { .. } => {
            let pairs: Vec<(f64, f64)> = params.chunks_exact(2).map(|c| (c[0], c[1])).collect();
            if pairs.windows(2).any(|w| w[0].0 >= w[1].0) {
                return Err(reject("abscissae must be strictly increasing".to_string()));
            }
            TermKind::Discrete { pairs }
        }
        TermKind::Linear { .. } => TermKind::Linear {
            coefficients: params.to_vec(),
        },
        TermKind::Ramp { .. } => TermKind::Ramp {
            start: params[0],
            end: params[1],
        },
        TermKind::Sigmoid { .. } => TermKind::Sigmoid {
            inflection: params[0],
            slope: params[1],
        },
        TermKind::SShape { .. } => TermKind::SShape {
            start: params[0],
            end: params[1],
        },
        TermKind::Triangle { .. } => {
            if !(params[0] <= params[1] && params[1] <= params[2]) {
                return Err(reject("vertices must satisfy a <= b <= c".to_string()));
            }
            TermKind::Triangle {
                a: params[0],
                b: params[1],
                c: params[2],
            }
        }
        TermKind::ZShape { .. } => TermKind::ZShape {
            start: params[0],
            end: params[1],
        },
    };

    *term.kind_mut() = kind;
    Ok(())
}

/// Partial derivatives of the term's membership at `x` with respect to
/// each parameter, in the same order as [`parameters`].
///
/// With `u = (x - c) / w`, `p = |u|^(2s)` and `D = (1 + p)^2`:
///
/// ```text
/// d/dc =  2 s p / ((x - c) D)        (0 at x = c)
/// d/dw =  2 s p / (w D)
/// d/ds = -ln(u^2) p / D              (0 at x = c and x = c + w)
/// ```
pub fn derivative_wrt_parameters(term: &Term, x: f64) -> IrResult<Vec<f64>> {
    match term.kind() {
        TermKind::Bell {
            center: c,
            width: w,
            slope: s,
        } => {
            let u = (x - c) / w;
            let p = if u != 0.0 { (u * u).powf(*s) } else { 0.0 };
            let den = (1.0 + p) * (1.0 + p);

            let d_center = if x != *c {
                2.0 * s * p / ((x - c) * den)
            } else {
                0.0
            };
            let d_width = 2.0 * s * p / (w * den);
            let d_slope = if x != *c && x != c + w {
                -(u * u).ln() * p / den
            } else {
                0.0
            };
            Ok(vec![d_center, d_width, d_slope])
        }
        other => Err(IrError::DerivativeNotImplemented {
            kind: other.name().to_string(),
        }),
    }
}
