//! Recursive least squares with exponential forgetting.

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::error::{TrainError, TrainResult};

/// Default scale of the initial covariance; the estimate starts wide
/// open so the first observations dominate.
pub const DEFAULT_COVARIANCE_SCALE: f64 = 1e4;

/// Online solver for `y = phi' theta` with forgetting factor `lambda`.
///
/// With `lambda = 1` and a consistent linear system the estimate
/// converges to the ordinary least-squares solution. The covariance is
/// re-symmetrized after every update to keep it positive semi-definite
/// under accumulated rounding.
#[derive(Clone, Debug)]
pub struct RecursiveLeastSquares {
    theta: Array1<f64>,
    covariance: Array2<f64>,
    lambda: f64,
}

impl RecursiveLeastSquares {
    /// Create an estimator with zero dimension; call [`reset`] to size
    /// it. `lambda` must lie in `(0, 1]`.
    ///
    /// [`reset`]: RecursiveLeastSquares::reset
    pub fn new(lambda: f64) -> TrainResult<Self> {
        if !(lambda > 0.0 && lambda <= 1.0) {
            return Err(TrainError::InvalidParameter(format!(
                "forgetting factor must be in (0, 1], got {lambda}"
            )));
        }
        Ok(RecursiveLeastSquares {
            theta: Array1::zeros(0),
            covariance: Array2::zeros((0, 0)),
            lambda,
        })
    }

    /// Zero the estimate and restart the covariance at `delta * I`.
    pub fn reset(&mut self, dimension: usize, delta: f64) {
        self.theta = Array1::zeros(dimension);
        self.covariance = Array2::eye(dimension) * delta;
    }

    /// Fold one observation `(phi, y)` into the estimate.
    pub fn update(&mut self, phi: ArrayView1<'_, f64>, y: f64) -> TrainResult<()> {
        if phi.len() != self.theta.len() {
            return Err(TrainError::DataShape(format!(
                "regressor has {} entries, estimator has dimension {}",
                phi.len(),
                self.theta.len()
            )));
        }

        let p_phi = self.covariance.dot(&phi);
        let denominator = self.lambda + phi.dot(&p_phi);
        let gain = p_phi.mapv(|v| v / denominator);

        let residual = y - phi.dot(&self.theta);
        self.theta.scaled_add(residual, &gain);

        let phi_t_p = phi.dot(&self.covariance);
        let correction = gain
            .view()
            .insert_axis(Axis(1))
            .dot(&phi_t_p.view().insert_axis(Axis(0)));
        self.covariance = (&self.covariance - &correction) / self.lambda;
        self.covariance = (&self.covariance + &self.covariance.t()) * 0.5;
        Ok(())
    }

    /// Current parameter estimate.
    pub fn solution(&self) -> &Array1<f64> {
        &self.theta
    }

    pub fn dimension(&self) -> usize {
        self.theta.len()
    }

    pub fn forgetting_factor(&self) -> f64 {
        self.lambda
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn forgetting_factor_validated() {
        assert!(RecursiveLeastSquares::new(0.0).is_err());
        assert!(RecursiveLeastSquares::new(1.1).is_err());
        assert!(RecursiveLeastSquares::new(1.0).is_ok());
        assert!(RecursiveLeastSquares::new(0.95).is_ok());
    }

    #[test]
    fn regressor_dimension_checked() {
        let mut rls = RecursiveLeastSquares::new(1.0).unwrap();
        rls.reset(3, DEFAULT_COVARIANCE_SCALE);
        let short = array![1.0, 2.0];
        assert!(rls.update(short.view(), 1.0).is_err());
    }

    #[test]
    fn recovers_consistent_linear_system() {
        // y = 3 phi1 - 2 phi2 + 0.5, streamed in; with lambda = 1 and a
        // wide-open covariance the estimate matches the batch solution
        let mut rls = RecursiveLeastSquares::new(1.0).unwrap();
        rls.reset(3, 1e10);

        for i in 0..50 {
            let t = i as f64;
            let phi1 = (0.7 * t).sin();
            let phi2 = (1.3 * t + 0.2).cos();
            let phi = array![phi1, phi2, 1.0];
            let y = 3.0 * phi1 - 2.0 * phi2 + 0.5;
            rls.update(phi.view(), y).unwrap();
        }

        let theta = rls.solution();
        assert_relative_eq!(theta[0], 3.0, epsilon = 1e-8);
        assert_relative_eq!(theta[1], -2.0, epsilon = 1e-8);
        assert_relative_eq!(theta[2], 0.5, epsilon = 1e-8);
    }

    #[test]
    fn covariance_stays_symmetric() {
        let mut rls = RecursiveLeastSquares::new(0.98).unwrap();
        rls.reset(2, DEFAULT_COVARIANCE_SCALE);
        for i in 0..20 {
            let t = i as f64;
            let phi = array![t.sin(), 1.0];
            rls.update(phi.view(), 2.0 * t.sin() - 1.0).unwrap();
        }
        let p = &rls.covariance;
        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(p[[i, j]], p[[j, i]], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn forgetting_tracks_a_drifting_target() {
        // constant regressor, target jumps; lambda < 1 must follow
        let mut rls = RecursiveLeastSquares::new(0.7).unwrap();
        rls.reset(1, DEFAULT_COVARIANCE_SCALE);
        let phi = array![1.0];
        for _ in 0..30 {
            rls.update(phi.view(), 1.0).unwrap();
        }
        assert_relative_eq!(rls.solution()[0], 1.0, epsilon = 1e-6);
        for _ in 0..30 {
            rls.update(phi.view(), 5.0).unwrap();
        }
        assert_relative_eq!(rls.solution()[0], 5.0, epsilon = 1e-3);
    }
}
