//! # neurofuzz train
//!
//! Training for ANFIS engines built by `neurofuzz-infer`.
//!
//! The centerpiece is the hybrid learning algorithm of Jang (1993):
//! every epoch runs a forward pass that identifies the Sugeno consequent
//! parameters by recursive least squares over regressors of normalized
//! firing strengths, then a backward pass that propagates error
//! derivatives down to the antecedent membership parameters and takes
//! one steepest-descent step whose length adapts to the recent RMSE
//! history.
//!
//! [`GradientDescentTrainer`] is the degenerate variant with consequent
//! identification disabled, for isolating antecedent-only learning.
//!
//! Trainers are cooperative and single-threaded: they borrow the engine
//! mutably per call, check their [`CancelToken`] at epoch boundaries,
//! and always leave the engine with valid parameters.

mod backward;
mod cancel;
mod descent;
mod error;
mod hybrid;
mod metrics;
mod rls;
mod step;

pub use cancel::CancelToken;
pub use descent::{DescentConfig, GradientDescentTrainer};
pub use error::{TrainError, TrainResult};
pub use hybrid::{HybridConfig, HybridTrainer, TrainerState};
pub use metrics::RmseAccumulator;
pub use rls::{RecursiveLeastSquares, DEFAULT_COVARIANCE_SCALE};
pub use step::StepSizePolicy;
