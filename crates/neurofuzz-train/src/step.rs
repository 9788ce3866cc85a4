//! Adaptive step-size schedule.
//!
//! Jang's heuristic: looking at a sliding window of the last four epoch
//! RMSEs, four windows of strict descent grow the step size, four
//! windows of strict rise-fall-rise alternation shrink it. Windows that
//! match neither pattern leave both counters untouched.

use std::collections::VecDeque;

use log::debug;

use crate::error::{TrainError, TrainResult};

const WINDOW_LEN: usize = 4;
const PATIENCE: usize = 4;

/// The step size kappa and the machinery that adapts it between epochs.
#[derive(Clone, Debug)]
pub struct StepSizePolicy {
    initial: f64,
    step_size: f64,
    decrease_rate: f64,
    increase_rate: f64,
    window: VecDeque<f64>,
    increase_counter: usize,
    decrease_counter: usize,
}

impl StepSizePolicy {
    pub fn new(initial: f64, decrease_rate: f64, increase_rate: f64) -> TrainResult<Self> {
        if initial <= 0.0 {
            return Err(TrainError::InvalidParameter(format!(
                "initial step size must be positive, got {initial}"
            )));
        }
        if !(decrease_rate > 0.0 && decrease_rate < 1.0) {
            return Err(TrainError::InvalidParameter(format!(
                "step size decrease rate must be in (0, 1), got {decrease_rate}"
            )));
        }
        if increase_rate <= 1.0 {
            return Err(TrainError::InvalidParameter(format!(
                "step size increase rate must be greater than 1, got {increase_rate}"
            )));
        }
        Ok(StepSizePolicy {
            initial,
            step_size: initial,
            decrease_rate,
            increase_rate,
            window: VecDeque::with_capacity(WINDOW_LEN),
            increase_counter: 0,
            decrease_counter: 0,
        })
    }

    /// Current kappa; always positive.
    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Record one epoch RMSE and adapt kappa when a pattern has held for
    /// four windows.
    pub fn record(&mut self, rmse: f64) {
        if self.window.len() == WINDOW_LEN {
            self.window.pop_front();
        }
        self.window.push_back(rmse);
        if self.window.len() < WINDOW_LEN {
            return;
        }

        let w: Vec<f64> = self.window.iter().copied().collect();
        if w[0] > w[1] && w[1] > w[2] && w[2] > w[3] {
            self.increase_counter += 1;
            if self.increase_counter == PATIENCE {
                self.step_size *= self.increase_rate;
                debug!("step size increased to {}", self.step_size);
                self.increase_counter = 0;
                self.decrease_counter = 0;
            }
        } else if w[0] < w[1] && w[1] > w[2] && w[2] < w[3] {
            self.decrease_counter += 1;
            if self.decrease_counter == PATIENCE {
                self.step_size *= self.decrease_rate;
                debug!("step size decreased to {}", self.step_size);
                self.increase_counter = 0;
                self.decrease_counter = 0;
            }
        }
    }

    /// Back to the initial kappa with an empty window.
    pub fn reset(&mut self) {
        self.step_size = self.initial;
        self.window.clear();
        self.increase_counter = 0;
        self.decrease_counter = 0;
    }
}
