//! ODE Driver
//!
//! Turns a compiled [`BioSystem`] into a [`Trace`] over a time span.
//!
//! The initial vector is taken from the *current* compositor values, not the initial
//! ones, so that consecutive runs can be chained. The time grid is uniform and includes
//! both endpoints; its size follows [`SimulationSetup::grid_size`]. Between two grid
//! points the state is advanced with `substeps` fixed steps of a `peroxide` integrator.
//!
//! Running never changes compositor values. Callers that want to continue from the end
//! of a run set the values themselves (see the pulse scheduler).

use std::cell::RefCell;
use std::time::Instant;

use log::debug;
use ndarray::{Array1, Array2};
use peroxide::fuga::{ODEIntegrator, ODEProblem, RK4};

use crate::equation::CompiledRate;
use crate::system::BioSystem;

use super::error::SimulationError;
use super::result::Trace;
use super::setup::SimulationSetup;

/// Right-hand side of the system built from compiled rate functions.
///
/// Each derivative is obtained by evaluating the compositor's compiled rate with the
/// arguments `(t, y[0], y[1], ...)`.
pub struct RateProblem {
    rates: Vec<CompiledRate>,
    names: Vec<String>,
    args: RefCell<Vec<f64>>,
    stack: RefCell<Vec<f64>>,
}

impl RateProblem {
    pub fn new(rates: Vec<CompiledRate>, names: Vec<String>) -> Self {
        let width = rates.len() + 1;
        Self {
            rates,
            names,
            args: RefCell::new(Vec::with_capacity(width)),
            stack: RefCell::new(Vec::new()),
        }
    }

    pub fn dimension(&self) -> usize {
        self.rates.len()
    }
}

impl ODEProblem for RateProblem {
    fn rhs(&self, t: f64, y: &[f64], dy: &mut [f64]) -> anyhow::Result<()> {
        let mut args = self.args.borrow_mut();
        let mut stack = self.stack.borrow_mut();

        args.clear();
        args.push(t);
        args.extend_from_slice(y);

        for (derivative, rate) in dy.iter_mut().zip(&self.rates) {
            *derivative = rate.eval_with(&args, &mut stack);
        }

        if let Some(i) = dy.iter().position(|v| !v.is_finite()) {
            anyhow::bail!("derivative of '{}' is not finite", self.names[i]);
        }

        Ok(())
    }
}

impl BioSystem {
    /// Simulates the system over `t_span` with the default setup and [`RK4`].
    ///
    /// # Arguments
    ///
    /// * `t_span` - `[t_start, t_end]` with `t_end > t_start`
    ///
    /// # Returns
    ///
    /// The sampled trace, one column per compositor in declaration order.
    ///
    /// # Errors
    ///
    /// * [`SimulationError::InvalidTimeSpan`] - the span is empty, reversed or not finite
    /// * [`SimulationError::GridTooLarge`] - the span needs more than `max_samples` samples
    /// * [`SimulationError::System`] - a rate law could not be compiled
    /// * [`SimulationError::Integration`] / [`SimulationError::NonFiniteState`] - the integrator failed
    pub fn run(&mut self, t_span: [f64; 2]) -> Result<Trace, SimulationError> {
        self.run_with(t_span, &SimulationSetup::default(), RK4)
    }

    /// Simulates the system over `t_span` with a custom setup and integrator.
    ///
    /// The integrator is driven with fixed steps of `grid spacing / substeps`.
    pub fn run_with<I: ODEIntegrator>(
        &mut self,
        t_span: [f64; 2],
        setup: &SimulationSetup,
        integrator: I,
    ) -> Result<Trace, SimulationError> {
        self.integrate_span(t_span, setup, &integrator)
    }

    pub(crate) fn integrate_span<I: ODEIntegrator>(
        &mut self,
        t_span: [f64; 2],
        setup: &SimulationSetup,
        integrator: &I,
    ) -> Result<Trace, SimulationError> {
        let [t0, t1] = t_span;
        if !(t0.is_finite() && t1.is_finite() && t1 > t0) {
            return Err(SimulationError::InvalidTimeSpan { t0, t1 });
        }

        let n_points = setup.checked_grid_size(t1 - t0)?;
        let problem = RateProblem::new(self.compiled_rates()?, self.compositor_names());
        let substeps = setup.substeps.max(1);
        let time = uniform_grid(t0, t1, n_points);

        debug!(
            "Integrating {} compositor(s) over [{}, {}] on {} grid points with {} substep(s)",
            problem.dimension(),
            t0,
            t1,
            n_points,
            substeps
        );

        let started = Instant::now();
        let mut state = self.current_state();
        let mut values = Array2::zeros((n_points, state.len()));
        values.row_mut(0).assign(&Array1::from(state.clone()));

        for (row, window) in time.windows(2).enumerate() {
            let (from, to) = (window[0], window[1]);
            let dt = (to - from) / substeps as f64;

            for k in 0..substeps {
                let t = from + k as f64 * dt;
                integrator
                    .step(&problem, t, &mut state, dt)
                    .map_err(|e| SimulationError::Integration {
                        t,
                        message: e.to_string(),
                    })?;
            }

            if state.iter().any(|v| !v.is_finite()) {
                return Err(SimulationError::NonFiniteState { t: to });
            }

            if let Some(limit) = setup.max_wall_time {
                if started.elapsed().as_secs_f64() > limit {
                    return Err(SimulationError::Timeout { limit, t: to });
                }
            }

            values
                .row_mut(row + 1)
                .assign(&Array1::from(state.clone()));
        }

        Trace::new(time, values, self.compositor_names())
    }
}

/// `n_points` uniformly spaced samples from `t0` to `t1`, both included.
fn uniform_grid(t0: f64, t1: f64, n_points: usize) -> Vec<f64> {
    let mut grid = Array1::linspace(t0, t1, n_points).to_vec();
    if let Some(last) = grid.last_mut() {
        *last = t1;
    }
    grid
}
