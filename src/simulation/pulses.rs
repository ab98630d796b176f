//! Pulse Scheduler
//!
//! Simulates a system piecewise between consecutive pulses. At the start of every
//! segment the pulse may force one compositor to a new value; otherwise the segment
//! continues from where the previous one ended.
//!
//! For pulses `p[0..n]` and every `i` in `0..n-1`:
//!
//! 1. apply the override of `p[i]`, if it names a compositor
//! 2. integrate over the local interval `[0, p[i+1].time - p[i].time]`
//! 3. drop the first `drop_samples` samples, shift the local times by `p[i].time` and
//!    append the rest to the stitched trace
//! 4. carry the last sampled state into the next segment
//!
//! The last pulse only marks where the schedule stops. Once the schedule ends, with or
//! without an error, every compositor is reset to its initial value.

use itertools::Itertools;
use log::{info, warn};
use peroxide::fuga::{ODEIntegrator, RK4};

use crate::model::pulse::Pulse;
use crate::system::{BioSystem, SystemError};

use super::error::SimulationError;
use super::result::{PulseTrace, Segment, Trace};
use super::setup::SimulationSetup;

impl BioSystem {
    /// Runs a pulse schedule with the default setup and [`RK4`].
    ///
    /// # Arguments
    ///
    /// * `pulses` - At least two pulses with strictly increasing times
    ///
    /// # Returns
    ///
    /// The stitched trace on the global clock together with per-segment bookkeeping.
    ///
    /// # Errors
    ///
    /// * [`SimulationError::TooFewPulses`] - fewer than two pulses
    /// * [`SimulationError::NonIncreasingPulses`] - a pulse time is not finite or not after its predecessor
    /// * [`SimulationError::System`] - a pulse names an unknown compositor or rates fail to compile
    /// * any integration error of a segment, which aborts the whole schedule
    pub fn run_pulses(&mut self, pulses: &[Pulse]) -> Result<PulseTrace, SimulationError> {
        self.run_pulses_with(pulses, &SimulationSetup::default(), RK4)
    }

    /// Runs a pulse schedule with a custom setup and integrator.
    pub fn run_pulses_with<I: ODEIntegrator>(
        &mut self,
        pulses: &[Pulse],
        setup: &SimulationSetup,
        integrator: I,
    ) -> Result<PulseTrace, SimulationError> {
        self.validate_pulses(pulses)?;

        let result = self.simulate_segments(pulses, setup, &integrator);
        self.reset_state_variables();

        result
    }

    /// Checks a pulse schedule without simulating it.
    pub fn validate_pulses(&self, pulses: &[Pulse]) -> Result<(), SimulationError> {
        if pulses.len() < 2 {
            return Err(SimulationError::TooFewPulses(pulses.len()));
        }

        if let Some((index, (previous, current))) = pulses
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|(_, (p, c))| !(c.time.is_finite() && p.time.is_finite() && c.time > p.time))
        {
            return Err(SimulationError::NonIncreasingPulses {
                index: index + 1,
                previous: previous.time,
                current: current.time,
            });
        }

        if let Some(unknown) = pulses
            .iter()
            .filter_map(Pulse::target)
            .find(|name| self.compositor_index(name).is_none())
        {
            return Err(SystemError::CompositorNotFound(unknown.to_string()).into());
        }

        if let Some(target) = pulses.last().and_then(Pulse::target) {
            warn!(
                "The final pulse only stops the schedule; its override of '{}' is never applied",
                target
            );
        }

        Ok(())
    }

    fn simulate_segments<I: ODEIntegrator>(
        &mut self,
        pulses: &[Pulse],
        setup: &SimulationSetup,
        integrator: &I,
    ) -> Result<PulseTrace, SimulationError> {
        let mut stitched = Trace::empty(self.compositor_names());
        let mut segments = Vec::with_capacity(pulses.len() - 1);

        for (index, (pulse, next)) in pulses.iter().tuple_windows().enumerate() {
            let applied = match pulse.target() {
                Some(name) => {
                    self.set_value(name, pulse.value)?;
                    Some((name.to_string(), pulse.value))
                }
                None => None,
            };

            let start_state = self.current_state();
            let local = self.integrate_span([0.0, next.time - pulse.time], setup, integrator)?;
            let samples = stitched.append_shifted(&local, setup.drop_samples, pulse.time)?;

            let end_state = local.final_state().unwrap_or_else(|| start_state.clone());
            self.set_state(&end_state);

            info!(
                "Segment {} [{}, {}]: {} sample(s){}",
                index,
                pulse.time,
                next.time,
                samples,
                applied
                    .as_ref()
                    .map(|(name, value)| format!(", {} set to {}", name, value))
                    .unwrap_or_default()
            );

            segments.push(Segment {
                start_time: pulse.time,
                end_time: next.time,
                applied,
                start_state,
                end_state,
                samples,
            });
        }

        Ok(PulseTrace {
            trace: stitched,
            segments,
        })
    }
}
