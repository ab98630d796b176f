//! Setup module for configuring simulation runs.
//!
//! [`SimulationSetup`] controls how densely a time span is sampled, how many integrator
//! steps are taken between samples, how pulse segments are stitched and an optional
//! wall-clock bound. Defaults reproduce the classic behaviour: `max(round(len * 17), 1000)`
//! samples per run and two samples dropped from the head of each pulse segment.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use super::error::SimulationError;

/// Configuration of the ODE driver and the pulse scheduler.
///
/// # Fields
///
/// * `samples_per_unit` - Grid samples per unit of simulated time (default: 17.0)
/// * `min_samples` - Lower bound on the grid size of a run (default: 1000)
/// * `max_samples` - Upper bound on the grid size of a run (default: 5 000 000)
/// * `substeps` - Integrator steps between two grid samples (default: 4)
/// * `drop_samples` - Samples discarded from the head of each pulse segment (default: 2)
/// * `max_wall_time` - Optional wall-clock limit per run in seconds (default: none)
///
/// # Examples
///
/// ```
/// use biosystem::prelude::SimulationSetupBuilder;
///
/// let setup = SimulationSetupBuilder::default()
///     .min_samples(200)
///     .substeps(8)
///     .max_wall_time(Some(5.0))
///     .build()
///     .unwrap();
///
/// assert_eq!(setup.grid_size(10.0), 200);
/// ```
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationSetup {
    #[builder(default = "17.0")]
    pub samples_per_unit: f64,
    #[builder(default = "1000")]
    pub min_samples: usize,
    #[builder(default = "5_000_000")]
    pub max_samples: usize,
    #[builder(default = "4")]
    pub substeps: usize,
    #[builder(default = "2")]
    pub drop_samples: usize,
    #[builder(default = "None")]
    pub max_wall_time: Option<f64>,
}

impl Default for SimulationSetup {
    fn default() -> Self {
        Self {
            samples_per_unit: 17.0,
            min_samples: 1000,
            max_samples: 5_000_000,
            substeps: 4,
            drop_samples: 2,
            max_wall_time: None,
        }
    }
}

impl SimulationSetup {
    /// Number of grid samples for an interval of the given length.
    ///
    /// Short intervals get at least `min_samples`, long ones scale with their length.
    /// The result is never below two, so both endpoints are always present. It is not
    /// clamped to `max_samples`; use [`SimulationSetup::checked_grid_size`] for that.
    pub fn grid_size(&self, length: f64) -> usize {
        let scaled = (length * self.samples_per_unit).round();
        let scaled = if scaled.is_finite() && scaled > 0.0 {
            scaled as usize
        } else {
            0
        };

        scaled.max(self.min_samples).max(2)
    }

    /// Like [`SimulationSetup::grid_size`], but fails when the grid exceeds `max_samples`.
    pub fn checked_grid_size(&self, length: f64) -> Result<usize, SimulationError> {
        let samples = self.grid_size(length);
        if samples > self.max_samples {
            return Err(SimulationError::GridTooLarge {
                samples,
                limit: self.max_samples,
            });
        }

        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_size_heuristic() {
        let setup = SimulationSetup::default();

        assert_eq!(setup.grid_size(25.0), 1000);
        assert_eq!(setup.grid_size(100.0), 1700);
        assert_eq!(setup.grid_size(250.0), 4250);
        assert_eq!(setup.grid_size(0.01), 1000);
    }

    #[test]
    fn test_grid_size_is_capped() {
        let setup = SimulationSetup::default();

        assert_eq!(setup.checked_grid_size(100.0).unwrap(), 1700);
        assert!(matches!(
            setup.checked_grid_size(1e18),
            Err(SimulationError::GridTooLarge { limit: 5_000_000, .. })
        ));
        assert!(matches!(
            setup.checked_grid_size(f64::MAX),
            Err(SimulationError::GridTooLarge { .. })
        ));
    }

    #[test]
    fn test_builder_defaults_match_default() {
        let built = SimulationSetupBuilder::default().build().unwrap();
        assert_eq!(built, SimulationSetup::default());
    }

    #[test]
    fn test_deserialize_partial() {
        let setup: SimulationSetup = serde_json::from_str(r#"{"substeps": 10}"#).unwrap();
        assert_eq!(setup.substeps, 10);
        assert_eq!(setup.min_samples, 1000);
    }
}
