//! Simulation Error Module
//!
//! This module provides the error type shared by the ODE driver, the pulse scheduler and
//! the trace resampler.
//!
//! # Key Error Types
//!
//! The [`SimulationError`] enum covers:
//! - Invalid input (time spans, pulse schedules, trace shapes)
//! - Integrator failures and non-finite states
//! - Wall-clock timeouts
//! - Declaration and compilation errors bubbling up from the system
//!
//! None of these are retried; a failed pulse segment aborts the whole schedule.

use thiserror::Error;

use crate::system::SystemError;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Invalid time span [{t0}, {t1}]: the end must be greater than the start")]
    InvalidTimeSpan { t0: f64, t1: f64 },
    #[error("Integration failed at t = {t}: {message}")]
    Integration { t: f64, message: String },
    #[error("State became non-finite at t = {t}")]
    NonFiniteState { t: f64 },
    #[error("Integration exceeded the wall-clock limit of {limit}s at t = {t}")]
    Timeout { limit: f64, t: f64 },
    #[error("A pulse schedule needs at least two pulses, got {0}")]
    TooFewPulses(usize),
    #[error("Pulse {index} at t = {current} does not come after the previous pulse at t = {previous}")]
    NonIncreasingPulses {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("No data provided for interpolation")]
    NoDataForInterpolation,
    #[error("Trace has {x} x-values but {y} y-values")]
    LengthMismatch { x: usize, y: usize },
    #[error("Expected one value per compositor ({expected}), got {actual}")]
    StateLengthMismatch { expected: usize, actual: usize },
    #[error("A grid of {samples} samples exceeds the limit of {limit}")]
    GridTooLarge { samples: usize, limit: usize },
    #[error(transparent)]
    System(#[from] SystemError),
}
