//! Biochemical Reaction Network Simulator
//!
//! This library models reaction networks as systems of ordinary differential equations:
//! - Declaring compositors (state variables), constants and parts (reactions) with
//!   textual rate laws
//! - Folding the contributions of all parts into one compiled rate per compositor
//! - Integrating the system over a time span
//! - Running pulse schedules that force compositors to new values at given times
//! - Resampling traces onto a common grid for comparison
//! - Reading/writing model documents as JSON

#![warn(unused_imports)]

/// Commonly used types and functionality re-exported for convenience
pub mod prelude {
    pub use crate::equation::{CompiledRate, EquationError, RateExpr};
    pub use crate::io::*;
    pub use crate::model::compositor::Compositor;
    pub use crate::model::constant::Constant;
    pub use crate::model::part::{Part, Rate};
    pub use crate::model::pulse::Pulse;
    pub use crate::registry::Named;
    pub use crate::symbols::{SymbolKind, SymbolRegistry, TIME_SYMBOL};
    pub use crate::system::{BioSystem, SystemError};

    pub use crate::simulation::error::*;
    pub use crate::simulation::interpolation::*;
    pub use crate::simulation::result::*;
    pub use crate::simulation::setup::*;
    pub use crate::simulation::{ODEIntegrator, RK4, RK5};
}

/// Rate law parsing, manipulation and compilation
pub mod equation;

/// Ordered name-indexed collections
pub mod registry;

/// Names available to rate laws
pub mod symbols;

/// The system aggregate
pub mod system;

/// Plain data types declared on a system
pub mod model {
    pub mod compositor;
    pub mod constant;
    pub mod part;
    pub mod pulse;
}

/// Simulation of reaction networks
pub mod simulation {
    pub use crate::simulation::setup::SimulationSetup;
    pub use peroxide::fuga::{ODEIntegrator, ODEProblem, RK4, RK5};

    /// Folding and compiling rate laws
    pub mod compiler;
    /// Integration of a compiled system over a time span
    pub mod driver;
    /// Error types for simulation failures
    pub mod error;
    /// Trace resampling
    pub mod interpolation;
    /// Piecewise simulation between pulses
    pub mod pulses;
    /// Simulation result data structures
    pub mod result;
    /// Simulation setup and configuration
    pub mod setup;
}

/// IO functionality
pub mod io;

/// Table rendering of systems
pub mod info;
