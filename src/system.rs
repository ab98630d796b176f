//! Biological System
//!
//! [`BioSystem`] is the aggregate owning everything a simulation needs: compositors
//! (state variables), constants, parts (reactions) and the symbol registry that ties
//! their names together.
//!
//! # Declaring a system
//!
//! ```
//! use biosystem::prelude::*;
//!
//! let mut system = BioSystem::new();
//! system.add_constant("k", 0.05).unwrap();
//! system.add_compositor("A", 10.0).unwrap();
//! system.add_compositor("B", 0.0).unwrap();
//! system.add_compositor("E", 1.0).unwrap();
//! system
//!     .add_part(
//!         Part::from_laws(
//!             "A + E -k> B + E",
//!             &["A", "B", "E"],
//!             &["-k * A * E", "k * A * E", "0"],
//!         )
//!         .unwrap(),
//!     )
//!     .unwrap();
//!
//! let trace = system.run([0.0, 25.0]).unwrap();
//! assert_eq!(trace.names(), &["A", "B", "E"]);
//! ```
//!
//! # Compiled state
//!
//! Rate functions are compiled lazily (see `simulation::compiler`). The system keeps a
//! revision counter that is bumped on every structural change or constant change; the
//! compiled functions are valid only for the revision they were built at.
//!
//! Simulation mutates compositor values in place, so all running operations take
//! `&mut self`. Clone the system to simulate the same network concurrently.

use log::debug;
use thiserror::Error;

use crate::equation::EquationError;
use crate::model::compositor::Compositor;
use crate::model::constant::Constant;
use crate::model::part::Part;
use crate::registry::Registry;
use crate::symbols::{SymbolKind, SymbolRegistry};

/// Errors raised while declaring, looking up or compiling parts of a system.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SystemError {
    #[error("'{0}' is a reserved name and cannot be used for a constant")]
    ReservedName(String),
    #[error("'{0}' is not a valid symbol name")]
    InvalidName(String),
    #[error("Name '{0}' is already declared")]
    DuplicateName(String),
    #[error("Compositor '{0}' not found")]
    CompositorNotFound(String),
    #[error("Constant '{0}' not found")]
    ConstantNotFound(String),
    #[error("Part '{part}' lists {compositors} compositor(s) but {rates} rate(s)")]
    PartShapeMismatch {
        part: String,
        compositors: usize,
        rates: usize,
    },
    #[error("Invalid rate law: {0}")]
    Equation(#[from] EquationError),
    #[error("Failed to compile the rate of compositor '{compositor}': {source}")]
    Compilation {
        compositor: String,
        source: EquationError,
    },
}

#[derive(Debug, Clone, Default)]
pub struct BioSystem {
    pub(crate) compositors: Registry<Compositor>,
    pub(crate) constants: Registry<Constant>,
    pub(crate) parts: Vec<Part>,
    pub(crate) symbols: SymbolRegistry,
    pub(crate) revision: u64,
    pub(crate) compiled_revision: Option<u64>,
}

impl BioSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a constant.
    ///
    /// # Arguments
    ///
    /// * `name` - Symbol used in rate laws, must not be `gamma`
    /// * `value` - Numeric value substituted at compile time
    ///
    /// # Returns
    ///
    /// The position of the constant in declaration order.
    pub fn add_constant(&mut self, name: &str, value: f64) -> Result<usize, SystemError> {
        let constant = Constant::new(name, value)?;
        self.symbols.check(name, SymbolKind::Constant)?;

        let position = self.constants.insert(constant)?;
        self.symbols.register(name, SymbolKind::Constant)?;
        self.invalidate();

        Ok(position)
    }

    /// Declares a compositor with its initial value.
    ///
    /// # Returns
    ///
    /// The column of the compositor in every trace.
    pub fn add_compositor(&mut self, name: &str, initial_value: f64) -> Result<usize, SystemError> {
        self.symbols.check(name, SymbolKind::Compositor)?;

        let position = self.compositors.insert(Compositor::new(name, initial_value))?;
        self.symbols.register(name, SymbolKind::Compositor)?;
        self.invalidate();

        Ok(position)
    }

    /// Adds a part to the system.
    ///
    /// The name of a part is a free label, so several parts may share one.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::CompositorNotFound`] if the part touches an undeclared
    /// compositor.
    pub fn add_part(&mut self, part: Part) -> Result<usize, SystemError> {
        if let Some(missing) = part
            .compositors()
            .iter()
            .find(|name| self.compositors.index_of(name).is_none())
        {
            return Err(SystemError::CompositorNotFound(missing.clone()));
        }

        let position = self.parts.len();
        self.parts.push(part);
        self.invalidate();

        Ok(position)
    }

    /// Column of a compositor, or `None` if it is not declared.
    pub fn compositor_index(&self, name: &str) -> Option<usize> {
        self.compositors.index_of(name)
    }

    pub fn compositor(&self, name: &str) -> Option<&Compositor> {
        self.compositors.get(name)
    }

    pub fn compositors(&self) -> impl Iterator<Item = &Compositor> {
        self.compositors.iter()
    }

    pub fn compositor_names(&self) -> Vec<String> {
        self.compositors.names()
    }

    pub fn constant(&self, name: &str) -> Option<&Constant> {
        self.constants.get(name)
    }

    pub fn constants(&self) -> impl Iterator<Item = &Constant> {
        self.constants.iter()
    }

    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter()
    }

    pub fn symbols(&self) -> &SymbolRegistry {
        &self.symbols
    }

    /// Sets a new constant value and drops all compiled rate functions.
    pub fn change_constant_value(&mut self, name: &str, value: f64) -> Result<(), SystemError> {
        let constant = self
            .constants
            .get_mut(name)
            .ok_or_else(|| SystemError::ConstantNotFound(name.to_string()))?;
        constant.set_value(value);
        self.invalidate();

        Ok(())
    }

    /// Sets both the initial and the current value of a compositor.
    pub fn change_initial_value(&mut self, name: &str, value: f64) -> Result<(), SystemError> {
        let compositor = self
            .compositors
            .get_mut(name)
            .ok_or_else(|| SystemError::CompositorNotFound(name.to_string()))?;
        compositor.set_initial_value(value);
        compositor.set_value(value);

        Ok(())
    }

    /// Overwrites the current value of a compositor, leaving its initial value alone.
    pub fn set_value(&mut self, name: &str, value: f64) -> Result<(), SystemError> {
        self.compositors
            .get_mut(name)
            .ok_or_else(|| SystemError::CompositorNotFound(name.to_string()))?
            .set_value(value);

        Ok(())
    }

    /// Current values of all compositors in column order.
    pub fn current_state(&self) -> Vec<f64> {
        self.compositors.iter().map(|c| c.value()).collect()
    }

    /// Initial values of all compositors in column order.
    pub fn initial_state(&self) -> Vec<f64> {
        self.compositors.iter().map(|c| c.initial_value()).collect()
    }

    /// Overwrites all current values in column order. Extra values are ignored.
    pub(crate) fn set_state(&mut self, state: &[f64]) {
        for (compositor, value) in self.compositors.iter_mut().zip(state) {
            compositor.set_value(*value);
        }
    }

    /// Resets every compositor to its initial value.
    pub fn reset_state_variables(&mut self) {
        for compositor in self.compositors.iter_mut() {
            compositor.reset_value();
        }
    }

    /// Clears every accumulated rate and compiled function and marks the system stale.
    pub fn reset_rates(&mut self) {
        self.compiled_revision = None;
        for compositor in self.compositors.iter_mut() {
            compositor.reset_rate();
        }
    }

    /// Whether every compiled rate reflects the current constants and parts.
    pub fn is_compiled(&self) -> bool {
        self.compiled_revision == Some(self.revision)
    }

    fn invalidate(&mut self) {
        self.revision += 1;
        if self.compiled_revision.is_some() {
            debug!("Rates invalidated at revision {}", self.revision);
        }
        self.reset_rates();
    }
}
