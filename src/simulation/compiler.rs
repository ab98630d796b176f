//! Rate Compiler
//!
//! Folds the contributions of every part into one rate expression per compositor,
//! substitutes the current constant values and compiles each result into a callable
//! taking `(t, compositor values...)` in column order.
//!
//! Compilation always starts from scratch: every accumulated rate is reset to zero and
//! all parts are folded in again. The result is cached until the system revision changes.

use std::collections::HashMap;

use log::debug;

use crate::equation::CompiledRate;
use crate::registry::Named;
use crate::system::{BioSystem, SystemError};

use super::error::SimulationError;

impl BioSystem {
    /// Compiles the rate of every compositor unless the cached functions are current.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::Compilation`] when a rate law refers to a symbol that is
    /// neither time, a compositor nor a constant. The system stays uncompiled.
    pub fn compile(&mut self) -> Result<(), SystemError> {
        if self.is_compiled() {
            return Ok(());
        }

        self.reset_rates();

        for part in self.parts.iter() {
            for (name, rate) in part.contributions() {
                self.compositors
                    .get_mut(name)
                    .ok_or_else(|| SystemError::CompositorNotFound(name.to_string()))?
                    .add_rate(rate.expression());
            }
        }

        let substitutions: HashMap<String, f64> = self
            .constants
            .iter()
            .map(|c| (c.name().to_string(), c.value()))
            .collect();
        let arguments = self.symbols.argument_order();

        for compositor in self.compositors.iter_mut() {
            let expression = compositor.rate().substitute(&substitutions).simplify();
            let compiled = expression
                .compile(&arguments)
                .map_err(|source| SystemError::Compilation {
                    compositor: compositor.name().to_string(),
                    source,
                })?;
            compositor.set_rhs(compiled);
        }

        self.compiled_revision = Some(self.revision);
        debug!(
            "Compiled rates of {} compositor(s) from {} part(s) at revision {}",
            self.compositors.len(),
            self.parts.len(),
            self.revision
        );

        Ok(())
    }

    /// Compiled rate functions in column order. Compiles first if needed.
    pub fn compiled_rates(&mut self) -> Result<Vec<CompiledRate>, SystemError> {
        self.compile()?;

        self.compositors
            .iter()
            .map(|c| {
                c.rhs()
                    .cloned()
                    .ok_or_else(|| SystemError::CompositorNotFound(c.name().to_string()))
            })
            .collect()
    }

    /// Evaluates the derivative of every compositor at time `t` and state `state`.
    ///
    /// # Arguments
    ///
    /// * `t` - Time
    /// * `state` - Values of all compositors in column order
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::StateLengthMismatch`] if `state` does not hold exactly
    /// one value per compositor.
    pub fn evaluate_rates(&mut self, t: f64, state: &[f64]) -> Result<Vec<f64>, SimulationError> {
        if state.len() != self.compositors.len() {
            return Err(SimulationError::StateLengthMismatch {
                expected: self.compositors.len(),
                actual: state.len(),
            });
        }

        let rates = self.compiled_rates()?;

        let mut args = Vec::with_capacity(state.len() + 1);
        args.push(t);
        args.extend_from_slice(state);

        Ok(rates.iter().map(|rate| rate.eval(&args)).collect())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::model::part::Part;

    use super::*;

    fn system() -> BioSystem {
        let mut system = BioSystem::new();
        system.add_constant("k", 0.05).unwrap();
        system.add_compositor("A", 10.0).unwrap();
        system.add_compositor("B", 0.0).unwrap();
        system
            .add_part(Part::from_laws("conversion", &["A", "B"], &["-k * A", "k * A"]).unwrap())
            .unwrap();
        system
    }

    #[test]
    fn test_compile_is_idempotent() {
        let mut system = system();
        system.compile().unwrap();
        let rate = system.compositor("A").unwrap().rate().to_string();
        let rhs = system.compositor("A").unwrap().rhs().cloned();

        system.compile().unwrap();
        assert_eq!(system.compositor("A").unwrap().rate().to_string(), rate);
        assert_eq!(system.compositor("A").unwrap().rhs().cloned(), rhs);
    }

    #[test]
    fn test_constants_are_substituted() {
        let mut system = system();
        system.compile().unwrap();

        let rhs = system.compositor("B").unwrap().rhs().unwrap();
        assert!(rhs.expression().symbols().iter().all(|s| s != "k"));
        assert_eq!(rhs.arity(), 3);
    }

    #[test]
    fn test_refold_does_not_double_count() {
        let mut system = system();
        let before = system.evaluate_rates(0.0, &[10.0, 0.0]).unwrap();

        system.change_constant_value("k", 0.05).unwrap();
        let after = system.evaluate_rates(0.0, &[10.0, 0.0]).unwrap();

        assert_relative_eq!(before[0], after[0]);
        assert_relative_eq!(after[0], -0.5);
    }

    #[test]
    fn test_evaluate_rates_checks_state_length() {
        let mut system = system();

        for state in [&[10.0][..], &[10.0, 0.0, 1.0][..], &[][..]] {
            assert!(matches!(
                system.evaluate_rates(0.0, state),
                Err(SimulationError::StateLengthMismatch { expected: 2, actual })
                    if actual == state.len()
            ));
        }
    }

    #[test]
    fn test_unresolved_symbol_fails() {
        let mut system = system();
        system
            .add_part(Part::from_laws("leak", &["B"], &["-q * B"]).unwrap())
            .unwrap();

        assert!(matches!(
            system.compile(),
            Err(SystemError::Compilation { compositor, .. }) if compositor == "B"
        ));
        assert!(!system.is_compiled());
    }
}
