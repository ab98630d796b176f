use serde::{Deserialize, Serialize};

use crate::registry::Named;
use crate::symbols::{check_reserved, validate_identifier};
use crate::system::SystemError;

/// A named numeric parameter usable inside rate laws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    name: String,
    value: f64,
}

impl Constant {
    /// Creates a constant.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::ReservedName`] for `gamma` regardless of the value, and
    /// [`SystemError::InvalidName`] for names that are not identifiers.
    pub fn new(name: impl Into<String>, value: f64) -> Result<Self, SystemError> {
        let name = name.into();
        check_reserved(&name)?;
        validate_identifier(&name)?;

        Ok(Self { name, value })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub(crate) fn set_value(&mut self, value: f64) {
        self.value = value;
    }
}

impl Named for Constant {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gamma_is_reserved() {
        for value in [0.0, 1.0, -3.5, f64::MAX] {
            assert!(matches!(
                Constant::new("gamma", value),
                Err(SystemError::ReservedName(_))
            ));
        }
        assert!(Constant::new("gamma2", 1.0).is_ok());
    }
}
