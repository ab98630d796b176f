use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::equation::{EquationError, RateExpr};
use crate::system::SystemError;

/// One contribution of a reaction to the derivative of a compositor.
///
/// The rate law is parsed once on construction; the source text is kept for display
/// and serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rate {
    source: String,
    expression: RateExpr,
}

impl Rate {
    pub fn new(source: &str) -> Result<Self, EquationError> {
        Ok(Self {
            source: source.trim().to_string(),
            expression: RateExpr::parse(source)?,
        })
    }

    pub fn expression(&self) -> &RateExpr {
        &self.expression
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl FromStr for Rate {
    type Err = EquationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rate::new(s)
    }
}

impl TryFrom<String> for Rate {
    type Error = EquationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rate::new(&value)
    }
}

impl From<Rate> for String {
    fn from(rate: Rate) -> Self {
        rate.source
    }
}

impl Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// A reaction or process changing several compositors at once.
///
/// `compositors[i]` changes according to `rates[i]`.
///
/// # Examples
///
/// ```
/// use biosystem::prelude::*;
///
/// let reaction = Part::from_laws(
///     "A + E -k> B + E",
///     &["A", "B", "E"],
///     &["-k * A * E", "k * A * E", "0"],
/// )
/// .unwrap();
///
/// assert_eq!(reaction.compositors().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    name: String,
    compositors: Vec<String>,
    rates: Vec<Rate>,
}

impl Part {
    /// Creates a part from already parsed rates.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::PartShapeMismatch`] if the two lists differ in length.
    pub fn new(
        name: impl Into<String>,
        compositors: Vec<String>,
        rates: Vec<Rate>,
    ) -> Result<Self, SystemError> {
        let name = name.into();
        if compositors.len() != rates.len() {
            return Err(SystemError::PartShapeMismatch {
                part: name,
                compositors: compositors.len(),
                rates: rates.len(),
            });
        }

        Ok(Self {
            name,
            compositors,
            rates,
        })
    }

    /// Creates a part from compositor names and textual rate laws.
    pub fn from_laws(name: &str, compositors: &[&str], laws: &[&str]) -> Result<Self, SystemError> {
        let rates = laws
            .iter()
            .map(|law| Rate::new(law))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(
            name,
            compositors.iter().map(|c| c.to_string()).collect(),
            rates,
        )
    }

    /// Free-text label of the part, not necessarily unique.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn compositors(&self) -> &[String] {
        &self.compositors
    }

    pub fn rates(&self) -> &[Rate] {
        &self.rates
    }

    /// Pairs every affected compositor with its rate contribution.
    pub fn contributions(&self) -> impl Iterator<Item = (&str, &Rate)> {
        self.compositors
            .iter()
            .map(String::as_str)
            .zip(self.rates.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch() {
        let result = Part::from_laws("r", &["A", "B"], &["-k * A"]);
        assert!(matches!(
            result,
            Err(SystemError::PartShapeMismatch {
                compositors: 2,
                rates: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_law() {
        let result = Part::from_laws("r", &["A"], &["k * * A"]);
        assert!(matches!(result, Err(SystemError::Equation(_))));
    }

    #[test]
    fn test_rate_serializes_as_text() {
        let rate = Rate::new("k * A").unwrap();
        let json = serde_json::to_string(&rate).unwrap();
        assert_eq!(json, "\"k * A\"");

        let back: Rate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rate);
    }
}
