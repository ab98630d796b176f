//! Symbol Registry
//!
//! Every name a rate law may refer to is registered here: the time symbol first, then
//! compositors and constants as they are declared. The registry guarantees that names are
//! valid identifiers, that no name is used twice and that constants avoid reserved words.
//!
//! The positional argument order of compiled rates is derived from this registry:
//! time, followed by the compositors in declaration order. Constants never become
//! arguments; they are substituted as literals before compilation.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::system::SystemError;

/// Name of the time symbol available in every rate law.
pub const TIME_SYMBOL: &str = "t";

/// Names a constant may not take.
pub const RESERVED_CONSTANT_NAMES: &[&str] = &["gamma"];

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// What a registered symbol stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Time,
    Compositor,
    Constant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
}

#[derive(Debug, Clone)]
pub struct SymbolRegistry {
    symbols: Vec<Symbol>,
    lookup: HashMap<String, usize>,
}

impl Default for SymbolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolRegistry {
    /// Creates a registry holding only the time symbol.
    pub fn new() -> Self {
        let time = Symbol {
            name: TIME_SYMBOL.to_string(),
            kind: SymbolKind::Time,
        };

        Self {
            lookup: HashMap::from([(time.name.clone(), 0)]),
            symbols: vec![time],
        }
    }

    /// Checks whether `name` could be registered as `kind` without registering it.
    ///
    /// # Errors
    ///
    /// * [`SystemError::InvalidName`] - not an identifier
    /// * [`SystemError::ReservedName`] - a constant named after a reserved word
    /// * [`SystemError::DuplicateName`] - the name is already taken, including by time
    pub fn check(&self, name: &str, kind: SymbolKind) -> Result<(), SystemError> {
        validate_identifier(name)?;

        if kind == SymbolKind::Constant {
            check_reserved(name)?;
        }

        if self.lookup.contains_key(name) {
            return Err(SystemError::DuplicateName(name.to_string()));
        }

        Ok(())
    }

    /// Registers a new symbol.
    pub fn register(&mut self, name: &str, kind: SymbolKind) -> Result<(), SystemError> {
        self.check(name, kind)?;

        self.lookup.insert(name.to_string(), self.symbols.len());
        self.symbols.push(Symbol {
            name: name.to_string(),
            kind,
        });

        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.lookup.get(name).map(|&i| &self.symbols[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Positional argument names of compiled rates: time, then compositors in order.
    pub fn argument_order(&self) -> Vec<String> {
        self.symbols
            .iter()
            .filter(|s| matches!(s.kind, SymbolKind::Time | SymbolKind::Compositor))
            .map(|s| s.name.clone())
            .collect()
    }
}

/// Fails if `name` is not usable inside a rate law.
pub fn validate_identifier(name: &str) -> Result<(), SystemError> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(SystemError::InvalidName(name.to_string()))
    }
}

/// Fails if `name` is reserved for constants.
pub fn check_reserved(name: &str) -> Result<(), SystemError> {
    if RESERVED_CONSTANT_NAMES.contains(&name) {
        Err(SystemError::ReservedName(name.to_string()))
    } else {
        Ok(())
    }
}
