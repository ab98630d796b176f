//! Model documents
//!
//! A [`ModelDocument`] is the serializable description of a [`BioSystem`]: constants,
//! compositors with their initial values, parts with textual rate laws, and optionally a
//! pulse schedule and a simulation setup.
//!
//! ```json
//! {
//!   "name": "catalysis",
//!   "constants": [{ "name": "k", "value": 0.05 }],
//!   "compositors": [{ "name": "A", "initial_value": 10.0 }],
//!   "parts": [{ "name": "decay", "compositors": ["A"], "rates": ["-k * A"] }],
//!   "pulses": [{ "time": 0.0, "compositor": "A", "value": 10.0 }, { "time": 50.0 }]
//! }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::constant::Constant;
use crate::model::part::Part;
use crate::model::pulse::Pulse;
use crate::registry::Named;
use crate::simulation::setup::SimulationSetup;
use crate::system::{BioSystem, SystemError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositorDocument {
    pub name: String,
    pub initial_value: f64,
}

/// Serializable description of a system.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub constants: Vec<Constant>,
    #[serde(default)]
    pub compositors: Vec<CompositorDocument>,
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pulses: Vec<Pulse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup: Option<SimulationSetup>,
}

impl ModelDocument {
    /// Builds the system described by this document.
    pub fn to_system(&self) -> Result<BioSystem, SystemError> {
        BioSystem::try_from(self)
    }
}

impl TryFrom<&ModelDocument> for BioSystem {
    type Error = SystemError;

    /// Declares constants, then compositors, then parts, so that every declaration goes
    /// through the same checks as the programmatic API.
    fn try_from(doc: &ModelDocument) -> Result<Self, Self::Error> {
        let mut system = BioSystem::new();

        for constant in &doc.constants {
            system.add_constant(constant.name(), constant.value())?;
        }

        for compositor in &doc.compositors {
            system.add_compositor(&compositor.name, compositor.initial_value)?;
        }

        for part in &doc.parts {
            system.add_part(Part::new(
                part.name(),
                part.compositors().to_vec(),
                part.rates().to_vec(),
            )?)?;
        }

        Ok(system)
    }
}

impl From<&BioSystem> for ModelDocument {
    fn from(system: &BioSystem) -> Self {
        Self {
            name: String::new(),
            constants: system.constants().cloned().collect(),
            compositors: system
                .compositors()
                .map(|c| CompositorDocument {
                    name: c.name().to_string(),
                    initial_value: c.initial_value(),
                })
                .collect(),
            parts: system.parts().cloned().collect(),
            pulses: Vec::new(),
            setup: None,
        }
    }
}

/// Loads a model document from a JSON file.
///
/// # Arguments
///
/// * `path` - Path to the JSON file
///
/// # Errors
///
/// * `IOError::FileNotFound` - the file cannot be opened
/// * `IOError::JsonParseError` - the file is not a valid model document, including rate
///   laws that fail to parse
pub fn load_model(path: impl Into<PathBuf>) -> Result<ModelDocument, IOError> {
    let path = path.into();
    let file = std::fs::File::open(path).map_err(IOError::FileNotFound)?;
    serde_json::from_reader(file).map_err(IOError::JsonParseError)
}

/// Loads a model document and builds its system.
pub fn load_system(path: impl Into<PathBuf>) -> Result<(BioSystem, ModelDocument), IOError> {
    let doc = load_model(path)?;
    let system = BioSystem::try_from(&doc)?;

    Ok((system, doc))
}

/// Saves a model document as pretty-printed JSON.
pub fn save_model(path: impl Into<PathBuf>, doc: &ModelDocument) -> Result<(), IOError> {
    let path = path.into();
    let file = std::fs::File::create(path).map_err(IOError::FileNotFound)?;
    serde_json::to_writer_pretty(file, doc).map_err(IOError::JsonParseError)
}

/// Errors raised while reading or writing model documents.
#[derive(Error, Debug)]
pub enum IOError {
    #[error("File not found: {0}")]
    FileNotFound(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),

    /// The document parsed but does not describe a valid system.
    #[error("Invalid model: {0}")]
    System(#[from] SystemError),
}
