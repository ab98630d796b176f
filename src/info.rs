//! Information display for systems
//!
//! Implements `Display` for [`BioSystem`], rendering its constants, compositors and parts
//! as tables. Compositors show their accumulated rate once the system has been compiled.

use std::fmt::{self, Display};

use tabled::{builder::Builder, settings::Style};

use crate::model::compositor::Compositor;
use crate::model::constant::Constant;
use crate::model::part::Part;
use crate::registry::Named;
use crate::system::BioSystem;

/// Rows of a display table.
trait TableRecord {
    fn columns() -> Vec<String>;

    fn to_record(&self) -> Vec<String>;
}

impl TableRecord for Constant {
    fn columns() -> Vec<String> {
        vec!["Name".into(), "Value".into()]
    }

    fn to_record(&self) -> Vec<String> {
        vec![self.name().to_string(), self.value().to_string()]
    }
}

impl TableRecord for Compositor {
    fn columns() -> Vec<String> {
        vec![
            "Name".into(),
            "Initial".into(),
            "Current".into(),
            "Rate".into(),
        ]
    }

    fn to_record(&self) -> Vec<String> {
        let rate = match self.rhs() {
            Some(rhs) => rhs.expression().to_string(),
            None => "-".to_string(),
        };

        vec![
            self.name().to_string(),
            self.initial_value().to_string(),
            self.value().to_string(),
            rate,
        ]
    }
}

impl TableRecord for Part {
    fn columns() -> Vec<String> {
        vec!["Part".into(), "Compositor".into(), "Rate".into()]
    }

    // One line per contribution inside a single cell keeps parts visually grouped.
    fn to_record(&self) -> Vec<String> {
        let (compositors, rates): (Vec<_>, Vec<_>) = self
            .contributions()
            .map(|(name, rate)| (name.to_string(), rate.to_string()))
            .unzip();

        vec![
            self.name().to_string(),
            compositors.join("\n"),
            rates.join("\n"),
        ]
    }
}

impl Display for BioSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = Builder::default();
        builder.push_record(vec!["Reaction Network"]);

        let constants: Vec<&Constant> = self.constants().collect();
        if !constants.is_empty() {
            builder.push_record(vec!["Constants"]);
            builder.push_record(vec![to_table(&constants)]);
        }

        let compositors: Vec<&Compositor> = self.compositors().collect();
        if !compositors.is_empty() {
            builder.push_record(vec!["Compositors"]);
            builder.push_record(vec![to_table(&compositors)]);
        }

        let parts: Vec<&Part> = self.parts().collect();
        if !parts.is_empty() {
            builder.push_record(vec!["Parts"]);
            builder.push_record(vec![to_table(&parts)]);
        }

        let mut table = builder.build();
        table.with(Style::sharp());
        write!(f, "{}", table)
    }
}

fn to_table<T: TableRecord>(records: &[&T]) -> String {
    let mut builder = Builder::default();
    builder.push_record(T::columns());

    for record in records {
        builder.push_record(record.to_record());
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}
