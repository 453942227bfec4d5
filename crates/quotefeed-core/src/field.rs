//! Field catalog: named, typed column identifiers.
//!
//! Every tabular result is keyed by entries from a single process-wide
//! catalog built once at initialization. Names are globally unique and
//! lookup by name is O(1). The catalog is append-only: there is no way
//! to remove or redefine a field after the catalog is built.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use crate::error::CatalogError;
use crate::value::{DataType, Value};

/// A named, typed column identifier.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Field {
    name: &'static str,
    data_type: DataType,
}

impl Field {
    pub const fn new(name: &'static str, data_type: DataType) -> Self {
        Self { name, data_type }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    /// The sentinel written into a cell that was never observed.
    /// Numeric columns use NaN so "not yet observed" is distinguishable
    /// from an observed zero.
    pub fn missing_value(&self) -> Value {
        Value::missing_for(self.data_type)
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// An immutable registry of fields validated for name uniqueness.
#[derive(Debug)]
pub struct FieldCatalog {
    fields: Vec<&'static Field>,
    by_name: HashMap<&'static str, usize>,
}

impl FieldCatalog {
    /// Builds a catalog from an ordered field list, rejecting duplicate
    /// names at build time rather than at first use.
    pub fn build(fields: &[&'static Field]) -> Result<Self, CatalogError> {
        let mut by_name = HashMap::with_capacity(fields.len());
        for (index, field) in fields.iter().enumerate() {
            if by_name.insert(field.name(), index).is_some() {
                return Err(CatalogError::DuplicateField { name: field.name() });
            }
        }
        Ok(Self {
            fields: fields.to_vec(),
            by_name,
        })
    }

    pub fn lookup(&self, name: &str) -> Option<&'static Field> {
        self.by_name.get(name).map(|&index| self.fields[index])
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &'static Field> + '_ {
        self.fields.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static OPEN: Field = Field::new("PX_OPEN", DataType::Number);
    static CLOSE: Field = Field::new("PX_CLOSE", DataType::Number);
    static OPEN_AGAIN: Field = Field::new("PX_OPEN", DataType::Text);

    #[test]
    fn lookup_finds_registered_fields() {
        let catalog = FieldCatalog::build(&[&OPEN, &CLOSE]).expect("unique names");
        assert_eq!(catalog.lookup("PX_CLOSE"), Some(&CLOSE));
        assert_eq!(catalog.lookup("PX_MISSING"), None);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn duplicate_names_are_rejected_at_build_time() {
        let error = FieldCatalog::build(&[&OPEN, &CLOSE, &OPEN_AGAIN]).expect_err("duplicate");
        assert_eq!(error, CatalogError::DuplicateField { name: "PX_OPEN" });
    }

    #[test]
    fn declaration_order_is_preserved() {
        let catalog = FieldCatalog::build(&[&CLOSE, &OPEN]).expect("unique names");
        let names = catalog.iter().map(Field::name).collect::<Vec<_>>();
        assert_eq!(names, vec!["PX_CLOSE", "PX_OPEN"]);
    }

    #[test]
    fn numeric_fields_default_to_nan() {
        match OPEN.missing_value() {
            Value::Number(value) => assert!(value.is_nan()),
            other => panic!("expected NaN number, got {other:?}"),
        }
    }
}
