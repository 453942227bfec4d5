use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use time::{Date, Time};

/// Data type declared for a catalog field / table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Number,
    Date,
    Time,
    Text,
}

impl DataType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Date => "date",
            Self::Time => "time",
            Self::Text => "text",
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed cell value produced by the parser and stored in result tables.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Number(f64),
    Date(Date),
    Time(Time),
    Text(String),
}

impl Value {
    /// The default cell for a column that has not been written yet.
    pub fn missing_for(data_type: DataType) -> Self {
        match data_type {
            DataType::Number => Self::Number(f64::NAN),
            _ => Self::Missing,
        }
    }

    pub const fn data_type(&self) -> Option<DataType> {
        match self {
            Self::Missing => None,
            Self::Number(_) => Some(DataType::Number),
            Self::Date(_) => Some(DataType::Date),
            Self::Time(_) => Some(DataType::Time),
            Self::Text(_) => Some(DataType::Text),
        }
    }

    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Missing => "null",
            Self::Number(_) => "number",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::Text(_) => "text",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            Self::Missing => true,
            Self::Number(value) => value.is_nan(),
            _ => false,
        }
    }

    /// Total ordering used by deterministic sort passes: missing cells
    /// sort last; values of different types group by type.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Missing, Self::Missing) => Ordering::Equal,
            (Self::Missing, _) => Ordering::Greater,
            (_, Self::Missing) => Ordering::Less,
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b).unwrap_or_else(|| {
                match (a.is_nan(), b.is_nan()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    _ => Ordering::Less,
                }
            }),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Time(a), Self::Time(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (a, b) => a.type_rank().cmp(&b.type_rank()),
        }
    }

    const fn type_rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::Date(_) => 1,
            Self::Time(_) => 2,
            Self::Text(_) => 3,
            Self::Missing => 4,
        }
    }
}

impl serde::Serialize for Value {
    /// Missing cells (including NaN numbers) serialize as null; dates
    /// and times serialize as their display form.
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Missing => serializer.serialize_none(),
            Self::Number(number) if number.is_nan() => serializer.serialize_none(),
            Self::Number(number) => serializer.serialize_f64(*number),
            Self::Date(date) => serializer.collect_str(date),
            Self::Time(time) => serializer.collect_str(time),
            Self::Text(text) => serializer.serialize_str(text),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Date> for Value {
    fn from(value: Date) -> Self {
        Self::Date(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_number_counts_as_missing() {
        assert!(Value::Number(f64::NAN).is_missing());
        assert!(!Value::Number(0.0).is_missing());
        assert!(Value::Missing.is_missing());
    }

    #[test]
    fn missing_sorts_after_values() {
        assert_eq!(
            Value::Missing.compare(&Value::Number(1.0)),
            Ordering::Greater
        );
        assert_eq!(Value::Number(1.0).compare(&Value::Number(2.0)), Ordering::Less);
        assert_eq!(
            Value::Text(String::from("CALL")).compare(&Value::Text(String::from("PUT"))),
            Ordering::Less
        );
    }
}
