//! Query compiler types.
//!
//! Provides the public filter vocabulary and the compiled plan:
//! - FilterDescriptor: caller-supplied `{field, operator, value}` triple
//! - ConferenceField / Operator: the fixed alias tables
//! - CompiledQuery: ordered predicates plus sort order

use std::fmt;

use serde::{Deserialize, Serialize};

/// Public filter names and the conference attributes they address.
pub const FIELD_ALIASES: [(&str, ConferenceField); 4] = [
    ("CITY", ConferenceField::City),
    ("TOPIC", ConferenceField::Topics),
    ("MONTH", ConferenceField::Month),
    ("MAX_ATTENDEES", ConferenceField::MaxAttendees),
];

/// Symbolic operator names and the comparisons they stand for.
pub const OPERATOR_ALIASES: [(&str, Operator); 6] = [
    ("EQ", Operator::Eq),
    ("GT", Operator::Gt),
    ("GTEQ", Operator::Gte),
    ("LT", Operator::Lt),
    ("LTEQ", Operator::Lte),
    ("NE", Operator::Ne),
];

/// One caller-supplied filter, exactly as received on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDescriptor {
    /// Field alias (`CITY`, `TOPIC`, `MONTH`, `MAX_ATTENDEES`).
    #[serde(default)]
    pub field: String,

    /// Operator alias (`EQ`, `GT`, `GTEQ`, `LT`, `LTEQ`, `NE`).
    #[serde(default)]
    pub operator: String,

    /// Raw value; integer fields are parsed during compilation.
    #[serde(default)]
    pub value: String,
}

impl FilterDescriptor {
    /// Build a descriptor from its three tokens.
    pub fn new(field: &str, operator: &str, value: &str) -> Self {
        Self {
            field: field.to_string(),
            operator: operator.to_string(),
            value: value.to_string(),
        }
    }
}

/// Conference attribute a filter can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConferenceField {
    City,
    Topics,
    Month,
    MaxAttendees,
}

/// How a filter value must be typed for its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
}

impl ConferenceField {
    /// Resolve a public alias such as `MAX_ATTENDEES`.
    pub fn from_alias(alias: &str) -> Option<Self> {
        FIELD_ALIASES
            .iter()
            .find(|(name, _)| *name == alias)
            .map(|(_, field)| *field)
    }

    /// Entity attribute name as exposed in conference forms.
    pub fn attribute(self) -> &'static str {
        match self {
            ConferenceField::City => "city",
            ConferenceField::Topics => "topics",
            ConferenceField::Month => "month",
            ConferenceField::MaxAttendees => "maxAttendees",
        }
    }

    /// Value type the field is stored with.
    pub fn value_kind(self) -> ValueKind {
        match self {
            ConferenceField::Month | ConferenceField::MaxAttendees => ValueKind::Integer,
            ConferenceField::City | ConferenceField::Topics => ValueKind::Text,
        }
    }

    /// Whether the attribute holds a list of values.
    pub fn is_repeated(self) -> bool {
        matches!(self, ConferenceField::Topics)
    }
}

impl fmt::Display for ConferenceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute())
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Ne,
}

impl Operator {
    /// Resolve a symbolic alias such as `GTEQ`.
    pub fn from_alias(alias: &str) -> Option<Self> {
        OPERATOR_ALIASES
            .iter()
            .find(|(name, _)| *name == alias)
            .map(|(_, op)| *op)
    }

    /// Comparison symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Ne => "!=",
        }
    }

    /// Every operator except equality is an inequality.
    pub fn is_inequality(self) -> bool {
        self != Operator::Eq
    }

    /// The operator with its operands swapped (`a > b` ⇔ `b < a`).
    pub fn flipped(self) -> Self {
        match self {
            Operator::Gt => Operator::Lt,
            Operator::Gte => Operator::Lte,
            Operator::Lt => Operator::Gt,
            Operator::Lte => Operator::Gte,
            Operator::Eq | Operator::Ne => self,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Typed filter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
}

impl FilterValue {
    /// Integer payload, if the value is integer-typed.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FilterValue::Integer(i) => Some(*i),
            FilterValue::Text(_) => None,
        }
    }
}

impl From<&FilterValue> for sea_query::Value {
    fn from(value: &FilterValue) -> Self {
        match value {
            FilterValue::Text(s) => s.clone().into(),
            FilterValue::Integer(i) => (*i).into(),
        }
    }
}

/// A resolved `(field, operator, value)` predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: ConferenceField,
    pub operator: Operator,
    pub value: FilterValue,
}

/// One key of the result ordering. All keys sort ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Field(ConferenceField),
    Name,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Field(field) => field.fmt(f),
            SortKey::Name => f.write_str("name"),
        }
    }
}

/// Validated, conflict-free query plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    /// Predicates in the order they were received.
    pub predicates: Vec<Predicate>,

    /// Sort order: the inequality field (if any), then name.
    pub order: Vec<SortKey>,
}

impl CompiledQuery {
    /// The single field carrying inequality predicates, if any.
    pub fn inequality_field(&self) -> Option<ConferenceField> {
        match self.order.first() {
            Some(SortKey::Field(field)) => Some(*field),
            _ => None,
        }
    }
}
