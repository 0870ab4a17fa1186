//! Query compilation errors.
//!
//! Both kinds are caused by caller input and are never retried.

use thiserror::Error;

use super::types::ConferenceField;

/// A filter that cannot be resolved against the alias tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidFilterError {
    #[error("Filter contains invalid field: {0:?}")]
    UnknownField(String),

    #[error("Filter contains invalid operator: {0:?}")]
    UnknownOperator(String),

    #[error("Filter value for {field} must be an integer, got {value:?}")]
    NotAnInteger {
        field: ConferenceField,
        value: String,
    },
}

/// Failure to compile a filter list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error(transparent)]
    InvalidFilter(#[from] InvalidFilterError),

    #[error(
        "Inequality filter is allowed on only one field: {first} and {second} both use inequalities"
    )]
    MultipleInequalityFields {
        first: ConferenceField,
        second: ConferenceField,
    },
}
