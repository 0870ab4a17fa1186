//! Conference query filter compiler.
//!
//! This module provides:
//! - compile: validates filter descriptors into a CompiledQuery
//! - ConferenceQueryBuilder: SeaQuery-based SQL generation for a CompiledQuery
//! - Types: FilterDescriptor, ConferenceField, Operator, SortKey, etc.

mod builder;
mod compiler;
mod error;
pub mod types;

pub use builder::ConferenceQueryBuilder;
pub use compiler::compile;
pub use error::{InvalidFilterError, QueryError};
pub use types::{
    CompiledQuery, ConferenceField, FIELD_ALIASES, FilterDescriptor, FilterValue,
    OPERATOR_ALIASES, Operator, Predicate, SortKey, ValueKind,
};
