//! Filter descriptor compilation.

use super::error::{InvalidFilterError, QueryError};
use super::types::{
    CompiledQuery, ConferenceField, FilterDescriptor, FilterValue, Operator, Predicate, SortKey,
    ValueKind,
};

/// Validate and translate filter descriptors into a query plan.
///
/// All descriptors are resolved; the first failure aborts compilation and no
/// partial plan is returned. At most one distinct field may carry inequality
/// operators, and when one does it becomes the primary sort key (the query
/// engine requires the first sort key to match the inequality field).
pub fn compile(descriptors: &[FilterDescriptor]) -> Result<CompiledQuery, QueryError> {
    let mut predicates = Vec::with_capacity(descriptors.len());
    let mut inequality_field: Option<ConferenceField> = None;

    for descriptor in descriptors {
        let predicate = resolve(descriptor)?;

        if predicate.operator.is_inequality() {
            match inequality_field {
                None => inequality_field = Some(predicate.field),
                Some(first) if first != predicate.field => {
                    return Err(QueryError::MultipleInequalityFields {
                        first,
                        second: predicate.field,
                    });
                }
                Some(_) => {}
            }
        }

        predicates.push(predicate);
    }

    let order = match inequality_field {
        Some(field) => vec![SortKey::Field(field), SortKey::Name],
        None => vec![SortKey::Name],
    };

    Ok(CompiledQuery { predicates, order })
}

/// Resolve one descriptor against the alias tables.
fn resolve(descriptor: &FilterDescriptor) -> Result<Predicate, InvalidFilterError> {
    let field = ConferenceField::from_alias(&descriptor.field)
        .ok_or_else(|| InvalidFilterError::UnknownField(descriptor.field.clone()))?;
    let operator = Operator::from_alias(&descriptor.operator)
        .ok_or_else(|| InvalidFilterError::UnknownOperator(descriptor.operator.clone()))?;

    let value = match field.value_kind() {
        ValueKind::Text => FilterValue::Text(descriptor.value.clone()),
        ValueKind::Integer => descriptor
            .value
            .trim()
            .parse::<i64>()
            .map(FilterValue::Integer)
            .map_err(|_| InvalidFilterError::NotAnInteger {
                field,
                value: descriptor.value.clone(),
            })?,
    };

    Ok(Predicate {
        field,
        operator,
        value,
    })
}
