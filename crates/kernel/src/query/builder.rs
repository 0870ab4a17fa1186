//! Conference query builder using SeaQuery.
//!
//! Renders a [`CompiledQuery`] as a PostgreSQL SELECT over the `conference`
//! table. Scalar attributes compare directly; the list-valued `topics`
//! attribute matches when any element satisfies the predicate.

use sea_query::{Asterisk, Expr, Iden, Order, PostgresQueryBuilder, Query, SimpleExpr};

use super::types::{CompiledQuery, ConferenceField, Operator, Predicate, SortKey};

/// Identifiers of the `conference` table.
#[derive(Iden, Clone, Copy)]
enum ConferenceIden {
    #[iden = "conference"]
    Table,
    Name,
    City,
    Topics,
    Month,
    MaxAttendees,
}

impl From<ConferenceField> for ConferenceIden {
    fn from(field: ConferenceField) -> Self {
        match field {
            ConferenceField::City => ConferenceIden::City,
            ConferenceField::Topics => ConferenceIden::Topics,
            ConferenceField::Month => ConferenceIden::Month,
            ConferenceField::MaxAttendees => ConferenceIden::MaxAttendees,
        }
    }
}

/// Query builder for compiled conference queries.
pub struct ConferenceQueryBuilder<'a> {
    query: &'a CompiledQuery,
}

impl<'a> ConferenceQueryBuilder<'a> {
    /// Create a builder over a compiled plan.
    pub fn new(query: &'a CompiledQuery) -> Self {
        Self { query }
    }

    /// Build the SELECT statement.
    pub fn build(&self) -> String {
        let mut select = Query::select();
        select
            .column((ConferenceIden::Table, Asterisk))
            .from(ConferenceIden::Table);

        for predicate in &self.query.predicates {
            select.and_where(predicate_expr(predicate));
        }

        for key in &self.query.order {
            let column = match key {
                SortKey::Field(field) => ConferenceIden::from(*field),
                SortKey::Name => ConferenceIden::Name,
            };
            select.order_by((ConferenceIden::Table, column), Order::Asc);
        }

        select.to_string(PostgresQueryBuilder)
    }
}

/// Build the WHERE condition for one predicate.
fn predicate_expr(predicate: &Predicate) -> SimpleExpr {
    let value = sea_query::Value::from(&predicate.value);

    if predicate.field.is_repeated() {
        // value <op'> ANY(column): true when some element satisfies column <op> value
        let column = ConferenceIden::from(predicate.field).to_string();
        let any = Expr::cust(format!("ANY(\"conference\".\"{column}\")"));
        compare(Expr::val(value), predicate.operator.flipped(), any)
    } else {
        compare(
            Expr::col((ConferenceIden::Table, ConferenceIden::from(predicate.field))),
            predicate.operator,
            value,
        )
    }
}

fn compare<R>(left: Expr, operator: Operator, right: R) -> SimpleExpr
where
    R: Into<SimpleExpr>,
{
    match operator {
        Operator::Eq => left.eq(right),
        Operator::Ne => left.ne(right),
        Operator::Gt => left.gt(right),
        Operator::Gte => left.gte(right),
        Operator::Lt => left.lt(right),
        Operator::Lte => left.lte(right),
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::query::{FilterDescriptor, compile};

    fn sql_for(descriptors: &[FilterDescriptor]) -> String {
        let compiled = compile(descriptors).unwrap();
        ConferenceQueryBuilder::new(&compiled).build()
    }

    #[test]
    fn no_filters_orders_by_name() {
        let sql = sql_for(&[]);

        assert!(sql.starts_with("SELECT \"conference\".* FROM \"conference\""));
        assert!(!sql.contains("WHERE"), "{sql}");
        assert!(
            sql.ends_with("ORDER BY \"conference\".\"name\" ASC"),
            "{sql}"
        );
    }

    #[test]
    fn equality_filters() {
        let sql = sql_for(&[
            FilterDescriptor::new("CITY", "EQ", "London"),
            FilterDescriptor::new("MONTH", "EQ", "6"),
        ]);

        assert!(sql.contains("\"conference\".\"city\" = 'London'"), "{sql}");
        assert!(sql.contains("\"conference\".\"month\" = 6"), "{sql}");
        assert!(sql.contains(" AND "), "{sql}");
        assert!(
            sql.ends_with("ORDER BY \"conference\".\"name\" ASC"),
            "{sql}"
        );
    }

    #[test]
    fn inequality_field_sorts_first() {
        let sql = sql_for(&[
            FilterDescriptor::new("MAX_ATTENDEES", "GT", "10"),
            FilterDescriptor::new("CITY", "EQ", "Paris"),
        ]);

        assert!(
            sql.contains("\"conference\".\"max_attendees\" > 10"),
            "{sql}"
        );
        assert!(
            sql.contains(
                "ORDER BY \"conference\".\"max_attendees\" ASC, \"conference\".\"name\" ASC"
            ),
            "{sql}"
        );
    }

    #[test]
    fn topic_equality_matches_any_element() {
        let sql = sql_for(&[FilterDescriptor::new("TOPIC", "EQ", "Medical Innovations")]);

        assert!(
            sql.contains("'Medical Innovations' = ANY(\"conference\".\"topics\")"),
            "{sql}"
        );
    }

    #[test]
    fn topic_inequality_flips_operator() {
        let sql = sql_for(&[FilterDescriptor::new("TOPIC", "GT", "M")]);

        assert!(sql.contains("'M' < ANY(\"conference\".\"topics\")"), "{sql}");
        assert!(sql.contains("ORDER BY \"conference\".\"topics\" ASC"), "{sql}");
    }

    #[test]
    fn text_values_are_escaped() {
        let sql = sql_for(&[FilterDescriptor::new("CITY", "EQ", "St. John's")]);

        assert!(!sql.contains("'St. John's'"), "{sql}");
        assert!(sql.contains("John"), "{sql}");
    }
}
