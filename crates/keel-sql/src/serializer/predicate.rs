use super::{params::Rendered, Ident, Params, Serializer};

use keel_core::{
    query::{
        Predicate, PredicateAnd, PredicateBetween, PredicateCompare, PredicateIn, PredicateIsNull,
        PredicateNot, PredicateOr, QueryField, QueryParameter, Visit,
    },
    schema::Table,
};

use std::fmt::Write;

/// Writes a predicate as a SQL condition.
///
/// Fields are written as their quoted column names and parameters as
/// placeholders, recorded in `params` in the order they appear. Every
/// `AND`, `OR` and `NOT` is parenthesized, so the output never depends on
/// operator precedence.
pub struct SqlVisitor<'a, P> {
    serializer: &'a Serializer,
    table: &'a Table,
    dst: &'a mut String,
    params: &'a mut P,
}

impl<'a, P: Params> SqlVisitor<'a, P> {
    pub fn new(serializer: &'a Serializer, table: &'a Table, dst: &'a mut String, params: &'a mut P) -> Self {
        Self {
            serializer,
            table,
            dst,
            params,
        }
    }

    pub fn serialize(&mut self, predicate: &Predicate) {
        self.visit_predicate(predicate);
    }

    fn column(&mut self, field: &QueryField) {
        let name = self
            .table
            .columns
            .get(field.column_number)
            .map_or(field.field_name.as_str(), |column| column.name.as_str());

        write!(self.dst, "{}", Ident(self.serializer, name)).unwrap();
    }

    fn param(&mut self, param: &QueryParameter) {
        let placeholder = self.params.push(param);
        write!(self.dst, "{}", Rendered(self.serializer, placeholder)).unwrap();
    }

    fn operands(&mut self, operands: &[Predicate], separator: &str) {
        self.dst.push('(');
        for (i, operand) in operands.iter().enumerate() {
            if i > 0 {
                self.dst.push_str(separator);
            }
            self.visit_predicate(operand);
        }
        self.dst.push(')');
    }
}

impl<P: Params> Visit for SqlVisitor<'_, P> {
    fn visit_predicate_compare(&mut self, i: &PredicateCompare) {
        self.column(&i.field);
        write!(self.dst, " {} ", i.op.as_str()).unwrap();
        self.param(&i.param);
    }

    fn visit_predicate_between(&mut self, i: &PredicateBetween) {
        self.column(&i.field);
        self.dst.push_str(" BETWEEN ");
        self.param(&i.lower);
        self.dst.push_str(" AND ");
        self.param(&i.upper);
    }

    /// The list is bound as a single parameter.
    fn visit_predicate_in(&mut self, i: &PredicateIn) {
        self.column(&i.field);
        self.dst.push_str(" IN (");
        self.param(&i.param);
        self.dst.push(')');
    }

    fn visit_predicate_is_null(&mut self, i: &PredicateIsNull) {
        self.column(&i.field);
        self.dst.push_str(" IS NULL");
    }

    fn visit_predicate_is_not_null(&mut self, i: &PredicateIsNull) {
        self.column(&i.field);
        self.dst.push_str(" IS NOT NULL");
    }

    fn visit_predicate_and(&mut self, i: &PredicateAnd) {
        self.operands(&i.operands, " AND ");
    }

    fn visit_predicate_or(&mut self, i: &PredicateOr) {
        self.operands(&i.operands, " OR ");
    }

    fn visit_predicate_not(&mut self, i: &PredicateNot) {
        self.dst.push_str("NOT (");
        self.visit_predicate(&i.predicate);
        self.dst.push(')');
    }
}
