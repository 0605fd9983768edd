use super::{CompareOp, Predicate, PredicateBetween, PredicateCompare, PredicateIn, PredicateIsNull, QueryParameter};
use crate::handler::HandlerField;

/// A mapped field as seen by the query builder. Comparison methods build
/// predicate leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryField {
    pub field_name: String,
    pub field_number: usize,
    pub column_number: usize,
}

impl QueryField {
    pub fn new(field: &HandlerField) -> Self {
        Self {
            field_name: field.field_name.clone(),
            field_number: field.field_number,
            column_number: field.column_number,
        }
    }

    pub fn eq(&self, param: QueryParameter) -> Predicate {
        self.compare(CompareOp::Eq, param)
    }

    pub fn ne(&self, param: QueryParameter) -> Predicate {
        self.compare(CompareOp::Ne, param)
    }

    pub fn lt(&self, param: QueryParameter) -> Predicate {
        self.compare(CompareOp::Lt, param)
    }

    pub fn le(&self, param: QueryParameter) -> Predicate {
        self.compare(CompareOp::Le, param)
    }

    pub fn gt(&self, param: QueryParameter) -> Predicate {
        self.compare(CompareOp::Gt, param)
    }

    pub fn ge(&self, param: QueryParameter) -> Predicate {
        self.compare(CompareOp::Ge, param)
    }

    /// Inclusive on both ends.
    pub fn between(&self, lower: QueryParameter, upper: QueryParameter) -> Predicate {
        PredicateBetween {
            field: self.clone(),
            lower,
            upper,
        }
        .into()
    }

    /// Matches when the field equals any value of the list bound to `param`.
    pub fn in_(&self, param: QueryParameter) -> Predicate {
        PredicateIn {
            field: self.clone(),
            param,
        }
        .into()
    }

    pub fn is_null(&self) -> Predicate {
        Predicate::IsNull(PredicateIsNull { field: self.clone() })
    }

    pub fn is_not_null(&self) -> Predicate {
        Predicate::IsNotNull(PredicateIsNull { field: self.clone() })
    }

    fn compare(&self, op: CompareOp, param: QueryParameter) -> Predicate {
        PredicateCompare {
            field: self.clone(),
            op,
            param,
        }
        .into()
    }
}
