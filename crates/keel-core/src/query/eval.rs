use super::{Predicate, QueryField, QueryParameter};
use crate::{handler::TableHandler, Error, Object, Result, Value};

use std::cmp::Ordering;

/// What a predicate needs to be evaluated against stored rows.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub handler: &'a TableHandler,
    pub adapter: &'a str,
    pub params: &'a Object,
}

impl Predicate {
    /// Evaluates the predicate against a stored row, indexed by column
    /// number. Parameter values are converted the way the compared field
    /// stores its values. Comparisons involving null never match.
    pub fn eval(&self, cx: &EvalContext<'_>, row: &[Value]) -> Result<bool> {
        match self {
            Self::Compare(compare) => {
                let param = cx.param(&compare.field, &compare.param)?;
                Ok(compare_values(column(row, &compare.field), &param)
                    .is_some_and(|ordering| compare.op.matches(ordering)))
            }
            Self::Between(between) => {
                let value = column(row, &between.field);
                let lower = cx.param(&between.field, &between.lower)?;
                let upper = cx.param(&between.field, &between.upper)?;
                Ok(compare_values(value, &lower).is_some_and(Ordering::is_ge)
                    && compare_values(value, &upper).is_some_and(Ordering::is_le))
            }
            Self::In(in_) => {
                let value = column(row, &in_.field);
                let Value::List(items) = cx.raw_param(&in_.param)? else {
                    return Err(Error::invalid_argument(format!(
                        "parameter `{}` must be a list",
                        in_.param.name
                    )));
                };
                for item in items {
                    let item = cx.convert(&in_.field, item.clone())?;
                    if compare_values(value, &item).is_some_and(Ordering::is_eq) {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::IsNull(is_null) => Ok(column(row, &is_null.field).is_null()),
            Self::IsNotNull(is_null) => Ok(!column(row, &is_null.field).is_null()),
            Self::And(and) => {
                for operand in and {
                    if !operand.eval(cx, row)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Or(or) => {
                for operand in or {
                    if operand.eval(cx, row)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Not(not) => Ok(!not.predicate.eval(cx, row)?),
        }
    }
}

impl EvalContext<'_> {
    fn raw_param(&self, param: &QueryParameter) -> Result<&Value> {
        self.params
            .get(&param.name)
            .ok_or_else(|| Error::invalid_argument(format!("parameter `{}` has no value", param.name)))
    }

    fn param(&self, field: &QueryField, param: &QueryParameter) -> Result<Value> {
        let value = self.raw_param(param)?.clone();
        self.convert(field, value)
    }

    fn convert(&self, field: &QueryField, value: Value) -> Result<Value> {
        match self.handler.field(field.field_number) {
            Some(field) => field.to_db(value, self.adapter),
            None => Ok(value),
        }
    }
}

fn column<'a>(row: &'a [Value], field: &QueryField) -> &'a Value {
    const NULL: &Value = &Value::Null;
    row.get(field.column_number).unwrap_or(NULL)
}

fn compare_values(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    if lhs.is_null() || rhs.is_null() {
        return None;
    }
    lhs.compare(rhs)
}
