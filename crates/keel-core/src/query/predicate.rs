use super::{QueryField, QueryParameter};

use std::cmp::Ordering;

/// A node of a query predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare(PredicateCompare),
    Between(PredicateBetween),
    In(PredicateIn),
    IsNull(PredicateIsNull),
    IsNotNull(PredicateIsNull),
    And(PredicateAnd),
    Or(PredicateOr),
    Not(PredicateNot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// `field <op> :param`
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateCompare {
    pub field: QueryField,
    pub op: CompareOp,
    pub param: QueryParameter,
}

/// `field BETWEEN :lower AND :upper`
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateBetween {
    pub field: QueryField,
    pub lower: QueryParameter,
    pub upper: QueryParameter,
}

/// `field IN (:param)`
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateIn {
    pub field: QueryField,
    pub param: QueryParameter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredicateIsNull {
    pub field: QueryField,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredicateAnd {
    pub operands: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredicateOr {
    pub operands: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredicateNot {
    pub predicate: Box<Predicate>,
}

impl Predicate {
    /// Conjunction. When `self` is already an `And`, `other` joins its
    /// operands instead of nesting.
    pub fn and(self, other: Predicate) -> Predicate {
        match self {
            Self::And(mut and) => {
                and.operands.push(other);
                and.into()
            }
            lhs => PredicateAnd {
                operands: vec![lhs, other],
            }
            .into(),
        }
    }

    /// Disjunction. When `self` is already an `Or`, `other` joins its
    /// operands. An `And` is never extended.
    pub fn or(self, other: Predicate) -> Predicate {
        match self {
            Self::Or(mut or) => {
                or.operands.push(other);
                or.into()
            }
            lhs => PredicateOr {
                operands: vec![lhs, other],
            }
            .into(),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Predicate {
        PredicateNot {
            predicate: Box::new(self),
        }
        .into()
    }

    pub fn is_and(&self) -> bool {
        matches!(self, Self::And(_))
    }

    pub fn is_or(&self) -> bool {
        matches!(self, Self::Or(_))
    }

    /// Names of every parameter the predicate refers to, in tree order,
    /// without duplicates.
    pub fn parameters(&self) -> Vec<&str> {
        let mut names: Vec<&str> = vec![];

        super::visit::for_each_parameter(self, |param| {
            if !names.contains(&param.name.as_str()) {
                names.push(&param.name);
            }
        });

        names
    }
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// Whether `lhs <op> rhs` holds, given how `lhs` orders against `rhs`.
    pub fn matches(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering.is_eq(),
            Self::Ne => ordering.is_ne(),
            Self::Lt => ordering.is_lt(),
            Self::Le => ordering.is_le(),
            Self::Gt => ordering.is_gt(),
            Self::Ge => ordering.is_ge(),
        }
    }
}

impl From<PredicateCompare> for Predicate {
    fn from(value: PredicateCompare) -> Self {
        Self::Compare(value)
    }
}

impl From<PredicateBetween> for Predicate {
    fn from(value: PredicateBetween) -> Self {
        Self::Between(value)
    }
}

impl From<PredicateIn> for Predicate {
    fn from(value: PredicateIn) -> Self {
        Self::In(value)
    }
}

impl From<PredicateAnd> for Predicate {
    fn from(value: PredicateAnd) -> Self {
        Self::And(value)
    }
}

impl From<PredicateOr> for Predicate {
    fn from(value: PredicateOr) -> Self {
        Self::Or(value)
    }
}

impl From<PredicateNot> for Predicate {
    fn from(value: PredicateNot) -> Self {
        Self::Not(value)
    }
}

impl<'a> IntoIterator for &'a PredicateAnd {
    type IntoIter = std::slice::Iter<'a, Predicate>;
    type Item = &'a Predicate;

    fn into_iter(self) -> Self::IntoIter {
        self.operands.iter()
    }
}

impl<'a> IntoIterator for &'a PredicateOr {
    type IntoIter = std::slice::Iter<'a, Predicate>;
    type Item = &'a Predicate;

    fn into_iter(self) -> Self::IntoIter {
        self.operands.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, column_number: usize) -> QueryField {
        QueryField {
            field_name: name.to_string(),
            field_number: column_number,
            column_number,
        }
    }

    fn param(name: &str) -> QueryParameter {
        QueryParameter::new(name)
    }

    #[test]
    fn and_chains_flatten() {
        let (a, b, c) = (field("a", 0), field("b", 1), field("c", 2));

        let predicate = a.eq(param("a")).and(b.eq(param("b"))).and(c.eq(param("c")));

        let Predicate::And(and) = &predicate else {
            panic!("expected And, got {predicate:?}");
        };
        assert_eq!(and.operands.len(), 3);
        assert!(and.operands.iter().all(|operand| !operand.is_and()));
    }

    #[test]
    fn or_chains_flatten() {
        let a = field("a", 0);

        let predicate = a.eq(param("x")).or(a.eq(param("y"))).or(a.is_null());

        let Predicate::Or(or) = &predicate else {
            panic!("expected Or, got {predicate:?}");
        };
        assert_eq!(or.operands.len(), 3);
    }

    #[test]
    fn or_never_joins_an_and() {
        let (a, b, c) = (field("a", 0), field("b", 1), field("c", 2));

        let predicate = a.eq(param("a")).and(b.eq(param("b"))).or(c.eq(param("c")));

        let Predicate::Or(or) = &predicate else {
            panic!("expected Or, got {predicate:?}");
        };
        assert_eq!(or.operands.len(), 2);
        assert!(or.operands[0].is_and());

        let predicate = a.eq(param("a")).or(b.eq(param("b"))).and(c.eq(param("c")));
        let Predicate::And(and) = &predicate else {
            panic!("expected And, got {predicate:?}");
        };
        assert!(and.operands[0].is_or());
    }

    #[test]
    fn parameters_are_listed_once() {
        let (a, b) = (field("a", 0), field("b", 1));

        let predicate = a
            .between(param("low"), param("high"))
            .and(b.eq(param("low")).not())
            .and(b.in_(param("set")));

        assert_eq!(predicate.parameters(), ["low", "high", "set"]);
    }
}
