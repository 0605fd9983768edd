//! Read-only traversal of predicate trees.

#![allow(unused_variables)]

use super::{
    Predicate, PredicateAnd, PredicateBetween, PredicateCompare, PredicateIn, PredicateIsNull,
    PredicateNot, PredicateOr, QueryParameter,
};

pub trait Visit {
    fn visit_predicate(&mut self, i: &Predicate) {
        visit_predicate(self, i);
    }

    fn visit_predicate_compare(&mut self, i: &PredicateCompare) {}

    fn visit_predicate_between(&mut self, i: &PredicateBetween) {}

    fn visit_predicate_in(&mut self, i: &PredicateIn) {}

    fn visit_predicate_is_null(&mut self, i: &PredicateIsNull) {}

    fn visit_predicate_is_not_null(&mut self, i: &PredicateIsNull) {}

    fn visit_predicate_and(&mut self, i: &PredicateAnd) {
        visit_predicate_and(self, i);
    }

    fn visit_predicate_or(&mut self, i: &PredicateOr) {
        visit_predicate_or(self, i);
    }

    fn visit_predicate_not(&mut self, i: &PredicateNot) {
        visit_predicate_not(self, i);
    }
}

pub fn visit_predicate<V>(v: &mut V, node: &Predicate)
where
    V: Visit + ?Sized,
{
    match node {
        Predicate::Compare(node) => v.visit_predicate_compare(node),
        Predicate::Between(node) => v.visit_predicate_between(node),
        Predicate::In(node) => v.visit_predicate_in(node),
        Predicate::IsNull(node) => v.visit_predicate_is_null(node),
        Predicate::IsNotNull(node) => v.visit_predicate_is_not_null(node),
        Predicate::And(node) => v.visit_predicate_and(node),
        Predicate::Or(node) => v.visit_predicate_or(node),
        Predicate::Not(node) => v.visit_predicate_not(node),
    }
}

pub fn visit_predicate_and<V>(v: &mut V, node: &PredicateAnd)
where
    V: Visit + ?Sized,
{
    for operand in node {
        v.visit_predicate(operand);
    }
}

pub fn visit_predicate_or<V>(v: &mut V, node: &PredicateOr)
where
    V: Visit + ?Sized,
{
    for operand in node {
        v.visit_predicate(operand);
    }
}

pub fn visit_predicate_not<V>(v: &mut V, node: &PredicateNot)
where
    V: Visit + ?Sized,
{
    v.visit_predicate(&node.predicate);
}

/// Calls `f` on every predicate node, children before parents.
pub fn for_each_predicate<'a, F>(node: &'a Predicate, mut f: F)
where
    F: FnMut(&'a Predicate),
{
    fn walk<'a>(node: &'a Predicate, f: &mut dyn FnMut(&'a Predicate)) {
        match node {
            Predicate::And(and) => and.operands.iter().for_each(|operand| walk(operand, f)),
            Predicate::Or(or) => or.operands.iter().for_each(|operand| walk(operand, f)),
            Predicate::Not(not) => walk(&not.predicate, f),
            _ => {}
        }
        f(node);
    }

    walk(node, &mut f);
}

/// Calls `f` on every parameter reference, in tree order.
pub fn for_each_parameter<'a, F>(node: &'a Predicate, mut f: F)
where
    F: FnMut(&'a QueryParameter),
{
    fn walk<'a>(node: &'a Predicate, f: &mut dyn FnMut(&'a QueryParameter)) {
        match node {
            Predicate::Compare(compare) => f(&compare.param),
            Predicate::Between(between) => {
                f(&between.lower);
                f(&between.upper);
            }
            Predicate::In(in_) => f(&in_.param),
            Predicate::IsNull(_) | Predicate::IsNotNull(_) => {}
            Predicate::And(and) => and.operands.iter().for_each(|operand| walk(operand, f)),
            Predicate::Or(or) => or.operands.iter().for_each(|operand| walk(operand, f)),
            Predicate::Not(not) => walk(&not.predicate, f),
        }
    }

    walk(node, &mut f);
}
