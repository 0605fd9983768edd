use super::{visit, ColumnMask, Predicate};

use by_address::ByAddress;
use std::collections::HashMap;

/// Columns referenced by a predicate node, and the subset constrained by
/// equality.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMasks {
    pub used: ColumnMask,
    pub equal: ColumnMask,
}

/// Column masks for every node of one predicate tree, keyed by node
/// identity.
///
/// `And` and `Or` both take the union of their operands' masks. For `Or`
/// this overstates the equality constraints: `a = 1 OR b = 2` reports both
/// columns as equality constrained. `Not` keeps its operand's used columns
/// and reports no equality constraints.
#[derive(Debug)]
pub struct Analysis<'a> {
    root: &'a Predicate,
    nodes: HashMap<ByAddress<&'a Predicate>, ColumnMasks>,
}

impl<'a> Analysis<'a> {
    pub fn new(root: &'a Predicate) -> Self {
        let mut nodes: HashMap<ByAddress<&'a Predicate>, ColumnMasks> = HashMap::new();

        visit::for_each_predicate(root, |node| {
            let masks = match node {
                Predicate::Compare(compare) => {
                    let used = ColumnMask::single(compare.field.column_number);
                    let equal = if compare.op == super::CompareOp::Eq {
                        used.clone()
                    } else {
                        ColumnMask::new()
                    };
                    ColumnMasks { used, equal }
                }
                Predicate::Between(between) => ColumnMasks::used(between.field.column_number),
                Predicate::In(in_) => ColumnMasks::used(in_.field.column_number),
                Predicate::IsNull(is_null) | Predicate::IsNotNull(is_null) => {
                    ColumnMasks::used(is_null.field.column_number)
                }
                Predicate::And(and) => union(&nodes, and.operands.iter()),
                Predicate::Or(or) => union(&nodes, or.operands.iter()),
                Predicate::Not(not) => ColumnMasks {
                    used: nodes[&ByAddress(&*not.predicate)].used.clone(),
                    equal: ColumnMask::new(),
                },
            };

            nodes.insert(ByAddress(node), masks);
        });

        Self { root, nodes }
    }

    /// Masks of the whole predicate.
    pub fn root(&self) -> &ColumnMasks {
        &self.nodes[&ByAddress(self.root)]
    }

    /// Masks of one node of the analyzed tree.
    pub fn masks(&self, node: &'a Predicate) -> Option<&ColumnMasks> {
        self.nodes.get(&ByAddress(node))
    }
}

impl ColumnMasks {
    fn used(column_number: usize) -> Self {
        Self {
            used: ColumnMask::single(column_number),
            equal: ColumnMask::new(),
        }
    }
}

fn union<'a>(
    nodes: &HashMap<ByAddress<&'a Predicate>, ColumnMasks>,
    operands: impl Iterator<Item = &'a Predicate>,
) -> ColumnMasks {
    let mut masks = ColumnMasks::default();
    for operand in operands {
        let operand = &nodes[&ByAddress(operand)];
        masks.used.union_with(&operand.used);
        masks.equal.union_with(&operand.equal);
    }
    masks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{QueryField, QueryParameter};

    fn field(column_number: usize) -> QueryField {
        QueryField {
            field_name: format!("c{column_number}"),
            field_number: column_number,
            column_number,
        }
    }

    fn p(name: &str) -> QueryParameter {
        QueryParameter::new(name)
    }

    #[test]
    fn leaves_mark_their_column() {
        let eq = field(3).eq(p("x"));
        let analysis = Analysis::new(&eq);
        assert_eq!(analysis.root().used, ColumnMask::single(3));
        assert_eq!(analysis.root().equal, ColumnMask::single(3));

        let gt = field(3).gt(p("x"));
        let analysis = Analysis::new(&gt);
        assert_eq!(analysis.root().used, ColumnMask::single(3));
        assert!(analysis.root().equal.is_empty());
    }

    #[test]
    fn and_unions_operands() {
        let predicate = field(0).eq(p("a")).and(field(2).lt(p("b")));
        let analysis = Analysis::new(&predicate);

        assert_eq!(analysis.root().used, [0, 2].into_iter().collect::<ColumnMask>());
        assert_eq!(analysis.root().equal, ColumnMask::single(0));

        let Predicate::And(and) = &predicate else {
            unreachable!()
        };
        assert_eq!(
            analysis.masks(&and.operands[1]).unwrap().used,
            ColumnMask::single(2)
        );
    }

    #[test]
    fn or_unions_equality_like_and() {
        // Neither column is pinned for every matching row, yet both are
        // reported as equality constrained.
        let predicate = field(0).eq(p("a")).or(field(1).eq(p("b")));
        let analysis = Analysis::new(&predicate);

        assert_eq!(analysis.root().equal, [0, 1].into_iter().collect::<ColumnMask>());
    }

    #[test]
    fn not_clears_equality() {
        let predicate = field(4).eq(p("a")).not();
        let analysis = Analysis::new(&predicate);

        assert_eq!(analysis.root().used, ColumnMask::single(4));
        assert!(analysis.root().equal.is_empty());
    }

    #[test]
    fn the_tree_is_left_untouched() {
        let predicate = field(0).eq(p("a")).and(field(1).eq(p("b")));
        let before = predicate.clone();
        let _ = Analysis::new(&predicate);
        assert_eq!(predicate, before);
    }
}
