use super::{ColumnMask, ColumnMasks, CompareOp, Predicate, PredicateCompare, QueryParameter, Visit};
use crate::{handler::IndexHandler, Error, Object, Result, Value};

/// An index considered by the query planner.
#[derive(Debug, Clone)]
pub struct CandidateIndex {
    pub index_number: usize,
    pub name: String,

    /// Column numbers, in index order
    pub columns: Vec<usize>,

    pub mask: ColumnMask,
    pub primary_key: bool,
    pub unique: bool,
    pub ordered: bool,

    /// Set for ordered indexes once scored.
    pub score: usize,
}

impl CandidateIndex {
    pub fn new(index: &IndexHandler) -> Self {
        Self {
            index_number: index.index_number,
            name: index.name.clone(),
            columns: index.index.columns.clone(),
            mask: index.index.columns.iter().copied().collect(),
            primary_key: index.is_primary_key(),
            unique: index.is_unique(),
            ordered: index.is_ordered(),
            score: 0,
        }
    }

    /// True if every column of the index is constrained by equality.
    pub fn is_equality_match(&self, masks: &ColumnMasks) -> bool {
        !self.columns.is_empty() && self.mask.is_subset_of(&masks.equal)
    }

    /// Scores the index for a range scan: one point for each leading column
    /// the predicate uses, and one more for each of those in the leading run
    /// of equality-constrained columns.
    pub fn score(&mut self, masks: &ColumnMasks) -> usize {
        let mut score = 0;
        let mut equal_run = true;

        for column_number in &self.columns {
            if !masks.used.contains(*column_number) {
                break;
            }

            score += 1;

            if equal_run && masks.equal.contains(*column_number) {
                score += 1;
            } else {
                equal_run = false;
            }
        }

        self.score = score;
        score
    }

    /// The key values bound by equality to each index column, in index
    /// order, resolved from `params`.
    pub fn get_keys(&self, predicate: &Predicate, params: &Object) -> Result<Vec<Value>> {
        self.columns
            .iter()
            .map(|column_number| {
                let mut binding = EqualityBinding {
                    column_number: *column_number,
                    param: None,
                };
                binding.visit_predicate(predicate);

                let Some(param) = binding.param else {
                    return Err(Error::invalid_argument(format!(
                        "no equality constraint on column {column_number} of index `{}`",
                        self.name
                    )));
                };

                params.get(&param.name).cloned().ok_or_else(|| {
                    Error::invalid_argument(format!("parameter `{}` has no value", param.name))
                })
            })
            .collect()
    }
}

/// Finds the first equality comparison on one column.
struct EqualityBinding {
    column_number: usize,
    param: Option<QueryParameter>,
}

impl Visit for EqualityBinding {
    fn visit_predicate_compare(&mut self, i: &PredicateCompare) {
        if self.param.is_none() && i.op == CompareOp::Eq && i.field.column_number == self.column_number {
            self.param = Some(i.param.clone());
        }
    }
}
