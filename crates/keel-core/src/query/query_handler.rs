use super::{Analysis, CandidateIndex, ColumnMasks, Predicate};
use crate::{handler::TableHandler, Error, Object, Result, Value};

/// The access path chosen for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum QueryType {
    PrimaryKey = 0,
    UniqueKey = 1,
    IndexScan = 2,
    TableScan = 3,
}

/// The plan for one predicate against one table.
#[derive(Debug, Clone)]
pub struct QueryHandler {
    query_type: QueryType,
    candidate: Option<CandidateIndex>,
    masks: ColumnMasks,
}

impl QueryHandler {
    /// Plans `predicate`:
    ///
    /// 1. the primary key, when every primary key column is equality
    ///    constrained;
    /// 2. otherwise the first unique index whose columns are all equality
    ///    constrained;
    /// 3. otherwise the best scoring ordered index, see
    ///    [`CandidateIndex::score`];
    /// 4. otherwise a table scan.
    ///
    /// Planning looks only at the shape of the predicate, never at parameter
    /// values.
    pub fn new(handler: &TableHandler, predicate: &Predicate) -> Self {
        let masks = Analysis::new(predicate).root().clone();

        let mut candidates: Vec<CandidateIndex> = handler
            .index_handlers()
            .iter()
            .map(CandidateIndex::new)
            .collect();

        let plan = |query_type, candidate: Option<&CandidateIndex>| {
            tracing::debug!(
                table = %handler.table().qualified_name(),
                ?query_type,
                index = candidate.map(|candidate| candidate.name.as_str()),
                "planned query"
            );
            Self {
                query_type,
                candidate: candidate.cloned(),
                masks: masks.clone(),
            }
        };

        if let Some(primary) = candidates
            .first()
            .filter(|candidate| candidate.primary_key && candidate.is_equality_match(&masks))
        {
            return plan(QueryType::PrimaryKey, Some(primary));
        }

        if let Some(unique) = candidates
            .iter()
            .find(|candidate| !candidate.primary_key && candidate.unique && candidate.is_equality_match(&masks))
        {
            return plan(QueryType::UniqueKey, Some(unique));
        }

        let mut best: Option<usize> = None;
        let mut best_score = 0;

        for (position, candidate) in candidates.iter_mut().enumerate() {
            if !candidate.ordered {
                continue;
            }

            let score = candidate.score(&masks);
            if score > best_score {
                best = Some(position);
                best_score = score;
            }
        }

        match best {
            Some(position) => plan(QueryType::IndexScan, Some(&candidates[position])),
            None => plan(QueryType::TableScan, None),
        }
    }

    /// The plan for a query without a predicate.
    pub fn table_scan() -> Self {
        Self {
            query_type: QueryType::TableScan,
            candidate: None,
            masks: ColumnMasks::default(),
        }
    }

    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    /// The chosen index, unless the plan is a table scan.
    pub fn candidate(&self) -> Option<&CandidateIndex> {
        self.candidate.as_ref()
    }

    pub fn index_number(&self) -> Option<usize> {
        self.candidate.as_ref().map(|candidate| candidate.index_number)
    }

    /// Masks of the whole predicate.
    pub fn masks(&self) -> &ColumnMasks {
        &self.masks
    }

    /// Key values for a primary or unique key lookup, in index column order.
    pub fn get_keys(&self, predicate: &Predicate, params: &Object) -> Result<Vec<Value>> {
        match (&self.candidate, self.query_type) {
            (Some(candidate), QueryType::PrimaryKey | QueryType::UniqueKey) => {
                candidate.get_keys(predicate, params)
            }
            _ => Err(Error::invalid_argument(format!(
                "a {:?} plan has no lookup keys",
                self.query_type
            ))),
        }
    }
}

impl QueryType {
    pub fn code(self) -> u8 {
        self as u8
    }
}
