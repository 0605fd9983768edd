use super::Operation;
use crate::{
    query::{QueryDomainType, QueryHandler},
    Object,
};

/// Reads every row matching the query's predicate.
#[derive(Debug, Clone)]
pub struct Scan {
    pub query: QueryDomainType,
    pub plan: QueryHandler,
    pub params: Object,
    pub options: ScanOptions,
}

/// Ordering and paging of a scan, already validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    pub order: Option<Order>,

    /// Rows to skip; only applied together with `order`
    pub skip: Option<u64>,

    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Scan {
    pub fn new(query: &QueryDomainType, params: &Object, options: &ScanOptions) -> Self {
        Self {
            plan: query.plan(),
            query: query.clone(),
            params: params.clone(),
            options: *options,
        }
    }
}

impl From<Scan> for Operation {
    fn from(value: Scan) -> Self {
        Self::Scan(value)
    }
}
