//! Query predicates and the planner that picks an access path for them.

mod analysis;
pub use analysis::{Analysis, ColumnMasks};

mod candidate_index;
pub use candidate_index::CandidateIndex;

mod column_mask;
pub use column_mask::ColumnMask;

mod domain_type;
pub use domain_type::QueryDomainType;

mod eval;
pub use eval::EvalContext;

mod field;
pub use field::QueryField;

mod param;
pub use param::QueryParameter;

mod predicate;
pub use predicate::{
    CompareOp, Predicate, PredicateAnd, PredicateBetween, PredicateCompare, PredicateIn,
    PredicateIsNull, PredicateNot, PredicateOr,
};

mod query_handler;
pub use query_handler::{QueryHandler, QueryType};

pub mod visit;
pub use visit::Visit;
