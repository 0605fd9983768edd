mod flavor;
use flavor::Flavor;

mod ident;
use ident::Ident;

mod params;
pub use params::{Params, Placeholder};

mod predicate;
pub use predicate::SqlVisitor;

mod select;

use keel_core::{query::Predicate, schema::Table};

/// Serializes predicates and statements to SQL for one dialect.
#[derive(Debug)]
pub struct Serializer {
    flavor: Flavor,
}

/// Transaction control statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transaction {
    Begin,
    Commit,
    Rollback,
}

impl Serializer {
    /// The WHERE condition for `predicate` over `table`, without the `WHERE`
    /// keyword. The names of the parameters it refers to are pushed to
    /// `params` in placeholder order.
    pub fn serialize_predicate(
        &self,
        table: &Table,
        predicate: &Predicate,
        params: &mut impl Params,
    ) -> String {
        let mut ret = String::new();
        SqlVisitor::new(self, table, &mut ret, params).serialize(predicate);
        ret
    }

    pub fn serialize_transaction(&self, op: Transaction) -> &'static str {
        match (op, &self.flavor) {
            (Transaction::Begin, Flavor::Mysql) => "START TRANSACTION",
            (Transaction::Begin, _) => "BEGIN",
            (Transaction::Commit, _) => "COMMIT",
            (Transaction::Rollback, _) => "ROLLBACK",
        }
    }

    fn table_name(&self, table: &Table) -> String {
        format!("{}.{}", Ident(self, &table.database), Ident(self, &table.name))
    }
}
