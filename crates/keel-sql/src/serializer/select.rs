use super::{Flavor, Ident, Params, Serializer};

use keel_core::{
    driver::{Order, ScanOptions},
    query::QueryDomainType,
};

use std::fmt::Write;

impl Serializer {
    /// The `SELECT` reading the rows `query` matches, ordered by the index
    /// the planner chose (or the primary key) when `options` asks for an
    /// order.
    pub fn serialize_select(
        &self,
        query: &QueryDomainType,
        options: &ScanOptions,
        params: &mut impl Params,
    ) -> String {
        let handler = query.handler();
        let table = handler.table();

        let columns = handler
            .fields()
            .iter()
            .map(|field| Ident(self, &field.column_name).to_string())
            .collect::<Vec<_>>()
            .join(", ");

        let mut ret = format!("SELECT {columns} FROM {}", self.table_name(table));

        if let Some(predicate) = query.predicate() {
            ret.push_str(" WHERE ");
            ret.push_str(&self.serialize_predicate(table, predicate, params));
        }

        if let Some(order) = options.order {
            let plan = query.plan();
            let order_columns = match plan.candidate() {
                Some(candidate) if candidate.ordered => candidate.columns.clone(),
                _ => table
                    .primary_key()
                    .map(|index| index.columns.clone())
                    .unwrap_or_default(),
            };

            let direction = match order {
                Order::Asc => "ASC",
                Order::Desc => "DESC",
            };

            let order_by = order_columns
                .iter()
                .filter_map(|column_number| table.columns.get(*column_number))
                .map(|column| format!("{} {direction}", Ident(self, &column.name)))
                .collect::<Vec<_>>();

            if !order_by.is_empty() {
                write!(ret, " ORDER BY {}", order_by.join(", ")).unwrap();
            }
        }

        match (options.limit, options.skip, &self.flavor) {
            (Some(limit), _, _) => write!(ret, " LIMIT {limit}").unwrap(),
            // An offset needs a limit in these dialects
            (None, Some(_), Flavor::Mysql) => write!(ret, " LIMIT {}", u64::MAX).unwrap(),
            (None, Some(_), Flavor::Sqlite) => ret.push_str(" LIMIT -1"),
            _ => {}
        }

        if let Some(skip) = options.skip {
            write!(ret, " OFFSET {skip}").unwrap();
        }

        ret
    }
}
