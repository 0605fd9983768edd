use super::row_to_object;
use crate::{store::StoredTable, ADAPTER};

use keel_core::{
    driver::{operation::Scan, OperationResult, Order},
    query::{visit, EvalContext, Predicate, QueryType},
    Result, Value,
};
use keel_sql::Serializer;

use std::cmp::Ordering;

pub(super) fn exec(table: &StoredTable, op: &Scan) -> Result<OperationResult> {
    let handler = op.query.handler();
    let predicate = op.query.predicate();

    if tracing::enabled!(tracing::Level::TRACE) {
        let mut params: Vec<String> = vec![];
        let sql = Serializer::mysql().serialize_select(&op.query, &op.options, &mut params);
        tracing::trace!(%sql, ?params, query_type = op.plan.query_type().code(), "scan");
    }

    // Key lookups narrow the candidates through the chosen index first. An
    // `Or` anywhere in the predicate can match rows outside the key.
    let mut rows: Vec<&Vec<Value>> = match (predicate, op.plan.candidate(), op.plan.query_type()) {
        (Some(predicate), Some(candidate), QueryType::PrimaryKey | QueryType::UniqueKey)
            if !contains_or(predicate) =>
        {
            let mut keys = op.plan.get_keys(predicate, &op.params)?;
            for (key, column) in keys.iter_mut().zip(&candidate.columns) {
                if let Some(field) = handler.field_for_column(*column) {
                    *key = field.to_db(key.take(), ADAPTER)?;
                }
            }

            table
                .matching(&candidate.columns, &keys)
                .into_iter()
                .map(|position| &table.rows[position])
                .collect()
        }
        _ => table.rows.iter().collect(),
    };

    if let Some(predicate) = predicate {
        let cx = EvalContext {
            handler,
            adapter: ADAPTER,
            params: &op.params,
        };

        let mut matched = Vec::with_capacity(rows.len());
        for row in rows {
            if predicate.eval(&cx, row)? {
                matched.push(row);
            }
        }
        rows = matched;
    }

    if let Some(order) = op.options.order {
        // Ordered by the scanned index, or else by the primary key
        let columns: Vec<usize> = match op.plan.candidate() {
            Some(candidate) if candidate.ordered => candidate.columns.clone(),
            _ => handler
                .table()
                .primary_key()
                .map(|index| index.columns.clone())
                .unwrap_or_default(),
        };

        rows.sort_by(|lhs, rhs| compare_rows(lhs, rhs, &columns));
        if order == Order::Desc {
            rows.reverse();
        }
    }

    let skip = op.options.skip.unwrap_or(0) as usize;
    let limit = op.options.limit.map_or(usize::MAX, |limit| limit as usize);

    let objects = rows
        .into_iter()
        .skip(skip)
        .take(limit)
        .map(|row| Value::Object(row_to_object(handler, row)))
        .collect();

    Ok(OperationResult::success(Value::List(objects)))
}

fn contains_or(predicate: &Predicate) -> bool {
    let mut found = false;
    visit::for_each_predicate(predicate, |node| found |= node.is_or());
    found
}

/// Orders rows by the given columns; nulls sort first.
fn compare_rows(lhs: &[Value], rhs: &[Value], columns: &[usize]) -> Ordering {
    for column in columns {
        let (lhs, rhs) = (&lhs[*column], &rhs[*column]);

        let ordering = match (lhs.is_null(), rhs.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => lhs.compare(rhs).unwrap_or(Ordering::Equal),
        };

        if ordering.is_ne() {
            return ordering;
        }
    }

    Ordering::Equal
}
