use super::{index_columns, table};
use crate::{
    store::{failure, StoredTable},
    Store,
};

use keel_core::{
    driver::{operation::ReadProjection, OperationResult},
    projection::{Sector, SectorJoin},
    Error, Result, Value,
};

/// Reads the root row and outer-joins every sector onto it, producing one
/// flat row per combination of related rows.
pub(super) fn exec(store: &Store, op: &ReadProjection) -> Result<OperationResult> {
    let sectors = op.projection.sectors();

    for sector in sectors {
        if store.get(&sector.handler.table().qualified_name()).is_none() {
            return Ok(OperationResult::failure(failure::no_such_table(
                sector.handler.table(),
            )));
        }
    }

    let root = table(store, &op.handler.table().qualified_name())?;
    let columns = index_columns(&op.handler, op.index)?;

    let Some(position) = root.find(columns, &op.keys) else {
        return Ok(OperationResult::failure(failure::no_row(&root.meta)));
    };

    // Stored row picked for each sector so far; `None` where there is no
    // related row
    let mut picked: Vec<Vec<Option<&[Value]>>> = vec![vec![Some(&root.rows[position][..])]];

    for sector in &sectors[1..] {
        let (Some(parent), Some(join)) = (sector.parent, &sector.join) else {
            return Err(Error::invalid_argument("projection sector has no parent join"));
        };

        let parent_table = table(store, &sectors[parent].handler.table().qualified_name())?;
        let child_table = table(store, &sector.handler.table().qualified_name())?;

        let mut expanded = Vec::with_capacity(picked.len());
        for rows in picked {
            let related = match rows[parent] {
                Some(parent_row) => related(store, parent_table, parent_row, child_table, join)?,
                None => vec![],
            };

            if related.is_empty() {
                let mut rows = rows;
                rows.push(None);
                expanded.push(rows);
                continue;
            }

            for child_row in related {
                let mut rows = rows.clone();
                rows.push(Some(child_row));
                expanded.push(rows);
            }
        }
        picked = expanded;
    }

    let rows = picked
        .into_iter()
        .map(|rows| Value::List(flatten(sectors, &rows)))
        .collect();

    Ok(OperationResult::success(Value::List(rows)))
}

/// Child rows related to `parent_row` through `join`.
fn related<'a>(
    store: &'a Store,
    parent_table: &StoredTable,
    parent_row: &[Value],
    child_table: &'a StoredTable,
    join: &SectorJoin,
) -> Result<Vec<&'a [Value]>> {
    let missing = || Error::invalid_argument("projection join names an unknown column");

    let (SectorJoin::Columns { parent_columns, .. } | SectorJoin::JoinTable { parent_columns, .. }) = join;

    let key = parent_table.values(parent_row, parent_columns).ok_or_else(missing)?;
    if key.iter().any(Value::is_null) {
        return Ok(vec![]);
    }

    match join {
        SectorJoin::Columns { child_columns, .. } => {
            let columns = child_table.column_numbers(child_columns).ok_or_else(missing)?;
            Ok(rows_at(child_table, child_table.matching(&columns, &key)))
        }
        SectorJoin::JoinTable {
            table: join_table,
            join_parent_columns,
            join_child_columns,
            child_columns,
            ..
        } => {
            let links = table(store, &join_table.qualified_name())?;
            let link_columns = links.column_numbers(join_parent_columns).ok_or_else(missing)?;
            let columns = child_table.column_numbers(child_columns).ok_or_else(missing)?;

            let mut related = vec![];
            for position in links.matching(&link_columns, &key) {
                let child_key = links
                    .values(&links.rows[position], join_child_columns)
                    .ok_or_else(missing)?;
                related.extend(rows_at(child_table, child_table.matching(&columns, &child_key)));
            }
            Ok(related)
        }
    }
}

fn rows_at(table: &StoredTable, positions: Vec<usize>) -> Vec<&[Value]> {
    positions
        .into_iter()
        .map(|position| &table.rows[position][..])
        .collect()
}

/// Lays out the picked rows by sector: key fields, then non-key fields.
fn flatten(sectors: &[Sector], rows: &[Option<&[Value]>]) -> Vec<Value> {
    let mut flat = vec![];

    for (sector, row) in sectors.iter().zip(rows) {
        for field_number in sector.key_fields.iter().chain(&sector.non_key_fields) {
            let value = sector
                .handler
                .field(*field_number)
                .zip(*row)
                .and_then(|(field, row)| row.get(field.column_number).cloned());
            flat.push(value.unwrap_or_default());
        }
    }

    flat
}
