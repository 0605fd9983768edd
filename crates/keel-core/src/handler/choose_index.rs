use super::{Keys, TableHandler};

/// Picks the index a keyed operation should use.
///
/// A scalar key selects a single-column primary key. Otherwise the first
/// unique index whose columns are all among the keys' defined fields wins,
/// in table order. Unless `unique_only` is set, the first ordered index whose
/// leading column is among those fields is tried next.
pub fn choose_index(handler: &TableHandler, keys: &Keys, unique_only: bool) -> Option<usize> {
    let indexes = handler.index_handlers();

    if keys.is_scalar() {
        return indexes
            .first()
            .filter(|primary| primary.single_column && primary.is_complete())
            .map(|primary| primary.index_number);
    }

    let names = keys.defined_names();

    let covered = |field_name: &str| names.contains(&field_name);

    for index in indexes {
        if index.is_unique()
            && index.is_complete()
            && index.fields().iter().all(|field| covered(&field.field_name))
        {
            return Some(index.index_number);
        }
    }

    if unique_only {
        return None;
    }

    indexes
        .iter()
        .filter(|index| index.is_ordered())
        .find(|index| {
            let leading_column = index.index.columns.first();
            index.fields().first().is_some_and(|leading| {
                Some(&leading.column_number) == leading_column && covered(&leading.field_name)
            })
        })
        .map(|index| index.index_number)
}
