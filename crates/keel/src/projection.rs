//! Resolving projections against the registered mappings, and reading
//! them.

use crate::{session_factory::unmapped, Session, TableIndicator};

use keel_core::{
    err,
    handler::{Keys, TableHandler},
    mapping::{MappingId, Relationship},
    projection::{Projection, ResolvedProjection, Sector, SectorJoin},
    Entity, Error, Result, Value,
};

use std::{collections::HashMap, sync::Arc};

/// A projection node waiting to become a sector.
struct Pending<'a> {
    projection: &'a Projection,
    parent: Option<usize>,
    relationship: Option<Relationship>,
    join: Option<SectorJoin>,

    /// Mappings from the root down to the parent
    path: Vec<MappingId>,
}

/// Validates `projection` and lays out its sectors in pre-order.
///
/// Every type in the tree must be mapped, every listed field must exist
/// and be a plain field, and every relationship declared by each mapping,
/// projected or not, must resolve against the tables' foreign keys. A type
/// appearing twice on one path is a recursive projection. All problems are
/// reported together.
pub(crate) async fn resolve(session: &Session, projection: &Projection) -> Result<ResolvedProjection> {
    let factory = session.factory();
    let db_session = Some(&**session.db_session());

    let mut errors = vec![];
    let mut sectors: Vec<Sector> = vec![];
    let mut offset = 0;

    let mut stack = vec![Pending {
        projection,
        parent: None,
        relationship: None,
        join: None,
        path: vec![],
    }];

    while let Some(node) = stack.pop() {
        let domain_object = node.projection.domain_object;
        let type_name = domain_object.type_name;

        let Some(descriptor) = factory.mappings().by_type_id(domain_object.type_id).cloned() else {
            errors.push(format!("`{type_name}` is not mapped"));
            continue;
        };

        if node.path.contains(&descriptor.id) {
            errors.push(format!("recursive projection: `{type_name}` appears twice on one path"));
            continue;
        }

        let indicator = TableIndicator::ByType(descriptor.clone());
        let handler = match factory.table_handler(&indicator, db_session).await {
            Ok(handler) => handler,
            Err(err) => {
                errors.push(format!("`{type_name}`: {err}"));
                continue;
            }
        };

        let mut requested = vec![];
        for name in &node.projection.fields {
            match handler.field_by_name(name) {
                Some(field) => requested.push(field.field_number),
                None if handler.relationship(name).is_some() => errors.push(format!(
                    "`{type_name}`: `{name}` is a relationship and needs a nested projection"
                )),
                None => errors.push(format!("`{type_name}` has no field `{name}`")),
            }
        }

        let mut joins = HashMap::new();
        for relationship in handler.relationship_fields() {
            match resolve_join(session, &handler, relationship).await {
                Ok(join) => {
                    joins.insert(relationship.field_name.as_str(), join);
                }
                Err(err) => errors.push(format!(
                    "`{type_name}`: relationship `{}`: {err}",
                    relationship.field_name
                )),
            }
        }

        let Some(primary) = handler.primary_index() else {
            errors.push(format!("`{type_name}`: table has no primary key"));
            continue;
        };
        let key_fields = primary.field_numbers();

        let non_key_fields: Vec<usize> = if node.projection.fields.is_empty() {
            (0..handler.fields().len())
                .filter(|field_number| !key_fields.contains(field_number))
                .collect()
        } else {
            let mut fields: Vec<usize> = vec![];
            for field_number in requested {
                if !key_fields.contains(&field_number) && !fields.contains(&field_number) {
                    fields.push(field_number);
                }
            }
            fields
        };

        let number = sectors.len();
        let mut path = node.path.clone();
        path.push(descriptor.id);

        for (name, nested) in node.projection.relationships.iter().rev() {
            let Some(relationship) = handler.relationship(name) else {
                errors.push(format!("`{type_name}`: `{name}` is not a relationship"));
                continue;
            };

            if relationship.target != Some(nested.domain_object) {
                errors.push(format!(
                    "`{type_name}`: relationship `{name}` does not target `{}`",
                    nested.domain_object.type_name
                ));
                continue;
            }

            let Some(join) = joins.get(name.as_str()) else {
                continue;
            };

            stack.push(Pending {
                projection: nested,
                parent: Some(number),
                relationship: Some(relationship.clone()),
                join: Some(join.clone()),
                path: path.clone(),
            });
        }

        let sector = Sector {
            handler,
            parent: node.parent,
            relationship: node.relationship,
            key_fields,
            non_key_fields,
            offset,
            join: node.join,
        };
        offset += sector.width();
        sectors.push(sector);
    }

    if !errors.is_empty() {
        return Err(Error::mapping(errors.join("\n")).context(err!(
            "invalid projection of `{}`",
            projection.domain_object.type_name
        )));
    }

    tracing::debug!(
        root = projection.domain_object.type_name,
        sectors = sectors.len(),
        "projection resolved"
    );

    ResolvedProjection::new(sectors)
}

/// Reads the root row `keys` identifies, with its related rows.
pub(crate) async fn find(
    session: &Session,
    projection: &Arc<ResolvedProjection>,
    keys: &Keys,
) -> Result<Option<Box<dyn Entity>>> {
    let handler = &projection.root().handler;
    let Some(index) = handler.get_index_handler(keys, true) else {
        return Err(Error::invalid_argument(format!(
            "find_with_projection: no unique index of {} is covered by the keys {:?}",
            handler.table().qualified_name(),
            keys.defined_names()
        )));
    };

    let th = session.db_session().transaction_handler();
    let operation = th
        .build_read_projection_operation(handler, index, keys, projection)
        .await?;

    let result = session
        .execute_one(&operation)
        .await
        .and_then(|result| result.into_result());

    let value = match result {
        Ok(value) => value,
        Err(err) if err.is_not_found() => return Ok(None),
        Err(err) => {
            session.current_transaction().on_operation_failed(&err);
            return Err(err);
        }
    };

    let Value::List(rows) = value else {
        return Err(Error::invalid_argument(format!(
            "projection read returned {value}, expected a list of rows"
        )));
    };

    let adapter = session.factory().pool().adapter();
    Ok(projection.assemble(&rows, adapter)?.into_iter().next())
}

/// How rows of the relationship's target join to rows of `parent`.
async fn resolve_join(
    session: &Session,
    parent: &TableHandler,
    relationship: &Relationship,
) -> Result<SectorJoin> {
    let Some(target) = relationship.target else {
        return Err(Error::invalid_argument("relationship has no target"));
    };

    let factory = session.factory();
    let descriptor = factory
        .mappings()
        .by_type_id(target.type_id)
        .cloned()
        .ok_or_else(|| unmapped(target.type_name))?;

    let child = factory
        .table_handler(&TableIndicator::ByType(descriptor), Some(&**session.db_session()))
        .await?;

    match &relationship.target_field {
        Some(target_field) => {
            let Some(reverse) = child.relationship(target_field) else {
                return Err(Error::invalid_argument(format!(
                    "`{}` has no relationship `{target_field}`",
                    target.type_name
                )));
            };
            if reverse.target_field.is_some() {
                return Err(Error::invalid_argument(
                    "neither side names a foreign key or join table",
                ));
            }
            Ok(reversed(direct_join(session, &child, reverse, parent).await?))
        }
        None => direct_join(session, parent, relationship, &child).await,
    }
}

/// A join through the foreign key or join table `relationship` names.
async fn direct_join(
    session: &Session,
    from: &TableHandler,
    relationship: &Relationship,
    to: &TableHandler,
) -> Result<SectorJoin> {
    let (from_table, to_table) = (from.table(), to.table());

    if let Some(name) = &relationship.foreign_key {
        if let Some(fk) = from
            .foreign_key(name)
            .filter(|fk| fk.targets(&to_table.database, &to_table.name))
        {
            return Ok(SectorJoin::Columns {
                parent_columns: fk.columns.clone(),
                child_columns: fk.target_columns.clone(),
            });
        }

        if let Some(fk) = to
            .foreign_key(name)
            .filter(|fk| fk.targets(&from_table.database, &from_table.name))
        {
            return Ok(SectorJoin::Columns {
                parent_columns: fk.target_columns.clone(),
                child_columns: fk.columns.clone(),
            });
        }

        return Err(Error::invalid_argument(format!(
            "foreign key `{name}` does not connect {} and {}",
            from_table.qualified_name(),
            to_table.qualified_name()
        )));
    }

    if let Some(join_table) = &relationship.join_table {
        let (database, table) = join_table
            .split_once('.')
            .unwrap_or((&from_table.database, join_table));

        let metadata = session
            .factory()
            .table_metadata_or_err(database, table, Some(&**session.db_session()))
            .await?;

        let to_parent = metadata
            .foreign_keys
            .iter()
            .find(|fk| fk.targets(&from_table.database, &from_table.name));

        let to_child = metadata.foreign_keys.iter().find(|fk| {
            fk.targets(&to_table.database, &to_table.name)
                && to_parent.map_or(true, |to_parent| to_parent.name != fk.name)
        });

        let (Some(to_parent), Some(to_child)) = (to_parent, to_child) else {
            return Err(Error::invalid_argument(format!(
                "join table {} needs foreign keys to {} and {}",
                metadata.qualified_name(),
                from_table.qualified_name(),
                to_table.qualified_name()
            )));
        };

        return Ok(SectorJoin::JoinTable {
            parent_columns: to_parent.target_columns.clone(),
            join_parent_columns: to_parent.columns.clone(),
            join_child_columns: to_child.columns.clone(),
            child_columns: to_child.target_columns.clone(),
            table: metadata,
        });
    }

    Err(Error::invalid_argument("relationship names no foreign key or join table"))
}

/// The same join seen from the other side.
fn reversed(join: SectorJoin) -> SectorJoin {
    match join {
        SectorJoin::Columns {
            parent_columns,
            child_columns,
        } => SectorJoin::Columns {
            parent_columns: child_columns,
            child_columns: parent_columns,
        },
        SectorJoin::JoinTable {
            table,
            parent_columns,
            join_parent_columns,
            join_child_columns,
            child_columns,
        } => SectorJoin::JoinTable {
            table,
            parent_columns: child_columns,
            join_parent_columns: join_child_columns,
            join_child_columns: join_parent_columns,
            child_columns: parent_columns,
        },
    }
}
