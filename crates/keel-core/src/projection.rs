//! Projections: a root domain type, a subset of its fields, and related
//! objects to read along with it.
//!
//! A [`Projection`] is what the user builds. Validating it against the
//! registered mappings yields a [`ResolvedProjection`]: a pre-order list of
//! [`Sector`]s, one per type in the projection tree, each describing where
//! its values sit in the flat rows the storage engine returns and how it
//! joins to its parent.

use crate::{
    handler::TableHandler,
    mapping::{Relationship, TargetType},
    schema::Table,
    Entity, Error, Result, Value,
};

use indexmap::IndexMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub domain_object: TargetType,

    /// Non-relationship fields to read. Key fields are always read.
    pub fields: Vec<String>,

    /// Nested projections, by relationship field name
    pub relationships: IndexMap<String, Projection>,
}

impl Projection {
    pub fn of<T: Entity>() -> Self {
        Self {
            domain_object: TargetType::of::<T>(),
            fields: vec![],
            relationships: IndexMap::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.fields.contains(&name) {
            self.fields.push(name);
        }
        self
    }

    pub fn fields<I>(self, names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        names
            .into_iter()
            .fold(self, |projection, name| projection.field(name))
    }

    pub fn relationship(mut self, field_name: impl Into<String>, projection: Projection) -> Self {
        self.relationships.insert(field_name.into(), projection);
        self
    }
}

/// One type within a resolved projection.
#[derive(Debug, Clone)]
pub struct Sector {
    pub handler: Arc<TableHandler>,

    /// Index of the parent sector; `None` for the root
    pub parent: Option<usize>,

    /// The parent's relationship this sector populates
    pub relationship: Option<Relationship>,

    /// Primary key field numbers, read first
    pub key_fields: Vec<usize>,

    pub non_key_fields: Vec<usize>,

    /// Position of the sector's first value in each row
    pub offset: usize,

    pub join: Option<SectorJoin>,
}

/// How a sector's rows relate to its parent's, by column name.
#[derive(Debug, Clone)]
pub enum SectorJoin {
    /// `parent.parent_columns = child.child_columns`
    Columns {
        parent_columns: Vec<String>,
        child_columns: Vec<String>,
    },

    /// Through a join table: `parent.parent_columns =
    /// join.join_parent_columns` and `join.join_child_columns =
    /// child.child_columns`.
    JoinTable {
        table: Arc<Table>,
        parent_columns: Vec<String>,
        join_parent_columns: Vec<String>,
        join_child_columns: Vec<String>,
        child_columns: Vec<String>,
    },
}

impl Sector {
    pub fn width(&self) -> usize {
        self.key_fields.len() + self.non_key_fields.len()
    }

    pub fn is_to_many(&self) -> bool {
        self.relationship
            .as_ref()
            .is_some_and(|relationship| relationship.kind.is_to_many())
    }
}

/// A projection checked against the mappings, ready to be read.
#[derive(Debug, Clone)]
pub struct ResolvedProjection {
    sectors: Vec<Sector>,
}

struct Node {
    parent: Option<usize>,
    key: Vec<Value>,
    entity: Box<dyn Entity>,
}

impl ResolvedProjection {
    /// `sectors` are in pre-order with the root first; each parent precedes
    /// its children.
    pub fn new(sectors: Vec<Sector>) -> Result<Self> {
        if sectors.is_empty() {
            return Err(Error::invalid_argument("a projection needs a root sector"));
        }

        for (number, sector) in sectors.iter().enumerate() {
            let parent_ok = match sector.parent {
                None => number == 0,
                Some(parent) => parent < number,
            };
            if !parent_ok {
                return Err(Error::invalid_argument(format!(
                    "sector {number} does not follow its parent"
                )));
            }
        }

        Ok(Self { sectors })
    }

    pub fn root(&self) -> &Sector {
        &self.sectors[0]
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    /// Number of values in each row.
    pub fn row_width(&self) -> usize {
        self.sectors.iter().map(|s| s.offset + s.width()).max().unwrap_or(0)
    }

    /// Builds the root objects from flat rows.
    ///
    /// Rows repeat parent values once per related row, so objects are
    /// deduplicated by their key values under the same parent. A sector
    /// whose key values are all null had no related row. Children are
    /// attached deepest first, as a list for to-many relationships and as a
    /// single object (or null) otherwise.
    pub fn assemble(&self, rows: &[Value], adapter: &str) -> Result<Vec<Box<dyn Entity>>> {
        let mut nodes: Vec<Vec<Node>> = self.sectors.iter().map(|_| vec![]).collect();

        for row in rows {
            let Value::List(row) = row else {
                return Err(Error::invalid_argument(format!(
                    "projection row must be a list, got {row}"
                )));
            };

            let mut current: Vec<Option<usize>> = vec![None; self.sectors.len()];

            for (number, sector) in self.sectors.iter().enumerate() {
                let parent = match sector.parent {
                    None => None,
                    Some(parent) => match current[parent] {
                        Some(node) => Some(node),
                        None => continue,
                    },
                };

                let end = sector.offset + sector.key_fields.len();
                let Some(key) = row.get(sector.offset..end) else {
                    return Err(Error::invalid_argument(format!(
                        "projection row has {} values, expected {}",
                        row.len(),
                        self.row_width()
                    )));
                };

                if key.iter().all(Value::is_null) {
                    continue;
                }

                let existing = nodes[number].iter().position(|node| {
                    node.parent == parent
                        && node.key.iter().zip(key).all(|(a, b)| a.key_eq(b))
                });

                current[number] = Some(match existing {
                    Some(node) => node,
                    None => {
                        let entity = sector.handler.new_result_object_from_row(
                            row,
                            adapter,
                            sector.offset,
                            &sector.key_fields,
                            &sector.non_key_fields,
                        )?;
                        nodes[number].push(Node {
                            parent,
                            key: key.to_vec(),
                            entity,
                        });
                        nodes[number].len() - 1
                    }
                });
            }
        }

        for number in (1..self.sectors.len()).rev() {
            let sector = &self.sectors[number];
            let (Some(parent), Some(relationship)) = (sector.parent, &sector.relationship) else {
                continue;
            };

            let mut children: Vec<Vec<Value>> = (0..nodes[parent].len()).map(|_| vec![]).collect();
            for node in std::mem::take(&mut nodes[number]) {
                if let Some(p) = node.parent {
                    children[p].push(Value::Object(node.entity.to_object()));
                }
            }

            for (node, values) in nodes[parent].iter_mut().zip(children) {
                let value = if sector.is_to_many() {
                    Value::List(values)
                } else {
                    values.into_iter().next().unwrap_or_default()
                };
                node.entity.set_field(&relationship.field_name, value)?;
            }
        }

        Ok(nodes
            .swap_remove(0)
            .into_iter()
            .map(|node| node.entity)
            .collect())
    }
}
