use std::any::TypeId;

/// The four relationship shapes a field can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipKind {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
}

impl RelationshipKind {
    /// True if the field holds a list of related objects.
    pub fn is_to_many(self) -> bool {
        matches!(self, Self::OneToMany | Self::ManyToMany)
    }
}

/// The domain type on the other side of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetType {
    pub type_id: TypeId,
    pub type_name: &'static str,
}

impl TargetType {
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }
}

/// A relationship field: resolved through a foreign key on one of the two
/// tables, through the target's field naming the reverse relationship, or
/// through a join table.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub kind: RelationshipKind,
    pub field_name: String,
    pub target: Option<TargetType>,
    pub target_field: Option<String>,
    pub foreign_key: Option<String>,
    pub join_table: Option<String>,
}

impl Relationship {
    pub fn new(kind: RelationshipKind, field_name: impl Into<String>) -> Self {
        Self {
            kind,
            field_name: field_name.into(),
            target: None,
            target_field: None,
            foreign_key: None,
            join_table: None,
        }
    }

    pub fn target<T: 'static>(mut self) -> Self {
        self.target = Some(TargetType::of::<T>());
        self
    }

    pub fn target_field(mut self, name: impl Into<String>) -> Self {
        self.target_field = Some(name.into());
        self
    }

    pub fn foreign_key(mut self, name: impl Into<String>) -> Self {
        self.foreign_key = Some(name.into());
        self
    }

    pub fn join_table(mut self, name: impl Into<String>) -> Self {
        self.join_table = Some(name.into());
        self
    }

    pub(super) fn validate(&self) -> Vec<String> {
        let mut errors = vec![];

        if self.field_name.is_empty() {
            errors.push("relationship field name must be a non-empty string".to_string());
        }

        if self.target.is_none() {
            errors.push(format!(
                "relationship `{}` must specify a target",
                self.field_name
            ));
        }

        let ways = [&self.target_field, &self.foreign_key, &self.join_table]
            .iter()
            .filter(|way| way.is_some())
            .count();

        if ways != 1 {
            errors.push(format!(
                "relationship `{}` must specify exactly one of target_field, foreign_key, join_table",
                self.field_name
            ));
        }

        errors
    }
}
