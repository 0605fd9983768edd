//! Domain types shared by the integration tests.

use crate::Model;

use keel::{
    entity, ColumnType, FieldMapping, FieldMeta, ForeignKey, Object, Relationship, RelationshipKind,
    TableMapping,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Employee {
    pub id: i32,
    pub name: String,
    pub age: Option<i32>,
    pub magic: Option<i32>,
}

entity!(Employee { id, name, age, magic });

impl Employee {
    pub fn new(id: i32, name: &str, age: i32, magic: i32) -> Self {
        Self {
            id,
            name: name.to_string(),
            age: Some(age),
            magic: Some(magic),
        }
    }
}

impl Model for Employee {
    fn mapping() -> TableMapping {
        TableMapping::new("employee")
            .map_field(FieldMapping::new("id").meta(FieldMeta::new(ColumnType::Int).primary_key()))
            .map_field(FieldMapping::new("name").meta(FieldMeta::new(ColumnType::VarChar(32)).not_null()))
            .map_field(FieldMapping::new("age").meta(FieldMeta::new(ColumnType::Int).ordered_index()))
            .map_field(FieldMapping::new("magic").meta(FieldMeta::new(ColumnType::Int).unique()))
    }
}

/// A row keyed by an auto-increment column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Counter {
    pub id: Option<i64>,
    pub label: String,
}

entity!(Counter { id, label });

impl Model for Counter {
    fn mapping() -> TableMapping {
        TableMapping::new("counter")
            .map_field(
                FieldMapping::new("id").meta(FieldMeta::new(ColumnType::BigInt).primary_key().auto_increment()),
            )
            .map_field(FieldMapping::new("label").column("counter_label"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Team {
    pub id: i32,
    pub name: String,
    pub members: Vec<Object>,
}

entity!(Team { id, name, members });

impl Model for Team {
    fn mapping() -> TableMapping {
        TableMapping::new("team")
            .map_field(FieldMapping::new("id").meta(FieldMeta::new(ColumnType::Int).primary_key()))
            .map_field(FieldMapping::new("name"))
            .map_one_to_many(
                Relationship::new(RelationshipKind::OneToMany, "members")
                    .target::<Member>()
                    .foreign_key("fk_member_team"),
            )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Member {
    pub id: i32,
    pub name: String,
    pub team_id: Option<i32>,
    pub team: Option<Object>,
}

entity!(Member { id, name, team_id, team });

impl Member {
    pub fn new(id: i32, name: &str, team_id: i32) -> Self {
        Self {
            id,
            name: name.to_string(),
            team_id: Some(team_id),
            team: None,
        }
    }
}

impl Model for Member {
    fn mapping() -> TableMapping {
        TableMapping::new("member")
            .map_field(FieldMapping::new("id").meta(FieldMeta::new(ColumnType::Int).primary_key()))
            .map_field(FieldMapping::new("name"))
            .map_field(FieldMapping::new("team_id").meta(FieldMeta::new(ColumnType::Int)))
            .map_foreign_key(ForeignKey::new("fk_member_team", &["team_id"], "team", &["id"]))
            .map_many_to_one(
                Relationship::new(RelationshipKind::ManyToOne, "team")
                    .target::<Team>()
                    .foreign_key("fk_member_team"),
            )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Student {
    pub id: i32,
    pub name: String,
    pub courses: Vec<Object>,
}

entity!(Student { id, name, courses });

impl Model for Student {
    fn mapping() -> TableMapping {
        TableMapping::new("student")
            .map_field(FieldMapping::new("id").meta(FieldMeta::new(ColumnType::Int).primary_key()))
            .map_field(FieldMapping::new("name"))
            .map_many_to_many(
                Relationship::new(RelationshipKind::ManyToMany, "courses")
                    .target::<Course>()
                    .join_table("enrollment"),
            )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Course {
    pub id: i32,
    pub title: String,
}

entity!(Course { id, title });

impl Model for Course {
    fn mapping() -> TableMapping {
        TableMapping::new("course")
            .map_field(FieldMapping::new("id").meta(FieldMeta::new(ColumnType::Int).primary_key()))
            .map_field(FieldMapping::new("title"))
    }
}

/// The join table between students and courses. It has no domain type and
/// is written by name.
pub fn enrollment() -> TableMapping {
    TableMapping::new("enrollment")
        .map_field(FieldMapping::new("student_id").meta(FieldMeta::new(ColumnType::Int).primary_key()))
        .map_field(FieldMapping::new("course_id").meta(FieldMeta::new(ColumnType::Int).primary_key()))
        .map_foreign_key(ForeignKey::new("fk_enrollment_student", &["student_id"], "student", &["id"]))
        .map_foreign_key(ForeignKey::new("fk_enrollment_course", &["course_id"], "course", &["id"]))
}

/// Keeps every unmapped field in one JSON column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub id: i32,
    pub color: Option<String>,
    pub size: Option<i32>,
}

entity!(Profile { id, color, size });

impl Model for Profile {
    fn mapping() -> TableMapping {
        TableMapping::new("profile")
            .map_field(FieldMapping::new("id").meta(FieldMeta::new(ColumnType::Int).primary_key()))
            .map_sparse_fields("extras", None, None)
    }
}
