//! Fixtures for test cases and examples. Not intended for actual use.

use crate::{
    AnnotationKind, AnnotationParser, Column, Constraint, DriftReporter, EntityCatalog,
    EntityModel, LengthCatalog, MockIntrospector, PropertyModel, config::default_base_columns,
};

/// A 36 character key column shaped like the base `id` column
pub fn uuid_column(name: &str) -> Column {
    Column {
        name: name.to_owned(),
        default: None,
        nullable: false,
        data_type: "char".to_owned(),
        max_length: Some(36),
        charset: Some("utf8mb4".to_owned()),
        collation: Some("utf8mb4_general_ci".to_owned()),
        column_type: "varchar(36)".to_owned(),
        key: String::new(),
        extra: String::new(),
        generated: Some("NEVER".to_owned()),
    }
}

pub fn varchar_column(name: &str, length: u64) -> Column {
    Column {
        data_type: "varchar".to_owned(),
        max_length: Some(length),
        column_type: format!("varchar({length})"),
        ..uuid_column(name)
    }
}

/// A nullable reference column carrying a foreign-key index
pub fn reference_column(name: &str) -> Column {
    Column {
        nullable: true,
        key: "MUL".to_owned(),
        ..uuid_column(name)
    }
}

/// The base columns followed by `columns`
pub fn table_columns(columns: impl IntoIterator<Item = Column>) -> Vec<Column> {
    default_base_columns().into_iter().chain(columns).collect()
}

pub fn constraint(name: &str, table: &str, column: &str, referenced_table: &str) -> Constraint {
    Constraint {
        name: name.to_owned(),
        table: table.to_owned(),
        column: column.to_owned(),
        referenced_table: referenced_table.to_owned(),
        referenced_column: "id".to_owned(),
        update_rule: "NO ACTION".to_owned(),
        delete_rule: "CASCADE".to_owned(),
    }
}

pub fn organization() -> EntityModel {
    EntityModel::new("Organization").property(
        PropertyModel::new("nameID", "string").annotate(
            AnnotationKind::Column,
            "Column('varchar', { length: UUID_LENGTH, nullable: false })",
        ),
    )
}

pub fn project() -> EntityModel {
    EntityModel::new("Project")
        .property(PropertyModel::new("displayName", "string").annotate(
            AnnotationKind::Column,
            "Column('varchar', { length: 255, nullable: false })",
        ))
        .property(PropertyModel::new("owner", "Organization").annotate(
            AnnotationKind::ManyToOne,
            "ManyToOne(() => Organization, organization => organization.projects, \
             { eager: false, cascade: false, onDelete: 'CASCADE' })",
        ))
}

/// `Organization` and `Project`, with parameters filled in
pub fn catalog() -> EntityCatalog {
    enrich(EntityCatalog::new(vec![organization(), project()]))
}

pub fn enrich(mut catalog: EntityCatalog) -> EntityCatalog {
    let mut reporter = DriftReporter::new();
    AnnotationParser::new(LengthCatalog::default()).enrich(&mut catalog, &mut reporter);
    catalog
}

/// A schema the entities of [`catalog`] map onto without any drift
pub fn schema() -> MockIntrospector {
    MockIntrospector::new()
        .append_table("organization", table_columns([varchar_column("nameID", 36)]))
        .append_table(
            "project",
            table_columns([
                varchar_column("displayName", 255),
                reference_column("ownerId"),
            ]),
        )
        .append_constraints(vec![constraint(
            "FK_project_owner",
            "project",
            "ownerId",
            "organization",
        )])
}
