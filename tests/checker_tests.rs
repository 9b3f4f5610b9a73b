pub mod common;

use common::{by_severity, check, dump, of_kind, replace, without};
use pretty_assertions::assert_eq;
use sea_orm_drift::{
    AnnotationKind, CheckerConfig, Column, Constraint, DriftErr, DriftReporter, EntityCatalog,
    EntityModel, FindingKind, MockIntrospector, PropertyModel, Severity,
    config::default_base_columns,
    tests_cfg::{self, constraint, table_columns, varchar_column},
};

#[tokio::test]
async fn owning_reference_without_drift() {
    let (reporter, visited) = check(
        &tests_cfg::catalog(),
        tests_cfg::schema(),
        CheckerConfig::default(),
    )
    .await;
    let visited = visited.unwrap();

    assert!(reporter.findings().is_empty(), "{}", dump(&reporter));
    assert_eq!(
        visited.constraints().collect::<Vec<_>>(),
        vec!["FK_project_owner"]
    );
    assert_eq!(
        visited.tables().collect::<Vec<_>>(),
        vec!["organization", "project"]
    );
}

#[tokio::test]
async fn schema_is_listed_once_per_run() {
    let introspector = tests_cfg::schema();
    let checker = sea_orm_drift::ConsistencyChecker::new(&introspector, CheckerConfig::default());
    let mut reporter = sea_orm_drift::DriftReporter::new();
    checker
        .run(&tests_cfg::catalog(), &mut reporter)
        .await
        .unwrap();

    assert_eq!(
        introspector.drain_query_log(),
        vec![
            "list_tables".to_owned(),
            "list_foreign_key_constraints".to_owned(),
            "list_columns organization".to_owned(),
            "list_columns project".to_owned(),
        ]
    );
}

#[tokio::test]
async fn missing_version_column() {
    let organization = without(table_columns([varchar_column("nameID", 36)]), "version");
    let (reporter, _) = check(
        &tests_cfg::catalog(),
        tests_cfg::schema().append_table("organization", organization),
        CheckerConfig::default(),
    )
    .await;

    assert_eq!(reporter.findings().len(), 1, "{}", dump(&reporter));
    let finding = &reporter.findings()[0];
    assert_eq!(finding.severity, Severity::Warning);
    assert_eq!(finding.kind, FindingKind::SchemaLookupFailure);
    assert_eq!(finding.entity.as_deref(), Some("Organization"));
    assert_eq!(finding.column.as_deref(), Some("version"));
}

#[tokio::test]
async fn char_varchar_difference_is_a_note() {
    let mut id = default_base_columns().remove(0);
    id.data_type = "varchar".to_owned();
    id.column_type = "char(36)".to_owned();
    let organization = replace(table_columns([varchar_column("nameID", 36)]), id);

    let (reporter, _) = check(
        &tests_cfg::catalog(),
        tests_cfg::schema().append_table("organization", organization),
        CheckerConfig::default(),
    )
    .await;

    assert_eq!(reporter.findings().len(), 1, "{}", dump(&reporter));
    let note = &reporter.findings()[0];
    assert_eq!(note.severity, Severity::Info);
    assert_eq!(note.kind, FindingKind::Note);
    assert_eq!(note.column.as_deref(), Some("id"));
}

#[tokio::test]
async fn different_base_column() {
    let mut version = default_base_columns().remove(3);
    version.nullable = true;
    let project = replace(
        table_columns([
            varchar_column("displayName", 255),
            tests_cfg::reference_column("ownerId"),
        ]),
        version,
    );

    let (reporter, _) = check(
        &tests_cfg::catalog(),
        tests_cfg::schema().append_table("project", project),
        CheckerConfig::default(),
    )
    .await;

    let warnings = by_severity(&reporter, Severity::Warning);
    assert_eq!(warnings.len(), 1, "{}", dump(&reporter));
    assert_eq!(warnings[0].kind, FindingKind::DriftMismatch);
    assert_eq!(
        warnings[0].detail,
        Some(serde_json::json!([{ "field": "nullable", "value": true, "expected": false }]))
    );
}

#[tokio::test]
async fn nullable_drift() {
    let mut display_name = varchar_column("displayName", 255);
    display_name.nullable = true;
    let project = table_columns([display_name, tests_cfg::reference_column("ownerId")]);

    let (reporter, _) = check(
        &tests_cfg::catalog(),
        tests_cfg::schema().append_table("project", project),
        CheckerConfig::default(),
    )
    .await;

    let mistakes = by_severity(&reporter, Severity::Mistake);
    let messages: Vec<&str> = mistakes.iter().map(|f| f.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "displayName column doesn't match",
            "expected nullable false but is YES",
        ],
        "{}",
        dump(&reporter)
    );
    assert_eq!(reporter.findings().len(), 2);
}

#[tokio::test]
async fn column_missing_from_entity() {
    let project = table_columns([
        varchar_column("displayName", 255),
        tests_cfg::reference_column("ownerId"),
        varchar_column("tagline", 512),
        tests_cfg::reference_column("authorizationId"),
    ]);

    let (reporter, _) = check(
        &tests_cfg::catalog(),
        tests_cfg::schema().append_table("project", project),
        CheckerConfig::default(),
    )
    .await;

    assert_eq!(reporter.findings().len(), 1, "{}", dump(&reporter));
    let finding = &reporter.findings()[0];
    assert_eq!(finding.kind, FindingKind::OrphanSchemaObject);
    assert_eq!(finding.column.as_deref(), Some("tagline"));
}

#[tokio::test]
async fn on_delete_drift() {
    let mut fk = constraint("FK_project_owner", "project", "ownerId", "organization");
    fk.delete_rule = "SET NULL".to_owned();
    let introspector = MockIntrospector::from_snapshot(sea_orm_drift::SchemaSnapshot {
        tables: tests_cfg::schema().snapshot().tables.clone(),
        constraints: vec![fk],
    });

    let (reporter, visited) =
        check(&tests_cfg::catalog(), introspector, CheckerConfig::default()).await;

    assert_eq!(reporter.findings().len(), 1, "{}", dump(&reporter));
    let finding = &reporter.findings()[0];
    assert_eq!(finding.severity, Severity::Mistake);
    assert_eq!(finding.property.as_deref(), Some("owner"));
    assert_eq!(
        finding.message,
        "onDelete policies don't match, declared 'CASCADE' but is SET NULL"
    );
    assert!(visited.unwrap().has_constraint("FK_project_owner"));
}

#[tokio::test]
async fn missing_foreign_key() {
    let introspector = MockIntrospector::from_snapshot(sea_orm_drift::SchemaSnapshot {
        tables: tests_cfg::schema().snapshot().tables.clone(),
        constraints: Vec::new(),
    });

    let (reporter, _) = check(&tests_cfg::catalog(), introspector, CheckerConfig::default()).await;

    assert_eq!(reporter.findings().len(), 1, "{}", dump(&reporter));
    assert_eq!(
        reporter.findings()[0].message,
        "missing FK on column ownerId to organization.id"
    );
}

#[tokio::test]
async fn duplicate_constraints_are_ambiguous() {
    let introspector = tests_cfg::schema().append_constraints(vec![constraint(
        "FK_project_owner_copy",
        "project",
        "ownerId",
        "organization",
    )]);

    let (reporter, visited) =
        check(&tests_cfg::catalog(), introspector, CheckerConfig::default()).await;
    let visited = visited.unwrap();

    let ambiguous = of_kind(&reporter, FindingKind::AmbiguousConstraint);
    assert_eq!(ambiguous.len(), 1, "{}", dump(&reporter));
    assert_eq!(ambiguous[0].severity, Severity::Error);
    assert_eq!(
        ambiguous[0].detail,
        Some(serde_json::json!(["FK_project_owner", "FK_project_owner_copy"]))
    );
    assert_eq!(visited.constraints().count(), 0);
    assert_eq!(of_kind(&reporter, FindingKind::OrphanSchemaObject).len(), 2);
}

#[tokio::test]
async fn entity_without_table() {
    let catalog = tests_cfg::enrich(EntityCatalog::new(vec![
        tests_cfg::organization(),
        tests_cfg::project(),
        EntityModel::new("Space"),
    ]));

    let (reporter, _) = check(&catalog, tests_cfg::schema(), CheckerConfig::default()).await;

    assert_eq!(reporter.findings().len(), 1, "{}", dump(&reporter));
    let finding = &reporter.findings()[0];
    assert_eq!(finding.severity, Severity::Error);
    assert_eq!(finding.kind, FindingKind::SchemaLookupFailure);
    assert_eq!(finding.table.as_deref(), Some("space"));
}

#[tokio::test]
async fn target_must_be_a_mapped_entity() {
    let catalog = tests_cfg::enrich(EntityCatalog::new(vec![tests_cfg::project()]));
    let introspector = tests_cfg::schema();

    let (reporter, _) = check(&catalog, introspector, CheckerConfig::default()).await;

    let messages: Vec<&str> = reporter.findings().iter().map(|f| f.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Organization is not a valid entity",
            "FK_project_owner not used by any entity",
            "organization not used by any entity",
        ],
        "{}",
        dump(&reporter)
    );
}

#[tokio::test]
async fn generated_column_requires_auto_increment() {
    let catalog = tests_cfg::enrich(EntityCatalog::new(vec![
        tests_cfg::organization(),
        tests_cfg::project().property(
            PropertyModel::new("rowId", "number")
                .annotate(AnnotationKind::Column, "Column()")
                .annotate(AnnotationKind::Generated, "Generated('increment')"),
        ),
    ]));
    let mut row_id = default_base_columns().remove(3);
    row_id.name = "rowId".to_owned();
    let project = table_columns([
        varchar_column("displayName", 255),
        tests_cfg::reference_column("ownerId"),
        row_id,
    ]);

    let (reporter, _) = check(
        &catalog,
        tests_cfg::schema().append_table("project", project),
        CheckerConfig::default(),
    )
    .await;

    assert_eq!(reporter.findings().len(), 1, "{}", dump(&reporter));
    assert_eq!(
        reporter.findings()[0].message,
        "generated column is not auto_increment"
    );
}

#[tokio::test]
async fn skipped_entities_leave_their_table_unvisited() {
    let config = CheckerConfig {
        skip_entities: vec!["Project".to_owned()],
        ..Default::default()
    };
    let introspector = tests_cfg::schema();

    let (reporter, _) = check(&tests_cfg::catalog(), introspector, config).await;

    let orphans: Vec<Option<&str>> = of_kind(&reporter, FindingKind::OrphanSchemaObject)
        .into_iter()
        .map(|f| f.table.as_deref())
        .collect();
    assert_eq!(orphans, vec![Some("project"), Some("project")]);
    assert_eq!(reporter.findings().len(), 2, "{}", dump(&reporter));
}

#[tokio::test]
async fn failed_lookup_is_scoped_to_its_entity() {
    let introspector = tests_cfg::schema()
        .fail_columns_of("organization", DriftErr::Query("Lock wait timeout".to_owned()));

    let (reporter, visited) =
        check(&tests_cfg::catalog(), introspector, CheckerConfig::default()).await;
    let visited = visited.unwrap();

    assert_eq!(reporter.findings().len(), 1, "{}", dump(&reporter));
    let finding = &reporter.findings()[0];
    assert_eq!(finding.severity, Severity::Error);
    assert_eq!(finding.entity.as_deref(), Some("Organization"));
    assert!(visited.has_constraint("FK_project_owner"));
    assert!(visited.has_table("organization"));
}

#[tokio::test]
async fn lost_connection_ends_the_pass() {
    let introspector =
        tests_cfg::schema().fail_columns_of("project", DriftErr::Conn("broken pipe".to_owned()));

    let (reporter, result) =
        check(&tests_cfg::catalog(), introspector, CheckerConfig::default()).await;

    assert_eq!(result, Err(DriftErr::Conn("broken pipe".to_owned())));
    assert_eq!(of_kind(&reporter, FindingKind::OrphanSchemaObject).len(), 0);
}

#[tokio::test]
async fn concurrency_keeps_entity_order() {
    let catalog = tests_cfg::enrich(EntityCatalog::new(vec![
        tests_cfg::organization(),
        tests_cfg::project(),
        EntityModel::new("Space"),
        EntityModel::new("Challenge"),
    ]));
    let introspector = || {
        tests_cfg::schema()
            .append_table("space", without(table_columns([]), "version"))
            .append_table("challenge", without(table_columns([]), "createdDate"))
    };

    let (sequential, _) = check(&catalog, introspector(), CheckerConfig::default()).await;
    let (concurrent, _) = check(
        &catalog,
        introspector(),
        CheckerConfig {
            concurrency: 4,
            ..Default::default()
        },
    )
    .await;

    assert_eq!(sequential.findings().len(), 2, "{}", dump(&sequential));
    assert_eq!(sequential.findings(), concurrent.findings());
    assert_eq!(sequential.findings()[0].entity.as_deref(), Some("Space"));
}

/// Check `Organization` with one more column property, backed by `column`
async fn check_organization_with(property: PropertyModel, column: Column) -> DriftReporter {
    let catalog = tests_cfg::enrich(EntityCatalog::new(vec![
        tests_cfg::organization().property(property),
        tests_cfg::project(),
    ]));
    let organization = table_columns([varchar_column("nameID", 36), column]);
    let (reporter, _) = check(
        &catalog,
        tests_cfg::schema().append_table("organization", organization),
        CheckerConfig::default(),
    )
    .await;
    reporter
}

#[tokio::test]
async fn column_facets_drift_on_their_own() {
    let int_column = Column {
        data_type: "int".to_owned(),
        max_length: None,
        charset: None,
        collation: None,
        column_type: "int(11)".to_owned(),
        ..tests_cfg::uuid_column("count")
    };
    let tinyint_column = Column {
        data_type: "tinyint".to_owned(),
        max_length: None,
        charset: None,
        collation: None,
        column_type: "tinyint(4)".to_owned(),
        ..tests_cfg::uuid_column("active")
    };
    let cases = vec![
        (
            PropertyModel::new("count", "number")
                .annotate(AnnotationKind::Column, "Column('varchar', { length: 64 })"),
            varchar_column("count", 64),
            "number doesn't have the expected data type, found varchar (varchar(64))",
        ),
        (
            PropertyModel::new("code", "string").annotate(AnnotationKind::Column, "Column('text')"),
            varchar_column("code", 64),
            "expected type text but has type varchar",
        ),
        (
            PropertyModel::new("code", "string")
                .annotate(AnnotationKind::Column, "Column('varchar', { length: 128 })"),
            varchar_column("code", 64),
            "expected length 128 but has length 64",
        ),
        (
            PropertyModel::new("count", "number")
                .annotate(AnnotationKind::Column, "Column('int', { length: 11 })"),
            int_column,
            "expected length 11 but has no length",
        ),
        (
            PropertyModel::new("active", "boolean")
                .annotate(AnnotationKind::Column, "Column({ type: 'boolean' })"),
            tinyint_column,
            "column type mismatch, found tinyint(4)",
        ),
        (
            PropertyModel::new("code", "string").annotate(
                AnnotationKind::Column,
                "Column('varchar', { length: 64, unique: true })",
            ),
            varchar_column("code", 64),
            "property has the unique parameter but the column is not unique",
        ),
    ];

    for (property, column, expected) in cases {
        let name = property.name.clone();
        let reporter = check_organization_with(property, column).await;

        let messages: Vec<&str> = reporter.findings().iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, vec![expected], "{name}");
        let finding = &reporter.findings()[0];
        assert_eq!(finding.severity, Severity::Mistake);
        assert_eq!(finding.entity.as_deref(), Some("Organization"));
        assert_eq!(finding.property.as_deref(), Some(name.as_str()));
        assert_eq!(finding.column.as_deref(), Some(name.as_str()));
    }
}

#[tokio::test]
async fn unique_column_matches_unique_key() {
    let reporter = check_organization_with(
        PropertyModel::new("code", "string").annotate(
            AnnotationKind::Column,
            "Column('varchar', { length: 64, unique: true })",
        ),
        Column {
            key: "UNI".to_owned(),
            ..varchar_column("code", 64)
        },
    )
    .await;

    assert!(reporter.findings().is_empty(), "{}", dump(&reporter));
}

fn project_with_host(join_column: bool) -> EntityCatalog {
    let mut host = PropertyModel::new("host", "Organization")
        .annotate(AnnotationKind::OneToOne, "OneToOne(() => Organization)");
    if join_column {
        host = host.annotate(AnnotationKind::JoinColumn, "JoinColumn()");
    }
    tests_cfg::enrich(EntityCatalog::new(vec![
        tests_cfg::organization(),
        tests_cfg::project().property(host),
    ]))
}

fn schema_with_host() -> MockIntrospector {
    tests_cfg::schema()
        .append_table(
            "project",
            table_columns([
                varchar_column("displayName", 255),
                tests_cfg::reference_column("ownerId"),
                tests_cfg::reference_column("hostId"),
            ]),
        )
        .append_constraints(vec![constraint(
            "FK_project_host",
            "project",
            "hostId",
            "organization",
        )])
}

#[tokio::test]
async fn one_to_one_needs_join_column() {
    let (reporter, visited) = check(
        &project_with_host(true),
        schema_with_host(),
        CheckerConfig::default(),
    )
    .await;
    assert!(reporter.findings().is_empty(), "{}", dump(&reporter));
    assert!(visited.unwrap().has_constraint("FK_project_host"));

    let (reporter, _) = check(
        &project_with_host(false),
        schema_with_host(),
        CheckerConfig::default(),
    )
    .await;
    assert_eq!(reporter.findings().len(), 1, "{}", dump(&reporter));
    let finding = &reporter.findings()[0];
    assert_eq!(finding.severity, Severity::Error);
    assert_eq!(finding.kind, FindingKind::InvalidMapping);
    assert_eq!(finding.property.as_deref(), Some("host"));
    assert_eq!(
        finding.message,
        "OneToOne property has unknown annotations, maybe a missing JoinColumn?"
    );
}

fn organization_with_projects(declared_type: &str) -> EntityCatalog {
    tests_cfg::enrich(EntityCatalog::new(vec![
        tests_cfg::organization().property(PropertyModel::new("projects", declared_type).annotate(
            AnnotationKind::OneToMany,
            "OneToMany(() => Project, project => project.organization)",
        )),
        tests_cfg::project(),
    ]))
}

fn organization_key(name: &str) -> Constraint {
    constraint(name, "project", "organizationId", "organization")
}

#[tokio::test]
async fn inverse_side_key_on_the_target_table() {
    let introspector = tests_cfg::schema().append_constraints(vec![organization_key("FK_project_org")]);

    let (reporter, visited) = check(
        &organization_with_projects("Project[]"),
        introspector,
        CheckerConfig::default(),
    )
    .await;

    assert!(reporter.findings().is_empty(), "{}", dump(&reporter));
    assert_eq!(
        visited.unwrap().constraints().collect::<Vec<_>>(),
        vec!["FK_project_org", "FK_project_owner"]
    );
}

#[tokio::test]
async fn inverse_side_without_key() {
    let (reporter, _) = check(
        &organization_with_projects("Project[]"),
        tests_cfg::schema(),
        CheckerConfig::default(),
    )
    .await;

    assert_eq!(reporter.findings().len(), 1, "{}", dump(&reporter));
    let finding = &reporter.findings()[0];
    assert_eq!(finding.severity, Severity::Mistake);
    assert_eq!(finding.kind, FindingKind::DriftMismatch);
    assert_eq!(finding.property.as_deref(), Some("projects"));
    assert_eq!(
        finding.message,
        "missing FK on table project column OrganizationId to organization.id, check manually"
    );
}

#[tokio::test]
async fn inverse_side_with_ambiguous_keys() {
    let introspector = tests_cfg::schema().append_constraints(vec![
        organization_key("FK_project_org"),
        organization_key("FK_project_org_legacy"),
    ]);

    let (reporter, visited) = check(
        &organization_with_projects("Project[]"),
        introspector,
        CheckerConfig::default(),
    )
    .await;

    let ambiguous = of_kind(&reporter, FindingKind::AmbiguousConstraint);
    assert_eq!(ambiguous.len(), 1, "{}", dump(&reporter));
    assert_eq!(
        ambiguous[0].detail,
        Some(serde_json::json!(["FK_project_org", "FK_project_org_legacy"]))
    );
    assert!(!visited.unwrap().has_constraint("FK_project_org"));
    assert_eq!(of_kind(&reporter, FindingKind::OrphanSchemaObject).len(), 2);
}

#[tokio::test]
async fn inverse_side_needs_an_array_type() {
    let introspector = tests_cfg::schema().append_constraints(vec![organization_key("FK_project_org")]);

    let (reporter, visited) = check(
        &organization_with_projects("Project"),
        introspector,
        CheckerConfig::default(),
    )
    .await;

    assert_eq!(reporter.findings().len(), 1, "{}", dump(&reporter));
    let finding = &reporter.findings()[0];
    assert_eq!(finding.severity, Severity::Mistake);
    assert_eq!(finding.kind, FindingKind::InvalidMapping);
    assert_eq!(
        finding.message,
        "Project should be an array type for a OneToMany relation"
    );
    assert!(visited.unwrap().has_constraint("FK_project_org"));
}

fn organization_with_partners(partners: PropertyModel) -> EntityCatalog {
    tests_cfg::enrich(EntityCatalog::new(vec![
        tests_cfg::organization().property(partners),
        tests_cfg::project(),
    ]))
}

#[tokio::test]
async fn many_to_many_is_left_for_review() {
    let partners = PropertyModel::new("partners", "Project[]")
        .annotate(AnnotationKind::ManyToMany, "ManyToMany(() => Project)")
        .annotate(AnnotationKind::JoinTable, "JoinTable()");

    let (reporter, _) = check(
        &organization_with_partners(partners),
        tests_cfg::schema(),
        CheckerConfig::default(),
    )
    .await;

    assert_eq!(reporter.findings().len(), 1, "{}", dump(&reporter));
    let finding = &reporter.findings()[0];
    assert_eq!(finding.severity, Severity::Info);
    assert_eq!(finding.kind, FindingKind::ManualReview);
    assert_eq!(finding.entity.as_deref(), Some("Organization"));
    assert_eq!(finding.property.as_deref(), Some("partners"));
    assert_eq!(
        finding.message,
        "ManyToMany relation to Project has to be checked manually"
    );
}

#[tokio::test]
async fn many_to_many_without_join_table() {
    let partners = PropertyModel::new("partners", "Project[]")
        .annotate(AnnotationKind::ManyToMany, "ManyToMany(() => Project)");

    let (reporter, _) = check(
        &organization_with_partners(partners),
        tests_cfg::schema(),
        CheckerConfig::default(),
    )
    .await;

    let findings: Vec<(Severity, FindingKind, &str)> = reporter
        .findings()
        .iter()
        .map(|f| (f.severity, f.kind, f.message.as_str()))
        .collect();
    assert_eq!(
        findings,
        vec![
            (
                Severity::Error,
                FindingKind::InvalidMapping,
                "ManyToMany property has unknown annotations, maybe a missing JoinTable?"
            ),
            (
                Severity::Info,
                FindingKind::ManualReview,
                "ManyToMany relation to Project has to be checked manually"
            ),
        ]
    );
}

#[tokio::test]
async fn many_to_many_target_must_be_mapped() {
    let partners = PropertyModel::new("partners", "Partner[]")
        .annotate(AnnotationKind::ManyToMany, "ManyToMany(() => Partner)")
        .annotate(AnnotationKind::JoinTable, "JoinTable({ name: 'organization_partners' })");

    let (reporter, _) = check(
        &organization_with_partners(partners),
        tests_cfg::schema(),
        CheckerConfig::default(),
    )
    .await;

    let errors = by_severity(&reporter, Severity::Error);
    assert_eq!(errors.len(), 1, "{}", dump(&reporter));
    assert_eq!(errors[0].kind, FindingKind::SchemaLookupFailure);
    assert_eq!(errors[0].message, "Partner is not a valid entity");
    assert_eq!(of_kind(&reporter, FindingKind::ManualReview).len(), 1);
}
