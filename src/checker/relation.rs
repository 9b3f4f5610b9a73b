use super::EntityCheck;
use crate::{
    AnnotationKind, AnnotationModel, Constraint, Finding, FindingKind, ParamValue, PropertyModel,
    model::naming,
};

/// Column every reference points at
const REFERENCED_COLUMN: &str = "id";

/// Which side of a relationship stores the foreign key
#[derive(Clone, Copy)]
enum ForeignKey {
    /// `<property>Id` on this entity's table
    Owning,
    /// `<entity>Id` on the target's table
    Inverse,
}

impl<'a> EntityCheck<'a> {
    pub(super) fn relation_property(
        &mut self,
        property: &PropertyModel,
        annotation: &AnnotationModel,
    ) {
        let kind = &annotation.kind;
        let context = |finding: Finding| finding.property(&property.name);

        let (expected_count, companion) = match kind {
            AnnotationKind::OneToOne => (2, Some(AnnotationKind::JoinColumn)),
            AnnotationKind::ManyToMany => (2, Some(AnnotationKind::JoinTable)),
            _ => (1, None),
        };
        if property.annotations.len() != expected_count {
            let message = match &companion {
                Some(companion) => {
                    format!("{kind} property has unknown annotations, maybe a missing {companion}?")
                }
                None => format!("{kind} property has unknown annotations"),
            };
            self.report(context(
                Finding::error(FindingKind::InvalidMapping, message)
                    .detail(annotation_kinds(property)),
            ));
        }
        let unknown: Vec<&str> = property
            .annotations
            .iter()
            .filter(|a| {
                let known = match (&a.kind, &companion) {
                    (k, _) if k == kind => true,
                    (AnnotationKind::JoinColumn, Some(AnnotationKind::JoinColumn)) => {
                        a.is_plain(&AnnotationKind::JoinColumn)
                    }
                    (k, Some(companion)) => k == companion,
                    _ => false,
                };
                !known
            })
            .map(|a| a.expression.as_str())
            .collect();
        if !unknown.is_empty() {
            self.report(context(
                Finding::error(
                    FindingKind::InvalidMapping,
                    format!("{kind} property has unknown annotations"),
                )
                .detail(unknown),
            ));
        }

        let declared = property.declared_type.as_deref().unwrap_or_default();
        let target = match kind {
            AnnotationKind::OneToMany => match declared.strip_suffix("[]") {
                Some(element) => element,
                None => {
                    self.report(context(Finding::mistake(
                        FindingKind::InvalidMapping,
                        format!("{declared} should be an array type for a {kind} relation"),
                    )));
                    declared
                }
            },
            AnnotationKind::ManyToMany => declared.strip_suffix("[]").unwrap_or(declared),
            _ => declared,
        };
        let column_type = annotation.param_value("columnType").and_then(ParamValue::as_str);
        if target.is_empty() || Some(target) != column_type {
            self.report(context(
                Finding::error(FindingKind::InvalidMapping, "unknown related entities")
                    .detail(serde_json::json!({ "declared": declared, "columnType": column_type })),
            ));
        }

        let foreign_key = match kind {
            AnnotationKind::OneToOne | AnnotationKind::ManyToOne => ForeignKey::Owning,
            AnnotationKind::OneToMany => ForeignKey::Inverse,
            _ => {
                if !self.catalog.is_mapped_entity(target) {
                    self.report(context(Finding::error(
                        FindingKind::SchemaLookupFailure,
                        format!("{target} is not a valid entity"),
                    )));
                }
                self.report(context(Finding::info(
                    FindingKind::ManualReview,
                    format!("{kind} relation to {target} has to be checked manually"),
                )));
                return;
            }
        };

        let column = match foreign_key {
            ForeignKey::Owning => naming::foreign_key_column(&property.name),
            ForeignKey::Inverse => naming::foreign_key_column(&self.entity.name),
        };
        if matches!(foreign_key, ForeignKey::Owning) {
            let found = self
                .columns
                .iter()
                .filter(|c| c.name.eq_ignore_ascii_case(&column))
                .count();
            if found != 1 {
                self.report(context(
                    Finding::mistake(
                        FindingKind::SchemaLookupFailure,
                        format!("{kind} relation doesn't have a {column} column"),
                    )
                    .column(&column),
                ));
                return;
            }
        }

        if !self.catalog.is_mapped_entity(target) {
            self.report(context(Finding::error(
                FindingKind::SchemaLookupFailure,
                format!("{target} is not a valid entity"),
            )));
            return;
        }
        let target_table = naming::table_name(target);
        let (table, referenced_table) = match foreign_key {
            ForeignKey::Owning => (self.table, target_table.as_str()),
            ForeignKey::Inverse => (target_table.as_str(), self.table),
        };

        let constraints: &'a [Constraint] = self.constraints;
        let matching: Vec<&'a Constraint> = constraints
            .iter()
            .filter(|c| {
                c.table == table
                    && c.column.eq_ignore_ascii_case(&column)
                    && c.referenced_table == referenced_table
                    && c.referenced_column == REFERENCED_COLUMN
            })
            .collect();

        match matching.as_slice() {
            [] => {
                let message = match foreign_key {
                    ForeignKey::Owning => format!(
                        "missing FK on column {column} to {referenced_table}.{REFERENCED_COLUMN}"
                    ),
                    ForeignKey::Inverse => format!(
                        "missing FK on table {table} column {column} \
                         to {referenced_table}.{REFERENCED_COLUMN}, check manually"
                    ),
                };
                self.report(context(Finding::mistake(FindingKind::DriftMismatch, message)));
            }
            [constraint] => {
                self.outcome.visited.visit_constraint(&constraint.name);
                self.constraint_parameters(property, annotation, constraint);
            }
            several => {
                let names: Vec<&str> = several.iter().map(|c| c.name.as_str()).collect();
                self.report(context(
                    Finding::error(
                        FindingKind::AmbiguousConstraint,
                        "more than one constraint matches this relation",
                    )
                    .column(&column)
                    .detail(names),
                ));
            }
        }
    }

    /// Compare the declared options of a relation to its constraint
    fn constraint_parameters(
        &mut self,
        property: &PropertyModel,
        annotation: &AnnotationModel,
        constraint: &Constraint,
    ) {
        for param in annotation.parameters.iter().flatten() {
            let finding = match (param.name.as_str(), &param.value) {
                ("onDelete", value) => (value.as_str() != Some(constraint.delete_rule.as_str()))
                    .then(|| {
                        Finding::mistake(
                            FindingKind::DriftMismatch,
                            format!(
                                "onDelete policies don't match, declared {value} but is {}",
                                constraint.delete_rule
                            ),
                        )
                    }),
                ("cascade" | "eager" | "relation" | "columnType", _) => None,
                (other, value) => Some(Finding::error(
                    FindingKind::UnrecognizedParameter,
                    format!("unknown constraint parameter {other}: {value}"),
                )),
            };
            if let Some(finding) = finding {
                self.report(
                    finding
                        .property(&property.name)
                        .column(&constraint.column)
                        .detail(constraint),
                );
            }
        }
    }
}

fn annotation_kinds(property: &PropertyModel) -> Vec<&str> {
    property.annotations.iter().map(|a| a.kind.as_str()).collect()
}
