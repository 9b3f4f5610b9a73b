use super::EntityCheck;
use crate::{AnnotationKind, Finding, FindingKind, model::naming};

const RELATION_KINDS: [AnnotationKind; 4] = [
    AnnotationKind::OneToOne,
    AnnotationKind::ManyToOne,
    AnnotationKind::OneToMany,
    AnnotationKind::ManyToMany,
];

impl EntityCheck<'_> {
    pub(super) fn entity_annotations(&mut self) {
        let entity = self.entity;
        let kinds: Vec<&str> = entity.annotations.iter().map(|a| a.kind.as_str()).collect();

        if kinds.len() != 1 || !kinds.contains(&AnnotationKind::Entity.as_str()) {
            self.report(
                Finding::warning(
                    FindingKind::InvalidMapping,
                    "object doesn't have exactly one Entity annotation",
                )
                .detail(&kinds),
            );
        }
        if !entity.is_plain_entity() {
            let expressions: Vec<&str> = entity
                .annotations
                .iter()
                .map(|a| a.expression.as_str())
                .collect();
            self.report(
                Finding::mistake(FindingKind::InvalidMapping, "entity has an unknown entity annotation")
                    .detail(expressions),
            );
        }
    }

    pub(super) fn base_columns(&mut self) {
        let config = self.config;
        for expected in &config.base_columns {
            let Some(column) = self.column(&expected.name) else {
                self.report(
                    Finding::warning(
                        FindingKind::SchemaLookupFailure,
                        format!("missing base column {}", expected.name),
                    )
                    .column(&expected.name),
                );
                continue;
            };
            if !self.expect_shape(column, expected) {
                self.report(
                    Finding::warning(
                        FindingKind::DriftMismatch,
                        format!("different base column {}", expected.name),
                    )
                    .column(&expected.name)
                    .detail(column.diff(expected)),
                );
            }
        }
    }

    /// Every table column has to be accounted for by the entity
    pub(super) fn extra_columns(&mut self) {
        let (config, entity) = (self.config, self.entity);
        for column in self.columns {
            let name = column.name.as_str();
            let accounted = config.is_base_column(name)
                || entity.find_property(name).is_some()
                || naming::relation_property_name(name)
                    .is_some_and(|property| entity.find_property(property).is_some())
                || name == config.authorization_column
                || entity
                    .properties
                    .iter()
                    .any(|p| p.has(&AnnotationKind::Column) && p.column_name() == name);
            if !accounted {
                self.report(
                    Finding::warning(FindingKind::OrphanSchemaObject, "column is missing in the entity")
                        .column(name)
                        .detail(column),
                );
            }
        }
    }

    pub(super) fn nameable_columns(&mut self) {
        let config = self.config;
        for column in self.columns {
            for expected in &config.nameable_columns {
                if column.name.eq_ignore_ascii_case(&expected.name)
                    && !self.expect_shape(column, expected)
                {
                    self.report(
                        Finding::mistake(
                            FindingKind::DriftMismatch,
                            format!("{} column doesn't match", expected.name),
                        )
                        .column(&column.name)
                        .detail(column.diff(expected)),
                    );
                }
            }
        }
    }

    pub(super) fn properties(&mut self) {
        let entity = self.entity;
        for property in &entity.properties {
            if let Some(annotation) = property.annotation(&AnnotationKind::Column) {
                self.column_property(property, annotation);
            }
            for kind in &RELATION_KINDS {
                if let Some(annotation) = property.annotation(kind) {
                    self.relation_property(property, annotation);
                }
            }
        }
    }
}
