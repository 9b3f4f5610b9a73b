use super::EntityCheck;
use crate::{
    AnnotationKind, AnnotationModel, CheckerConfig, Column, Finding, FindingKind, ParamValue,
    PropertyModel,
};

/// How a live column compares to its expectation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnMatch {
    Exact,
    /// Equal once `char` and `varchar` are taken as the same type, but the
    /// `column_type` strings still differ
    CharVarchar {
        column_type: String,
        expected: String,
    },
    Differs,
}

impl ColumnMatch {
    pub fn is_match(&self) -> bool {
        !matches!(self, Self::Differs)
    }
}

fn is_char_like(data_type: &str) -> bool {
    matches!(data_type, "char" | "varchar")
}

pub fn match_column(column: &Column, expected: &Column) -> ColumnMatch {
    if column == expected {
        return ColumnMatch::Exact;
    }
    if !is_char_like(&column.data_type) || !is_char_like(&expected.data_type) {
        return ColumnMatch::Differs;
    }

    let untyped = |c: &Column| Column {
        data_type: String::new(),
        column_type: String::new(),
        ..c.clone()
    };
    if untyped(column) != untyped(expected) {
        ColumnMatch::Differs
    } else if column.column_type == expected.column_type {
        ColumnMatch::Exact
    } else {
        ColumnMatch::CharVarchar {
            column_type: column.column_type.clone(),
            expected: expected.column_type.clone(),
        }
    }
}

impl<'a> EntityCheck<'a> {
    /// Compare a fixed-shape column, noting a tolerated char/varchar difference.
    /// Returns whether the column matched.
    pub(super) fn expect_shape(&mut self, column: &Column, expected: &Column) -> bool {
        match match_column(column, expected) {
            ColumnMatch::Exact => true,
            ColumnMatch::CharVarchar {
                column_type,
                expected,
            } => {
                self.report(
                    Finding::info(
                        FindingKind::Note,
                        format!("column is {column_type} but is expected to be {expected}"),
                    )
                    .column(&column.name),
                );
                true
            }
            ColumnMatch::Differs => false,
        }
    }

    /// Checks of a property carrying a `Column` annotation
    pub(super) fn column_property(
        &mut self,
        property: &PropertyModel,
        annotation: &AnnotationModel,
    ) {
        let context = |finding: Finding| finding.property(&property.name);

        if annotation.parameters.is_none() {
            self.report(context(
                Finding::error(FindingKind::ParseMismatch, "column annotation was not parsed")
                    .detail(&annotation.expression),
            ));
        }

        let column_name = property.column_name();
        let Some(column) = self.column(column_name) else {
            self.report(context(
                Finding::error(FindingKind::SchemaLookupFailure, "column not found")
                    .column(column_name),
            ));
            return;
        };
        let context = |finding: Finding| context(finding).column(&column.name);

        let others: Vec<&str> = property
            .annotations
            .iter()
            .filter(|a| !matches!(a.kind, AnnotationKind::Column | AnnotationKind::Generated))
            .map(|a| a.kind.as_str())
            .collect();
        if !others.is_empty() {
            self.report(context(
                Finding::mistake(FindingKind::InvalidMapping, "column property has other annotations")
                    .detail(others),
            ));
        }

        if property.has(&AnnotationKind::Generated) && column.extra != "auto_increment" {
            self.report(context(
                Finding::error(FindingKind::InvalidMapping, "generated column is not auto_increment")
                    .detail(&column.extra),
            ));
        }

        let config: &'a CheckerConfig = self.config;
        let type_table = &config.type_table;
        let declared = property.declared_type.as_deref().unwrap_or_default();
        match type_table.allowed(declared) {
            Some(allowed) if !allowed.contains(&column.data_type) => self.report(context(
                Finding::mistake(
                    FindingKind::DriftMismatch,
                    format!(
                        "{declared} doesn't have the expected data type, found {} ({})",
                        column.data_type, column.column_type
                    ),
                )
                .detail(allowed),
            )),
            Some(_) => {}
            None => self.report(context(Finding::info(
                FindingKind::Note,
                format!("property type `{declared}` is not in the type table"),
            ))),
        }

        for param in annotation.parameters.iter().flatten() {
            let finding = match (param.name.as_str(), &param.value) {
                ("columnType", value) => {
                    let expected = match value.as_str() {
                        Some("simple-array") => "text",
                        Some(expected) => expected,
                        None => continue,
                    };
                    (column.data_type != expected).then(|| {
                        Finding::mistake(
                            FindingKind::DriftMismatch,
                            format!("expected type {expected} but has type {}", column.data_type),
                        )
                    })
                }
                ("nullable", ParamValue::Bool(nullable)) => {
                    (column.nullable != *nullable).then(|| {
                        Finding::mistake(
                            FindingKind::DriftMismatch,
                            format!(
                                "expected nullable {nullable} but is {}",
                                if column.nullable { "YES" } else { "NO" }
                            ),
                        )
                    })
                }
                ("nullable", value) => Some(Finding::error(
                    FindingKind::UnsupportedValue,
                    format!("unknown nullable value {value}"),
                )),
                ("length", ParamValue::Int(length)) => {
                    (column.max_length != Some(*length)).then(|| {
                        let found = match column.max_length {
                            Some(found) => format!("length {found}"),
                            None => "no length".to_owned(),
                        };
                        Finding::mistake(
                            FindingKind::DriftMismatch,
                            format!("expected length {length} but has {found}"),
                        )
                    })
                }
                ("length", value) => Some(Finding::error(
                    FindingKind::UnsupportedValue,
                    format!("unknown length value {value}"),
                )),
                ("type", ParamValue::ColumnTypes(allowed)) => {
                    (!allowed.contains(&column.column_type)).then(|| {
                        Finding::mistake(
                            FindingKind::DriftMismatch,
                            format!("column type mismatch, found {}", column.column_type),
                        )
                        .detail(allowed)
                    })
                }
                ("type", value) => Some(Finding::error(
                    FindingKind::UnsupportedValue,
                    format!("unknown column type parameter {value}"),
                )),
                ("unique", ParamValue::Bool(true)) => (!column.is_unique()).then(|| {
                    Finding::mistake(
                        FindingKind::DriftMismatch,
                        "property has the unique parameter but the column is not unique",
                    )
                }),
                ("unique" | "default" | "name", _) => None,
                (other, value) => Some(Finding::error(
                    FindingKind::UnrecognizedParameter,
                    format!("unknown column parameter {other}: {value}"),
                )),
            };
            if let Some(finding) = finding {
                self.report(context(finding));
            }
        }
    }
}
