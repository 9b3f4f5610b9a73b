//! Turns raw annotation expressions into typed parameter lists.
//!
//! Each [`AnnotationKind`] owns a small grammar: the argument forms it accepts,
//! tried from the simplest to the most general, and the rules for the keys of
//! its options record. Parsing never fails; anything the grammar does not
//! cover degrades to an absent parameter list plus a [`Diagnostic`].

mod grammar;
mod lexer;
mod options;

pub use options::BOOLEAN_COLUMN_TYPES;

use crate::{
    AnnotationKind, AnnotationModel, DriftReporter, EntityCatalog, Finding, FindingKind,
    LengthCatalog, ParamValue, Parameter, Severity,
};
use grammar::{Arg, Interpretation, Slot};
use tracing::{debug, instrument};

/// Something the parser noticed about one expression
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: FindingKind,
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn warning(kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn error(kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message: message.into(),
        }
    }

    pub fn into_finding(self) -> Finding {
        Finding::new(self.severity, self.kind, self.message)
    }
}

/// Outcome of parsing one expression
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedAnnotation {
    /// `None` when the expression was not recognized
    pub parameters: Option<Vec<Parameter>>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedAnnotation {
    fn unrecognized(diagnostic: Option<Diagnostic>) -> Self {
        Self {
            parameters: None,
            diagnostics: diagnostic.into_iter().collect(),
        }
    }

    pub fn count(&self, kind: FindingKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }
}

#[derive(Clone, Debug, Default)]
pub struct AnnotationParser {
    lengths: LengthCatalog,
}

impl AnnotationParser {
    pub fn new(lengths: LengthCatalog) -> Self {
        Self { lengths }
    }

    /// Parse one expression, logging what the grammar did not accept
    pub fn parse(&self, kind: &AnnotationKind, expression: &str) -> ParsedAnnotation {
        let parsed = self.parse_quiet(kind, expression);
        for diagnostic in &parsed.diagnostics {
            match diagnostic.severity {
                Severity::Error => {
                    tracing::error!(%kind, expression, kind_tag = %diagnostic.kind, "{}", diagnostic.message)
                }
                _ => {
                    tracing::warn!(%kind, expression, kind_tag = %diagnostic.kind, "{}", diagnostic.message)
                }
            }
        }
        parsed
    }

    /// Fill the parameters of every annotation in the catalog.
    ///
    /// Diagnostics are reported as findings carrying the entity and property
    /// they were found on.
    #[instrument(level = "debug", skip_all, fields(entities = catalog.len()))]
    pub fn enrich(&self, catalog: &mut EntityCatalog, reporter: &mut DriftReporter) {
        for entity in catalog.entities_mut() {
            for annotation in &mut entity.annotations {
                for finding in self.fill(annotation) {
                    reporter.report(finding.entity(&entity.name));
                }
            }
            for property in &mut entity.properties {
                for annotation in &mut property.annotations {
                    for finding in self.fill(annotation) {
                        reporter.report(finding.entity(&entity.name).property(&property.name));
                    }
                }
            }
        }
    }

    fn fill(&self, annotation: &mut AnnotationModel) -> Vec<Finding> {
        let parsed = self.parse_quiet(&annotation.kind, &annotation.expression);
        annotation.parameters = parsed.parameters;
        parsed
            .diagnostics
            .into_iter()
            .map(|d| {
                let expression = annotation.expression.clone();
                d.into_finding().detail(expression)
            })
            .collect()
    }

    fn parse_quiet(&self, kind: &AnnotationKind, expression: &str) -> ParsedAnnotation {
        let expression = expression.trim();
        let grammar = match grammar::interpretation(kind) {
            Interpretation::Parsed(grammar) => grammar,
            Interpretation::Marker => {
                return match grammar::parse_call(kind.as_str(), expression) {
                    Ok(args) if args.is_empty() => ParsedAnnotation {
                        parameters: Some(Vec::new()),
                        diagnostics: Vec::new(),
                    },
                    _ => {
                        debug!(%kind, expression, "not interpreted");
                        ParsedAnnotation::unrecognized(None)
                    }
                };
            }
            Interpretation::Unhandled => {
                return ParsedAnnotation::unrecognized(Some(Diagnostic::warning(
                    FindingKind::UnhandledAnnotation,
                    format!("annotation kind `{kind}` is not handled"),
                )));
            }
        };

        let args = match grammar::parse_call(kind.as_str(), expression) {
            Ok(args) => args,
            Err(reason) => {
                return ParsedAnnotation::unrecognized(Some(Diagnostic::warning(
                    FindingKind::ParseMismatch,
                    format!("`{expression}` does not parse: {reason}"),
                )));
            }
        };
        let Some(form) = grammar.select(&args) else {
            return ParsedAnnotation::unrecognized(Some(Diagnostic::warning(
                FindingKind::ParseMismatch,
                format!("`{expression}` matches no form of {kind}"),
            )));
        };

        let mut parameters = Vec::new();
        let mut diagnostics = Vec::new();
        for (slot, arg) in form.iter().zip(&args) {
            match (slot, arg) {
                (Slot::Literal, Arg::Literal(literal)) => parameters.push(Parameter::new(
                    grammar.literal,
                    ParamValue::Text((*literal).to_owned()),
                )),
                (Slot::Target, Arg::Target(target)) => parameters.push(Parameter::new(
                    "columnType",
                    ParamValue::Text((*target).to_owned()),
                )),
                (
                    Slot::Inverse,
                    Arg::Inverse {
                        receiver,
                        root,
                        property,
                    },
                ) => {
                    if receiver == root {
                        parameters.push(
                            Parameter::new("relation", ParamValue::Text((*property).to_owned()))
                                .with_type(*receiver),
                        );
                    } else {
                        diagnostics.push(Diagnostic::warning(
                            FindingKind::ParseMismatch,
                            format!("relation `{receiver} => {root}.{property}` reads another receiver"),
                        ));
                    }
                }
                (Slot::Record, Arg::Record(entries)) => options::read_record(
                    entries,
                    grammar.options,
                    &self.lengths,
                    &mut parameters,
                    &mut diagnostics,
                ),
                _ => {}
            }
        }

        debug!(%kind, expression, parameters = parameters.len(), "parsed");
        ParsedAnnotation {
            parameters: Some(parameters),
            diagnostics,
        }
    }
}
