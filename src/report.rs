//! Findings and the append-only sink they are reported to.

use crate::DriftErr;
use serde::{Deserialize, Serialize};
use std::{fmt, io::Write};

/// How serious a finding is. None of them stops the pass.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    /// Progress notes and low-severity observations
    Info,
    /// Something looks off but may be intentional
    Warning,
    /// The checker's own assumptions do not hold, e.g. an unparseable
    /// annotation or an ambiguous constraint
    Error,
    /// Actual drift between the declared mapping and the live schema
    Mistake,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FindingKind {
    /// An annotation expression matched none of the grammars of its kind
    ParseMismatch,
    /// An options record holds a key its kind does not know
    UnrecognizedParameter,
    /// A symbolic length is missing from the length-class catalog
    UnresolvedLength,
    /// A recognized parameter holds a value the checker cannot interpret
    UnsupportedValue,
    /// An annotation kind the parser has no grammar for
    UnhandledAnnotation,
    /// An expected table, column or target entity is absent
    SchemaLookupFailure,
    /// The schema shape differs from the declared mapping
    DriftMismatch,
    /// More than one constraint matches a relationship
    AmbiguousConstraint,
    /// The annotations on an entity or property are not laid out as expected
    InvalidMapping,
    /// A table or constraint no entity accounted for
    OrphanSchemaObject,
    /// A relationship that can only be verified by hand
    ManualReview,
    /// A tolerated difference worth knowing about
    Note,
}

/// One discovered fact about the mapping and the schema
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub kind: FindingKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl Finding {
    pub fn new(severity: Severity, kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            entity: None,
            table: None,
            property: None,
            column: None,
            message: message.into(),
            detail: None,
        }
    }

    pub fn info(kind: FindingKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, kind, message)
    }

    pub fn warning(kind: FindingKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, kind, message)
    }

    pub fn error(kind: FindingKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, kind, message)
    }

    pub fn mistake(kind: FindingKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Mistake, kind, message)
    }

    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn detail(mut self, detail: impl Serialize) -> Self {
        self.detail = serde_json::to_value(detail).ok();
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.kind)?;
        match (&self.entity, &self.property) {
            (Some(entity), Some(property)) => write!(f, " {entity}.{property}")?,
            (Some(entity), None) => write!(f, " {entity}")?,
            (None, Some(property)) => write!(f, " .{property}")?,
            (None, None) => {}
        }
        if let Some(table) = &self.table {
            write!(f, " ({table}")?;
            if let Some(column) = &self.column {
                write!(f, ".{column}")?;
            }
            write!(f, ")")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, " {detail}")?;
        }
        Ok(())
    }
}

/// Counts per severity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub info: usize,
    pub warning: usize,
    pub error: usize,
    pub mistake: usize,
}

/// Append-only sink of findings, kept in discovery order.
///
/// Every reported finding is also emitted as a `tracing` event.
#[derive(Debug, Default)]
pub struct DriftReporter {
    findings: Vec<Finding>,
}

impl DriftReporter {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn report(&mut self, finding: Finding) {
        emit(&finding);
        self.findings.push(finding);
    }

    pub fn extend<I>(&mut self, findings: I)
    where
        I: IntoIterator<Item = Finding>,
    {
        for finding in findings {
            self.report(finding);
        }
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }

    pub fn of_kind(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.kind == kind)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    pub fn summary(&self) -> Summary {
        Summary {
            info: self.count(Severity::Info),
            warning: self.count(Severity::Warning),
            error: self.count(Severity::Error),
            mistake: self.count(Severity::Mistake),
        }
    }

    /// Write one JSON record per finding, newline delimited
    pub fn write_ndjson<W: Write>(&self, mut writer: W) -> Result<(), DriftErr> {
        for finding in &self.findings {
            serde_json::to_writer(&mut writer, finding)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn emit(finding: &Finding) {
    match finding.severity {
        Severity::Info => tracing::info!(kind = %finding.kind, "{finding}"),
        Severity::Warning => tracing::warn!(kind = %finding.kind, "{finding}"),
        Severity::Error => tracing::error!(kind = %finding.kind, "{finding}"),
        Severity::Mistake => tracing::warn!(kind = %finding.kind, mistake = true, "{finding}"),
    }
}
