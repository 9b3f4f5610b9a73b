use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

/// The kind tag of a declarative mapping annotation.
///
/// The set is closed: anything the extractor emits that is not one of the
/// known kinds is kept as [`AnnotationKind::Other`] so it still round-trips.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnnotationKind {
    Entity,
    Column,
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
    JoinTable,
    JoinColumn,
    CreateDateColumn,
    UpdateDateColumn,
    VersionColumn,
    InputType,
    ObjectType,
    Scalar,
    PrimaryGeneratedColumn,
    Generated,
    Other(String),
}

impl AnnotationKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Entity => "Entity",
            Self::Column => "Column",
            Self::OneToOne => "OneToOne",
            Self::ManyToOne => "ManyToOne",
            Self::OneToMany => "OneToMany",
            Self::ManyToMany => "ManyToMany",
            Self::JoinTable => "JoinTable",
            Self::JoinColumn => "JoinColumn",
            Self::CreateDateColumn => "CreateDateColumn",
            Self::UpdateDateColumn => "UpdateDateColumn",
            Self::VersionColumn => "VersionColumn",
            Self::InputType => "InputType",
            Self::ObjectType => "ObjectType",
            Self::Scalar => "Scalar",
            Self::PrimaryGeneratedColumn => "PrimaryGeneratedColumn",
            Self::Generated => "Generated",
            Self::Other(name) => name,
        }
    }

    /// Relationship kinds, the ones reconciled against foreign-key constraints
    pub fn is_relation(&self) -> bool {
        matches!(
            self,
            Self::OneToOne | Self::ManyToOne | Self::OneToMany | Self::ManyToMany
        )
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnotationKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Entity" => Self::Entity,
            "Column" => Self::Column,
            "OneToOne" => Self::OneToOne,
            "ManyToOne" => Self::ManyToOne,
            "OneToMany" => Self::OneToMany,
            "ManyToMany" => Self::ManyToMany,
            "JoinTable" => Self::JoinTable,
            "JoinColumn" => Self::JoinColumn,
            "CreateDateColumn" => Self::CreateDateColumn,
            "UpdateDateColumn" => Self::UpdateDateColumn,
            "VersionColumn" => Self::VersionColumn,
            "InputType" => Self::InputType,
            "ObjectType" => Self::ObjectType,
            "Scalar" => Self::Scalar,
            "PrimaryGeneratedColumn" => Self::PrimaryGeneratedColumn,
            "Generated" => Self::Generated,
            other => Self::Other(other.to_owned()),
        })
    }
}

impl From<String> for AnnotationKind {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<&str> for AnnotationKind {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

impl From<AnnotationKind> for String {
    fn from(kind: AnnotationKind) -> Self {
        kind.as_str().to_owned()
    }
}

/// A typed parameter value produced by the annotation parser
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamValue {
    Bool(bool),
    Int(u64),
    /// A quoted string literal, unquoted
    Text(String),
    /// An expression kept verbatim because it has no typed reading
    Token(String),
    /// A set of acceptable `column_type` strings
    ColumnTypes(Vec<String>),
}

impl ParamValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<u64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The string content of a text literal or a verbatim token
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Token(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => write!(f, "'{s}'"),
            Self::Token(s) => write!(f, "{s}"),
            Self::ColumnTypes(types) => write!(f, "[{}]", types.join(", ")),
        }
    }
}

/// One named parameter of an annotation.
///
/// `ty` carries the secondary reading some parameters have, e.g. the
/// receiver name of an inverse-side `relation`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: ParamValue,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: ParamValue) -> Self {
        Self {
            name: name.into(),
            value,
            ty: None,
        }
    }

    pub fn with_type(mut self, ty: impl Into<String>) -> Self {
        self.ty = Some(ty.into());
        self
    }
}

/// A declarative mapping annotation attached to an entity or a property
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationModel {
    #[serde(alias = "name")]
    pub kind: AnnotationKind,
    #[serde(alias = "rawValue", default)]
    pub expression: String,
    /// Filled by the parser; `None` when the expression was not recognized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
}

impl AnnotationModel {
    pub fn new(kind: impl Into<AnnotationKind>, expression: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            expression: expression.into(),
            parameters: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn param(&self, name: &str) -> Option<&Parameter> {
        self.parameters
            .as_ref()
            .and_then(|params| params.iter().find(|p| p.name == name))
    }

    pub fn param_value(&self, name: &str) -> Option<&ParamValue> {
        self.param(name).map(|p| &p.value)
    }

    /// `true` for the bare `Kind()` form of the given kind
    pub fn is_plain(&self, kind: &AnnotationKind) -> bool {
        if &self.kind != kind {
            return false;
        }
        let expression = self.expression.trim();
        expression
            .strip_prefix(kind.as_str())
            .is_some_and(|rest| rest == "()")
    }
}

/// Extractor output may hold `null` in place of an annotation; drop those.
pub(crate) fn deserialize_annotations<'de, D>(
    deserializer: D,
) -> Result<Vec<AnnotationModel>, D::Error>
where
    D: Deserializer<'de>,
{
    let annotations: Option<Vec<Option<AnnotationModel>>> = Option::deserialize(deserializer)?;
    Ok(annotations.into_iter().flatten().flatten().collect())
}
