mod annotation;
mod catalog;
pub mod naming;

pub use annotation::*;
pub use catalog::*;

use serde::{Deserialize, Serialize};

/// A mapped class as read from the source model
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityModel {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<PropertyModel>,
    #[serde(
        default,
        alias = "decorators",
        deserialize_with = "annotation::deserialize_annotations"
    )]
    pub annotations: Vec<AnnotationModel>,
}

/// A property of a mapped class
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyModel {
    pub name: String,
    /// The declared type as written in the source, e.g. `string` or `Tagset[]`
    #[serde(
        rename = "type",
        alias = "declaredType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub declared_type: Option<String>,
    #[serde(
        default,
        alias = "decorators",
        deserialize_with = "annotation::deserialize_annotations"
    )]
    pub annotations: Vec<AnnotationModel>,
}

impl EntityModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            annotations: vec![AnnotationModel::new(AnnotationKind::Entity, "Entity()")],
        }
    }

    pub fn property(mut self, property: PropertyModel) -> Self {
        self.properties.push(property);
        self
    }

    pub fn table_name(&self) -> String {
        naming::table_name(&self.name)
    }

    pub fn find_property(&self, name: &str) -> Option<&PropertyModel> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// An entity whose only annotation is a bare `Entity()`
    pub fn is_plain_entity(&self) -> bool {
        matches!(self.annotations.as_slice(), [only] if only.is_plain(&AnnotationKind::Entity))
    }
}

impl PropertyModel {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: Some(declared_type.into()),
            annotations: Vec::new(),
        }
    }

    pub fn annotate(mut self, kind: impl Into<AnnotationKind>, expression: &str) -> Self {
        self.annotations.push(AnnotationModel::new(kind, expression));
        self
    }

    /// The first annotation of the given kind
    pub fn annotation(&self, kind: &AnnotationKind) -> Option<&AnnotationModel> {
        self.annotations.iter().find(|a| &a.kind == kind)
    }

    pub fn has(&self, kind: &AnnotationKind) -> bool {
        self.annotation(kind).is_some()
    }

    /// The column this property is stored in, honouring a `name` override
    pub fn column_name(&self) -> &str {
        self.annotation(&AnnotationKind::Column)
            .and_then(|column| column.param_value("name"))
            .and_then(ParamValue::as_str)
            .unwrap_or(&self.name)
    }
}
