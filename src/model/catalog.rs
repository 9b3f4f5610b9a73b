use super::EntityModel;
use crate::DriftErr;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// The persisted collection of entity records, in extraction order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityCatalog {
    entities: Vec<EntityModel>,
}

impl EntityCatalog {
    pub fn new(entities: Vec<EntityModel>) -> Self {
        Self { entities }
    }

    pub fn from_json(json: &str) -> Result<Self, DriftErr> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DriftErr> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialize the collection. Same catalog, same bytes.
    pub fn to_json(&self) -> Result<String, DriftErr> {
        let mut json = serde_json::to_string_pretty(&self.entities)?;
        json.push('\n');
        Ok(json)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DriftErr> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn entities(&self) -> &[EntityModel] {
        &self.entities
    }

    pub(crate) fn entities_mut(&mut self) -> &mut [EntityModel] {
        &mut self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&EntityModel> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Whether `name` is a mapped entity of this catalog, i.e. a plain `Entity()`
    pub fn is_mapped_entity(&self, name: &str) -> bool {
        self.entities
            .iter()
            .any(|e| e.name == name && e.is_plain_entity())
    }
}

impl FromIterator<EntityModel> for EntityCatalog {
    fn from_iter<T: IntoIterator<Item = EntityModel>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
