use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::GeseError;
use crate::resource::Validate;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesMetadata {
    #[serde(default)]
    pub n_markers: Option<u64>,
    #[serde(default)]
    pub n_genotypes: Option<u64>,
    #[serde(default)]
    pub n_traits: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    #[serde(rename = "X")]
    pub x: String,
    #[serde(rename = "Y")]
    pub y: String,
    #[serde(rename = "Z")]
    pub z: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SpeciesMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Index(BTreeMap<String, IndexEntry>);

impl Index {
    pub fn new(entries: BTreeMap<String, IndexEntry>) -> Self {
        Self(entries)
    }

    pub fn get(&self, species: &str) -> Option<&IndexEntry> {
        self.0.get(species)
    }

    pub fn contains(&self, species: &str) -> bool {
        self.0.contains_key(species)
    }

    pub fn species(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &IndexEntry)> {
        self.0.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Validate for Index {
    fn validate(&self) -> Result<(), GeseError> {
        for (species, entry) in &self.0 {
            for (key, url) in [("X", &entry.x), ("Y", &entry.y), ("Z", &entry.z)] {
                if url.trim().is_empty() {
                    return Err(GeseError::Parse(format!(
                        "index entry '{species}' has an empty {key} location"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasMap(BTreeMap<String, String>);

impl AliasMap {
    pub fn new(aliases: BTreeMap<String, String>) -> Self {
        Self(aliases)
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.0.get(alias).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Validate for AliasMap {}

impl FromIterator<(String, String)> for AliasMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
