use std::io::Read;
use std::ops::Deref;

use camino::Utf8Path;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::GeseError;
use crate::store::Store;

pub const SPLITS_TAG_KEY: &str = "_is_easygese_Z";

pub const GENOTYPE_INDEX: &str = "Genotype";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Genotype,
    Phenotype,
    Splits,
}

impl DatasetKind {
    pub fn letter(self) -> char {
        match self {
            DatasetKind::Genotype => 'X',
            DatasetKind::Phenotype => 'Y',
            DatasetKind::Splits => 'Z',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    index_name: String,
    row_labels: Vec<String>,
    columns: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl Table {
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, GeseError> {
        Self::from_reader(bytes)
    }

    pub fn from_csv_path(path: &Utf8Path) -> Result<Self, GeseError> {
        let bytes = Store::read(path)?;
        Self::from_reader(bytes.as_slice())
    }

    fn from_reader<R: Read>(reader: R) -> Result<Self, GeseError> {
        let mut reader = csv::ReaderBuilder::new().flexible(false).from_reader(reader);
        let headers = reader
            .headers()
            .map_err(|err| GeseError::Parse(format!("reading CSV headers: {err}")))?
            .clone();
        let mut header_iter = headers.iter();
        let index_name = header_iter
            .next()
            .ok_or_else(|| GeseError::Parse("CSV has no header row".to_string()))?
            .to_string();
        let columns = header_iter.map(str::to_string).collect::<Vec<_>>();

        let mut row_labels = Vec::new();
        let mut values = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|err| GeseError::Parse(err.to_string()))?;
            let mut cells = record.iter();
            let label = cells.next().unwrap_or_default().to_string();
            let row = cells
                .enumerate()
                .map(|(j, cell)| {
                    parse_cell(cell).ok_or_else(|| {
                        GeseError::Parse(format!(
                            "row {} ({label}), column '{}': not a number: {cell:?}",
                            i + 1,
                            columns[j]
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            row_labels.push(label);
            values.push(row);
        }

        Ok(Self {
            index_name,
            row_labels,
            columns,
            values,
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.row_labels.len(), self.columns.len())
    }

    pub fn row(&self, label: &str) -> Option<&[f64]> {
        let pos = self.row_labels.iter().position(|row| row == label)?;
        Some(&self.values[pos])
    }

    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let pos = self.columns.iter().position(|col| col == name)?;
        Some(self.values.iter().map(|row| row[pos]).collect())
    }

    pub fn value(&self, row: &str, column: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.row(row).map(|values| values[col])
    }
}

fn parse_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || matches!(cell, "NA" | "NaN" | "nan" | "null") {
        return Some(f64::NAN);
    }
    cell.parse().ok()
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenotypeTable(Table);

#[derive(Debug, Clone, PartialEq)]
pub struct PhenotypeTable(Table);

impl GenotypeTable {
    pub fn new(table: Table) -> Self {
        Self(table)
    }

    pub fn kind(&self) -> DatasetKind {
        DatasetKind::Genotype
    }

    pub fn into_inner(self) -> Table {
        self.0
    }
}

impl PhenotypeTable {
    pub fn new(table: Table) -> Self {
        Self(table)
    }

    pub fn kind(&self) -> DatasetKind {
        DatasetKind::Phenotype
    }

    pub fn traits(&self) -> Vec<String> {
        self.0.columns.clone()
    }

    pub fn into_inner(self) -> Table {
        self.0
    }
}

impl Deref for GenotypeTable {
    type Target = Table;

    fn deref(&self) -> &Table {
        &self.0
    }
}

impl Deref for PhenotypeTable {
    type Target = Table;

    fn deref(&self) -> &Table {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
struct GenotypeSplits {
    genotype: String,
    memberships: Vec<(String, i64)>,
}

#[derive(Debug, Clone, PartialEq)]
struct TraitSplits {
    name: String,
    genotypes: Vec<GenotypeSplits>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitDefinition {
    traits: Vec<TraitSplits>,
}

impl SplitDefinition {
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, GeseError> {
        let root: Map<String, Value> =
            serde_json::from_slice(bytes).map_err(|err| GeseError::Parse(err.to_string()))?;
        Self::from_map(root)
    }

    pub fn from_json_path(path: &Utf8Path) -> Result<Self, GeseError> {
        let bytes = Store::read(path)?;
        Self::from_json_bytes(&bytes)
    }

    fn from_map(root: Map<String, Value>) -> Result<Self, GeseError> {
        let mut traits = Vec::new();
        for (name, value) in root {
            if is_internal_key(&name) {
                continue;
            }
            let genotypes = as_object(&value, &name)?
                .iter()
                .map(|(genotype, labels)| -> Result<GenotypeSplits, GeseError> {
                    let memberships = as_object(labels, genotype)?
                        .iter()
                        .map(|(label, flag)| {
                            membership(flag)
                                .map(|flag| (label.clone(), flag))
                                .ok_or_else(|| {
                                    GeseError::Parse(format!(
                                        "trait '{name}', genotype '{genotype}', split '{label}': expected an integer"
                                    ))
                                })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(GenotypeSplits {
                        genotype: genotype.clone(),
                        memberships,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            traits.push(TraitSplits { name, genotypes });
        }
        Ok(Self { traits })
    }

    pub fn kind(&self) -> DatasetKind {
        DatasetKind::Splits
    }

    pub fn traits(&self) -> Vec<String> {
        self.traits.iter().map(|t| t.name.clone()).collect()
    }

    pub fn cv_indices(&self, trait_name: &str) -> Result<CvTable, GeseError> {
        let splits = self
            .traits
            .iter()
            .find(|t| t.name == trait_name)
            .ok_or_else(|| GeseError::UnknownTrait {
                trait_name: trait_name.to_string(),
                available: self.traits(),
            })?;

        let mut labels: Vec<String> = Vec::new();
        for genotype in &splits.genotypes {
            for (label, _) in &genotype.memberships {
                if !labels.contains(label) {
                    labels.push(label.clone());
                }
            }
        }

        let values = splits
            .genotypes
            .iter()
            .map(|genotype| {
                labels
                    .iter()
                    .map(|label| {
                        genotype
                            .memberships
                            .iter()
                            .find(|(l, _)| l == label)
                            .map(|(_, flag)| *flag)
                    })
                    .collect()
            })
            .collect();

        Ok(CvTable {
            index_name: GENOTYPE_INDEX.to_string(),
            genotypes: splits.genotypes.iter().map(|g| g.genotype.clone()).collect(),
            labels,
            values,
        })
    }
}

// Covers SPLITS_TAG_KEY and any other underscore-prefixed bookkeeping key.
fn is_internal_key(key: &str) -> bool {
    key.starts_with('_')
}

fn as_object<'a>(value: &'a Value, context: &str) -> Result<&'a Map<String, Value>, GeseError> {
    value
        .as_object()
        .ok_or_else(|| GeseError::Parse(format!("'{context}' is not a JSON object")))
}

// Integral floats such as 1.0 are accepted; booleans and out-of-range floats are not.
fn membership(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CvTable {
    pub index_name: String,
    pub genotypes: Vec<String>,
    pub labels: Vec<String>,
    pub values: Vec<Vec<Option<i64>>>,
}

impl CvTable {
    pub fn shape(&self) -> (usize, usize) {
        (self.genotypes.len(), self.labels.len())
    }

    pub fn get(&self, genotype: &str, label: &str) -> Option<i64> {
        let row = self.genotypes.iter().position(|g| g == genotype)?;
        let col = self.labels.iter().position(|l| l == label)?;
        self.values[row][col]
    }

    pub fn members(&self, label: &str) -> Vec<&str> {
        let Some(col) = self.labels.iter().position(|l| l == label) else {
            return Vec::new();
        };
        self.genotypes
            .iter()
            .zip(&self.values)
            .filter(|(_, row)| row[col] == Some(1))
            .map(|(genotype, _)| genotype.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum DatasetRef<'a> {
    Genotype(&'a GenotypeTable),
    Phenotype(&'a PhenotypeTable),
    Splits(&'a SplitDefinition),
}

impl DatasetRef<'_> {
    pub fn kind(&self) -> DatasetKind {
        match self {
            DatasetRef::Genotype(_) => DatasetKind::Genotype,
            DatasetRef::Phenotype(_) => DatasetKind::Phenotype,
            DatasetRef::Splits(_) => DatasetKind::Splits,
        }
    }
}

impl<'a> From<&'a GenotypeTable> for DatasetRef<'a> {
    fn from(value: &'a GenotypeTable) -> Self {
        DatasetRef::Genotype(value)
    }
}

impl<'a> From<&'a PhenotypeTable> for DatasetRef<'a> {
    fn from(value: &'a PhenotypeTable) -> Self {
        DatasetRef::Phenotype(value)
    }
}

impl<'a> From<&'a SplitDefinition> for DatasetRef<'a> {
    fn from(value: &'a SplitDefinition) -> Self {
        DatasetRef::Splits(value)
    }
}

pub fn list_traits<'a>(obj: impl Into<DatasetRef<'a>>) -> Result<Vec<String>, GeseError> {
    match obj.into() {
        DatasetRef::Splits(z) => Ok(z.traits()),
        DatasetRef::Phenotype(y) => Ok(y.traits()),
        other => Err(GeseError::InvalidArgument(format!(
            "expected a phenotype table (Y) or split definition (Z), got {:?} ({})",
            other.kind(),
            other.kind().letter()
        ))),
    }
}

pub fn get_cv_indices<'a>(
    obj: impl Into<DatasetRef<'a>>,
    trait_name: &str,
) -> Result<CvTable, GeseError> {
    match obj.into() {
        DatasetRef::Splits(z) => z.cv_indices(trait_name),
        other => Err(GeseError::InvalidArgument(format!(
            "CV indices need a split definition (Z), got {:?} ({})",
            other.kind(),
            other.kind().letter()
        ))),
    }
}
