use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::GeseError;

pub const SPECIES_COLUMN: &str = "species";
pub const TRAIT_COLUMN: &str = "trait";
pub const MODEL_COLUMN: &str = "model";

#[derive(Debug, Clone)]
pub struct BenchmarkQuery {
    pub species: Option<Vec<String>>,
    pub traits: Option<Vec<String>>,
    pub models: Option<Vec<String>>,
    pub summarize: bool,
    pub download: bool,
}

impl Default for BenchmarkQuery {
    fn default() -> Self {
        Self {
            species: None,
            traits: None,
            models: None,
            summarize: true,
            download: false,
        }
    }
}

impl BenchmarkQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn species<I, S>(mut self, species: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.species = Some(species.into_iter().map(Into::into).collect());
        self
    }

    pub fn traits<I, S>(mut self, traits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.traits = Some(traits.into_iter().map(Into::into).collect());
        self
    }

    pub fn models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = Some(models.into_iter().map(Into::into).collect());
        self
    }

    pub fn summarize(mut self, summarize: bool) -> Self {
        self.summarize = summarize;
        self
    }

    pub fn download(mut self, download: bool) -> Self {
        self.download = download;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ResultsTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, GeseError> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(GeseError::InvalidArgument(format!(
                "row {i} has {} cells, expected {}",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, GeseError> {
        let mut reader = csv::Reader::from_reader(bytes);
        let columns = reader
            .headers()
            .map_err(|err| GeseError::Parse(format!("reading CSV headers: {err}")))?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let rows = reader
            .records()
            .map(|record| {
                record
                    .map(|record| record.iter().map(str::to_string).collect::<Vec<_>>())
                    .map_err(|err| GeseError::Parse(err.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|col| col.trim().eq_ignore_ascii_case(name))
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let pos = self.find_column(name)?;
        Some(self.rows.iter().map(|row| row[pos].as_str()).collect())
    }

    pub fn numeric_column(&self, name: &str) -> Option<Vec<f64>> {
        let pos = self.find_column(name)?;
        Some(self.rows.iter().map(|row| parse_f64(&row[pos])).collect())
    }

    pub fn filter_in(self, column: &str, allowed: &[String]) -> Result<Self, GeseError> {
        let pos = self.find_column(column).ok_or_else(|| {
            GeseError::InvalidArgument(format!(
                "results have no '{column}' column (columns: {})",
                self.columns.join(", ")
            ))
        })?;
        let rows = self
            .rows
            .into_iter()
            .filter(|row| allowed.iter().any(|value| *value == row[pos]))
            .collect();
        Ok(Self {
            columns: self.columns,
            rows,
        })
    }

    pub fn summarize(&self) -> Result<ResultsTable, GeseError> {
        let key_columns = [SPECIES_COLUMN, TRAIT_COLUMN, MODEL_COLUMN]
            .into_iter()
            .map(|name| self.require_column(name))
            .collect::<Result<Vec<_>, _>>()?;
        let correlation = self.require_column("correlation")?;
        let rmse = self.require_column("rmse")?;

        let mut groups: BTreeMap<Vec<&str>, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
        for row in &self.rows {
            let key = key_columns.iter().map(|&pos| row[pos].as_str()).collect();
            let entry = groups.entry(key).or_default();
            entry.0.push(parse_f64(&row[correlation]));
            entry.1.push(parse_f64(&row[rmse]));
        }

        let mut columns = key_columns
            .iter()
            .map(|&pos| self.columns[pos].clone())
            .collect::<Vec<_>>();
        columns.extend(
            ["correlation_mean", "correlation_std", "RMSE_mean", "RMSE_std"].map(str::to_string),
        );

        let rows = groups
            .into_iter()
            .map(|(key, (corr, err))| {
                let mut row = key.into_iter().map(str::to_string).collect::<Vec<_>>();
                let (corr_mean, corr_std) = mean_std(&corr);
                let (err_mean, err_std) = mean_std(&err);
                row.extend([corr_mean, corr_std, err_mean, err_std].map(|v| v.to_string()));
                row
            })
            .collect();

        Ok(ResultsTable { columns, rows })
    }

    fn require_column(&self, name: &str) -> Result<usize, GeseError> {
        self.find_column(name).ok_or_else(|| {
            GeseError::InvalidArgument(format!("results have no '{name}' column"))
        })
    }
}

fn parse_f64(cell: &str) -> f64 {
    cell.trim().parse().unwrap_or(f64::NAN)
}

/// NaN samples are skipped; std uses n - 1 and is NaN below two samples.
fn mean_std(values: &[f64]) -> (f64, f64) {
    let values = values.iter().copied().filter(|v| !v.is_nan()).collect::<Vec<_>>();
    let n = values.len() as f64;
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, f64::NAN);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var.sqrt())
}
