use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::Builder;

use crate::error::GeseError;

pub const INDEX_FILE: &str = "index.json";
pub const ALIASES_FILE: &str = "species_aliases.json";
pub const BENCHMARK_DIR: &str = "benchmarks";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchmarkFile {
    Raw,
    Summary,
}

impl BenchmarkFile {
    pub const ALL: [BenchmarkFile; 2] = [BenchmarkFile::Raw, BenchmarkFile::Summary];

    pub fn file_name(self) -> &'static str {
        match self {
            BenchmarkFile::Raw => "results_raw.csv",
            BenchmarkFile::Summary => "results_summary.csv",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesFiles {
    pub genotypes: Utf8PathBuf,
    pub phenotypes: Utf8PathBuf,
    pub splits: Utf8PathBuf,
}

impl SpeciesFiles {
    pub fn in_dir(dir: &Utf8Path, species: &str) -> Self {
        Self {
            genotypes: dir.join(format!("{species}X.csv")),
            phenotypes: dir.join(format!("{species}Y.csv")),
            splits: dir.join(format!("{species}Z.json")),
        }
    }

    pub fn all_exist(&self) -> bool {
        self.genotypes.as_std_path().is_file()
            && self.phenotypes.as_std_path().is_file()
            && self.splits.as_std_path().is_file()
    }

    pub fn first_missing(&self) -> Option<&Utf8Path> {
        [&self.genotypes, &self.phenotypes, &self.splits]
            .into_iter()
            .find(|path| !path.as_std_path().is_file())
            .map(|path| path.as_path())
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    cache_root: Utf8PathBuf,
}

impl Store {
    pub fn new(cache_root: Utf8PathBuf) -> Self {
        Self { cache_root }
    }

    pub fn cache_root(&self) -> &Utf8Path {
        &self.cache_root
    }

    pub fn path_for(&self, name: &str) -> Utf8PathBuf {
        self.cache_root.join(name)
    }

    pub fn index_path(&self) -> Utf8PathBuf {
        self.path_for(INDEX_FILE)
    }

    pub fn aliases_path(&self) -> Utf8PathBuf {
        self.path_for(ALIASES_FILE)
    }

    pub fn benchmark_dir(&self) -> Utf8PathBuf {
        self.path_for(BENCHMARK_DIR)
    }

    pub fn benchmark_path(&self, file: BenchmarkFile) -> Utf8PathBuf {
        self.benchmark_dir().join(file.file_name())
    }

    pub fn species_files(&self, dir: Option<&Utf8Path>, species: &str) -> SpeciesFiles {
        SpeciesFiles::in_dir(dir.unwrap_or(&self.cache_root), species)
    }

    pub fn exists(&self, path: &Utf8Path) -> bool {
        path.as_std_path().is_file()
    }

    pub fn read(path: &Utf8Path) -> Result<Vec<u8>, GeseError> {
        fs::read(path.as_std_path())
            .map_err(|err| GeseError::Filesystem(format!("read {path}: {err}")))
    }

    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), GeseError> {
        let parent = path
            .parent()
            .ok_or_else(|| GeseError::Filesystem("invalid destination path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| GeseError::Filesystem(err.to_string()))?;
        let mut temp = Builder::new()
            .prefix(".easygese")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| GeseError::Filesystem(err.to_string()))?;
        temp.write_all(content)
            .map_err(|err| GeseError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| GeseError::Filesystem(err.to_string()))?;
        Ok(())
    }
}
