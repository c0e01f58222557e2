use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{info, warn};

use crate::benchmark::{BenchmarkQuery, MODEL_COLUMN, ResultsTable, SPECIES_COLUMN, TRAIT_COLUMN};
use crate::config::Config;
use crate::error::GeseError;
use crate::fetch::RemoteFetcher;
use crate::index::{AliasMap, Index, IndexEntry, SpeciesMetadata};
use crate::resolve::resolve_species;
use crate::resource::CachedJsonResource;
use crate::store::{ALIASES_FILE, BenchmarkFile, INDEX_FILE, SpeciesFiles, Store};
use crate::table::{GenotypeTable, PhenotypeTable, SplitDefinition, Table};

#[derive(Debug, Clone)]
pub struct SpeciesDataset {
    pub species: String,
    pub genotypes: GenotypeTable,
    pub phenotypes: PhenotypeTable,
    pub splits: SplitDefinition,
    pub citation: Option<String>,
}

impl SpeciesDataset {
    pub fn into_parts(self) -> (GenotypeTable, PhenotypeTable, SplitDefinition) {
        (self.genotypes, self.phenotypes, self.splits)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeciesListing {
    pub species: String,
    pub metadata: SpeciesMetadata,
    pub citation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetSource {
    Local,
    Downloaded,
    Remote,
}

pub struct App<F: RemoteFetcher> {
    config: Config,
    store: Store,
    fetcher: F,
}

impl<F: RemoteFetcher> App<F> {
    pub fn new(config: Config, fetcher: F) -> Self {
        let store = Store::new(config.cache_dir.clone());
        Self {
            config,
            store,
            fetcher,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    fn index_resource(&self) -> CachedJsonResource {
        CachedJsonResource::new(&self.config.index_url, INDEX_FILE)
            .with_fallback(self.config.index_fallback.clone())
    }

    fn aliases_resource(&self) -> CachedJsonResource {
        CachedJsonResource::new(&self.config.aliases_url, ALIASES_FILE)
            .with_fallback(self.config.aliases_fallback.clone())
    }

    pub fn load_index(&self, force_refresh: bool) -> Result<Index, GeseError> {
        self.index_resource()
            .load(&self.store, &self.fetcher, force_refresh)
    }

    pub fn load_species_aliases(&self, force_refresh: bool) -> Result<AliasMap, GeseError> {
        self.aliases_resource()
            .load(&self.store, &self.fetcher, force_refresh)
    }

    pub fn list_species(&self) -> Result<Vec<SpeciesListing>, GeseError> {
        let index = self.load_index(false)?;
        Ok(index
            .entries()
            .map(|(species, entry)| SpeciesListing {
                species: species.to_string(),
                metadata: entry.metadata.clone().unwrap_or_default(),
                citation: entry.citation.clone(),
            })
            .collect())
    }

    pub fn resolve(&self, species: &str) -> Result<(String, IndexEntry), GeseError> {
        let index = self.load_index(false)?;
        let aliases = self.load_species_aliases(false)?;
        let canonical = resolve_species(species, &index.species(), &aliases)?;
        let entry = index
            .get(&canonical)
            .cloned()
            .ok_or_else(|| GeseError::UnknownSpecies {
                input: species.to_string(),
                available: index.species().into_iter().map(str::to_string).collect(),
            })?;
        Ok((canonical, entry))
    }

    pub fn download_data(
        &self,
        species: &str,
        output_dir: Option<&Utf8Path>,
    ) -> Result<Utf8PathBuf, GeseError> {
        let (canonical, entry) = self.resolve(species)?;
        let dir = output_dir
            .map(Utf8Path::to_path_buf)
            .unwrap_or_else(|| self.store.cache_root().to_path_buf());
        let files = SpeciesFiles::in_dir(&dir, &canonical);
        self.download_species_files(&canonical, &entry, &files)?;
        Ok(dir)
    }

    pub fn load_species(
        &self,
        species: &str,
        download: bool,
        download_dir: Option<&Utf8Path>,
    ) -> Result<SpeciesDataset, GeseError> {
        let (canonical, entry) = self.resolve(species)?;
        let files = self.store.species_files(download_dir, &canonical);

        let (genotypes, phenotypes, splits, source) = if files.all_exist() {
            let (x, y, z) = parse_local(&files)?;
            (x, y, z, DatasetSource::Local)
        } else if download {
            self.download_species_files(&canonical, &entry, &files)?;
            let (x, y, z) = parse_local(&files)?;
            (x, y, z, DatasetSource::Downloaded)
        } else {
            match self.read_remote(&entry) {
                Ok((x, y, z)) => (x, y, z, DatasetSource::Remote),
                Err(err) => {
                    let missing = files
                        .first_missing()
                        .unwrap_or(files.genotypes.as_path())
                        .to_string();
                    warn!(
                        species = %canonical,
                        "local file {missing} not found and remote read failed: {err}"
                    );
                    return Err(GeseError::DataUnavailable {
                        species: canonical,
                        path: missing,
                        reason: err.to_string(),
                    });
                }
            }
        };
        info!(
            species = %canonical,
            ?source,
            genotypes = genotypes.shape().0,
            markers = genotypes.shape().1,
            "loaded dataset"
        );

        if let Some(citation) = &entry.citation {
            info!("Citation for {canonical} dataset: {citation}");
        }

        Ok(SpeciesDataset {
            species: canonical,
            genotypes,
            phenotypes,
            splits,
            citation: entry.citation,
        })
    }

    fn download_species_files(
        &self,
        species: &str,
        entry: &IndexEntry,
        files: &SpeciesFiles,
    ) -> Result<(), GeseError> {
        info!("downloading {species} data files");
        for (label, url, path) in [
            ("X (genotype)", &entry.x, &files.genotypes),
            ("Y (phenotype)", &entry.y, &files.phenotypes),
            ("Z (CV splits)", &entry.z, &files.splits),
        ] {
            info!("downloading {label} data");
            let bytes = self.fetcher.fetch_bytes(url)?;
            Store::write_bytes_atomic(path, &bytes)?;
        }
        Ok(())
    }

    fn read_remote(
        &self,
        entry: &IndexEntry,
    ) -> Result<(GenotypeTable, PhenotypeTable, SplitDefinition), GeseError> {
        let x = Table::from_csv_bytes(&self.fetcher.fetch_bytes(&entry.x)?)?;
        let y = Table::from_csv_bytes(&self.fetcher.fetch_bytes(&entry.y)?)?;
        let z = SplitDefinition::from_json_bytes(&self.fetcher.fetch_bytes(&entry.z)?)?;
        Ok((GenotypeTable::new(x), PhenotypeTable::new(y), z))
    }

    pub fn download_benchmark_data(&self, force: bool) -> Result<Utf8PathBuf, GeseError> {
        let base_url = self.config.remote_base_url();
        for file in BenchmarkFile::ALL {
            let path = self.store.benchmark_path(file);
            if self.store.exists(&path) && !force {
                info!("using cached {}", file.file_name());
                continue;
            }
            info!("downloading {}", file.file_name());
            let url = format!("{base_url}{}", file.file_name());
            let result = self
                .fetcher
                .fetch_bytes(&url)
                .and_then(|bytes| Store::write_bytes_atomic(&path, &bytes));
            if let Err(err) = result {
                warn!("error downloading {}: {err}", file.file_name());
            }
        }
        Ok(self.store.benchmark_dir())
    }

    pub fn load_benchmark_results(&self, query: &BenchmarkQuery) -> Result<ResultsTable, GeseError> {
        let file = if query.summarize {
            BenchmarkFile::Summary
        } else {
            BenchmarkFile::Raw
        };
        let path = self.store.benchmark_path(file);
        if query.download || !self.store.exists(&path) {
            self.download_benchmark_data(query.download)?;
        }
        if !self.store.exists(&path) {
            return Err(GeseError::DataUnavailable {
                species: "benchmark results".to_string(),
                path: path.to_string(),
                reason: format!("{} could not be downloaded", file.file_name()),
            });
        }

        let mut table = ResultsTable::from_csv_bytes(&Store::read(&path)?)?;

        if let Some(species) = &query.species {
            let canonical = self.resolve_many(species)?;
            table = table.filter_in(SPECIES_COLUMN, &canonical)?;
        }
        if let Some(traits) = &query.traits {
            table = table.filter_in(TRAIT_COLUMN, traits)?;
        }
        if let Some(models) = &query.models {
            table = table.filter_in(MODEL_COLUMN, models)?;
        }

        if table.is_empty() {
            warn!("no benchmark results match the given filters");
        }
        Ok(table)
    }

    fn resolve_many(&self, species: &[String]) -> Result<Vec<String>, GeseError> {
        let index = self.load_index(false)?;
        let aliases = self.load_species_aliases(false)?;
        let names = index.species();
        species
            .iter()
            .map(|name| resolve_species(name, &names, &aliases))
            .collect()
    }
}

fn parse_local(
    files: &SpeciesFiles,
) -> Result<(GenotypeTable, PhenotypeTable, SplitDefinition), GeseError> {
    Ok((
        GenotypeTable::new(Table::from_csv_path(&files.genotypes)?),
        PhenotypeTable::new(Table::from_csv_path(&files.phenotypes)?),
        SplitDefinition::from_json_path(&files.splits)?,
    ))
}
