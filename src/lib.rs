pub mod app;
pub mod benchmark;
pub mod config;
pub mod error;
pub mod fetch;
pub mod index;
pub mod output;
pub mod resolve;
pub mod resource;
pub mod store;
pub mod table;

pub use app::{App, SpeciesDataset};
pub use benchmark::{BenchmarkQuery, ResultsTable};
pub use config::{Config, ConfigLoader};
pub use error::GeseError;
pub use fetch::{HttpFetcher, RemoteFetcher};
pub use table::{
    CvTable, DatasetKind, DatasetRef, GenotypeTable, PhenotypeTable, SplitDefinition,
    get_cv_indices, list_traits,
};
