mod common;

use assert_matches::assert_matches;

use easygese::benchmark::BenchmarkQuery;
use easygese::error::GeseError;
use easygese::store::{BenchmarkFile, Store};

use common::{BASE, MockFetcher, test_app};

const SUMMARY_UPPER: &str = "\
Species,Trait,Model,correlation_mean,RMSE_mean
bean,DF,GBLUP,0.61,1.2
bean,YLD,XGBoost,0.42,0.8
maize,DTA,GBLUP,0.55,1.0
";

const SUMMARY_LOWER: &str = "\
species,trait,model,correlation_mean,RMSE_mean
bean,DF,GBLUP,0.61,1.2
maize,DTA,GBLUP,0.55,1.0
";

const RAW: &str = "\
Species,Trait,Model,Split,correlation,RMSE
bean,DF,GBLUP,1,0.5,1.0
bean,DF,GBLUP,2,0.7,3.0
";

fn summary_url() -> String {
    format!("{BASE}results_summary.csv")
}

fn raw_url() -> String {
    format!("{BASE}results_raw.csv")
}

#[test]
fn species_filter_resolves_alias_with_capitalised_header() {
    let temp = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::default()
        .with_species()
        .with(&summary_url(), SUMMARY_UPPER);
    let app = test_app(&temp, fetcher);

    let table = app
        .load_benchmark_results(&BenchmarkQuery::new().species(["Beans"]))
        .unwrap();
    assert_eq!(table.len(), 2);
    assert!(table.column("Species").unwrap().iter().all(|s| *s == "bean"));
}

#[test]
fn species_filter_with_lowercase_header() {
    let temp = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::default()
        .with_species()
        .with(&summary_url(), SUMMARY_LOWER);
    let app = test_app(&temp, fetcher);

    let table = app
        .load_benchmark_results(&BenchmarkQuery::new().species(["bean"]))
        .unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.column("species").unwrap(), vec!["bean"]);
}

#[test]
fn trait_and_model_filters_are_exact() {
    let temp = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::default()
        .with_species()
        .with(&summary_url(), SUMMARY_UPPER);
    let app = test_app(&temp, fetcher);

    let table = app
        .load_benchmark_results(&BenchmarkQuery::new().models(["GBLUP"]).traits(["DF", "DTA"]))
        .unwrap();
    assert_eq!(table.len(), 2);

    let empty = app
        .load_benchmark_results(&BenchmarkQuery::new().models(["gblup"]))
        .unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.columns().len(), 5);
}

#[test]
fn unknown_species_filter_fails() {
    let temp = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::default()
        .with_species()
        .with(&summary_url(), SUMMARY_UPPER);
    let app = test_app(&temp, fetcher);

    assert_matches!(
        app.load_benchmark_results(&BenchmarkQuery::new().species(["potato"])),
        Err(GeseError::UnknownSpecies { .. })
    );
}

#[test]
fn one_failed_file_does_not_abort_the_other() {
    let temp = tempfile::tempdir().unwrap();
    let app = test_app(&temp, MockFetcher::default().with(&summary_url(), SUMMARY_UPPER));

    let dir = app.download_benchmark_data(false).unwrap();
    assert_eq!(dir, app.store().benchmark_dir());
    assert!(app.store().exists(&app.store().benchmark_path(BenchmarkFile::Summary)));
    assert!(!app.store().exists(&app.store().benchmark_path(BenchmarkFile::Raw)));
    assert_eq!(app.fetcher().calls_to(&raw_url()), 1);

    assert_matches!(
        app.load_benchmark_results(&BenchmarkQuery::new().summarize(false)),
        Err(GeseError::DataUnavailable { .. })
    );
}

#[test]
fn cached_files_are_reused_until_forced() {
    let temp = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::default()
        .with(&summary_url(), SUMMARY_UPPER)
        .with(&raw_url(), RAW);
    let app = test_app(&temp, fetcher);

    app.download_benchmark_data(false).unwrap();
    app.download_benchmark_data(false).unwrap();
    assert_eq!(app.fetcher().calls_to(&summary_url()), 1);

    app.load_benchmark_results(&BenchmarkQuery::new().download(true))
        .unwrap();
    assert_eq!(app.fetcher().calls_to(&summary_url()), 2);
    assert_eq!(app.fetcher().calls_to(&raw_url()), 2);
}

#[test]
fn raw_results_can_be_aggregated() {
    let temp = tempfile::tempdir().unwrap();
    let app = test_app(&temp, MockFetcher::default());
    Store::write_bytes_atomic(
        &app.store().benchmark_path(BenchmarkFile::Raw),
        RAW.as_bytes(),
    )
    .unwrap();

    let raw = app
        .load_benchmark_results(&BenchmarkQuery::new().summarize(false))
        .unwrap();
    assert_eq!(app.fetcher().total_calls(), 0);

    let summary = raw.summarize().unwrap();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary.numeric_column("correlation_mean").unwrap(), vec![0.6]);
}
