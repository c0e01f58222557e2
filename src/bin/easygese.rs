use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::IntoDiagnostic;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use easygese::app::App;
use easygese::benchmark::BenchmarkQuery;
use easygese::config::ConfigLoader;
use easygese::error::GeseError;
use easygese::fetch::HttpFetcher;
use easygese::output::{JsonOutput, TableOutput};
use easygese::table::{get_cv_indices, list_traits};

#[derive(Parser)]
#[command(name = "easygese")]
#[command(about = "Fetch EasyGeSe genomic prediction datasets and benchmark results")]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "Path to an easygese.json config file")]
    config: Option<String>,

    #[arg(long, global = true, help = "Override the cache directory")]
    cache_dir: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "List available species with marker/genotype/trait counts")]
    Species(RefreshArgs),
    #[command(about = "Print the dataset index")]
    Index(RefreshArgs),
    #[command(about = "Download a species' X/Y/Z files for offline use")]
    Download(DownloadArgs),
    #[command(about = "Load a species and print a summary")]
    Load(LoadArgs),
    #[command(about = "List the traits of a species")]
    Traits(TraitsArgs),
    #[command(about = "Print CV split membership for one trait")]
    Cv(CvArgs),
    #[command(about = "Load (and filter) benchmark results")]
    Benchmarks(BenchmarkArgs),
    #[command(about = "Download benchmark result files into the cache")]
    FetchBenchmarks(FetchBenchmarksArgs),
}

#[derive(Args)]
struct RefreshArgs {
    #[arg(long)]
    refresh: bool,
}

#[derive(Args)]
struct DownloadArgs {
    species: String,

    #[arg(long)]
    dir: Option<Utf8PathBuf>,
}

#[derive(Args)]
struct LoadArgs {
    species: String,

    #[arg(long)]
    download: bool,

    #[arg(long)]
    dir: Option<Utf8PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum TraitSource {
    Y,
    Z,
}

#[derive(Args)]
struct TraitsArgs {
    species: String,

    #[arg(long, value_enum, default_value = "z")]
    from: TraitSource,
}

#[derive(Args)]
struct CvArgs {
    species: String,
    #[arg(value_name = "TRAIT")]
    trait_name: String,
}

#[derive(Args)]
struct BenchmarkArgs {
    #[arg(long = "species")]
    species: Vec<String>,

    #[arg(long = "trait")]
    traits: Vec<String>,

    #[arg(long = "model")]
    models: Vec<String>,

    #[arg(long, help = "Use per-split raw results instead of the published summary")]
    raw: bool,

    #[arg(
        long,
        requires = "raw",
        help = "Aggregate the selected raw results by species, trait and model"
    )]
    summarize_raw: bool,

    #[arg(long)]
    download: bool,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct FetchBenchmarksArgs {
    #[arg(long)]
    force: bool,
}

#[derive(Serialize)]
struct LoadSummary {
    species: String,
    genotypes: usize,
    markers: usize,
    phenotyped: usize,
    traits: Vec<String>,
    citation: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<GeseError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &GeseError) -> u8 {
    match error {
        GeseError::UnknownSpecies { .. }
        | GeseError::UnknownTrait { .. }
        | GeseError::DataUnavailable { .. } => 2,
        GeseError::Network(_)
        | GeseError::NetworkStatus { .. }
        | GeseError::IndexUnavailable { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("easygese=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ConfigLoader::resolve(cli.config.as_deref())?;
    if let Some(dir) = cli.cache_dir {
        config.cache_dir = dir;
    }
    let fetcher = HttpFetcher::new(config.timeout)?;
    let app = App::new(config, fetcher);

    match cli.command {
        Command::Species(args) => {
            if args.refresh {
                app.load_index(true)?;
            }
            let listing = app.list_species()?;
            TableOutput::print_species(&listing).into_diagnostic()
        }
        Command::Index(args) => {
            let index = app.load_index(args.refresh)?;
            JsonOutput::print(&index).into_diagnostic()
        }
        Command::Download(args) => {
            let dir = app.download_data(&args.species, args.dir.as_deref())?;
            println!("{dir}");
            Ok(())
        }
        Command::Load(args) => {
            let dataset = app.load_species(&args.species, args.download, args.dir.as_deref())?;
            let (genotypes, markers) = dataset.genotypes.shape();
            let summary = LoadSummary {
                species: dataset.species.clone(),
                genotypes,
                markers,
                phenotyped: dataset.phenotypes.shape().0,
                traits: list_traits(&dataset.splits)?,
                citation: dataset.citation.clone(),
            };
            JsonOutput::print(&summary).into_diagnostic()
        }
        Command::Traits(args) => {
            let dataset = app.load_species(&args.species, false, None)?;
            let traits = match args.from {
                TraitSource::Y => list_traits(&dataset.phenotypes)?,
                TraitSource::Z => list_traits(&dataset.splits)?,
            };
            JsonOutput::print(&traits).into_diagnostic()
        }
        Command::Cv(args) => {
            let dataset = app.load_species(&args.species, false, None)?;
            let cv = get_cv_indices(&dataset.splits, &args.trait_name)?;
            JsonOutput::print(&cv).into_diagnostic()
        }
        Command::Benchmarks(args) => {
            let mut query = BenchmarkQuery::new()
                .summarize(!args.raw)
                .download(args.download);
            if !args.species.is_empty() {
                query = query.species(args.species);
            }
            if !args.traits.is_empty() {
                query = query.traits(args.traits);
            }
            if !args.models.is_empty() {
                query = query.models(args.models);
            }
            let mut table = app.load_benchmark_results(&query)?;
            if args.summarize_raw {
                table = table.summarize()?;
            }
            if args.json {
                JsonOutput::print(&table).into_diagnostic()
            } else {
                TableOutput::print_results(&table).into_diagnostic()
            }
        }
        Command::FetchBenchmarks(args) => {
            let dir = app.download_benchmark_data(args.force)?;
            println!("{dir}");
            Ok(())
        }
    }
}
