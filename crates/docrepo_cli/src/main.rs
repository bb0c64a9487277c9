//! `docrepo` command-line front end.
//!
//! # Responsibility
//! - Seed, page through and inspect persons in a file-backed document store.
//! - Print results as pretty JSON on stdout; errors go to stderr.

use clap::{Args, Parser, Subcommand};
use docrepo_core::{
    default_log_level, init_logging, DocumentStore, PaginationParams, PersonFilter,
    PersonService, RawPagination, StoreConfig,
};
use log::info;
use std::error::Error;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "docrepo", version)]
#[command(about = "Document repository over an embedded store", long_about = None)]
struct Cli {
    /// Store file; created when missing.
    #[arg(long, global = true, default_value = "docrepo.db")]
    db: PathBuf,
    /// Enables file logging under this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Bulk-insert random persons
    Seed {
        #[arg(long)]
        total: usize,
    },
    /// Page through persons
    Persons(PersonsArgs),
    /// Show one person
    Person { id: String },
}

#[derive(Debug, Args)]
struct PersonsArgs {
    #[arg(long)]
    page: Option<String>,
    #[arg(long)]
    limit: Option<String>,
    /// Matches first or last name; a trailing `*` matches prefixes.
    #[arg(long)]
    search: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,
    /// Kilometers.
    #[arg(long)]
    radius: Option<f64>,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = &cli.log_dir {
        let log_dir = if log_dir.is_absolute() {
            log_dir.clone()
        } else {
            std::env::current_dir()?.join(log_dir)
        };
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, &log_dir)?;
    }

    let store = DocumentStore::open(StoreConfig::file(&cli.db))?;
    let service = PersonService::new(&store);
    info!(
        "event=cli_command module=cli status=start command={}",
        command_name(&cli.command)
    );

    match cli.command {
        Commands::Seed { total } => {
            let summary = service.seed_persons(total)?;
            println!(
                "Inserted {} persons. Total seconds: {:.3}",
                summary.inserted,
                summary.elapsed.as_secs_f64()
            );
        }
        Commands::Persons(args) => {
            let params = PaginationParams::from_raw_with_default_limit(
                RawPagination {
                    limit: args.limit,
                    page: args.page,
                    search: args.search,
                },
                u64::from(store.config().default_page_size),
            )?;
            let filter = PersonFilter {
                latitude: args.lat,
                longitude: args.lon,
                radius: args.radius,
            };
            let page = service.paginate(&params, &filter)?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        Commands::Person { id } => {
            let person = service.get_by_id(&id)?;
            println!("{}", serde_json::to_string_pretty(&person)?);
        }
    }
    Ok(())
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Seed { .. } => "seed",
        Commands::Persons(_) => "persons",
        Commands::Person { .. } => "person",
    }
}
