//! Catalog CLI
//!
//! Local entry point: validates resources, classifies ad-hoc text and
//! processes listing batches against the local JSON stores.

use std::path::PathBuf;
use std::sync::Arc;

use catalog::{
    config::load_all,
    error::{AppError, Result},
    models::Listing,
    pipeline::Processor,
    services::language,
    stores::{FileQueue, LocalSearchIndex, LocalStore},
};
use clap::{Parser, Subcommand};

/// catalog - classified-ad curation and tagging engine
#[derive(Parser, Debug)]
#[command(name = "catalog", version, about = "Classified-ad curation and tagging engine")]
struct Cli {
    /// Path to the data directory with config.toml, lists/ and tags/
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate configuration, tag resources and curation lists
    Validate,

    /// Print the tags matching a text
    Tags {
        /// Text to classify
        text: String,

        /// Listing language
        #[arg(short, long, default_value = "sv")]
        language: String,
    },

    /// Curate a hypothetical listing and print the verdict
    Curate {
        /// Listing title
        title: String,

        /// Listing description
        #[arg(short = 'd', long, default_value = "")]
        description: String,

        /// Price
        #[arg(short, long)]
        price: f64,

        /// Currency code
        #[arg(short, long, default_value = "SEK")]
        currency: String,

        /// Listing language
        #[arg(short, long, default_value = "sv")]
        language: String,

        /// Run shallow (whitelist-ignoring) curation
        #[arg(long)]
        shallow: bool,
    },

    /// Process a JSON array of listings against the local stores
    Process {
        /// Path to the listings JSON file
        input: PathBuf,

        /// Store directory (default: {data_dir}/store)
        #[arg(long)]
        store_dir: Option<PathBuf>,
    },

    /// Query the local search index
    Search {
        /// Free-text query
        query: String,

        /// Store directory (default: {data_dir}/store)
        #[arg(long)]
        store_dir: Option<PathBuf>,
    },

    /// Show store counts and queue length
    Info {
        /// Store directory (default: {data_dir}/store)
        #[arg(long)]
        store_dir: Option<PathBuf>,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let store_dir_or = |dir: &Option<PathBuf>| {
        dir.clone().unwrap_or_else(|| cli.data_dir.join("store"))
    };

    match cli.command {
        Command::Validate => {
            log::info!("Validating resources in {}", cli.data_dir.display());
            let (config, tree, curator) = load_all(&cli.data_dir)?;
            log::info!("✓ Config OK ({} categories)", config.curation.categories.len());
            log::info!("✓ Tag tree OK ({} nodes)", tree.len());
            let roots = tree.nodes().filter(|n| n.parents.is_empty()).count();
            log::info!("  {} root categories", roots);
            log::info!(
                "✓ Curation lists OK ({})",
                curator
                    .categories()
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            log::info!("All validations passed!");
        }

        Command::Tags { text, language } => {
            let (_, tree, _) = load_all(&cli.data_dir)?;
            let tags = tree.matching_tags(&text, &language);
            if tags.is_empty() {
                log::info!("No tags match");
            }
            for tag in tags {
                println!("{tag}");
            }
        }

        Command::Curate {
            title,
            description,
            price,
            currency,
            language,
            shallow,
        } => {
            use catalog::curation::CurationMode;
            use catalog::models::SaleListing;

            let (_, _, curator) = load_all(&cli.data_dir)?;
            let listing = SaleListing {
                title: Some(title),
                description: if description.is_empty() {
                    None
                } else {
                    Some(description)
                },
                price: Some(price),
                currency: Some(currency),
                ..SaleListing::default()
            };
            let mode = if shallow {
                CurationMode::Shallow
            } else {
                CurationMode::Deep
            };
            let verdict = curator.passes(&listing, &language, mode)?;
            println!("{}", if verdict { "PASS" } else { "REJECT" });
        }

        Command::Process { input, store_dir } => {
            let (config, tree, curator) = load_all(&cli.data_dir)?;
            let store_dir = store_dir_or(&store_dir);
            log::info!("Processing {} against {}", input.display(), store_dir.display());

            let content = std::fs::read_to_string(&input)?;
            let listings: Vec<Listing> = serde_json::from_str(&content)?;
            log::info!("Loaded {} listings", listings.len());

            let processor = Processor::new(
                &config,
                tree,
                curator,
                Arc::new(LocalStore::new(&store_dir)),
                Arc::new(LocalSearchIndex::new(&store_dir)),
                Arc::new(FileQueue::new(&store_dir)),
                language::from_config(&config.language)?,
            );

            let outcome = processor.process_batch(listings).await;
            println!("{}", serde_json::to_string_pretty(&outcome.outcomes)?);

            if !outcome.failures.is_empty() {
                for failure in &outcome.failures {
                    log::error!("{}: {}", failure.native_url, failure.error);
                }
                return Err(AppError::validation(format!(
                    "{} of {} listings failed",
                    outcome.failures.len(),
                    outcome.failures.len() + outcome.outcomes.len()
                )));
            }
        }

        Command::Search { query, store_dir } => {
            let index = LocalSearchIndex::new(store_dir_or(&store_dir));
            let ids = index.lookup(&query).await?;
            if ids.is_empty() {
                log::info!("No items match");
            }
            for id in ids {
                println!("{id}");
            }
        }

        Command::Info { store_dir } => {
            let store_dir = store_dir_or(&store_dir);
            log::info!("Store directory: {}", store_dir.display());

            let items_path = store_dir.join("items.json");
            if items_path.exists() {
                let content = std::fs::read_to_string(&items_path)?;
                let items: Vec<serde_json::Value> = serde_json::from_str(&content)?;
                log::info!("Live items: {}", items.len());
            } else {
                log::info!("No live items yet.");
            }

            let queue = FileQueue::new(&store_dir);
            log::info!("Pending scrape tasks: {}", queue.pending().await?.len());

            let archive_root = store_dir.join("archive");
            if archive_root.exists() {
                let mut archived = 0usize;
                for year in std::fs::read_dir(&archive_root)? {
                    for month in std::fs::read_dir(year?.path())? {
                        let content = std::fs::read_to_string(month?.path())?;
                        let items: Vec<serde_json::Value> = serde_json::from_str(&content)?;
                        archived += items.len();
                    }
                }
                log::info!("Archived items: {archived}");
            } else {
                log::info!("No archived items yet.");
            }
        }
    }

    Ok(())
}
