use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use offerbook_client::{images, ClientConfig, SnapshotCache, StoreClient};
use offerbook_core::{Dataset, FilterPolicy};
use offerbook_render::{install_resources, LatexRenderer, MkDocsRenderer};

/// Site flavor to generate.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Frontend {
    /// MkDocs Markdown site.
    Mkdocs,

    /// LaTeX book.
    Latex,
}

#[derive(Parser, Debug)]
#[clap(author, version, about = "Generate the application-outcomes directory site")]
struct Args {
    /// API key for the remote base
    #[clap(long, env = "OFFERBOOK_API_KEY")]
    api_key: Option<String>,

    /// Base URL of the remote API
    #[clap(long, env = "OFFERBOOK_API_BASE", default_value = offerbook_client::api::DEFAULT_API_BASE)]
    api_base: String,

    /// Output directory
    #[clap(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Snapshot cache directory
    #[clap(long, default_value = ".cache")]
    cache_dir: PathBuf,

    /// Use the cached snapshot without querying the API
    #[clap(long)]
    cached: bool,

    /// Symlink static resources instead of copying them
    #[clap(long)]
    link_resources: bool,

    /// Static resource directory containing manifest.json
    #[clap(long)]
    resource_dir: Option<PathBuf>,

    /// Drop applicants without a marked final destination
    #[clap(long)]
    require_destination: bool,

    /// Frontend to build
    #[clap(long, value_enum)]
    frontend: Frontend,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let args = Args::parse();

    let cache = SnapshotCache::new(&args.cache_dir);
    let cached = if args.cached { cache.load() } else { None };
    let raw = match cached {
        Some(tables) => tables,
        None => {
            let api_key = args
                .api_key
                .clone()
                .context("API key is not provided (use --api-key or OFFERBOOK_API_KEY)")?;

            info!("fetching all rows...");
            let client = StoreClient::connect(ClientConfig::new(args.api_base.clone(), api_key))
                .await
                .context("failed to connect to the base")?;
            let mut tables = client.fetch_all().await.context("failed to fetch rows")?;

            info!("rewriting image urls...");
            let rewritten = images::rewrite_image_urls(&client, &mut tables.applicants).await?;
            info!("rewrote {} image urls", rewritten);

            cache.save(&tables).context("failed to write snapshot cache")?;
            tables
        }
    };

    info!(
        "got {} applicants, {} datapoints, {} programs, {} majors",
        raw.applicants.len(),
        raw.datapoints.len(),
        raw.programs.len(),
        raw.majors.len()
    );

    let mut dataset = Dataset::from_rows(&raw.applicants, &raw.datapoints, &raw.programs, &raw.majors);
    let policy = FilterPolicy {
        require_destination: args.require_destination,
    };
    let (buckets, outcome) = offerbook_core::run_pipeline(&mut dataset, &policy)?;
    info!(
        "integrity filter: {} passes, removed {} records, pruned {} references",
        outcome.passes,
        outcome.removed_records(),
        outcome.pruned_references
    );

    match args.frontend {
        Frontend::Mkdocs => {
            MkDocsRenderer::new(&args.output_dir).build(&dataset, &buckets)?;
        }
        Frontend::Latex => {
            LatexRenderer::new(&args.output_dir).build(&dataset, &buckets)?;
        }
    }

    if let Some(resource_dir) = &args.resource_dir {
        install_resources(resource_dir, &args.output_dir, args.link_resources)
            .context("failed to install resources")?;
    }

    info!("site written to {}", args.output_dir.display());
    Ok(())
}
