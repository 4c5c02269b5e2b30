use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vitrine_core::ExtractionResult;
use vitrine_scraper::{parse_identifier, v2_signature, ExtractionPipeline, ScraperConfig};

#[derive(Debug, Parser)]
#[command(name = "vitrine-cli")]
#[command(about = "Resolve product links into title, image and price")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the extraction pipeline and print the result as JSON
    Resolve {
        url: String,
        /// Render the page in a headless browser instead of the HTTP cascade
        #[arg(long, conflicts_with = "simple")]
        headless: bool,
        /// Single direct fetch: structured data and script blobs only
        #[arg(long)]
        simple: bool,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Print the marketplace identifier and v2 signature parsed from a URL
    Inspect { url: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = vitrine_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // stdout carries the JSON result only.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Resolve {
            url,
            headless,
            simple,
            pretty,
        } => {
            let pipeline = build_pipeline(ScraperConfig::from_app_config(&config))?;
            let result = if headless {
                match pipeline.run_headless(&url).await {
                    Ok(record) => ExtractionResult::from(record),
                    Err(e) => ExtractionResult::failure(e.to_string()),
                }
            } else if simple {
                ExtractionResult::from(pipeline.run_simple(&url).await)
            } else {
                ExtractionResult::from(pipeline.run(&url).await)
            };
            print_json(&result, pretty)?;
            if let ExtractionResult::Failed { error } = result {
                anyhow::bail!("extraction failed: {error}");
            }
        }
        Commands::Inspect { url } => {
            let Some(id) = parse_identifier(&url) else {
                anyhow::bail!("no marketplace identifier in {url}");
            };
            let json = serde_json::json!({
                "shopId": id.shop_id,
                "itemId": id.item_id,
                "signature": v2_signature(&id.item_id, &id.shop_id),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

fn print_json(result: &ExtractionResult, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{out}");
    Ok(())
}

#[cfg(feature = "headless")]
fn build_pipeline(config: ScraperConfig) -> anyhow::Result<ExtractionPipeline> {
    let renderer = std::sync::Arc::new(vitrine_scraper::ChromiumRenderer::new(&config));
    Ok(ExtractionPipeline::new(config)?.with_renderer(renderer))
}

#[cfg(not(feature = "headless"))]
fn build_pipeline(config: ScraperConfig) -> anyhow::Result<ExtractionPipeline> {
    Ok(ExtractionPipeline::new(config)?)
}
