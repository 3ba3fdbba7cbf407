use anyhow::{bail, Context, Result};
use clap::Parser;
use review_image_ingest::models::Config;
use review_image_ingest::platform::AdminGraphqlClient;
use review_image_ingest::ImagePipeline;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "review-image-ingest")]
#[command(about = "Upload an inline review image to the store's file library")]
struct CliArgs {
    /// Image as a `data:image/<type>;base64,...` URI, or `-` to read it from stdin.
    #[arg(value_name = "DATA_URI", conflicts_with = "input", required_unless_present = "input")]
    data_uri: Option<String>,

    /// Read the data URI from a file instead.
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Shop domain, e.g. `demo.myshopify.com`. Overrides SHOPIFY_SHOP_DOMAIN.
    #[arg(long, value_name = "DOMAIN")]
    shop: Option<String>,
}

fn read_data_uri(arg: Option<&str>, input: Option<&Path>) -> Result<String> {
    let raw = match (arg, input) {
        (_, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (Some("-"), None) => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read data URI from stdin")?;
            buf
        }
        (Some(value), None) => value.to_string(),
        (None, None) => bail!("No data URI given"),
    };
    Ok(raw.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "review_image_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let shop = match args.shop.clone().or_else(|| config.shop_domain.clone()) {
        Some(shop) => shop,
        None => {
            error!("No shop domain: pass --shop or set SHOPIFY_SHOP_DOMAIN");
            std::process::exit(1);
        }
    };

    let data_uri = read_data_uri(args.data_uri.as_deref(), args.input.as_deref())?;

    info!("Uploading review image for {}", shop);

    let platform = AdminGraphqlClient::new(&shop, config.access_token.clone(), &config.api_version);
    let pipeline = ImagePipeline::new(config.images.clone());

    match pipeline.ingest(&data_uri, &shop, &platform).await {
        Some(url) => {
            println!("{}", url);
            Ok(())
        }
        None => {
            error!("No image URL produced");
            std::process::exit(1);
        }
    }
}
