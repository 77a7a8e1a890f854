use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qrstudio::auth::Session;
use qrstudio::config::Config;
use qrstudio::cursor::CursorSigner;
use qrstudio::models::{ListQrQuery, QrStatus, RenderRequest};
use qrstudio::objects;
use qrstudio::render::ExportFormat;
use qrstudio::service::{palette_for_logo, render_export, QrService, MAX_PAGE_SIZE};
use qrstudio::storage;
use qrstudio::style::QrStyleConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qrstudio-admin")]
#[command(about = "QR Studio admin CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive a style palette from a logo image
    Palette {
        image: PathBuf,
    },
    /// Render data to an image file
    Render {
        /// Payload to encode
        data: String,
        #[arg(long)]
        out: PathBuf,
        /// png, jpeg or webp; defaults to the output file's extension
        #[arg(long)]
        format: Option<String>,
        /// simple, rounded, dots or elegant
        #[arg(long)]
        preset: Option<String>,
        /// JSON style file
        #[arg(long)]
        style: Option<PathBuf>,
    },
    /// Activate or deactivate a short code
    ShortStatus {
        short_code: String,
        /// active or inactive
        status: String,
    },
    /// List an owner's saved QR codes
    List {
        owner_id: String,
    },
}

async fn service(config: &Config) -> Result<QrService> {
    let storage = storage::connect(&config.database).await?;
    let objects = objects::open(&config.object_store).await?;
    Ok(QrService::new(
        storage,
        objects,
        config.public_base_url.clone(),
        CursorSigner::new(config.cursor_hmac_secret.as_deref()),
    ))
}

fn output_format(format: Option<&str>, out: &std::path::Path) -> Result<ExportFormat> {
    let name = match format {
        Some(f) => f.to_string(),
        None => out
            .extension()
            .and_then(|e| e.to_str())
            .context("cannot infer format: pass --format or use a .png/.jpeg/.webp file")?
            .to_string(),
    };
    Ok(name.parse::<ExportFormat>()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Palette { image } => {
            let bytes = tokio::fs::read(&image)
                .await
                .with_context(|| format!("failed to read {}", image.display()))?;
            let palette = palette_for_logo(&bytes)?;
            println!("{}", serde_json::to_string_pretty(&palette)?);
        }
        Commands::Render { data, out, format, preset, style } => {
            let style = match style {
                Some(path) => {
                    let json = tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    serde_json::from_str::<QrStyleConfig>(&json).context("invalid style JSON")?
                }
                None => QrStyleConfig::default(),
            };
            let request = RenderRequest {
                style,
                preset,
                format: output_format(format.as_deref(), &out)?,
                data: Some(data),
            };
            let export = render_export(&request, chrono::Utc::now().timestamp_millis())?;
            tokio::fs::write(&out, &export.bytes)
                .await
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("✓ Wrote {} ({} bytes)", out.display(), export.bytes.len());
        }
        Commands::ShortStatus { short_code, status } => {
            let status: QrStatus = status.parse()?;
            let config = Config::from_env()?;
            service(&config).await?.set_short_code_status(&short_code, status).await?;
            println!("✓ Short code '{}' is now {}", short_code, status);
        }
        Commands::List { owner_id } => {
            let config = Config::from_env()?;
            let service = service(&config).await?;
            let session = Session::new(owner_id.clone());

            let mut query = ListQrQuery {
                cursor: None,
                limit: Some(MAX_PAGE_SIZE),
                category_id: None,
            };
            let mut total = 0;
            println!("{:<14} {:<10} {:>7}  {:<30} {}", "ID", "Status", "Scans", "Name", "Target");
            println!("{}", "-".repeat(100));
            loop {
                let page = service.list(&session, &query).await?;
                for qr in &page.qrcodes {
                    println!(
                        "{:<14} {:<10} {:>7}  {:<30} {}",
                        qr.unique_id, qr.status.as_str(), qr.scan_count, qr.name, qr.target_url
                    );
                }
                total += page.qrcodes.len();
                match page.next_cursor {
                    Some(cursor) => query.cursor = Some(cursor),
                    None => break,
                }
            }
            if total == 0 {
                println!("No QR codes found for owner '{}'.", owner_id);
            }
        }
    }

    Ok(())
}
